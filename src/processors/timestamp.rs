use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{In, Tag};
use log::debug;
use std::{fs::File, io::BufReader, path::Path};

use crate::utils::PathExt;

const EXIF_DATETIME_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

/// Resolve the logical capture time of an image: EXIF capture metadata
/// first, the file's modification time otherwise. Metadata decode problems
/// are swallowed; only a failing `stat` on the fallback path is an error.
pub fn resolve(path: &Path) -> Result<DateTime<Local>> {
    if let Some(taken_at) = capture_time_from_exif(path) {
        return Ok(taken_at);
    }

    debug!("Using file modification time for {}", path.name_lossy());
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("failed to read modification time of {:?}", path))?;
    Ok(DateTime::<Local>::from(modified))
}

fn capture_time_from_exif(path: &Path) -> Option<DateTime<Local>> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;

    let now_time = Local::now().naive_local();
    for tag in [Tag::DateTimeOriginal, Tag::DateTime] {
        if let Some(field) = exif.get_field(tag, In::PRIMARY)
            && let Ok(naive) = NaiveDateTime::parse_from_str(
                &field.display_value().to_string(),
                EXIF_DATETIME_FORMAT,
            )
            && let Some(local_dt) = Local.from_local_datetime(&naive).single()
            && local_dt.naive_local() <= now_time
        {
            return Some(local_dt);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};

    #[test]
    fn falls_back_to_modification_time_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

        let resolved = resolve(&path).unwrap();
        assert_eq!(resolved.timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve(&dir.path().join("gone.jpg")).is_err());
    }
}
