use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

use crate::common::DATE_FOLDER_FORMAT;
use crate::common::io::move_file;
use crate::config::AppConfig;
use crate::pipeline::types::Session;

/// Move the session's files into `<watch>/<subject>/<YYYY.MM.DD>/`,
/// renaming candidates to a zero-padded sequence in chronological order and
/// the marker last. Returns the number of files moved.
pub fn organize(config: &AppConfig, session: &Session) -> Result<usize> {
    let date_folder = session.marker.taken_at.format(DATE_FOLDER_FORMAT).to_string();
    let dest_dir = config
        .watch_folder
        .join(&session.subject_id)
        .join(&date_folder);
    fs::create_dir_all(&dest_dir)
        .with_context(|| format!("failed to create directory tree {:?}", dest_dir))?;

    let mut moved = 0;
    for (index, image) in session.candidates.iter().enumerate() {
        let dest = dest_dir.join(sequence_file_name(index + 1, &image.path));
        move_file(&image.path, &dest)
            .with_context(|| format!("failed to move {:?} to {:?}", image.path, dest))?;
        moved += 1;
    }

    let marker_dest = dest_dir.join(session.marker_file_name());
    move_file(&session.marker.path, &marker_dest).with_context(|| {
        format!(
            "failed to move marker {:?} to {:?}",
            session.marker.path, marker_dest
        )
    })?;
    moved += 1;

    info!(
        "Moved {} files into {}/{}.",
        moved, session.subject_id, date_folder
    );
    Ok(moved)
}

/// Sequence numbering discards the original file name and keeps only its
/// extension, so destinations are collision-free within one session.
fn sequence_file_name(seq: usize, source: &Path) -> String {
    match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{seq:03}.{ext}"),
        None => format!("{seq:03}"),
    }
}
