use anyhow::{Context, Result};
use chrono::Duration;
use log::debug;
use path_clean::PathClean;
use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::pipeline::types::{ImageFile, SessionTrigger};
use crate::processors::timestamp;
use crate::utils::is_reserved_name;

/// Select the time-windowed candidate set for a trigger, chronologically
/// ordered, marker excluded. The enumeration is a point-in-time snapshot;
/// files appearing mid-scan are not retroactively added.
pub fn collect(config: &AppConfig, trigger: &SessionTrigger) -> Result<Vec<ImageFile>> {
    let cutoff = trigger.taken_at - Duration::minutes(config.session_window_minutes);
    let marker_path = trigger.marker_path.clean();
    let mut candidates = Vec::new();

    for entry in WalkDir::new(&config.watch_folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_reserved_name(&name) {
            continue;
        }
        let path = entry.path().to_path_buf();
        if !config.is_image_file(&path) || path.clean() == marker_path {
            continue;
        }

        let taken_at = timestamp::resolve(&path)
            .with_context(|| format!("failed to resolve capture time of {:?}", path))?;
        if cutoff <= taken_at && taken_at <= trigger.taken_at {
            candidates.push(ImageFile { path, taken_at });
        } else {
            debug!("Skipping {}: outside the session window.", name);
        }
    }

    // Stable sort: ties keep their enumeration order.
    candidates.sort_by_key(|image| image.taken_at);
    Ok(candidates)
}
