use anyhow::{Context, Result, bail};
use log::info;
use std::fs;

use crate::common::io::copy_with_retry;
use crate::config::AppConfig;
use crate::pipeline::types::Session;

/// Copy the session's raw inputs (marker included) into the backup area.
/// Runs before any original file is moved; a failure here means organizing
/// must not run.
pub fn archive(config: &AppConfig, session: &Session) -> Result<()> {
    let backup_dir = config.backup_dir().join(&session.id);
    if backup_dir.exists() {
        bail!(
            "backup for session {} already exists at {:?}; refusing to overwrite",
            session.id,
            backup_dir
        );
    }
    fs::create_dir_all(&backup_dir)
        .with_context(|| format!("failed to create directory tree {:?}", backup_dir))?;

    for image in &session.candidates {
        let file_name = image
            .path
            .file_name()
            .with_context(|| format!("candidate without a file name: {:?}", image.path))?;
        copy_with_retry(&image.path, &backup_dir.join(file_name))?;
    }

    // The marker backup name embeds the subject id so a human can correlate
    // the backup to a subject even if organizing fails afterwards.
    copy_with_retry(
        &session.marker.path,
        &backup_dir.join(session.marker_file_name()),
    )?;

    info!(
        "Archived {} files for session {} to {:?}",
        session.candidates.len() + 1,
        session.id,
        backup_dir
    );
    Ok(())
}
