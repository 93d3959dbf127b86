use anyhow::{Context, Result};
use chrono::Local;
use log::warn;
use std::fs;

use crate::config::AppConfig;

/// Outcome records are best-effort diagnostics: a failure to write one is
/// logged and never changes the session's already-decided classification.
pub fn record_success(config: &AppConfig, session_id: &str, subject_id: &str, moved: usize) {
    if let Err(err) = write_success_record(config, session_id, subject_id, moved) {
        warn!("Failed to write success record for session {session_id}: {err:#}");
    }
}

pub fn record_failure(config: &AppConfig, session_id: &str, subject_id: &str, err: &anyhow::Error) {
    if let Err(record_err) = write_failure_record(config, session_id, subject_id, err) {
        warn!("Failed to write failure record for session {session_id}: {record_err:#}");
    }
}

fn write_success_record(
    config: &AppConfig,
    session_id: &str,
    subject_id: &str,
    moved: usize,
) -> Result<()> {
    let dir = config.done_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory tree {:?}", dir))?;

    let path = dir.join(format!("done_{session_id}_{subject_id}.txt"));
    let body = format!(
        "session: {session_id}\nsubject: {subject_id}\nphotos moved: {moved}\ncompleted: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    fs::write(&path, body).with_context(|| format!("failed to write record {:?}", path))
}

fn write_failure_record(
    config: &AppConfig,
    session_id: &str,
    subject_id: &str,
    err: &anyhow::Error,
) -> Result<()> {
    let dir = config.error_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory tree {:?}", dir))?;

    let path = dir.join(format!("error_{session_id}.txt"));
    let body = format!(
        "session: {session_id}\nsubject: {subject_id}\nrecorded: {}\nerror: {err:?}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    fs::write(&path, body).with_context(|| format!("failed to write record {:?}", path))
}
