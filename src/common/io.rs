use anyhow::{Context, Result};
use log::warn;
use std::{fs, path::Path, thread, time::Duration};

use crate::common::MAX_COPY_RETRIES;

/// Copy a file, retrying transient failures with a linear backoff.
pub fn copy_with_retry(source: &Path, dest: &Path) -> Result<u64> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match fs::copy(source, dest) {
            Ok(bytes) => return Ok(bytes),
            Err(err) if attempts < MAX_COPY_RETRIES => {
                warn!(
                    "Failed copying {:?} (attempt {}), retrying in {}ms: {}",
                    source,
                    attempts,
                    100 * attempts,
                    err
                );
                thread::sleep(Duration::from_millis(100 * attempts as u64));
            }
            Err(err) => {
                return Err(err).context(format!(
                    "Failed copying {:?} to {:?} after {} attempts",
                    source, dest, attempts
                ));
            }
        }
    }
}

/// Move a file, falling back to copy-and-remove when `rename` is not
/// possible (e.g. across filesystems).
pub fn move_file(source: &Path, dest: &Path) -> Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    copy_with_retry(source, dest)?;
    fs::remove_file(source)
        .with_context(|| format!("Failed removing {:?} after copying to {:?}", source, dest))
}
