use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::common::MARKER_NAME_PREFIX;

/// A candidate image in the watch folder with its resolved capture time,
/// computed once per processing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub taken_at: DateTime<Local>,
}

/// Produced when the detector finds a subject id in an image. Transient;
/// drives exactly one pipeline run.
#[derive(Debug, Clone)]
pub struct SessionTrigger {
    pub subject_id: String,
    pub marker_path: PathBuf,
    pub taken_at: DateTime<Local>,
}

/// The unit of work triggered by one marker. The candidate list is a fixed
/// snapshot: it is never re-queried once archiving begins.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub subject_id: String,
    pub candidates: Vec<ImageFile>,
    pub marker: ImageFile,
}

impl Session {
    pub fn new(id: String, trigger: &SessionTrigger, candidates: Vec<ImageFile>) -> Self {
        Self {
            id,
            subject_id: trigger.subject_id.clone(),
            candidates,
            marker: ImageFile {
                path: trigger.marker_path.clone(),
                taken_at: trigger.taken_at,
            },
        }
    }

    /// Backup and destination name for the marker file, e.g. `QR_42.jpg`.
    pub fn marker_file_name(&self) -> String {
        match self.marker.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{MARKER_NAME_PREFIX}{}.{ext}", self.subject_id),
            None => format!("{MARKER_NAME_PREFIX}{}", self.subject_id),
        }
    }
}
