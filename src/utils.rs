use std::path::Path;

use crate::common::RESERVED_PREFIX;

pub trait PathExt {
    fn ext_lower(&self) -> String;
    fn name_lossy(&self) -> String;
}

impl PathExt for Path {
    fn ext_lower(&self) -> String {
        self.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn name_lossy(&self) -> String {
        self.file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Reserved entries (backup/error/done folders and anything else prefixed
/// with the marker character) never participate in a session.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}
