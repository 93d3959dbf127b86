use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::common::VALID_IMAGE_EXTENSIONS;
use crate::utils::PathExt;

pub const CONFIG_FILE: &'static str = "config.json";

const ENV_PREFIX: &'static str = "PHOTOSORT_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop accepting triggers after a fatal session error until a human
    /// intervenes.
    Halt,
    /// Keep processing subsequent triggers.
    Continue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder monitored for incoming photos. Also the root of the output
    /// layout and the reserved subfolders.
    pub watch_folder: PathBuf,
    /// Image extensions accepted into a session (leading dot optional).
    pub supported_formats: Vec<String>,
    pub max_photos_per_session: usize,
    /// How far before the marker's capture time a photo may lie and still
    /// belong to the session.
    pub session_window_minutes: i64,
    /// Backlog window for the one-time scan at startup.
    pub startup_scan_minutes: i64,
    /// Wait after a creation event so the writer can finish the file.
    pub settle_delay_seconds: u64,
    pub backup_folder: String,
    pub error_folder: String,
    pub done_folder: String,
    pub error_policy: ErrorPolicy,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watch_folder: PathBuf::from("./watch"),
            supported_formats: VALID_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_photos_per_session: 200,
            session_window_minutes: 60,
            startup_scan_minutes: 1440,
            settle_delay_seconds: 2,
            backup_folder: "_backup".to_string(),
            error_folder: "_error".to_string(),
            done_folder: "_done".to_string(),
            error_policy: ErrorPolicy::Halt,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `config.json` when present, otherwise from
    /// `PHOTOSORT_*` environment variables (a `.env` file is honored).
    pub fn load() -> Result<Self> {
        let mut config: AppConfig = if Path::new(CONFIG_FILE).exists() {
            let file = File::open(CONFIG_FILE)
                .with_context(|| format!("failed to open {CONFIG_FILE}"))?;
            serde_json::from_reader(file)
                .with_context(|| format!("invalid JSON in {CONFIG_FILE}"))?
        } else {
            dotenv::dotenv().ok();
            envy::prefixed(ENV_PREFIX)
                .from_env()
                .context("failed to read configuration from environment")?
        };

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn normalize(&mut self) {
        for ext in &mut self.supported_formats {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.supported_formats.is_empty() {
            bail!("supported_formats must not be empty");
        }
        if self.max_photos_per_session == 0 {
            bail!("max_photos_per_session must be at least 1");
        }
        if self.session_window_minutes <= 0 {
            bail!("session_window_minutes must be positive");
        }
        Ok(())
    }

    pub fn is_image_file(&self, path: &Path) -> bool {
        let ext = path.ext_lower();
        !ext.is_empty() && self.supported_formats.iter().any(|allowed| *allowed == ext)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.watch_folder.join(&self.backup_folder)
    }

    pub fn error_dir(&self) -> PathBuf {
        self.watch_folder.join(&self.error_folder)
    }

    pub fn done_dir(&self) -> PathBuf {
        self.watch_folder.join(&self.done_folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_normalized() {
        let mut config = AppConfig {
            supported_formats: vec![".JPG".to_string(), "Png".to_string()],
            ..AppConfig::default()
        };
        config.normalize();
        assert_eq!(config.supported_formats, vec!["jpg", "png"]);
        assert!(config.is_image_file(Path::new("photo.JPG")));
        assert!(!config.is_image_file(Path::new("notes.txt")));
        assert!(!config.is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let config = AppConfig {
            supported_formats: vec![],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
