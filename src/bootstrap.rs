use anyhow::{Context, Result, bail};
use log::LevelFilter;
use std::fs::{self, File};

use crate::config::AppConfig;

pub fn init_logging(config: &AppConfig) -> Result<()> {
    let level = config
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);

    if let Some(log_file) = &config.log_file {
        let file = File::create(log_file)
            .with_context(|| format!("failed to create log file {:?}", log_file))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("logger already initialized")?;
    Ok(())
}

/// Verify the watch folder and create the reserved subfolders.
pub fn ensure_layout(config: &AppConfig) -> Result<()> {
    if !config.watch_folder.is_dir() {
        bail!("watch folder does not exist: {:?}", config.watch_folder);
    }

    for dir in [config.backup_dir(), config.error_dir(), config.done_dir()] {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create directory tree {:?}", dir))?;
    }

    Ok(())
}
