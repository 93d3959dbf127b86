use anyhow::Result;
use log::info;
use std::sync::Arc;

use photosort::bootstrap;
use photosort::common::PIPELINE_RUNTIME;
use photosort::config::AppConfig;
use photosort::processors::marker::{MarkerDecoder, QrDecoder};
use photosort::state::ProcessorState;
use photosort::watch;

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    bootstrap::init_logging(&config)?;
    bootstrap::ensure_layout(&config)?;

    info!("Photo processor initialized.");
    info!("Watching folder: {:?}", config.watch_folder);

    let state = Arc::new(ProcessorState::new(config));
    let decoder: Arc<dyn MarkerDecoder> = Arc::new(QrDecoder);

    PIPELINE_RUNTIME.block_on(watch::run(state, decoder))?;

    info!("Photo processor stopped.");
    Ok(())
}
