use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info, warn};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use path_clean::PathClean;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use walkdir::WalkDir;

use crate::common::{EVENT_QUEUE_BOUND, HALT_POLL_INTERVAL};
use crate::config::AppConfig;
use crate::pipeline::controller;
use crate::pipeline::types::SessionTrigger;
use crate::processors::marker::{self, MarkerDecoder};
use crate::processors::timestamp;
use crate::state::ProcessorState;
use crate::utils::{PathExt, is_reserved_name};

/// Run the dispatcher: one startup backlog scan, then the live watch loop.
/// All controller invocations are funneled through this single flow, so no
/// two sessions' mutating stages ever interleave.
pub async fn run(state: Arc<ProcessorState>, decoder: Arc<dyn MarkerDecoder>) -> Result<()> {
    {
        let state = state.clone();
        let decoder = decoder.clone();
        spawn_blocking(move || scan_backlog(&state, decoder.as_ref()))
            .await
            .context("backlog scan task panicked")??;
    }

    let (tx, mut rx) = mpsc::channel::<PathBuf>(EVENT_QUEUE_BOUND);
    let _watcher = start_watcher(&state.config, tx)?;
    info!(
        "Monitoring {:?} for new images.",
        state.config.watch_folder
    );

    let mut poll = tokio::time::interval(HALT_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested.");
                break;
            }
            _ = poll.tick() => {
                if state.is_halted() {
                    warn!("Halt flag is set; stopping the watch loop.");
                    break;
                }
            }
            received = rx.recv() => match received {
                Some(path) => handle_created(&state, &decoder, path).await?,
                None => break,
            },
        }
    }

    Ok(())
}

/// One-time scan for images that arrived before startup. Triggers run in
/// directory-enumeration order, unlike live events, which arrive in time
/// order.
pub fn scan_backlog(state: &ProcessorState, decoder: &dyn MarkerDecoder) -> Result<()> {
    let config = &state.config;
    let cutoff = Local::now() - chrono::Duration::minutes(config.startup_scan_minutes);
    info!(
        "Scanning backlog for images captured after {} (directory order).",
        cutoff.format("%Y-%m-%d %H:%M:%S")
    );

    let mut triggers = 0;
    for entry in WalkDir::new(&config.watch_folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if state.is_halted() {
            warn!("Halt flag is set; abandoning the backlog scan.");
            break;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_reserved_name(&name) {
            continue;
        }
        let path = entry.path().to_path_buf();
        if !config.is_image_file(&path) {
            continue;
        }

        let taken_at = match timestamp::resolve(&path) {
            Ok(taken_at) => taken_at,
            Err(err) => {
                warn!("Skipping {}: {err:#}", name);
                continue;
            }
        };
        if taken_at < cutoff {
            continue;
        }

        if let Some(subject_id) = marker::detect(decoder, &path) {
            let trigger = SessionTrigger {
                subject_id,
                marker_path: path,
                taken_at,
            };
            controller::run(state, &trigger);
            triggers += 1;
        }
    }

    info!("Backlog scan complete ({} marker(s) processed).", triggers);
    Ok(())
}

fn start_watcher(
    config: &AppConfig,
    tx: mpsc::Sender<PathBuf>,
) -> Result<notify::RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_)) {
                    return;
                }
                for path in event.paths {
                    // blocking_send: the bounded queue applies backpressure
                    // to the notification thread instead of dropping events.
                    if tx.blocking_send(path).is_err() {
                        return;
                    }
                }
            }
            Err(err) => warn!("Watch error: {err}"),
        }
    })
    .context("failed to create filesystem watcher")?;

    watcher
        .watch(&config.watch_folder, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {:?}", config.watch_folder))?;
    Ok(watcher)
}

/// Settle, detect, and run the pipeline for one creation event. Awaited by
/// the caller before the next event is dequeued.
async fn handle_created(
    state: &Arc<ProcessorState>,
    decoder: &Arc<dyn MarkerDecoder>,
    path: PathBuf,
) -> Result<()> {
    if state.is_halted() {
        debug!("Halted; discarding event for {:?}", path);
        return Ok(());
    }

    let path = path.clean();
    let name = path.name_lossy();
    if name.is_empty() || is_reserved_name(&name) || !state.config.is_image_file(&path) {
        return Ok(());
    }
    info!("New image detected: {}", name);

    // Let the producing writer finish before touching the file.
    tokio::time::sleep(Duration::from_secs(state.config.settle_delay_seconds)).await;

    let state = state.clone();
    let decoder = decoder.clone();
    spawn_blocking(move || {
        if !path.is_file() {
            debug!("File {:?} disappeared while settling.", path);
            return;
        }
        let Some(subject_id) = marker::detect(decoder.as_ref(), &path) else {
            return;
        };
        match timestamp::resolve(&path) {
            Ok(taken_at) => {
                let trigger = SessionTrigger {
                    subject_id,
                    marker_path: path,
                    taken_at,
                };
                controller::run(&state, &trigger);
            }
            Err(err) => warn!("Could not resolve capture time of {:?}: {err:#}", path),
        }
    })
    .await
    .context("event handler task panicked")?;

    Ok(())
}
