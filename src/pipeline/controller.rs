use anyhow::{Result, bail};
use log::{info, warn};
use std::time::Instant;

use crate::common::SESSION_ID_FORMAT;
use crate::common::errors::handle_error;
use crate::config::ErrorPolicy;
use crate::pipeline::types::{Session, SessionTrigger};
use crate::pipeline::{archiver, collector, organizer, recorder};
use crate::state::ProcessorState;
use crate::utils::PathExt;

/// Terminal result of one pipeline run. An outcome record has been written
/// either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Organized { moved: usize },
    Aborted,
}

/// Drive one trigger end-to-end: collect, guard, archive, organize, record.
/// Every error from the mutating stages is caught here, recorded as a
/// failure, and escalated to the halt flag under the halt policy.
pub fn run(state: &ProcessorState, trigger: &SessionTrigger) -> SessionOutcome {
    let config = &state.config;
    let session_id = trigger.taken_at.format(SESSION_ID_FORMAT).to_string();
    let start_time = Instant::now();

    info!(
        "Session {} triggered by {} for subject {}.",
        session_id,
        trigger.marker_path.name_lossy(),
        trigger.subject_id
    );

    match run_to_organized(state, &session_id, trigger) {
        Ok(moved) => {
            recorder::record_success(config, &session_id, &trigger.subject_id, moved);
            info!(duration = &*format!("{:?}", start_time.elapsed()); "Session {} complete ({} files moved).", session_id, moved);
            SessionOutcome::Organized { moved }
        }
        Err(err) => {
            let err = handle_error(err.context(format!("session {session_id} aborted")));
            recorder::record_failure(config, &session_id, &trigger.subject_id, &err);
            if config.error_policy == ErrorPolicy::Halt {
                warn!("Error policy is halt; no further triggers will be accepted.");
                state.halt();
            }
            SessionOutcome::Aborted
        }
    }
}

fn run_to_organized(
    state: &ProcessorState,
    session_id: &str,
    trigger: &SessionTrigger,
) -> Result<usize> {
    let config = &state.config;

    let candidates = collector::collect(config, trigger)?;
    if candidates.len() > config.max_photos_per_session {
        bail!(
            "too many photos for one session: {} (limit {})",
            candidates.len(),
            config.max_photos_per_session
        );
    }

    let session = Session::new(session_id.to_string(), trigger, candidates);
    archiver::archive(config, &session)?;
    organizer::organize(config, &session)
}
