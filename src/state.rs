use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::AppConfig;

/// Process-wide control state shared by the dispatcher and the pipeline.
pub struct ProcessorState {
    pub config: AppConfig,
    halted: AtomicBool,
}

impl ProcessorState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            halted: AtomicBool::new(false),
        }
    }

    /// Checked before every trigger acceptance.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Set after a fatal session error under the halt policy. Never cleared
    /// within a run.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }
}
