pub mod errors;
pub mod io;

use std::sync::LazyLock;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

pub const MAX_COPY_RETRIES: u32 = 3;

pub const EVENT_QUEUE_BOUND: usize = 64;

pub const HALT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub const VALID_IMAGE_EXTENSIONS: &'static [&'static str] = &[
    "jpg", "jpeg", "jfif", "jpe", "png", "gif", "bmp", "tif", "tiff", "webp",
];

/// Entries whose top-level name starts with this character are reserved
/// (backup, error and done folders) and never enter a session.
pub const RESERVED_PREFIX: char = '_';

pub const MARKER_NAME_PREFIX: &'static str = "QR_";

pub const SESSION_ID_FORMAT: &'static str = "%Y%m%d_%H%M%S";

pub const DATE_FOLDER_FORMAT: &'static str = "%Y.%m.%d";

// Single runtime for the watch loop and the pipeline. All mutating work is
// funneled through one consumer, so there is no need for more than one.
pub static PIPELINE_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .thread_name("pipeline-worker")
        .enable_all()
        .build()
        .expect("Failed to build pipeline Tokio runtime")
});
