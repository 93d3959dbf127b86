use log::error;

/// Log an error with its full context chain and hand it back to the caller.
pub fn handle_error(err: anyhow::Error) -> anyhow::Error {
    error!("{err:?}");
    err
}
