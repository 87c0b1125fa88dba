//! Progress reporting for incident fetches.
//!
//! Sources report through [`ProgressCallback`] so the CLI can draw a
//! spinner while the server and tests stay silent.

/// Receives status updates while a source fetches.
///
/// Implementations must be `Send + Sync`: the server fetches from a spawned
/// task.
pub trait ProgressCallback: Send + Sync {
    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark the fetch as complete with a final message.
    fn finish(&self, msg: String);

    /// Mark the fetch as complete and remove the indicator.
    fn finish_and_clear(&self);
}

/// A [`ProgressCallback`] that ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Reports progress through `log::debug!` only.
pub struct LogProgress;

impl ProgressCallback for LogProgress {
    fn set_message(&self, msg: String) {
        log::debug!("{msg}");
    }

    fn finish(&self, msg: String) {
        log::debug!("done: {msg}");
    }

    fn finish_and_clear(&self) {}
}
