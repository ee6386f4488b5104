//! Progress reporting contract.

/// Receives completion events from the reconciler.
///
/// Purely presentational. `advance` carries the cumulative number of
/// completed items; with concurrent dispatch the calls may interleave, so
/// implementations should only ever move their display forward.
pub trait Progress: Send + Sync {
    /// A batch of `total` items is starting.
    fn start(&self, total: u64);

    /// `completed` items have finished so far.
    fn advance(&self, completed: u64);

    /// The batch is over.
    fn finish(&self) {}
}

/// A progress sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _total: u64) {}

    fn advance(&self, _completed: u64) {}
}
