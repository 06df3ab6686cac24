use crate::CoreResult;

/// Durable home of the accumulated total, in whole seconds.
///
/// Implementations serialize their own read-modify-write cycles so that a
/// fold always starts from the value left by the latest manual adjustment.
pub trait TotalTimeStore: Send + Sync {
    /// Read the persisted total; 0 when missing or unreadable.
    fn load(&self) -> u64;

    /// Persist `load() + seconds` and return the new total.
    ///
    /// A successful return implies the value survives a restart.
    fn add(&self, seconds: u64) -> CoreResult<u64>;

    /// Persist `load() + delta`, clamped at zero, and return the new total.
    fn adjust_by(&self, delta: i64) -> CoreResult<u64>;

    /// Persist zero.
    fn reset(&self) -> CoreResult<()>;
}
