//! Ambient signal source trait.

use siaga_shared::signal::SignalState;

/// Single writer of the shared [`SignalState`]
///
/// Both methods are synchronous: a state replacement is one indivisible step,
/// so concurrent readers never see a torn reading.
pub trait SignalSource: Send + Sync {
    /// Current reading
    fn current(&self) -> SignalState;

    /// Advance the reading if the minimum interval has elapsed since the last
    /// update. Returns `None` (and changes nothing) otherwise.
    fn tick(&self) -> Option<SignalState>;
}
