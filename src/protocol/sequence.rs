//! Per-session sequence numbers.

use super::wire_format::{SEQUENCE_MARKER, SEQUENCE_MASK};

/// Sequence number generator for one connection.
///
/// Each call to [`next`](Self::next) increments the stored value, masks it to
/// 15 bits and ORs in the marker bit. The marked value is kept as the new
/// state, so once bit 7 is set the low byte walks `0x80..=0xFF` and every
/// carry moves to the next page. Zero is never produced and no value repeats
/// within one rollover period of [`PERIOD`](Self::PERIOD) requests.
///
/// ```
/// use odrive_client::protocol::SequenceCounter;
///
/// let mut seq = SequenceCounter::new();
/// assert_eq!(seq.next(), 0x0081);
/// assert_eq!(seq.next(), 0x0082);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceCounter {
    value: u16,
}

impl SequenceCounter {
    /// Number of distinct sequence numbers before the counter wraps.
    pub const PERIOD: usize = (SEQUENCE_MASK as usize + 1) / 2;

    /// Create a counter for a fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the number to transmit.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u16 {
        self.value = (self.value.wrapping_add(1) & SEQUENCE_MASK) | SEQUENCE_MARKER;
        self.value
    }

    /// Last transmitted number, `0` before the first request.
    #[inline]
    pub fn current(&self) -> u16 {
        self.value
    }
}
