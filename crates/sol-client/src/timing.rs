//! Chain timing constants used by the blockhash refresh protocol.

use std::time::Duration;

/// PoH ticks per second.
pub const NUM_TICKS_PER_SECOND: u64 = 160;

/// Ticks per slot.
pub const DEFAULT_TICKS_PER_SLOT: u64 = 64;

/// Wall-clock duration of one slot: 400ms.
pub const MS_PER_SLOT: u64 = 1000 * DEFAULT_TICKS_PER_SLOT / NUM_TICKS_PER_SECOND;

/// How long a cached blockhash is considered fresh before the cache
/// re-fetches on the next use.
pub const BLOCKHASH_CACHE_TTL: Duration = Duration::from_secs(30);

/// Delay between attempts when polling for a new blockhash: half a slot.
pub const BLOCKHASH_POLL_INTERVAL: Duration = Duration::from_millis(MS_PER_SLOT / 2);

/// Upper bound on poll attempts before giving up.
pub const BLOCKHASH_POLL_ATTEMPTS: u32 = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_duration_is_400ms() {
        assert_eq!(MS_PER_SLOT, 400);
    }

    #[test]
    fn poll_interval_is_half_a_slot() {
        assert_eq!(BLOCKHASH_POLL_INTERVAL, Duration::from_millis(200));
    }
}
