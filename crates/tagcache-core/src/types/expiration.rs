//! Entry expiration encoding

use serde::{Deserialize, Serialize};

/// Lifetimes above this many seconds (30 days) are stored as absolute
/// Unix timestamps instead of relative durations.
///
/// Older cache protocols overload a single expiration field this way and
/// the stored values have to stay compatible with them.
pub const RELATIVE_LIFETIME_LIMIT: u64 = 2_592_000;

/// Expiration as handed to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expiration {
    /// Never expires
    Unlimited,
    /// Expires this many seconds after the write
    Relative(u64),
    /// Expires at this Unix timestamp (seconds)
    Absolute(u64),
}

impl Expiration {
    /// Encode a lifetime in seconds the way the backends expect it
    ///
    /// `0` means unlimited. Lifetimes up to [`RELATIVE_LIFETIME_LIMIT`] are
    /// relative, longer ones become `now + lifetime`.
    pub fn from_lifetime(lifetime: u64, now: u64) -> Self {
        if lifetime == 0 {
            Expiration::Unlimited
        } else if lifetime > RELATIVE_LIFETIME_LIMIT {
            Expiration::Absolute(now.saturating_add(lifetime))
        } else {
            Expiration::Relative(lifetime)
        }
    }

    /// Absolute deadline for a value written at `written_at`, if any
    pub fn deadline(&self, written_at: u64) -> Option<u64> {
        match *self {
            Expiration::Unlimited => None,
            Expiration::Relative(secs) => Some(written_at.saturating_add(secs)),
            Expiration::Absolute(ts) => Some(ts),
        }
    }

    /// Check if this is an unlimited lifetime
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Expiration::Unlimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn test_zero_is_unlimited() {
        assert_eq!(Expiration::from_lifetime(0, NOW), Expiration::Unlimited);
        assert_eq!(Expiration::Unlimited.deadline(NOW), None);
    }

    #[test]
    fn test_short_lifetime_is_relative() {
        assert_eq!(Expiration::from_lifetime(100, NOW), Expiration::Relative(100));
        assert_eq!(Expiration::Relative(100).deadline(NOW), Some(NOW + 100));
    }

    #[test]
    fn test_threshold_is_still_relative() {
        assert_eq!(
            Expiration::from_lifetime(RELATIVE_LIFETIME_LIMIT, NOW),
            Expiration::Relative(RELATIVE_LIFETIME_LIMIT)
        );
    }

    #[test]
    fn test_long_lifetime_is_absolute() {
        assert_eq!(
            Expiration::from_lifetime(3_000_000, NOW),
            Expiration::Absolute(NOW + 3_000_000)
        );
        assert_eq!(
            Expiration::Absolute(NOW + 3_000_000).deadline(0),
            Some(NOW + 3_000_000)
        );
    }
}
