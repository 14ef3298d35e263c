//! Monetary unit conversion.
//!
//! Ledger totals are tracked as integer satoshi-equivalent units
//! (1 coin = 10^8 units). Node responses carry output values as decimal
//! coin amounts, converted exactly once at decomposition time.

use crate::constants::SATS_PER_COIN;

/// Convert a decimal coin amount to integer satoshi-equivalent units.
///
/// Rounds at the eighth decimal place before dropping sub-satoshi
/// precision, so binary float artifacts (0.3 * 1e8 = 29999999.999...)
/// land on the intended integer.
pub fn to_sats(coins: f64) -> u64 {
    let scaled = (coins * SATS_PER_COIN as f64).round();
    if scaled <= 0.0 { 0 } else { scaled as u64 }
}

/// Convert satoshi-equivalent units back to a decimal coin amount.
pub fn to_coins(sats: u64) -> f64 {
    sats as f64 / SATS_PER_COIN as f64
}

/// Round to two decimals. Presentation only.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to eight decimals. Presentation only.
pub fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_coins() {
        assert_eq!(to_sats(4.0), 400_000_000);
        assert_eq!(to_sats(1.5), 150_000_000);
        assert_eq!(to_sats(2.5), 250_000_000);
    }

    #[test]
    fn float_artifacts_absorbed() {
        assert_eq!(to_sats(0.3), 30_000_000);
        assert_eq!(to_sats(0.1), 10_000_000);
        assert_eq!(to_sats(20.12345678), 2_012_345_678);
    }

    #[test]
    fn negative_clamps_to_zero() {
        assert_eq!(to_sats(-1.0), 0);
    }

    #[test]
    fn round_trip() {
        assert_eq!(to_coins(to_sats(12.5)), 12.5);
    }

    #[test]
    fn presentation_rounding() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round8(0.123456789), 0.12345679);
    }
}
