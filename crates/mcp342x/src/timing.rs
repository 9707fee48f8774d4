//! Conversion settling time.

use crate::Resolution;

/// Margin added on top of one conversion period.
pub const GUARD_MS: u32 = 50;

/// Base wait used for a bit count the device does not support.
const UNKNOWN_BASE_MS: u32 = 500;

/// Milliseconds to wait after starting a one-shot conversion at `bits` resolution.
///
/// One conversion period, rounded down, plus [`GUARD_MS`].
pub fn conversion_delay_ms(bits: u8) -> u32 {
    match Resolution::try_from(bits) {
        Ok(resolution) => 1_000_000 / resolution.sample_rate_millihertz() + GUARD_MS,
        Err(_) => UNKNOWN_BASE_MS + GUARD_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_per_resolution() {
        assert_eq!(conversion_delay_ms(12), 54);
        assert_eq!(conversion_delay_ms(14), 66);
        assert_eq!(conversion_delay_ms(16), 116);
        assert_eq!(conversion_delay_ms(18), 316);
    }

    #[test]
    fn unknown_resolution_waits_longest() {
        assert_eq!(conversion_delay_ms(0), 550);
        assert_eq!(conversion_delay_ms(24), 550);
    }

    #[test]
    fn resolution_delegates() {
        assert_eq!(Resolution::Bits12.conversion_delay_ms(), 54);
        assert_eq!(Resolution::Bits18.conversion_delay_ms(), 316);
    }
}
