//! Count to voltage scaling.

use crate::{Gain, Resolution};

/// Internal voltage reference of the MCP342x family, in volts.
pub const REFERENCE_VOLTAGE: f64 = 2.048;

/// Volts per count at `resolution`, before gain compensation.
pub fn lsb_volts(resolution: Resolution) -> f64 {
    2.0 * REFERENCE_VOLTAGE / f64::from(1u32 << resolution.bits())
}

/// Input voltage for a signed count, compensated for `gain`.
pub fn to_volts(counts: i32, resolution: Resolution, gain: Gain) -> f64 {
    f64::from(counts) * lsb_volts(resolution) / f64::from(gain.factor())
}
