//! Provides a driver for a Microchip MCP3424 delta-sigma ADC via the `embedded-hal` ecosystem.
//!
//! Every read is a one-shot conversion: the configuration byte is written,
//! the driver waits for the conversion to settle and then reads the result
//! back. Nothing is kept between reads, so the write, wait and read of one
//! request must not be interleaved with another request to the same device.
//! Serialise access to a shared device outside this crate.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use tracing::{debug, trace, warn};

pub mod config;
pub mod convert;
pub mod decode;
mod error;
pub mod timing;

#[cfg(feature = "mcp3424")]
pub mod mcp3424;

pub use config::{
    gain_code_to_factor, resolution_code_to_bits, Channel, ChannelConfig, ConfigByte,
    ConfigError, Gain, Resolution,
};
pub use decode::{DecodedSample, RawResponse};
pub use error::Error;

/// Factory address with both address pins tied low.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// A completed conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Input voltage at the channel, gain compensated.
    pub volts: f64,
    pub sample: DecodedSample,
}

impl Reading {
    /// Six byte diagnostic buffer: working bytes, low count byte, resolution.
    pub fn diagnostics(&self) -> [u8; 6] {
        self.sample.snapshot
    }
}

/// Write the configuration byte that starts a one-shot conversion.
pub fn start_conversion<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    config: &ChannelConfig,
) -> Result<(), Error<I2C::Error>> {
    let byte = config.one_shot().encode();

    trace!("configuring {:#04x} with {:#010b}", address, byte);

    i2c.write(address, &[byte]).map_err(Error::TransportWrite)
}

/// Read back a conversion started by [`start_conversion`] and scale it to volts.
///
/// The caller is responsible for having waited
/// [`Resolution::conversion_delay_ms`] since the conversion was started.
pub fn fetch_reading<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    config: &ChannelConfig,
) -> Result<Reading, Error<I2C::Error>> {
    let mut raw: RawResponse = [0; 4];

    i2c.read(address, &mut raw).map_err(Error::TransportRead)?;

    trace!("read {:02x?} from {:#04x}", raw, address);

    let sample = decode::decode(&raw, config.resolution);

    let echo = ConfigByte::decode(sample.echo());
    if !echo.is_ready() {
        debug!("{:#04x} reports /RDY high, result is stale", address);
    }
    if !echo.matches(config) {
        warn!(
            "{:#04x} echoed {:#010b}, expected channel {} at {} bits x{}",
            address,
            sample.echo(),
            config.channel.number(),
            config.resolution.bits(),
            config.gain.factor(),
        );
    }

    let volts = convert::to_volts(sample.counts, config.resolution, config.gain);

    debug!(
        "{:#04x} channel {}: {} counts, {} V",
        address,
        config.channel.number(),
        sample.counts,
        volts
    );

    Ok(Reading { volts, sample })
}

/// Run one complete one-shot conversion on `config.channel` of the device at `address`.
///
/// Blocks for the full conversion delay between the write and the read. If the
/// write fails the read is never attempted.
pub fn read_channel<I2C: I2c, D: DelayNs>(
    i2c: &mut I2C,
    delay: &mut D,
    address: u8,
    config: ChannelConfig,
) -> Result<Reading, Error<I2C::Error>> {
    start_conversion(i2c, address, &config)?;

    let wait = config.resolution.conversion_delay_ms();
    trace!("waiting {} ms for conversion", wait);
    delay.delay_ms(wait);

    fetch_reading(i2c, address, &config)
}
