//! Sampler settings.
//!
//! Parses environment variables to pick the bus, the device and the channels
//! to sample.

use std::env::VarError;
use std::time::Duration;

use mcp342x::{Channel, ChannelConfig, ConfigError, Gain, Resolution};

/// Lowest and highest address an MCP3424 can be strapped to.
const ADDRESS_RANGE: std::ops::RangeInclusive<u8> = 0x68..=0x6F;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{var}={value:?} is not a number")]
    NotANumber { var: &'static str, value: String },

    #[error("{var}: {source}")]
    Config {
        var: &'static str,
        #[source]
        source: ConfigError,
    },

    #[error("{var} is not valid unicode")]
    NotUnicode { var: &'static str },

    #[error("address 0x{0:02x} is outside 0x68..=0x6f")]
    Address(u8),

    #[error("EGT_CHANNELS lists no channels")]
    NoChannels,
}

/// Sampler settings parsed from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSettings {
    /// Linux I2C bus number.
    pub bus: u8,

    /// 7-bit address of the MCP3424.
    pub address: u8,

    /// Conversions to run each round, in order.
    pub channels: Vec<ChannelConfig>,

    /// Pause between rounds.
    pub interval: Duration,
}

impl Default for SamplerSettings {
    /// Two thermocouples on channels 1 and 2 at full resolution and gain.
    fn default() -> Self {
        let config = |channel| ChannelConfig {
            channel,
            resolution: Resolution::Bits18,
            gain: Gain::X8,
        };

        Self {
            bus: 1,
            address: mcp342x::DEFAULT_ADDRESS,
            channels: vec![config(Channel::CH1), config(Channel::CH2)],
            interval: Duration::from_millis(1000),
        }
    }
}

impl SamplerSettings {
    /// Parse settings from environment variables, defaulting any that are unset.
    ///
    /// # Environment Variables
    ///
    /// - `EGT_I2C_BUS`: I2C bus number (default: 1)
    /// - `EGT_ADDRESS`: device address, decimal or `0x` hex (default: 0x68)
    /// - `EGT_CHANNELS`: comma separated channel numbers (default: `1,2`)
    /// - `EGT_RESOLUTION`: 12, 14, 16 or 18 bits (default: 18)
    /// - `EGT_GAIN`: 1, 2, 4 or 8 (default: 8)
    /// - `EGT_INTERVAL_MS`: pause between rounds (default: 1000)
    pub fn from_env() -> Result<Self, SettingsError> {
        let defaults = Self::default();

        let bus = number("EGT_I2C_BUS")?.unwrap_or(defaults.bus);

        let address = number("EGT_ADDRESS")?.unwrap_or(defaults.address);
        if !ADDRESS_RANGE.contains(&address) {
            return Err(SettingsError::Address(address));
        }

        let resolution = match number::<u8>("EGT_RESOLUTION")? {
            Some(bits) => Resolution::try_from(bits).map_err(config_error("EGT_RESOLUTION"))?,
            None => Resolution::Bits18,
        };

        let gain = match number::<u8>("EGT_GAIN")? {
            Some(factor) => Gain::try_from(factor).map_err(config_error("EGT_GAIN"))?,
            None => Gain::X8,
        };

        let channels = match var("EGT_CHANNELS")? {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| {
                    let number: u8 = parse("EGT_CHANNELS", item)?;
                    let channel = Channel::try_from(number).map_err(config_error("EGT_CHANNELS"))?;
                    Ok(channel)
                })
                .collect::<Result<Vec<_>, SettingsError>>()?,
            None => defaults.channels.iter().map(|config| config.channel).collect(),
        };

        if channels.is_empty() {
            return Err(SettingsError::NoChannels);
        }

        let channels = channels
            .into_iter()
            .map(|channel| ChannelConfig {
                channel,
                resolution,
                gain,
            })
            .collect();

        let interval = number::<u64>("EGT_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.interval);

        Ok(Self {
            bus,
            address,
            channels,
            interval,
        })
    }
}

fn config_error(var: &'static str) -> impl Fn(ConfigError) -> SettingsError {
    move |source| SettingsError::Config { var, source }
}

/// Read `name` if it is set.
fn var(name: &'static str) -> Result<Option<String>, SettingsError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(SettingsError::NotUnicode { var: name }),
    }
}

/// Read `name` as a number if it is set.
fn number<T: FromHex>(name: &'static str) -> Result<Option<T>, SettingsError> {
    var(name)?
        .map(|value| parse(name, value.trim()))
        .transpose()
}

fn parse<T: FromHex>(var: &'static str, value: &str) -> Result<T, SettingsError> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => T::from_hex(hex),
        None => value.parse().ok(),
    };

    parsed.ok_or_else(|| SettingsError::NotANumber {
        var,
        value: value.to_owned(),
    })
}

/// Integers that may be written in hex.
trait FromHex: std::str::FromStr {
    fn from_hex(digits: &str) -> Option<Self>;
}

impl FromHex for u8 {
    fn from_hex(digits: &str) -> Option<Self> {
        u8::from_str_radix(digits, 16).ok()
    }
}

impl FromHex for u64 {
    fn from_hex(digits: &str) -> Option<Self> {
        u64::from_str_radix(digits, 16).ok()
    }
}
