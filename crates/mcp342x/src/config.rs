//! Channel, resolution and gain settings and the configuration byte they encode to.
//!
//! The MCP342x configuration register is a single byte:
//!
//! | Bit   | 7     | 6..5    | 4    | 3..2        | 1..0 |
//! | :--   | :--:  | :--:    | :--: | :--:        | :--: |
//! | Write | start | channel | mode | sample rate | gain |
//! | Read  | /RDY  | channel | mode | sample rate | gain |

use core::fmt;

const START_BIT: u8 = 0b1000_0000;
const CHANNEL_MASK: u8 = 0b0110_0000;
const MODE_BIT: u8 = 0b0001_0000;
const RATE_MASK: u8 = 0b0000_1100;
const GAIN_MASK: u8 = 0b0000_0011;

/// Rejected channel, resolution or gain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Channel number outside `1..=4`.
    Channel(u8),
    /// Resolution other than 12, 14, 16 or 18 bits.
    Resolution(u8),
    /// Gain other than 1, 2, 4 or 8.
    Gain(u8),
    /// Gain code outside `0..=3`.
    GainCode(u8),
    /// Sample rate code outside `0..=3`.
    ResolutionCode(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(ch) => write!(f, "channel {ch} is not in 1..=4"),
            Self::Resolution(bits) => write!(f, "{bits}-bit resolution is not supported"),
            Self::Gain(gain) => write!(f, "gain x{gain} is not supported"),
            Self::GainCode(code) => write!(f, "gain code {code} is not in 0..=3"),
            Self::ResolutionCode(code) => write!(f, "sample rate code {code} is not in 0..=3"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Input channel list for MCP3424
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
    CH1 = 0,
    CH2 = 1,
    CH3 = 2,
    CH4 = 3,
}

impl Channel {
    /// Iterate over all channels.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::CH1, Self::CH2, Self::CH3, Self::CH4].into_iter()
    }

    /// One based channel number, as printed on the datasheet.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::CH1,
            1 => Self::CH2,
            2 => Self::CH3,
            _ => Self::CH4,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = ConfigError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1..=4 => Ok(Self::from_bits(number - 1)),
            _ => Err(ConfigError::Channel(number)),
        }
    }
}

/// Conversion resolution. The discriminant is the sample rate code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Resolution {
    /// 240 samples per second
    Bits12 = 0,
    /// 60 samples per second
    Bits14 = 1,
    /// 15 samples per second
    Bits16 = 2,
    /// 3.75 samples per second
    Bits18 = 3,
}

impl Resolution {
    /// Look up a resolution from its 2-bit sample rate code.
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(Self::Bits12),
            1 => Ok(Self::Bits14),
            2 => Ok(Self::Bits16),
            3 => Ok(Self::Bits18),
            _ => Err(ConfigError::ResolutionCode(code)),
        }
    }

    /// 2-bit sample rate code written into the configuration byte.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Number of bits in a conversion result, sign included.
    pub fn bits(self) -> u8 {
        match self {
            Self::Bits12 => 12,
            Self::Bits14 => 14,
            Self::Bits16 => 16,
            Self::Bits18 => 18,
        }
    }

    /// Number of data bytes the device returns ahead of the configuration echo.
    pub fn data_bytes(self) -> usize {
        if let Self::Bits18 = self {
            3
        } else {
            2
        }
    }

    /// Conversions per second, in millihertz.
    pub fn sample_rate_millihertz(self) -> u32 {
        match self {
            Self::Bits12 => 240_000,
            Self::Bits14 => 60_000,
            Self::Bits16 => 15_000,
            Self::Bits18 => 3_750,
        }
    }

    /// Time to wait between starting a one-shot conversion and reading it back.
    pub fn conversion_delay_ms(self) -> u32 {
        crate::timing::conversion_delay_ms(self.bits())
    }
}

impl TryFrom<u8> for Resolution {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            12 => Ok(Self::Bits12),
            14 => Ok(Self::Bits14),
            16 => Ok(Self::Bits16),
            18 => Ok(Self::Bits18),
            _ => Err(ConfigError::Resolution(bits)),
        }
    }
}

/// Programmable gain amplifier setting. The discriminant is the gain code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Gain {
    X1 = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
}

impl Gain {
    /// Look up a gain from its 2-bit code.
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(Self::X1),
            1 => Ok(Self::X2),
            2 => Ok(Self::X4),
            3 => Ok(Self::X8),
            _ => Err(ConfigError::GainCode(code)),
        }
    }

    /// 2-bit gain code written into the configuration byte.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Multiplication factor applied before conversion.
    pub fn factor(self) -> u8 {
        1 << self.code()
    }
}

impl TryFrom<u8> for Gain {
    type Error = ConfigError;

    fn try_from(factor: u8) -> Result<Self, Self::Error> {
        match factor {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            8 => Ok(Self::X8),
            _ => Err(ConfigError::Gain(factor)),
        }
    }
}

/// Map a 2-bit gain code to its multiplication factor.
pub fn gain_code_to_factor(code: u8) -> Result<u8, ConfigError> {
    Gain::from_code(code).map(Gain::factor)
}

/// Map a 2-bit sample rate code to its resolution in bits.
pub fn resolution_code_to_bits(code: u8) -> Result<u8, ConfigError> {
    Resolution::from_code(code).map(Resolution::bits)
}

/// Everything needed to request a single conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel: Channel,
    pub resolution: Resolution,
    pub gain: Gain,
}

impl ChannelConfig {
    /// Validate a plain channel number, resolution in bits and gain factor.
    ///
    /// Older firmware quietly fell back to 12-bit, x1 for values it did not
    /// recognise. Those values are now refused instead.
    pub fn new(channel: u8, resolution: u8, gain: u8) -> Result<Self, ConfigError> {
        Ok(Self {
            channel: Channel::try_from(channel)?,
            resolution: Resolution::try_from(resolution)?,
            gain: Gain::try_from(gain)?,
        })
    }

    /// Configuration byte that starts a one-shot conversion with these settings.
    pub fn one_shot(&self) -> ConfigByte {
        ConfigByte {
            start: true,
            channel: self.channel,
            continuous: false,
            resolution: self.resolution,
            gain: self.gain,
        }
    }
}

/// Field view of the configuration register.
///
/// When written, `start` set begins a conversion. When read back from the
/// device the same bit is /RDY and is clear once the result is fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigByte {
    pub start: bool,
    pub channel: Channel,
    pub continuous: bool,
    pub resolution: Resolution,
    pub gain: Gain,
}

impl ConfigByte {
    /// Pack the fields into the register layout.
    pub fn encode(&self) -> u8 {
        let mut byte = self.gain.code();
        byte |= self.resolution.code() << 2;
        if self.continuous {
            byte |= MODE_BIT;
        }
        byte |= (self.channel as u8) << 5;
        if self.start {
            byte |= START_BIT;
        }
        byte
    }

    /// Unpack a register value, such as the echo that trails every read.
    pub fn decode(byte: u8) -> Self {
        let code = |mask: u8, shift: u8| (byte & mask) >> shift;

        Self {
            start: byte & START_BIT != 0,
            channel: Channel::from_bits(code(CHANNEL_MASK, 5)),
            continuous: byte & MODE_BIT != 0,
            // Both fields are two bits wide, so every code is in range.
            resolution: match code(RATE_MASK, 2) {
                0 => Resolution::Bits12,
                1 => Resolution::Bits14,
                2 => Resolution::Bits16,
                _ => Resolution::Bits18,
            },
            gain: match code(GAIN_MASK, 0) {
                0 => Gain::X1,
                1 => Gain::X2,
                2 => Gain::X4,
                _ => Gain::X8,
            },
        }
    }

    /// Whether an echoed register reports a fresh result (/RDY low).
    pub fn is_ready(&self) -> bool {
        !self.start
    }

    /// Whether this echo describes the conversion requested by `config`.
    pub fn matches(&self, config: &ChannelConfig) -> bool {
        self.channel == config.channel
            && self.resolution == config.resolution
            && self.gain == config.gain
    }
}

impl From<ConfigByte> for u8 {
    fn from(config: ConfigByte) -> Self {
        config.encode()
    }
}
