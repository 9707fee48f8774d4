use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::{ChannelConfig, Error, Reading};

/// MCP3424 driver
pub struct Mcp3424<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mcp3424<I2C> {
    /// Creates a new driver for the device at `address` on an I2C bus.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// 7-bit bus address of the device.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Run a one-shot conversion and return the gain compensated input voltage.
    /// `delay` is blocked on for the whole conversion time.
    pub fn read<D: DelayNs>(
        &mut self,
        delay: &mut D,
        config: ChannelConfig,
    ) -> Result<Reading, Error<I2C::Error>> {
        crate::read_channel(&mut self.i2c, delay, self.address, config)
    }

    /// Same as [`Mcp3424::read`], taking a channel number (1 to 4), resolution
    /// in bits and gain factor.
    /// Unsupported values are refused before anything is sent to the device.
    pub fn read_channel<D: DelayNs>(
        &mut self,
        delay: &mut D,
        channel: u8,
        resolution: u8,
        gain: u8,
    ) -> Result<Reading, Error<I2C::Error>> {
        let config = ChannelConfig::new(channel, resolution, gain)?;
        self.read(delay, config)
    }

    /// Write the configuration for a one-shot conversion without waiting for it.
    pub fn start_conversion(&mut self, config: &ChannelConfig) -> Result<(), Error<I2C::Error>> {
        crate::start_conversion(&mut self.i2c, self.address, config)
    }

    /// Read back a conversion previously started with [`Mcp3424::start_conversion`].
    pub fn fetch_reading(&mut self, config: &ChannelConfig) -> Result<Reading, Error<I2C::Error>> {
        crate::fetch_reading(&mut self.i2c, self.address, config)
    }

    /// Give back the I2C bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, ConfigError, Gain, Resolution};
    use embedded_hal::i2c::{Error as _, ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct MockError;

    impl embedded_hal::i2c::Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        }
    }

    #[derive(Debug, PartialEq)]
    enum Op {
        Write(u8, Vec<u8>),
        Read(u8, usize),
    }

    #[derive(Default)]
    struct MockI2c {
        response: [u8; 4],
        fail_write: bool,
        fail_read: bool,
        log: Vec<Op>,
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        self.log.push(Op::Write(address, bytes.to_vec()));
                        if self.fail_write {
                            return Err(MockError);
                        }
                    }
                    Operation::Read(buffer) => {
                        self.log.push(Op::Read(address, buffer.len()));
                        if self.fail_read {
                            return Err(MockError);
                        }
                        buffer.copy_from_slice(&self.response[..buffer.len()]);
                    }
                }
            }

            Ok(())
        }
    }

    #[derive(Default)]
    struct MockDelay {
        waits: Vec<u32>,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {
            panic!("Driver should wait in milliseconds");
        }

        fn delay_ms(&mut self, ms: u32) {
            self.waits.push(ms);
        }
    }

    #[test]
    fn reads_16_bit_channel() {
        let i2c = MockI2c {
            response: [0x12, 0x34, 0b1010_1000, 0b1010_1000],
            ..Default::default()
        };
        let mut delay = MockDelay::default();
        let mut mcp = Mcp3424::new(i2c, 0x68);

        let reading = mcp.read_channel(&mut delay, 2, 16, 1).unwrap();

        let expected = 4660.0 * (2.0 * 2.048 / 65536.0);
        assert!((reading.volts - expected).abs() < 1e-9);
        assert_eq!(reading.sample.counts, 4660);
        assert_eq!(reading.diagnostics(), [0x00, 0x12, 0x34, 0b1010_1000, 0x34, 16]);
        assert_eq!(delay.waits, [116]);

        let i2c = mcp.release();
        assert_eq!(
            i2c.log,
            [Op::Write(0x68, vec![0b1010_1000]), Op::Read(0x68, 4)]
        );
    }

    #[test]
    fn reads_18_bit_channel_with_gain() {
        let i2c = MockI2c {
            response: [0x00, 0x40, 0x00, 0b0110_1111],
            ..Default::default()
        };
        let mut delay = MockDelay::default();
        let mut mcp = Mcp3424::new(i2c, 0x6A);

        let config = ChannelConfig {
            channel: Channel::CH4,
            resolution: Resolution::Bits18,
            gain: Gain::X8,
        };
        let reading = mcp.read(&mut delay, config).unwrap();

        let expected = 16384.0 * (2.0 * 2.048 / 262144.0) / 8.0;
        assert!((reading.volts - expected).abs() < 1e-9);
        assert_eq!(delay.waits, [316]);

        let i2c = mcp.release();
        assert_eq!(i2c.log[0], Op::Write(0x6A, vec![0b1110_1111]));
    }

    #[test]
    fn negative_reading_uses_subtraction() {
        let i2c = MockI2c {
            response: [0xFF, 0xFE, 0x88, 0x88],
            ..Default::default()
        };
        let mut delay = MockDelay::default();
        let mut mcp = Mcp3424::new(i2c, 0x68);

        let reading = mcp.read_channel(&mut delay, 1, 16, 1).unwrap();

        assert_eq!(reading.sample.counts, 0xFFFE - ((1 << 15) - 1));
    }

    #[test]
    fn write_failure_skips_read() {
        let i2c = MockI2c {
            fail_write: true,
            ..Default::default()
        };
        let mut delay = MockDelay::default();
        let mut mcp = Mcp3424::new(i2c, 0x68);

        let result = mcp.read_channel(&mut delay, 1, 12, 1);

        assert_eq!(result, Err(Error::TransportWrite(MockError)));
        assert!(delay.waits.is_empty());

        let i2c = mcp.release();
        assert_eq!(i2c.log, [Op::Write(0x68, vec![0b1000_0000])]);
    }

    #[test]
    fn read_failure_is_reported() {
        let i2c = MockI2c {
            fail_read: true,
            ..Default::default()
        };
        let mut delay = MockDelay::default();
        let mut mcp = Mcp3424::new(i2c, 0x68);

        let result = mcp.read_channel(&mut delay, 3, 14, 4);

        assert_eq!(result, Err(Error::TransportRead(MockError)));
        assert_eq!(delay.waits, [66]);
        assert_eq!(
            MockError.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
    }

    #[test]
    fn bad_settings_never_reach_the_bus() {
        let mut delay = MockDelay::default();
        let mut mcp = Mcp3424::new(MockI2c::default(), 0x68);

        assert_eq!(
            mcp.read_channel(&mut delay, 1, 18, 16),
            Err(Error::Configuration(ConfigError::Gain(16)))
        );
        assert_eq!(
            mcp.read_channel(&mut delay, 1, 17, 1),
            Err(Error::Configuration(ConfigError::Resolution(17)))
        );
        assert_eq!(
            mcp.read_channel(&mut delay, 0, 18, 1),
            Err(Error::Configuration(ConfigError::Channel(0)))
        );

        assert!(mcp.release().log.is_empty());
        assert!(delay.waits.is_empty());
    }

    #[test]
    fn split_steps_match_blocking_read() {
        let i2c = MockI2c {
            response: [0x01, 0x00, 0b1000_0000, 0b1000_0000],
            ..Default::default()
        };
        let mut mcp = Mcp3424::new(i2c, 0x6C);
        let config = ChannelConfig::new(1, 12, 1).unwrap();

        mcp.start_conversion(&config).unwrap();
        let reading = mcp.fetch_reading(&config).unwrap();

        assert_eq!(reading.sample.counts, 0x100);
        assert!((reading.volts - 0.256).abs() < 1e-9);
        assert_eq!(mcp.address(), 0x6C);
    }

    #[test]
    fn stale_result_is_still_returned() {
        // /RDY still set: the conversion had not finished when read back.
        let i2c = MockI2c {
            response: [0x00, 0x20, 0b1000_0000, 0b1000_0000],
            ..Default::default()
        };
        let mut delay = MockDelay::default();
        let mut mcp = Mcp3424::new(i2c, 0x68);

        let reading = mcp.read_channel(&mut delay, 1, 12, 1).unwrap();

        assert!(!crate::ConfigByte::decode(reading.sample.echo()).is_ready());
        assert_eq!(reading.sample.counts, 0x20);
    }
}
