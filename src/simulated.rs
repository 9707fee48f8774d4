//! An I2C bus populated with simulated MCP3424s, for running without hardware.
//!
//! Each simulated device converts instantly and answers in the datasheet
//! format: two's complement data with the sign repeated into the unused upper
//! bits, followed by the configuration register with /RDY cleared on the
//! first read after a conversion.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use mcp342x::convert::lsb_volts;
use mcp342x::{Channel, ConfigByte};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SimulatedError {
    #[error("no device at address 0x{0:02x}")]
    NoDevice(u8),
}

impl embedded_hal::i2c::Error for SimulatedError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoDevice(_) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
        }
    }
}

/// Bus traffic seen by a [`SimulatedBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Write { address: u8, byte: u8 },
    Read { address: u8, len: usize },
}

/// A simulated MCP3424 with a fixed voltage on each input.
#[derive(Debug, Clone)]
pub struct SimulatedMcp3424 {
    address: u8,
    inputs: [f64; 4],
    config: u8,
    fresh: bool,
}

impl SimulatedMcp3424 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            inputs: [0.0; 4],
            // Power-on default: channel 1, continuous, 12 bit, x1
            config: 0b1001_0000,
            fresh: false,
        }
    }

    pub fn with_input(mut self, channel: Channel, volts: f64) -> Self {
        self.set_input(channel, volts);
        self
    }

    pub fn set_input(&mut self, channel: Channel, volts: f64) {
        self.inputs[channel as usize] = volts;
    }

    fn write(&mut self, byte: u8) {
        self.config = byte;
        self.fresh = byte & 0b1000_0000 != 0;
    }

    fn respond(&mut self, buffer: &mut [u8]) {
        let config = ConfigByte::decode(self.config);
        let resolution = config.resolution;

        let largest = (1i32 << (resolution.bits() - 1)) - 1;
        let volts = self.inputs[config.channel as usize] * f64::from(config.gain.factor());
        let code = (volts / lsb_volts(resolution))
            .round()
            .clamp(f64::from(-largest - 1), f64::from(largest)) as i32;

        let echo = ConfigByte {
            start: !self.fresh,
            ..config
        }
        .encode();
        self.fresh = false;

        let [_, upper, middle, lower] = code.to_be_bytes();
        let response = if resolution.data_bytes() == 3 {
            [upper, middle, lower, echo]
        } else {
            [middle, lower, echo, echo]
        };

        // Reads past the end keep repeating the configuration register.
        for (index, byte) in buffer.iter_mut().enumerate() {
            *byte = response.get(index).copied().unwrap_or(echo);
        }
    }
}

/// An I2C bus with simulated devices on it.
#[derive(Debug, Default)]
pub struct SimulatedBus {
    devices: Vec<SimulatedMcp3424>,
    transactions: Vec<Transaction>,
}

impl SimulatedBus {
    pub fn new(devices: Vec<SimulatedMcp3424>) -> Self {
        Self {
            devices,
            transactions: Vec::new(),
        }
    }

    /// Change the voltage on an input of the device at `address`, if there is one.
    pub fn set_input(&mut self, address: u8, channel: Channel, volts: f64) {
        if let Some(device) = self.devices.iter_mut().find(|device| device.address == address) {
            device.set_input(channel, volts);
        }
    }

    /// Every transaction addressed to a device on the bus, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

impl ErrorType for SimulatedBus {
    type Error = SimulatedError;
}

impl I2c for SimulatedBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let device = self
            .devices
            .iter_mut()
            .find(|device| device.address == address)
            .ok_or(SimulatedError::NoDevice(address))?;

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        self.transactions.push(Transaction::Write { address, byte });
                        device.write(byte);
                    }
                }
                Operation::Read(buffer) => {
                    self.transactions.push(Transaction::Read {
                        address,
                        len: buffer.len(),
                    });
                    device.respond(buffer);
                }
            }
        }

        Ok(())
    }
}
