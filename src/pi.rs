use std::sync::Mutex;

use egt::sampler::{CancelToken, Sampler};
use egt::settings::SamplerSettings;
use embedded_hal_bus::i2c::MutexDevice;
use mcp342x::mcp3424::Mcp3424;
use rppal::i2c::I2c;

fn main() -> Result<(), anyhow::Error> {
    egt::tracing::init_stdout();

    let settings = SamplerSettings::from_env()?;

    let i2c = I2c::with_bus(settings.bus)?;

    // Other devices on the bus can share it through further `MutexDevice`s.
    let bus = Mutex::new(i2c);

    let mcp = Mcp3424::new(MutexDevice::new(&bus), settings.address);

    let cancel = CancelToken::new();
    cancel.cancel_on_signal()?;
    cancel.cancel_on_enter();

    let sampler = Sampler::new(mcp, cancel);

    egt::sampler::run(&sampler, &settings)?;

    Ok(())
}
