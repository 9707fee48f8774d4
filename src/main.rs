use std::sync::Mutex;

use egt::sampler::{CancelToken, Sampler};
use egt::settings::SamplerSettings;
use egt::simulated::{SimulatedBus, SimulatedMcp3424};
use embedded_hal_bus::i2c::MutexDevice;
use mcp342x::mcp3424::Mcp3424;
use mcp342x::Channel;

/// Samples a simulated expander so the pipeline can be exercised on a desktop.
fn main() -> Result<(), anyhow::Error> {
    egt::tracing::init_stdout();

    let settings = SamplerSettings::from_env()?;

    // Type K thermocouples at roughly 300 and 100 degrees above the cold junction.
    let device = SimulatedMcp3424::new(settings.address)
        .with_input(Channel::CH1, 12.21e-3)
        .with_input(Channel::CH2, 4.096e-3)
        .with_input(Channel::CH3, 0.0)
        .with_input(Channel::CH4, 0.0);

    let bus = Mutex::new(SimulatedBus::new(vec![device]));

    let mcp = Mcp3424::new(MutexDevice::new(&bus), settings.address);

    let cancel = CancelToken::new();
    cancel.cancel_on_signal()?;
    cancel.cancel_on_enter();

    let sampler = Sampler::new(mcp, cancel);

    egt::sampler::run(&sampler, &settings)?;

    Ok(())
}
