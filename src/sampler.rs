//! Thread safe, cancellable sampling of one MCP3424.
//!
//! The driver itself does not guard the write, wait and read of a conversion
//! against other requests to the same device. A [`Sampler`] holds the device
//! lock for the whole sequence, and waits on a [`CancelToken`] instead of
//! sleeping so shutdown does not have to sit out an 18-bit conversion.

use std::fmt;
use std::io::BufRead;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use embedded_hal::i2c::I2c;
use mcp342x::mcp3424::Mcp3424;
use mcp342x::{ChannelConfig, Reading};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::settings::SamplerSettings;
use crate::tracing::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum SampleError<E: fmt::Debug> {
    #[error(transparent)]
    Device(#[from] mcp342x::Error<E>),

    #[error("sampling cancelled")]
    Cancelled,

    #[error("device lock poisoned by a panicked sampler")]
    Poisoned,
}

/// Shared flag that interrupts waits once set. Cancelling is permanent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every waiter.
    pub fn cancel(&self) {
        let (cancelled, waiters) = &*self.inner;
        *cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
        waiters.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (cancelled, _) = &*self.inner;
        *cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for `duration`. Returns `false` if cancelled first.
    pub fn wait(&self, duration: Duration) -> bool {
        let (cancelled, waiters) = &*self.inner;
        let guard = cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = waiters
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        !*guard
    }

    /// Cancel on SIGINT or SIGTERM.
    pub fn cancel_on_signal(&self) -> std::io::Result<()> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let token = self.clone();

        std::thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                let name = if signal == SIGTERM { "SIGTERM" } else { "SIGINT" };
                info!("Received {}.", name);
                token.cancel();
            }
        });

        Ok(())
    }

    /// Cancel when Enter is pressed on stdin.
    pub fn cancel_on_enter(&self) -> JoinHandle<()> {
        self.cancel_on_line(std::io::BufReader::new(std::io::stdin()))
    }

    /// Cancel once a line is read from `input`.
    ///
    /// End of input or a read error leaves the token alone, so a detached
    /// stdin (a service, `nohup`, `</dev/null`) does not stop sampling.
    pub fn cancel_on_line<R: BufRead + Send + 'static>(&self, mut input: R) -> JoinHandle<()> {
        let token = self.clone();

        std::thread::spawn(move || {
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => debug!("stdin closed, stop with SIGINT or SIGTERM"),
                Ok(_) => {
                    info!("Stopping");
                    token.cancel();
                }
                Err(e) => debug!("Not watching stdin: {}", e),
            }
        })
    }
}

/// One MCP3424 shared between threads.
pub struct Sampler<I2C> {
    device: Arc<Mutex<Mcp3424<I2C>>>,
    cancel: CancelToken,
}

impl<I2C> Clone for Sampler<I2C> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
            cancel: self.cancel.clone(),
        }
    }
}

impl<I2C: I2c> Sampler<I2C> {
    pub fn new(device: Mcp3424<I2C>, cancel: CancelToken) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run one conversion, holding the device for the whole write, wait and read.
    ///
    /// If the token is cancelled while waiting, the result is never read back.
    pub fn sample(&self, config: ChannelConfig) -> Result<Reading, SampleError<I2C::Error>> {
        if self.cancel.is_cancelled() {
            return Err(SampleError::Cancelled);
        }

        let mut device = self.device.lock().map_err(|_| SampleError::Poisoned)?;

        device.start_conversion(&config)?;

        let wait = Duration::from_millis(config.resolution.conversion_delay_ms().into());
        if !self.cancel.wait(wait) {
            debug!(
                "Cancelled conversion on {:#04x} channel {}",
                device.address(),
                config.channel.number()
            );
            return Err(SampleError::Cancelled);
        }

        Ok(device.fetch_reading(&config)?)
    }
}

/// Sample every configured channel in rounds until cancelled.
///
/// Bus errors are logged and sampling carries on with the next channel.
pub fn run<I2C: I2c>(
    sampler: &Sampler<I2C>,
    settings: &SamplerSettings,
) -> Result<(), SampleError<I2C::Error>> {
    info!(
        "Sampling {} channel(s) on {:#04x}, press Enter or Ctrl-C to stop",
        settings.channels.len(),
        settings.address
    );

    loop {
        for config in &settings.channels {
            match sampler.sample(*config) {
                Ok(reading) => info!(
                    "CH{}: {:.6} mV ({} counts)",
                    config.channel.number(),
                    reading.volts * 1000.0,
                    reading.sample.counts
                ),
                Err(SampleError::Cancelled) => return Ok(()),
                Err(SampleError::Device(e)) => {
                    warn!("CH{}: {}", config.channel.number(), e)
                }
                Err(e) => return Err(e),
            }
        }

        if !sampler.cancel_token().wait(settings.interval) {
            return Ok(());
        }
    }
}
