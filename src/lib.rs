//! Exhaust gas temperature sampling from an MCP3424 thermocouple expander.
//!
//! The conversion itself lives in the `mcp342x` driver crate. This crate adds
//! what a multi-threaded host needs around it: a per-device lock and a
//! cancellable settling wait ([`sampler`]), settings from the environment
//! ([`settings`]), logging ([`tracing`]) and a simulated bus for running
//! without hardware ([`simulated`]).

pub mod sampler;
pub mod settings;
pub mod simulated;
pub mod tracing;
