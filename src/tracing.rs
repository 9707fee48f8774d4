//! Provide tracing, tailored to this program.
//!
//! Binaries call [`init_stdout`] once at startup. The rest of the program
//! can `use crate::tracing::prelude::*` for the level macros. Events from the
//! driver crate go through the same subscriber.

use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

/// Log to stdout, filtering according to environment variable RUST_LOG,
/// overriding the default level (ERROR) to INFO.
pub fn init_stdout() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
