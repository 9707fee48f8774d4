use core::fmt;

use crate::ConfigError;

/// Driver error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The configuration byte was not accepted; no read was attempted
    TransportWrite(E),
    /// The conversion result could not be read back
    TransportRead(E),
    /// The requested channel, resolution or gain is not supported
    Configuration(ConfigError),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportWrite(e) => write!(f, "writing configuration failed: {e:?}"),
            Self::TransportRead(e) => write!(f, "reading conversion failed: {e:?}"),
            Self::Configuration(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }
}
