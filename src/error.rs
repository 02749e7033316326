use std::fmt;

/// Errors that can escape the sensor core.
///
/// Authorization outcomes (denied, cancelled, ignored) are never errors; they
/// are reported through [`Progress`](crate::Progress). Only provider failures on
/// the unguarded discovery path and configuration problems surface here.
#[derive(Debug)]
pub enum Error {
    /// The data-source provider reported a failure
    Provider(ProviderError),
    /// Configuration could not be loaded or is invalid
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Provider(e) => write!(f, "Provider failure: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Provider(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        Error::Provider(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// A failure reported by a [`DataSourceSession`](crate::DataSourceSession).
///
/// # Examples
///
/// ```
/// use fit_sensors::{ProviderError, ProviderErrorKind};
///
/// let error = ProviderError::with_message(ProviderErrorKind::Discovery, "api not connected");
/// assert_eq!(error.kind(), ProviderErrorKind::Discovery);
/// assert_eq!(error.to_string(), "discovery failed: api not connected");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: Option<String>,
}

impl ProviderError {
    /// Creates a new provider error with the specified kind.
    pub fn new(kind: ProviderErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new provider error with a custom message.
    pub fn with_message(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind, msg),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Which provider operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Data-source discovery failed
    Discovery,
    /// Listener registration failed
    Registration,
    /// Listener removal failed
    Unregistration,
    /// The provider is not reachable at all
    Unavailable,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery failed"),
            Self::Registration => write!(f, "registration failed"),
            Self::Unregistration => write!(f, "unregistration failed"),
            Self::Unavailable => write!(f, "provider unavailable"),
        }
    }
}

/// Errors produced while loading or validating a [`Config`](crate::Config).
#[derive(Debug)]
pub enum ConfigError {
    /// The TOML document could not be parsed
    Parse(toml::de::Error),
    /// A field holds a value the core cannot work with
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid TOML: {}", e),
            ConfigError::Invalid { field, reason } => write!(f, "'{}' {}", field, reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}
