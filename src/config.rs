//! Runtime configuration for a [`SensorController`](crate::SensorController).

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::probe::Permission;

/// Which discovery call the sensor feed uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Provider failures are logged and the action completes normally.
    #[default]
    SuccessListener,
    /// Awaits discovery directly. Provider failures propagate out of the
    /// dispatched action instead of being logged; this path is known to fail
    /// against the real provider and is kept for diagnosis.
    DirectAwait,
    /// Uses the legacy result-with-status call and logs the status.
    LegacySensorsApi,
}

/// Settings shared by every component of a controller.
///
/// # Examples
///
/// ```
/// use fit_sensors::{Config, DiscoveryMode};
/// use std::time::Duration;
///
/// let config = Config::new("com.example.sensors")
///     .with_sampling_interval(Duration::from_secs(5))
///     .with_discovery(DiscoveryMode::LegacySensorsApi);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.runtime_permission_threshold, 29);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Application package identifier, used for the settings deep link
    pub package_name: String,
    /// OS permission that gates the sensor feed
    pub permission: Permission,
    /// First platform version that requires the run-time permission prompt
    pub runtime_permission_threshold: u32,
    /// Sampling interval requested when registering a listener
    pub sampling_interval: Duration,
    /// Discovery variant used by the sensor feed
    pub discovery: DiscoveryMode,
    /// Tag attached to every log record
    pub log_tag: String,
}

impl Config {
    /// Platform version (Android Q) from which location needs a run-time grant.
    pub const DEFAULT_PERMISSION_THRESHOLD: u32 = 29;
    /// Default listener sampling interval.
    pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_secs(10);
    /// Default log tag.
    pub const DEFAULT_LOG_TAG: &'static str = "BasicSensorsApi";

    /// Creates a configuration with defaults for everything but the package.
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            permission: Permission::ACCESS_FINE_LOCATION,
            runtime_permission_threshold: Self::DEFAULT_PERMISSION_THRESHOLD,
            sampling_interval: Self::DEFAULT_SAMPLING_INTERVAL,
            discovery: DiscoveryMode::default(),
            log_tag: Self::DEFAULT_LOG_TAG.to_string(),
        }
    }

    /// Sets the gating permission.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    /// Sets the platform version threshold.
    pub fn with_permission_threshold(mut self, threshold: u32) -> Self {
        self.runtime_permission_threshold = threshold;
        self
    }

    /// Sets the listener sampling interval.
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Sets the discovery variant.
    pub fn with_discovery(mut self, discovery: DiscoveryMode) -> Self {
        self.discovery = discovery;
        self
    }

    /// Sets the log tag.
    pub fn with_log_tag(mut self, tag: impl Into<String>) -> Self {
        self.log_tag = tag.into();
        self
    }

    /// Parses a TOML document and validates the result.
    ///
    /// Only `package_name` is required; every other key falls back to the
    /// defaults of [`Config::new`].
    ///
    /// ```
    /// use fit_sensors::{Config, DiscoveryMode};
    ///
    /// let config = Config::from_toml_str(r#"
    ///     package_name = "com.example.sensors"
    ///     sampling_interval_secs = 30
    ///     discovery = "direct_await"
    /// "#).unwrap();
    ///
    /// assert_eq!(config.sampling_interval.as_secs(), 30);
    /// assert_eq!(config.discovery, DiscoveryMode::DirectAwait);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        let mut config = Config::new(file.package_name);
        if let Some(permission) = file.permission {
            config.permission = Permission::new(permission);
        }
        if let Some(threshold) = file.runtime_permission_threshold {
            config.runtime_permission_threshold = threshold;
        }
        if let Some(secs) = file.sampling_interval_secs {
            config.sampling_interval = Duration::from_secs(secs);
        }
        if let Some(discovery) = file.discovery {
            config.discovery = discovery;
        }
        if let Some(tag) = file.log_tag {
            config.log_tag = tag;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks values the core cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty package name, an empty
    /// permission id, or a zero sampling interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.package_name.trim().is_empty() {
            return Err(ConfigError::invalid("package_name", "must not be empty"));
        }
        if self.permission.as_str().trim().is_empty() {
            return Err(ConfigError::invalid("permission", "must not be empty"));
        }
        if self.sampling_interval.is_zero() {
            return Err(ConfigError::invalid(
                "sampling_interval",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    package_name: String,
    permission: Option<String>,
    runtime_permission_threshold: Option<u32>,
    sampling_interval_secs: Option<u64>,
    discovery: Option<DiscoveryMode>,
    log_tag: Option<String>,
}
