//! Data types, data sources and the capability requirement built from them.

use std::fmt;

/// The semantic kind of measurement a data source emits.
///
/// Two `DataType` values describing the same measurement may not compare
/// equal structurally when they come from different provider builds; use
/// [`same_data_type`] when matching provider output against a desired type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    name: String,
    fields: Vec<String>,
}

impl DataType {
    /// Name of the location sample data type.
    pub const LOCATION_SAMPLE: &'static str = "com.google.location.sample";

    /// Creates a data type with the given name and field names.
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The location sample type: latitude, longitude, accuracy and altitude.
    pub fn location_sample() -> Self {
        Self::new(
            Self::LOCATION_SAMPLE,
            ["latitude", "longitude", "accuracy", "altitude"],
        )
    }

    /// Returns the provider-visible name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field names in provider order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Decides whether a provider-reported type is the type we asked for.
///
/// Matching is by name only. Provider-built type objects were observed to
/// compare unequal to the locally built constant even when they describe the
/// same stream; until that is understood, every match goes through here.
pub fn same_data_type(reported: &DataType, desired: &DataType) -> bool {
    reported.name() == desired.name()
}

/// How an app intends to use a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Read-only access
    Read,
    /// Write access
    Write,
}

/// What scopes an action needs from the account subsystem.
///
/// Built once through [`CapabilityRequirement::builder`]; duplicate entries are
/// dropped so two requirements built from the same declarations compare equal.
///
/// # Examples
///
/// ```
/// use fit_sensors::{AccessType, CapabilityRequirement, DataType};
///
/// let requirement = CapabilityRequirement::builder()
///     .add_data_type(DataType::location_sample(), AccessType::Read)
///     .add_data_type(DataType::location_sample(), AccessType::Read)
///     .build();
///
/// assert_eq!(requirement.entries().len(), 1);
/// assert_eq!(requirement, CapabilityRequirement::location_read());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityRequirement {
    entries: Vec<(DataType, AccessType)>,
}

impl CapabilityRequirement {
    /// Starts an empty requirement.
    pub fn builder() -> CapabilityRequirementBuilder {
        CapabilityRequirementBuilder {
            entries: Vec::new(),
        }
    }

    /// The requirement used by the sensor feed: read access to location samples.
    pub fn location_read() -> Self {
        Self::builder()
            .add_data_type(DataType::location_sample(), AccessType::Read)
            .build()
    }

    /// Returns the declared `(data type, access)` pairs.
    pub fn entries(&self) -> &[(DataType, AccessType)] {
        &self.entries
    }

    /// Returns the declared data types without access levels.
    pub fn data_types(&self) -> impl Iterator<Item = &DataType> {
        self.entries.iter().map(|(data_type, _)| data_type)
    }
}

/// Builder for [`CapabilityRequirement`].
#[derive(Debug)]
pub struct CapabilityRequirementBuilder {
    entries: Vec<(DataType, AccessType)>,
}

impl CapabilityRequirementBuilder {
    /// Declares a data type with the given access level.
    pub fn add_data_type(mut self, data_type: DataType, access: AccessType) -> Self {
        let entry = (data_type, access);
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
        self
    }

    /// Freezes the declarations.
    pub fn build(self) -> CapabilityRequirement {
        CapabilityRequirement {
            entries: self.entries,
        }
    }
}

/// Whether a data source is a raw sensor or a derived stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSourceType {
    /// Raw readings from a sensor
    Raw,
    /// Values computed from other sources
    Derived,
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceType::Raw => write!(f, "raw"),
            DataSourceType::Derived => write!(f, "derived"),
        }
    }
}

/// A provider-supplied description of one measurable stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceDescriptor {
    data_type: DataType,
    source_type: DataSourceType,
    stream_name: String,
    device: Option<String>,
    app_package: Option<String>,
}

impl DataSourceDescriptor {
    /// Creates a descriptor for a stream of the given type.
    pub fn new(
        data_type: DataType,
        source_type: DataSourceType,
        stream_name: impl Into<String>,
    ) -> Self {
        Self {
            data_type,
            source_type,
            stream_name: stream_name.into(),
            device: None,
            app_package: None,
        }
    }

    /// Sets the device the stream originates from.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Sets the application package publishing the stream.
    pub fn with_app_package(mut self, package: impl Into<String>) -> Self {
        self.app_package = Some(package.into());
        self
    }

    /// Returns the data type reported by the provider.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Returns whether the stream is raw or derived.
    pub fn source_type(&self) -> DataSourceType {
        self.source_type
    }

    /// Returns the stream name.
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Returns the originating device, if known.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Returns the publishing package, if known.
    pub fn app_package(&self) -> Option<&str> {
        self.app_package.as_deref()
    }
}

impl fmt::Display for DataSourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataSource{{{}:{}:{}",
            self.source_type, self.data_type, self.stream_name
        )?;
        if let Some(device) = &self.device {
            write!(f, ":{}", device)?;
        }
        if let Some(package) = &self.app_package {
            write!(f, ":{}", package)?;
        }
        write!(f, "}}")
    }
}
