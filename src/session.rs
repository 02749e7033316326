//! The provider-side contract the sensor feed depends on.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::capability::{DataSourceDescriptor, DataSourceType, DataType};
use crate::error::ProviderError;

/// Query for data sources of the given types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourcesRequest {
    /// Data types of interest
    pub data_types: Vec<DataType>,
    /// Restrict to raw or derived sources
    pub source_type: DataSourceType,
}

impl DataSourcesRequest {
    /// Raw sources of a single data type.
    pub fn raw(data_type: DataType) -> Self {
        Self {
            data_types: vec![data_type],
            source_type: DataSourceType::Raw,
        }
    }
}

/// Legacy discovery result: a status string plus the sources found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourcesResult {
    /// Provider status, e.g. `SUCCESS`
    pub status: String,
    /// Sources in provider order
    pub data_sources: Vec<DataSourceDescriptor>,
}

/// Parameters for a listener registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorRequest {
    /// Source to listen to
    pub data_source: DataSourceDescriptor,
    /// Data type to receive; always set
    pub data_type: DataType,
    /// How often the provider should deliver points
    pub sampling_interval: Duration,
}

/// A single field value inside a [`DataPoint`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Floating-point reading
    Float(f64),
    /// Integer reading
    Int(i64),
    /// Textual reading
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// One sample delivered to a registered listener.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Type of the sample
    pub data_type: DataType,
    /// Field name and value pairs, in the data type's field order
    pub values: Vec<(String, Value)>,
}

impl DataPoint {
    /// Creates a data point.
    pub fn new(data_type: DataType, values: Vec<(String, Value)>) -> Self {
        Self { data_type, values }
    }

    /// Looks up a field by name.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// Callback invoked for every data point a listener receives.
pub type DataPointCallback = Rc<dyn Fn(&DataPoint)>;

/// Provider-issued token for a registered listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerHandle {
    id: u64,
    data_source: DataSourceDescriptor,
}

impl ListenerHandle {
    /// Creates a handle. Only providers should call this.
    pub fn new(id: u64, data_source: DataSourceDescriptor) -> Self {
        Self { id, data_source }
    }

    /// Provider-assigned id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The source this listener is attached to.
    pub fn data_source(&self) -> &DataSourceDescriptor {
        &self.data_source
    }
}

/// Data-source discovery and listener management on the provider side.
pub trait DataSourceSession {
    /// Finds data sources matching `request`, in provider order.
    fn find_data_sources(
        &self,
        request: &DataSourcesRequest,
    ) -> Result<Vec<DataSourceDescriptor>, ProviderError>;

    /// Legacy discovery call reporting a status alongside the sources.
    fn find_data_sources_legacy(
        &self,
        request: &DataSourcesRequest,
    ) -> Result<DataSourcesResult, ProviderError> {
        Ok(DataSourcesResult {
            status: "SUCCESS".to_string(),
            data_sources: self.find_data_sources(request)?,
        })
    }

    /// Registers `callback` for points from `request.data_source`.
    fn register_listener(
        &self,
        request: &SensorRequest,
        callback: DataPointCallback,
    ) -> Result<ListenerHandle, ProviderError>;

    /// Removes a listener. `Ok(false)` means the provider refused.
    fn unregister_listener(&self, handle: &ListenerHandle) -> Result<bool, ProviderError>;
}
