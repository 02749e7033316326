//! The location feed: find data sources and attach one listener.

use std::rc::Rc;
use std::time::Duration;

use crate::capability::{same_data_type, DataSourceDescriptor, DataType};
use crate::config::{Config, DiscoveryMode};
use crate::error::Error;
use crate::logging::Log;
use crate::registry::{ListenerRegistry, Registration, Unregistration};
use crate::session::{DataPoint, DataPointCallback, DataSourceSession, DataSourcesRequest};

/// Discovers location data sources and keeps at most one listener on them.
///
/// This is the action bound to
/// [`RequestCode::FindDataSources`](crate::RequestCode::FindDataSources).
pub struct SensorFeed {
    session: Rc<dyn DataSourceSession>,
    registry: ListenerRegistry,
    desired: DataType,
    sampling_interval: Duration,
    discovery: DiscoveryMode,
    callback: DataPointCallback,
    log: Log,
}

impl SensorFeed {
    /// Creates a feed for location samples. The default listener logs each
    /// field of every data point.
    pub fn new(session: Rc<dyn DataSourceSession>, config: &Config, log: Log) -> Self {
        Self {
            session,
            registry: ListenerRegistry::new(log.clone()),
            desired: DataType::location_sample(),
            sampling_interval: config.sampling_interval,
            discovery: config.discovery,
            callback: logging_listener(log.clone()),
            log,
        }
    }

    /// Replaces the listener callback used for future registrations.
    pub fn with_listener(mut self, callback: impl Fn(&DataPoint) + 'static) -> Self {
        self.callback = Rc::new(callback);
        self
    }

    /// Replaces the desired data type.
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.desired = data_type;
        self
    }

    /// The single-listener registry.
    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// Runs discovery with the configured [`DiscoveryMode`] and registers
    /// the first matching source.
    ///
    /// # Errors
    ///
    /// Only [`DiscoveryMode::DirectAwait`] returns an error: its discovery
    /// failures are not handled here. The other modes log and return `Ok`.
    pub fn find_data_sources(&mut self) -> Result<(), Error> {
        let request = DataSourcesRequest::raw(self.desired.clone());

        match self.discovery {
            DiscoveryMode::SuccessListener => match self.session.find_data_sources(&request) {
                Ok(batch) => self.register_first_match(&batch),
                Err(e) => self
                    .log
                    .error(format_args!("Failed to find data sources: {}", e)),
            },
            DiscoveryMode::DirectAwait => {
                let batch = self.session.find_data_sources(&request)?;
                self.register_first_match(&batch);
            }
            DiscoveryMode::LegacySensorsApi => {
                match self.session.find_data_sources_legacy(&request) {
                    Ok(result) => {
                        self.log.info(format_args!("Result: {}", result.status));
                        self.register_first_match(&result.data_sources);
                    }
                    Err(e) => self
                        .log
                        .error(format_args!("Failed to find data sources: {}", e)),
                }
            }
        }
        Ok(())
    }

    /// Walks `batch` in order and registers the first source of the desired
    /// type while no listener is active. Later matches are skipped, even when
    /// that registration fails.
    pub fn register_first_match(&mut self, batch: &[DataSourceDescriptor]) {
        for source in batch {
            self.log.info(format_args!("Data source found: {}", source));
            self.log
                .info(format_args!("Data Source type: {}", source.data_type().name()));

            if !same_data_type(source.data_type(), &self.desired) || self.registry.is_active() {
                continue;
            }

            self.log.info(format_args!(
                "Data source for {} found! Registering.",
                self.desired.name()
            ));
            let outcome = self.registry.register(
                self.session.as_ref(),
                source,
                &self.desired,
                self.sampling_interval,
                self.callback.clone(),
            );
            match outcome {
                Ok(Registration::Registered(handle)) => self
                    .log
                    .debug(format_args!("Listening with handle {}", handle.id())),
                Ok(Registration::AlreadyActive) => {}
                // Already logged by the registry. No retry within this batch.
                Err(_) => {}
            }
            break;
        }
    }

    /// Removes the active listener, if any.
    pub fn unregister_listener(&mut self) -> Unregistration {
        self.registry.unregister(self.session.as_ref())
    }
}

fn logging_listener(log: Log) -> DataPointCallback {
    Rc::new(move |point: &DataPoint| {
        for (field, value) in &point.values {
            log.info(format_args!("Detected DataPoint field: {}", field));
            log.info(format_args!("Detected DataPoint value: {}", value));
        }
    })
}
