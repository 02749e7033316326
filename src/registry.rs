use std::time::Duration;

use crate::capability::{DataSourceDescriptor, DataType};
use crate::error::ProviderError;
use crate::logging::Log;
use crate::session::{DataPointCallback, DataSourceSession, ListenerHandle, SensorRequest};

/// What a call to [`ListenerRegistry::register`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new listener is now active
    Registered(ListenerHandle),
    /// A listener was already active; nothing was sent to the provider
    AlreadyActive,
}

/// What a call to [`ListenerRegistry::unregister`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unregistration {
    /// The provider removed the listener and the handle was cleared
    Removed,
    /// No listener was active; nothing was sent to the provider
    NotRegistered,
    /// The provider refused or failed; the handle is still held
    Failed,
}

/// Owner of the single active streaming listener.
///
/// Holds zero or one [`ListenerHandle`]. The handle can be read but only
/// changes through [`register`](Self::register) and
/// [`unregister`](Self::unregister), and only after the provider confirms.
#[derive(Debug)]
pub struct ListenerRegistry {
    active: Option<ListenerHandle>,
    log: Log,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new(log: Log) -> Self {
        Self { active: None, log }
    }

    /// True while a listener is registered.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The active handle, if any.
    pub fn handle(&self) -> Option<&ListenerHandle> {
        self.active.as_ref()
    }

    /// Registers `callback` on `data_source`, unless a listener is active.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when registration fails. The registry
    /// stays empty in that case.
    pub fn register(
        &mut self,
        session: &dyn DataSourceSession,
        data_source: &DataSourceDescriptor,
        data_type: &DataType,
        sampling_interval: Duration,
        callback: DataPointCallback,
    ) -> Result<Registration, ProviderError> {
        if self.active.is_some() {
            return Ok(Registration::AlreadyActive);
        }

        let request = SensorRequest {
            data_source: data_source.clone(),
            data_type: data_type.clone(),
            sampling_interval,
        };

        match session.register_listener(&request, callback) {
            Ok(handle) => {
                self.log.info(format_args!("Listener registered."));
                self.active = Some(handle.clone());
                Ok(Registration::Registered(handle))
            }
            Err(e) => {
                self.log
                    .warn(format_args!("Listener not registered. {}", e));
                Err(e)
            }
        }
    }

    /// Removes the active listener, if any.
    ///
    /// The handle is only dropped when the provider reports success.
    pub fn unregister(&mut self, session: &dyn DataSourceSession) -> Unregistration {
        let Some(handle) = &self.active else {
            return Unregistration::NotRegistered;
        };

        match session.unregister_listener(handle) {
            Ok(true) => {
                self.log.info(format_args!("Listener was removed!"));
                self.active = None;
                Unregistration::Removed
            }
            Ok(false) => {
                self.log.info(format_args!("Listener was not removed."));
                Unregistration::Failed
            }
            Err(e) => {
                self.log
                    .error(format_args!("Listener was not removed: {}", e));
                Unregistration::Failed
            }
        }
    }
}
