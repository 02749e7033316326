//! In-memory collaborators for exercising the core without a device.
//!
//! Every fake records what it was asked to do and uses interior mutability,
//! so a test can keep an `Rc` clone and inspect or reconfigure it while the
//! controller holds another.
//!
//! ```
//! use fit_sensors::testing::FakePlatform;
//! use fit_sensors::{Permission, Platform, PermissionStatus};
//!
//! let platform = FakePlatform::new(30);
//! assert_eq!(
//!     platform.check_self_permission(&Permission::ACCESS_FINE_LOCATION),
//!     PermissionStatus::Denied
//! );
//! platform.grant(&Permission::ACCESS_FINE_LOCATION);
//! assert_eq!(
//!     platform.check_self_permission(&Permission::ACCESS_FINE_LOCATION),
//!     PermissionStatus::Granted
//! );
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::capability::{CapabilityRequirement, DataSourceDescriptor};
use crate::error::ProviderError;
use crate::notice::{Notice, NoticeSurface};
use crate::probe::{AccountAuthority, Permission, PermissionStatus, Platform};
use crate::request::PrincipalAccount;
use crate::session::{
    DataPoint, DataPointCallback, DataSourceSession, DataSourcesRequest, ListenerHandle,
    SensorRequest,
};
use crate::settings::SettingsLink;

/// Platform with a settable version, registry and rationale flag.
#[derive(Debug, Default)]
pub struct FakePlatform {
    sdk_version: Cell<u32>,
    granted: RefCell<HashSet<Permission>>,
    rationale: Cell<bool>,
    checks: Cell<usize>,
    requests: RefCell<Vec<(Vec<Permission>, i32)>>,
    settings: RefCell<Vec<SettingsLink>>,
}

impl FakePlatform {
    /// A platform at `sdk_version` with nothing granted.
    pub fn new(sdk_version: u32) -> Self {
        Self {
            sdk_version: Cell::new(sdk_version),
            ..Self::default()
        }
    }

    /// Changes the reported platform version.
    pub fn set_sdk_version(&self, sdk_version: u32) {
        self.sdk_version.set(sdk_version);
    }

    /// Marks `permission` as granted in the registry.
    pub fn grant(&self, permission: &Permission) {
        self.granted.borrow_mut().insert(permission.clone());
    }

    /// Removes `permission` from the registry.
    pub fn revoke(&self, permission: &Permission) {
        self.granted.borrow_mut().remove(permission);
    }

    /// Sets what `should_show_rationale` answers.
    pub fn set_rationale(&self, show: bool) {
        self.rationale.set(show);
    }

    /// How many times the registry was read.
    pub fn permission_checks(&self) -> usize {
        self.checks.get()
    }

    /// Every prompt issued, with its correlation code.
    pub fn permission_requests(&self) -> Vec<(Vec<Permission>, i32)> {
        self.requests.borrow().clone()
    }

    /// Every settings link opened.
    pub fn opened_settings(&self) -> Vec<SettingsLink> {
        self.settings.borrow().clone()
    }
}

impl Platform for FakePlatform {
    fn sdk_version(&self) -> u32 {
        self.sdk_version.get()
    }

    fn check_self_permission(&self, permission: &Permission) -> PermissionStatus {
        self.checks.set(self.checks.get() + 1);
        if self.granted.borrow().contains(permission) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    fn should_show_rationale(&self, _permission: &Permission) -> bool {
        self.rationale.get()
    }

    fn request_permissions(&self, permissions: &[Permission], correlation_code: i32) {
        self.requests
            .borrow_mut()
            .push((permissions.to_vec(), correlation_code));
    }

    fn open_settings(&self, link: &SettingsLink) {
        self.settings.borrow_mut().push(link.clone());
    }
}

/// Account subsystem with a single account and a consent switch.
#[derive(Debug)]
pub struct FakeAuthority {
    account: PrincipalAccount,
    approved: Cell<bool>,
    lookups: Cell<usize>,
    requests: RefCell<Vec<(PrincipalAccount, i32)>>,
}

impl FakeAuthority {
    /// An authority whose account has not consented yet.
    pub fn new() -> Self {
        Self {
            account: PrincipalAccount::new("account-1").with_email("runner@example.com"),
            approved: Cell::new(false),
            lookups: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Grants every requirement from now on.
    pub fn approve(&self) {
        self.approved.set(true);
    }

    /// Withdraws consent.
    pub fn revoke(&self) {
        self.approved.set(false);
    }

    /// How many times the account was resolved.
    pub fn account_lookups(&self) -> usize {
        self.lookups.get()
    }

    /// Every consent flow started, with its correlation code.
    pub fn consent_requests(&self) -> Vec<(PrincipalAccount, i32)> {
        self.requests.borrow().clone()
    }
}

impl Default for FakeAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountAuthority for FakeAuthority {
    fn account_for(&self, _requirement: &CapabilityRequirement) -> PrincipalAccount {
        self.lookups.set(self.lookups.get() + 1);
        self.account.clone()
    }

    fn has_permissions(
        &self,
        _account: &PrincipalAccount,
        _requirement: &CapabilityRequirement,
    ) -> bool {
        self.approved.get()
    }

    fn request_permissions(
        &self,
        account: &PrincipalAccount,
        _requirement: &CapabilityRequirement,
        correlation_code: i32,
    ) {
        self.requests
            .borrow_mut()
            .push((account.clone(), correlation_code));
    }
}

/// Notice surface that keeps every notice shown.
#[derive(Debug, Default)]
pub struct RecordingNotices {
    shown: RefCell<Vec<Notice>>,
}

impl RecordingNotices {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notice shown, oldest first.
    pub fn shown(&self) -> Vec<Notice> {
        self.shown.borrow().clone()
    }

    /// The most recent notice.
    pub fn last(&self) -> Option<Notice> {
        self.shown.borrow().last().cloned()
    }
}

impl NoticeSurface for RecordingNotices {
    fn show(&self, notice: Notice) {
        self.shown.borrow_mut().push(notice);
    }
}

/// Provider returning a fixed batch and tracking listeners.
#[derive(Default)]
pub struct FakeSession {
    batch: RefCell<Vec<DataSourceDescriptor>>,
    discovery_error: RefCell<Option<ProviderError>>,
    registration_error: RefCell<Option<ProviderError>>,
    fail_registration_once: Cell<bool>,
    refuse_unregister: Cell<bool>,
    unregister_error: RefCell<Option<ProviderError>>,
    registrations: RefCell<Vec<SensorRequest>>,
    listeners: RefCell<Vec<(ListenerHandle, DataPointCallback)>>,
    next_id: Cell<u64>,
    discovery_calls: Cell<usize>,
    unregister_calls: Cell<usize>,
}

impl FakeSession {
    /// A provider with no data sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch every discovery call returns.
    pub fn with_batch(self, batch: Vec<DataSourceDescriptor>) -> Self {
        self.set_batch(batch);
        self
    }

    /// Makes every discovery call fail with `error`.
    pub fn failing_discovery(self, error: ProviderError) -> Self {
        *self.discovery_error.borrow_mut() = Some(error);
        self
    }

    /// Makes every registration fail with `error`.
    pub fn failing_registration(self, error: ProviderError) -> Self {
        *self.registration_error.borrow_mut() = Some(error);
        self
    }

    /// Makes only the next registration fail with `error`.
    pub fn failing_registration_once(self, error: ProviderError) -> Self {
        self.fail_registration_once.set(true);
        self.failing_registration(error)
    }

    /// Makes the provider answer `false` to every unregister call.
    pub fn refusing_unregister(self) -> Self {
        self.refuse_unregister.set(true);
        self
    }

    /// Makes every unregister call fail with `error`.
    pub fn failing_unregister(self, error: ProviderError) -> Self {
        *self.unregister_error.borrow_mut() = Some(error);
        self
    }

    /// Replaces the batch.
    pub fn set_batch(&self, batch: Vec<DataSourceDescriptor>) {
        *self.batch.borrow_mut() = batch;
    }

    /// Every registration attempt that reached the provider.
    pub fn registrations(&self) -> Vec<SensorRequest> {
        self.registrations.borrow().clone()
    }

    /// Number of listeners the provider currently holds.
    pub fn active_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// How many discovery calls were made.
    pub fn discovery_calls(&self) -> usize {
        self.discovery_calls.get()
    }

    /// How many unregister calls were made.
    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.get()
    }

    /// Delivers `point` to every registered listener.
    pub fn deliver(&self, point: &DataPoint) {
        let callbacks: Vec<DataPointCallback> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(point);
        }
    }
}

impl DataSourceSession for FakeSession {
    fn find_data_sources(
        &self,
        _request: &DataSourcesRequest,
    ) -> Result<Vec<DataSourceDescriptor>, ProviderError> {
        self.discovery_calls.set(self.discovery_calls.get() + 1);
        if let Some(error) = self.discovery_error.borrow().clone() {
            return Err(error);
        }
        Ok(self.batch.borrow().clone())
    }

    fn register_listener(
        &self,
        request: &SensorRequest,
        callback: DataPointCallback,
    ) -> Result<ListenerHandle, ProviderError> {
        self.registrations.borrow_mut().push(request.clone());

        let error = if self.fail_registration_once.replace(false) {
            self.registration_error.borrow_mut().take()
        } else {
            self.registration_error.borrow().clone()
        };
        if let Some(error) = error {
            return Err(error);
        }

        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = ListenerHandle::new(id, request.data_source.clone());
        self.listeners
            .borrow_mut()
            .push((handle.clone(), callback));
        Ok(handle)
    }

    fn unregister_listener(&self, handle: &ListenerHandle) -> Result<bool, ProviderError> {
        self.unregister_calls.set(self.unregister_calls.get() + 1);
        if let Some(error) = self.unregister_error.borrow().clone() {
            return Err(error);
        }
        if self.refuse_unregister.get() {
            return Ok(false);
        }
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(held, _)| held.id() != handle.id());
        Ok(listeners.len() < before)
    }
}
