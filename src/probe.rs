//! Pure authorization predicates and the platform seams they read from.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::capability::CapabilityRequirement;
use crate::request::PrincipalAccount;
use crate::settings::SettingsLink;

/// An OS-level permission identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Precise location access.
    pub const ACCESS_FINE_LOCATION: Permission =
        Permission(Cow::Borrowed("android.permission.ACCESS_FINE_LOCATION"));

    /// Creates a permission from an arbitrary identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Permission(Cow::Owned(id.into()))
    }

    /// Returns the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a platform permission check or prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The permission is held
    Granted,
    /// The permission is not held
    Denied,
}

/// The host platform's permission registry and prompts.
///
/// `request_permissions` is fire-and-forget: the answer comes back later
/// through [`Resumption::Permission`](crate::Resumption::Permission) carrying
/// the same `correlation_code`.
pub trait Platform {
    /// Version of the running platform (Android API level).
    fn sdk_version(&self) -> u32;

    /// Looks the permission up in the platform registry.
    fn check_self_permission(&self, permission: &Permission) -> PermissionStatus;

    /// True when the user dismissed an earlier prompt without choosing
    /// "never ask again".
    fn should_show_rationale(&self, permission: &Permission) -> bool;

    /// Shows the platform prompt.
    fn request_permissions(&self, permissions: &[Permission], correlation_code: i32);

    /// Opens the application's settings page.
    fn open_settings(&self, link: &SettingsLink);
}

/// The account subsystem that owns account-level consent.
///
/// `request_permissions` is fire-and-forget: the answer comes back later
/// through [`Resumption::Consent`](crate::Resumption::Consent).
pub trait AccountAuthority {
    /// Resolves the account to use for `requirement`, signing in if needed.
    fn account_for(&self, requirement: &CapabilityRequirement) -> PrincipalAccount;

    /// True when `account` already holds every scope in `requirement`.
    fn has_permissions(&self, account: &PrincipalAccount, requirement: &CapabilityRequirement)
        -> bool;

    /// Starts the consent flow.
    fn request_permissions(
        &self,
        account: &PrincipalAccount,
        requirement: &CapabilityRequirement,
        correlation_code: i32,
    );
}

/// Side-effect-free checks of whether an action is currently authorized.
///
/// # Examples
///
/// ```
/// use fit_sensors::{CapabilityProbe, Permission, testing::FakePlatform, testing::FakeAuthority};
/// use std::rc::Rc;
///
/// let platform = Rc::new(FakePlatform::new(28));
/// let probe = CapabilityProbe::new(platform, Rc::new(FakeAuthority::new()), 29);
///
/// // Below the threshold location is granted at install time.
/// assert!(probe.has_os_permission(&Permission::ACCESS_FINE_LOCATION));
/// ```
#[derive(Clone)]
pub struct CapabilityProbe {
    platform: Rc<dyn Platform>,
    authority: Rc<dyn AccountAuthority>,
    threshold: u32,
}

impl CapabilityProbe {
    /// Creates a probe over the given collaborators.
    pub fn new(
        platform: Rc<dyn Platform>,
        authority: Rc<dyn AccountAuthority>,
        threshold: u32,
    ) -> Self {
        Self {
            platform,
            authority,
            threshold,
        }
    }

    /// Whether `permission` is held.
    ///
    /// Platform versions below the threshold grant it implicitly and the
    /// registry is not consulted.
    pub fn has_os_permission(&self, permission: &Permission) -> bool {
        if self.platform.sdk_version() < self.threshold {
            return true;
        }
        self.platform.check_self_permission(permission) == PermissionStatus::Granted
    }

    /// Whether `account` holds every scope in `requirement`.
    pub fn has_account_scope(
        &self,
        requirement: &CapabilityRequirement,
        account: &PrincipalAccount,
    ) -> bool {
        self.authority.has_permissions(account, requirement)
    }

    /// Resolves the account for `requirement`. Never cached.
    pub fn account(&self, requirement: &CapabilityRequirement) -> PrincipalAccount {
        self.authority.account_for(requirement)
    }

    /// The version threshold this probe was built with.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub(crate) fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub(crate) fn authority(&self) -> &dyn AccountAuthority {
        self.authority.as_ref()
    }
}

impl fmt::Debug for CapabilityProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityProbe")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
