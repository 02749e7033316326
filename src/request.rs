use std::fmt;

/// Identifies a privileged action that is waiting on authorization.
///
/// The discriminant is the correlation code handed to the platform and account
/// subsystems; it comes back unchanged on the resumption channel and is turned
/// back into a `RequestCode` with [`TryFrom<i32>`].
///
/// # Examples
///
/// ```
/// use fit_sensors::RequestCode;
///
/// assert_eq!(RequestCode::FindDataSources.as_i32(), 1);
/// assert_eq!(RequestCode::try_from(1), Ok(RequestCode::FindDataSources));
/// assert!(RequestCode::try_from(42).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum RequestCode {
    /// Discover location data sources and register a listener
    FindDataSources = 1,
}

impl RequestCode {
    /// Every known request code, in discriminant order.
    pub const ALL: &'static [RequestCode] = &[RequestCode::FindDataSources];

    /// Returns the integer carried across the external round-trip.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a stable, human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            RequestCode::FindDataSources => "find_data_sources",
        }
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.as_i32())
    }
}

/// Returned when an integer does not name any [`RequestCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRequestCode(pub i32);

impl fmt::Display for UnknownRequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown request code {}", self.0)
    }
}

impl std::error::Error for UnknownRequestCode {}

impl TryFrom<i32> for RequestCode {
    type Error = UnknownRequestCode;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        RequestCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_i32() == value)
            .ok_or(UnknownRequestCode(value))
    }
}

/// The signed-in principal used for account-level consent.
///
/// The core never stores one of these across calls; it asks the
/// [`AccountAuthority`](crate::AccountAuthority) for a fresh value each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalAccount {
    /// Stable identifier of the account
    pub id: String,
    /// Email address, when the account subsystem exposes one
    pub email: Option<String>,
}

impl PrincipalAccount {
    /// Creates an account with no email.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    /// Attaches an email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
