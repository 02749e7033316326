//! Messages delivered back to the core when an external flow completes.

use std::fmt;

use crate::probe::PermissionStatus;

/// Result code of the account consent flow, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// The flow completed and consent was given
    Ok,
    /// The flow was closed without a decision
    Canceled,
    /// Any other host-specific failure code
    Other(i32),
}

impl ResultStatus {
    /// Host value for a successful result.
    pub const RESULT_OK: i32 = -1;
    /// Host value for a cancelled result.
    pub const RESULT_CANCELED: i32 = 0;

    /// Decodes a raw host result code.
    pub fn from_code(code: i32) -> Self {
        match code {
            Self::RESULT_OK => ResultStatus::Ok,
            Self::RESULT_CANCELED => ResultStatus::Canceled,
            other => ResultStatus::Other(other),
        }
    }

    /// Returns the raw host result code.
    pub fn code(self) -> i32 {
        match self {
            ResultStatus::Ok => Self::RESULT_OK,
            ResultStatus::Canceled => Self::RESULT_CANCELED,
            ResultStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A callback from either external authorization flow.
///
/// The correlation code is the raw integer the host hands back; it is
/// matched against [`RequestCode`](crate::RequestCode) on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumption {
    /// Result of the platform permission prompt. An empty `grants` list
    /// means the interaction was interrupted.
    Permission {
        /// Correlation code passed to `request_permissions`
        code: i32,
        /// One entry per requested permission, in request order
        grants: Vec<PermissionStatus>,
    },
    /// Result of the account consent flow.
    Consent {
        /// Correlation code passed to `request_permissions`
        code: i32,
        /// Host result status
        status: ResultStatus,
    },
}

impl Resumption {
    /// Returns the raw correlation code.
    pub fn code(&self) -> i32 {
        match self {
            Resumption::Permission { code, .. } | Resumption::Consent { code, .. } => *code,
        }
    }
}
