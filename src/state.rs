//! Authorization states and the values a coordinator step yields.
//!
//! ```text
//! Idle -> CheckingOsPermission -> AwaitingRationale -> AwaitingOsPermission
//!                              \-> AwaitingOsPermission
//!      -> CheckingAccountScope -> AwaitingAccountConsent
//!      -> Authorized | Denied
//! ```

use std::fmt;

use crate::request::RequestCode;

/// Where a request code currently is in the authorization flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationState {
    /// Nothing in flight; also the state after a cancelled flow
    Idle,
    /// Reading the OS permission registry
    CheckingOsPermission,
    /// Rationale notice shown; waiting for the user to confirm it
    AwaitingRationale,
    /// Platform prompt issued; waiting for its result
    AwaitingOsPermission,
    /// Reading the account subsystem
    CheckingAccountScope,
    /// Consent flow started; waiting for its result
    AwaitingAccountConsent,
    /// Every check passed
    Authorized,
    /// The user or the account subsystem refused
    Denied,
}

impl AuthorizationState {
    /// True while an external callback is expected.
    pub fn is_suspended(self) -> bool {
        matches!(
            self,
            Self::AwaitingRationale | Self::AwaitingOsPermission | Self::AwaitingAccountConsent
        )
    }

    /// True when an external flow owes exactly one answer.
    ///
    /// A rationale notice can be dismissed without any answer, so
    /// `AwaitingRationale` does not count.
    pub fn awaits_callback(self) -> bool {
        matches!(self, Self::AwaitingOsPermission | Self::AwaitingAccountConsent)
    }

    /// True for `Authorized` and `Denied`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Authorized | Self::Denied)
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CheckingOsPermission => "checking_os_permission",
            Self::AwaitingRationale => "awaiting_rationale",
            Self::AwaitingOsPermission => "awaiting_os_permission",
            Self::CheckingAccountScope => "checking_account_scope",
            Self::AwaitingAccountConsent => "awaiting_account_consent",
            Self::Authorized => "authorized",
            Self::Denied => "denied",
        };
        f.write_str(name)
    }
}

/// Result of one authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// Rights confirmed
    Granted,
    /// Explicitly refused
    Denied,
    /// Interrupted with no decision
    Cancelled,
}

/// What a coordinator step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Authorization confirmed; the bound action should run now
    Authorized(RequestCode),
    /// Waiting on an external flow
    Suspended(AuthorizationState),
    /// Terminal refusal for this invocation
    Denied(RequestCode),
    /// The flow was interrupted with no decision
    Cancelled(RequestCode),
    /// Callback with no matching pending request
    Ignored,
}

impl Progress {
    /// Maps finished steps to their outcome; `None` while suspended or ignored.
    pub fn outcome(&self) -> Option<AuthorizationOutcome> {
        match self {
            Progress::Authorized(_) => Some(AuthorizationOutcome::Granted),
            Progress::Denied(_) => Some(AuthorizationOutcome::Denied),
            Progress::Cancelled(_) => Some(AuthorizationOutcome::Cancelled),
            Progress::Suspended(_) | Progress::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn awaiting_states_are_suspended() {
        assert!(AuthorizationState::AwaitingRationale.is_suspended());
        assert!(AuthorizationState::AwaitingOsPermission.is_suspended());
        assert!(AuthorizationState::AwaitingAccountConsent.is_suspended());
        assert!(!AuthorizationState::Idle.is_suspended());
        assert!(!AuthorizationState::Authorized.is_suspended());
    }

    #[test]
    fn dismissible_rationale_awaits_no_callback() {
        assert!(!AuthorizationState::AwaitingRationale.awaits_callback());
        assert!(AuthorizationState::AwaitingOsPermission.awaits_callback());
        assert!(AuthorizationState::AwaitingAccountConsent.awaits_callback());
        assert!(!AuthorizationState::Idle.awaits_callback());
    }

    #[test]
    fn only_authorized_and_denied_are_terminal() {
        assert!(AuthorizationState::Authorized.is_terminal());
        assert!(AuthorizationState::Denied.is_terminal());
        assert!(!AuthorizationState::Idle.is_terminal());
        assert!(!AuthorizationState::CheckingAccountScope.is_terminal());
    }

    #[test]
    fn progress_outcomes() {
        let code = RequestCode::FindDataSources;
        assert_eq!(
            Progress::Authorized(code).outcome(),
            Some(AuthorizationOutcome::Granted)
        );
        assert_eq!(
            Progress::Cancelled(code).outcome(),
            Some(AuthorizationOutcome::Cancelled)
        );
        assert_eq!(
            Progress::Suspended(AuthorizationState::AwaitingOsPermission).outcome(),
            None
        );
        assert_eq!(Progress::Ignored.outcome(), None);
    }
}
