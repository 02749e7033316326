//! Table of authorization continuations keyed by request code.

use std::collections::BTreeMap;

use crate::request::RequestCode;
use crate::state::AuthorizationState;

/// Per-code authorization state.
///
/// Suspended entries are the outstanding continuations: at most one per
/// code, resolved exactly once by [`PendingTable::take`]. Terminal states are
/// kept so callers can observe how the last attempt ended.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    states: BTreeMap<RequestCode, AuthorizationState>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self, code: RequestCode) -> AuthorizationState {
        self.states
            .get(&code)
            .copied()
            .unwrap_or(AuthorizationState::Idle)
    }

    pub(crate) fn set(&mut self, code: RequestCode, state: AuthorizationState) {
        self.states.insert(code, state);
    }

    /// True while a platform or account callback is owed for `code`.
    pub(crate) fn is_pending(&self, code: RequestCode) -> bool {
        self.state(code).awaits_callback()
    }

    /// Resolves the continuation for `code` if it is waiting in `expected`.
    ///
    /// On a match the entry drops back to `Idle` so a second callback finds
    /// nothing to resolve.
    pub(crate) fn take(&mut self, code: RequestCode, expected: AuthorizationState) -> bool {
        if self.state(code) != expected {
            return false;
        }
        self.states.insert(code, AuthorizationState::Idle);
        true
    }

    pub(crate) fn pending(&self) -> impl Iterator<Item = (RequestCode, AuthorizationState)> + '_ {
        self.states
            .iter()
            .filter(|(_, state)| state.is_suspended())
            .map(|(code, state)| (*code, *state))
    }
}
