use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;
use crate::request::RequestCode;

/// A bound action run against the dispatch context `C`.
pub type Action<C> = Box<dyn FnMut(&mut C) -> Result<(), Error>>;

/// What [`ActionDispatcher::dispatch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The bound action ran to completion
    Ran(RequestCode),
    /// Nothing is bound to the code; ignored
    Unbound,
}

/// Continuation table from request code to action.
///
/// Authorization callbacks only carry an integer; this table is what turns
/// that integer back into something to run.
///
/// # Examples
///
/// ```
/// use fit_sensors::{ActionDispatcher, Dispatch, RequestCode};
///
/// let mut dispatcher: ActionDispatcher<u32> = ActionDispatcher::new();
/// dispatcher.bind(RequestCode::FindDataSources, |count: &mut u32| {
///     *count += 1;
///     Ok(())
/// });
///
/// let mut count = 0;
/// assert_eq!(
///     dispatcher.dispatch(RequestCode::FindDataSources, &mut count).unwrap(),
///     Dispatch::Ran(RequestCode::FindDataSources)
/// );
/// assert_eq!(dispatcher.dispatch_raw(7, &mut count).unwrap(), Dispatch::Unbound);
/// assert_eq!(count, 1);
/// ```
pub struct ActionDispatcher<C> {
    actions: BTreeMap<RequestCode, Action<C>>,
}

impl<C> ActionDispatcher<C> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    /// Binds `action` to `code`, replacing any previous binding.
    pub fn bind(
        &mut self,
        code: RequestCode,
        action: impl FnMut(&mut C) -> Result<(), Error> + 'static,
    ) -> &mut Self {
        self.actions.insert(code, Box::new(action));
        self
    }

    /// True if something is bound to `code`.
    pub fn is_bound(&self, code: RequestCode) -> bool {
        self.actions.contains_key(&code)
    }

    /// Runs the action bound to `code`. Unbound codes are ignored.
    ///
    /// # Errors
    ///
    /// Returns whatever the bound action returns.
    pub fn dispatch(&mut self, code: RequestCode, ctx: &mut C) -> Result<Dispatch, Error> {
        match self.actions.get_mut(&code) {
            Some(action) => {
                tracing::debug!(request_code = code.as_i32(), "dispatching {}", code.name());
                action(ctx)?;
                Ok(Dispatch::Ran(code))
            }
            None => Ok(Dispatch::Unbound),
        }
    }

    /// Like [`dispatch`](Self::dispatch), for a raw integer code.
    ///
    /// # Errors
    ///
    /// Returns whatever the bound action returns.
    pub fn dispatch_raw(&mut self, code: i32, ctx: &mut C) -> Result<Dispatch, Error> {
        match RequestCode::try_from(code) {
            Ok(code) => self.dispatch(code, ctx),
            Err(_) => Ok(Dispatch::Unbound),
        }
    }
}

impl<C> Default for ActionDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ActionDispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("bound", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderErrorKind};

    #[test]
    fn unbound_code_is_ignored() {
        let mut dispatcher: ActionDispatcher<Vec<&'static str>> = ActionDispatcher::new();
        let mut calls = Vec::new();

        assert_eq!(
            dispatcher
                .dispatch(RequestCode::FindDataSources, &mut calls)
                .unwrap(),
            Dispatch::Unbound
        );
        assert!(calls.is_empty());
    }

    #[test]
    fn rebinding_replaces_the_action() {
        let mut dispatcher: ActionDispatcher<Vec<&'static str>> = ActionDispatcher::new();
        dispatcher.bind(RequestCode::FindDataSources, |calls: &mut Vec<&'static str>| {
            calls.push("first");
            Ok(())
        });
        dispatcher.bind(RequestCode::FindDataSources, |calls: &mut Vec<&'static str>| {
            calls.push("second");
            Ok(())
        });

        let mut calls = Vec::new();
        dispatcher
            .dispatch(RequestCode::FindDataSources, &mut calls)
            .unwrap();

        assert_eq!(calls, vec!["second"]);
    }

    #[test]
    fn action_errors_propagate() {
        let mut dispatcher: ActionDispatcher<()> = ActionDispatcher::new();
        dispatcher.bind(RequestCode::FindDataSources, |_: &mut ()| {
            Err(ProviderError::new(ProviderErrorKind::Discovery).into())
        });

        let result = dispatcher.dispatch(RequestCode::FindDataSources, &mut ());
        assert!(matches!(result, Err(Error::Provider(_))));
    }

    #[test]
    fn raw_dispatch_maps_known_codes() {
        let mut dispatcher: ActionDispatcher<u8> = ActionDispatcher::new();
        dispatcher.bind(RequestCode::FindDataSources, |n: &mut u8| {
            *n += 1;
            Ok(())
        });
        let mut n = 0;

        assert_eq!(
            dispatcher.dispatch_raw(1, &mut n).unwrap(),
            Dispatch::Ran(RequestCode::FindDataSources)
        );
        assert_eq!(dispatcher.dispatch_raw(-3, &mut n).unwrap(), Dispatch::Unbound);
        assert_eq!(n, 1);
        assert!(dispatcher.is_bound(RequestCode::FindDataSources));
    }
}
