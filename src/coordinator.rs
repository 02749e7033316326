use std::rc::Rc;

use crate::capability::CapabilityRequirement;
use crate::config::Config;
use crate::logging::Log;
use crate::notice::{Notice, NoticeSurface};
use crate::pending::PendingTable;
use crate::probe::{CapabilityProbe, Permission, PermissionStatus};
use crate::request::RequestCode;
use crate::resumption::{ResultStatus, Resumption};
use crate::settings::SettingsLink;
use crate::state::{AuthorizationState, Progress};

/// Drives a request through the OS permission and account consent flows.
///
/// The OS permission is always settled before the account scope is
/// examined. Each external flow is started at most once per suspension; its
/// answer comes back through [`resume`](Self::resume) (or the typed
/// handlers) and resolves the pending entry exactly once.
///
/// The coordinator never runs the action itself. A step that confirms
/// authorization returns [`Progress::Authorized`] and the caller dispatches.
///
/// # Examples
///
/// ```
/// use fit_sensors::{
///     AuthorizationCoordinator, CapabilityProbe, Config, Progress, RequestCode,
///     logging::Log,
///     testing::{FakeAuthority, FakePlatform, RecordingNotices},
/// };
/// use std::rc::Rc;
///
/// let platform = Rc::new(FakePlatform::new(28));
/// let authority = Rc::new(FakeAuthority::new());
/// authority.approve();
///
/// let config = Config::new("com.example.sensors");
/// let probe = CapabilityProbe::new(platform, authority, config.runtime_permission_threshold);
/// let mut coordinator = AuthorizationCoordinator::new(
///     probe,
///     Rc::new(RecordingNotices::new()),
///     &config,
///     Log::new("doc"),
/// );
///
/// assert_eq!(
///     coordinator.ensure_authorized_then_run(RequestCode::FindDataSources),
///     Progress::Authorized(RequestCode::FindDataSources)
/// );
/// ```
pub struct AuthorizationCoordinator {
    probe: CapabilityProbe,
    notices: Rc<dyn NoticeSurface>,
    requirement: CapabilityRequirement,
    permission: Permission,
    settings: SettingsLink,
    pending: PendingTable,
    log: Log,
}

impl AuthorizationCoordinator {
    /// Creates a coordinator asking for location read access.
    pub fn new(
        probe: CapabilityProbe,
        notices: Rc<dyn NoticeSurface>,
        config: &Config,
        log: Log,
    ) -> Self {
        Self {
            probe,
            notices,
            requirement: CapabilityRequirement::location_read(),
            permission: config.permission.clone(),
            settings: SettingsLink::application_details(&config.package_name),
            pending: PendingTable::new(),
            log,
        }
    }

    /// Replaces the account-level requirement.
    pub fn with_requirement(mut self, requirement: CapabilityRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// The account-level requirement this coordinator asks for.
    pub fn requirement(&self) -> &CapabilityRequirement {
        &self.requirement
    }

    /// Current state of `code`. Codes never seen are `Idle`.
    pub fn state(&self, code: RequestCode) -> AuthorizationState {
        self.pending.state(code)
    }

    /// Request codes currently waiting on an external flow.
    pub fn pending(&self) -> Vec<(RequestCode, AuthorizationState)> {
        self.pending.pending().collect()
    }

    /// Checks every right `code` needs and starts the first missing flow.
    ///
    /// Returns [`Progress::Authorized`] when nothing is missing. If `code` is
    /// already waiting on a platform prompt or consent flow, no new request is
    /// issued and the current suspension is reported. An unanswered rationale
    /// notice does not block: the checks run again and the notice is shown
    /// again.
    pub fn ensure_authorized_then_run(&mut self, code: RequestCode) -> Progress {
        if self.pending.is_pending(code) {
            let state = self.pending.state(code);
            self.log
                .debug(format_args!("{} is already waiting ({})", code, state));
            return Progress::Suspended(state);
        }

        self.pending.set(code, AuthorizationState::CheckingOsPermission);
        if self.probe.has_os_permission(&self.permission) {
            self.check_account_scope(code)
        } else {
            self.request_runtime_permission(code)
        }
    }

    /// The user confirmed the rationale notice for `code`.
    pub fn confirm_rationale(&mut self, code: RequestCode) -> Progress {
        if !self.pending.take(code, AuthorizationState::AwaitingRationale) {
            return self.ignore(code, "rationale confirmation");
        }
        self.issue_permission_prompt(code)
    }

    /// Routes a raw callback from the host to the matching handler.
    ///
    /// Unknown correlation codes are ignored.
    pub fn resume(&mut self, resumption: Resumption) -> Progress {
        let raw = resumption.code();
        let Ok(code) = RequestCode::try_from(raw) else {
            self.log
                .debug(format_args!("Ignoring result for unknown request code {}", raw));
            return Progress::Ignored;
        };

        match resumption {
            Resumption::Permission { grants, .. } => self.on_permission_result(code, &grants),
            Resumption::Consent { status, .. } => self.on_consent_result(code, status),
        }
    }

    /// Result of the platform permission prompt for `code`.
    pub fn on_permission_result(
        &mut self,
        code: RequestCode,
        grants: &[PermissionStatus],
    ) -> Progress {
        if !self
            .pending
            .take(code, AuthorizationState::AwaitingOsPermission)
        {
            return self.ignore(code, "permission result");
        }

        match grants.first() {
            None => {
                // Interrupted prompts report empty results; no decision was made.
                self.log.info(format_args!("User interaction was cancelled."));
                Progress::Cancelled(code)
            }
            Some(PermissionStatus::Granted) => self.check_account_scope(code),
            Some(PermissionStatus::Denied) => {
                self.log.warn(format_args!(
                    "{} was denied for {}; pointing the user at settings",
                    self.permission, code
                ));
                self.notices
                    .show(Notice::permission_denied(self.settings.clone()));
                self.pending.set(code, AuthorizationState::Denied);
                Progress::Denied(code)
            }
        }
    }

    /// Result of the account consent flow for `code`.
    pub fn on_consent_result(&mut self, code: RequestCode, status: ResultStatus) -> Progress {
        if !self
            .pending
            .take(code, AuthorizationState::AwaitingAccountConsent)
        {
            return self.ignore(code, "consent result");
        }

        if status == ResultStatus::Ok {
            self.pending.set(code, AuthorizationState::Authorized);
            return Progress::Authorized(code);
        }

        self.log.error(format_args!(
            "There was an error signing in to the account. Request code was: {}. Result code was: {}.",
            code.as_i32(),
            status.code()
        ));
        if status == ResultStatus::Canceled {
            Progress::Cancelled(code)
        } else {
            self.pending.set(code, AuthorizationState::Denied);
            Progress::Denied(code)
        }
    }

    fn request_runtime_permission(&mut self, code: RequestCode) -> Progress {
        let platform = self.probe.platform();
        if platform.should_show_rationale(&self.permission) {
            self.log.info(format_args!(
                "Displaying permission rationale to provide additional context."
            ));
            self.notices.show(Notice::rationale(code));
            self.pending.set(code, AuthorizationState::AwaitingRationale);
            Progress::Suspended(AuthorizationState::AwaitingRationale)
        } else {
            self.issue_permission_prompt(code)
        }
    }

    fn issue_permission_prompt(&mut self, code: RequestCode) -> Progress {
        // May be answered without a prompt when device policy or
        // "never ask again" already decided.
        self.log.info(format_args!("Requesting permission(s)..."));
        self.probe
            .platform()
            .request_permissions(std::slice::from_ref(&self.permission), code.as_i32());
        self.pending
            .set(code, AuthorizationState::AwaitingOsPermission);
        Progress::Suspended(AuthorizationState::AwaitingOsPermission)
    }

    fn check_account_scope(&mut self, code: RequestCode) -> Progress {
        self.pending
            .set(code, AuthorizationState::CheckingAccountScope);

        let account = self.probe.account(&self.requirement);
        if self.probe.has_account_scope(&self.requirement, &account) {
            self.pending.set(code, AuthorizationState::Authorized);
            return Progress::Authorized(code);
        }

        self.log.info(format_args!(
            "Requesting account consent for {} ({})",
            account.id, code
        ));
        self.probe
            .authority()
            .request_permissions(&account, &self.requirement, code.as_i32());
        self.pending
            .set(code, AuthorizationState::AwaitingAccountConsent);
        Progress::Suspended(AuthorizationState::AwaitingAccountConsent)
    }

    fn ignore(&self, code: RequestCode, what: &str) -> Progress {
        self.log.debug(format_args!(
            "Ignoring {} for {}: nothing pending ({})",
            what,
            code,
            self.pending.state(code)
        ));
        Progress::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogPipeline, MemorySink, MessageOnlyFilter};
    use crate::notice::{NoticeAction, NoticeKind};
    use crate::testing::{FakeAuthority, FakePlatform, RecordingNotices};

    const CODE: RequestCode = RequestCode::FindDataSources;

    struct Fixture {
        platform: Rc<FakePlatform>,
        authority: Rc<FakeAuthority>,
        notices: Rc<RecordingNotices>,
        sink: Rc<MemorySink>,
        coordinator: AuthorizationCoordinator,
    }

    fn fixture(sdk: u32) -> Fixture {
        let platform = Rc::new(FakePlatform::new(sdk));
        let authority = Rc::new(FakeAuthority::new());
        let notices = Rc::new(RecordingNotices::new());
        let sink = Rc::new(MemorySink::new());
        let log = Log::new("test").with_pipeline(
            LogPipeline::builder()
                .filter(MessageOnlyFilter)
                .sink(sink.clone())
                .build(),
        );
        let config = Config::new("com.example.sensors");
        let probe = CapabilityProbe::new(
            platform.clone(),
            authority.clone(),
            config.runtime_permission_threshold,
        );
        let coordinator = AuthorizationCoordinator::new(probe, notices.clone(), &config, log);
        Fixture {
            platform,
            authority,
            notices,
            sink,
            coordinator,
        }
    }

    #[test]
    fn fully_authorized_runs_without_requests() {
        let mut f = fixture(30);
        f.platform.grant(&Permission::ACCESS_FINE_LOCATION);
        f.authority.approve();

        assert_eq!(
            f.coordinator.ensure_authorized_then_run(CODE),
            Progress::Authorized(CODE)
        );
        assert!(f.platform.permission_requests().is_empty());
        assert!(f.authority.consent_requests().is_empty());
        assert_eq!(f.coordinator.state(CODE), AuthorizationState::Authorized);
    }

    #[test]
    fn missing_permission_prompts_directly_without_rationale() {
        let mut f = fixture(30);

        let progress = f.coordinator.ensure_authorized_then_run(CODE);

        assert_eq!(
            progress,
            Progress::Suspended(AuthorizationState::AwaitingOsPermission)
        );
        assert_eq!(
            f.platform.permission_requests(),
            vec![(vec![Permission::ACCESS_FINE_LOCATION], 1)]
        );
        assert!(f.notices.shown().is_empty());
        assert!(f.sink.contains("Requesting permission(s)..."));
    }

    #[test]
    fn rationale_is_shown_before_prompting() {
        let mut f = fixture(30);
        f.platform.set_rationale(true);

        let progress = f.coordinator.ensure_authorized_then_run(CODE);

        assert_eq!(
            progress,
            Progress::Suspended(AuthorizationState::AwaitingRationale)
        );
        assert!(f.platform.permission_requests().is_empty());
        let shown = f.notices.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].kind, NoticeKind::Rationale);

        assert_eq!(
            f.coordinator.confirm_rationale(CODE),
            Progress::Suspended(AuthorizationState::AwaitingOsPermission)
        );
        assert_eq!(f.platform.permission_requests().len(), 1);
    }

    #[test]
    fn second_request_while_pending_issues_nothing() {
        let mut f = fixture(30);
        f.coordinator.ensure_authorized_then_run(CODE);

        let again = f.coordinator.ensure_authorized_then_run(CODE);

        assert_eq!(
            again,
            Progress::Suspended(AuthorizationState::AwaitingOsPermission)
        );
        assert_eq!(f.platform.permission_requests().len(), 1);
    }

    #[test]
    fn dismissed_rationale_is_shown_again() {
        let mut f = fixture(30);
        f.platform.set_rationale(true);
        f.coordinator.ensure_authorized_then_run(CODE);

        let again = f.coordinator.ensure_authorized_then_run(CODE);

        assert_eq!(
            again,
            Progress::Suspended(AuthorizationState::AwaitingRationale)
        );
        let shown = f.notices.shown();
        assert_eq!(shown.len(), 2);
        assert!(shown.iter().all(|n| n.kind == NoticeKind::Rationale));
        assert!(f.platform.permission_requests().is_empty());

        assert_eq!(
            f.coordinator.confirm_rationale(CODE),
            Progress::Suspended(AuthorizationState::AwaitingOsPermission)
        );
        assert_eq!(f.platform.permission_requests().len(), 1);
    }

    #[test]
    fn rationale_is_skipped_once_permission_was_granted_elsewhere() {
        let mut f = fixture(30);
        f.platform.set_rationale(true);
        f.authority.approve();
        f.coordinator.ensure_authorized_then_run(CODE);
        f.platform.grant(&Permission::ACCESS_FINE_LOCATION);

        assert_eq!(
            f.coordinator.ensure_authorized_then_run(CODE),
            Progress::Authorized(CODE)
        );
        assert_eq!(
            f.coordinator.confirm_rationale(CODE),
            Progress::Ignored
        );
    }

    #[test]
    fn grant_moves_on_to_account_consent() {
        let mut f = fixture(30);
        f.coordinator.ensure_authorized_then_run(CODE);

        let progress = f
            .coordinator
            .on_permission_result(CODE, &[PermissionStatus::Granted]);

        assert_eq!(
            progress,
            Progress::Suspended(AuthorizationState::AwaitingAccountConsent)
        );
        let requests = f.authority.consent_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, 1);
    }

    #[test]
    fn denial_shows_settings_notice() {
        let mut f = fixture(30);
        f.coordinator.ensure_authorized_then_run(CODE);

        let progress = f
            .coordinator
            .on_permission_result(CODE, &[PermissionStatus::Denied]);

        assert_eq!(progress, Progress::Denied(CODE));
        assert_eq!(f.coordinator.state(CODE), AuthorizationState::Denied);
        let shown = f.notices.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(
            shown[0].action,
            NoticeAction::OpenSettings(SettingsLink::application_details(
                "com.example.sensors"
            ))
        );
        assert!(f.authority.consent_requests().is_empty());
    }

    #[test]
    fn empty_grants_are_cancelled_not_denied() {
        let mut f = fixture(30);
        f.coordinator.ensure_authorized_then_run(CODE);

        let progress = f.coordinator.on_permission_result(CODE, &[]);

        assert_eq!(progress, Progress::Cancelled(CODE));
        assert_eq!(f.coordinator.state(CODE), AuthorizationState::Idle);
        assert!(f.sink.contains("User interaction was cancelled."));
        assert!(f.notices.shown().is_empty());
        assert!(f.coordinator.pending().is_empty());
    }

    #[test]
    fn duplicate_permission_result_is_ignored() {
        let mut f = fixture(30);
        f.authority.approve();
        f.coordinator.ensure_authorized_then_run(CODE);

        assert_eq!(
            f.coordinator
                .on_permission_result(CODE, &[PermissionStatus::Granted]),
            Progress::Authorized(CODE)
        );
        assert_eq!(
            f.coordinator
                .on_permission_result(CODE, &[PermissionStatus::Granted]),
            Progress::Ignored
        );
    }

    #[test]
    fn consent_error_logs_both_codes() {
        let mut f = fixture(28);
        f.coordinator.ensure_authorized_then_run(CODE);

        let progress = f.coordinator.on_consent_result(CODE, ResultStatus::Other(5));

        assert_eq!(progress, Progress::Denied(CODE));
        assert!(f.sink.contains("Request code was: 1"));
        assert!(f.sink.contains("Result code was: 5"));
    }

    #[test]
    fn consent_cancel_returns_to_idle() {
        let mut f = fixture(28);
        f.coordinator.ensure_authorized_then_run(CODE);

        let progress = f.coordinator.on_consent_result(CODE, ResultStatus::Canceled);

        assert_eq!(progress, Progress::Cancelled(CODE));
        assert_eq!(f.coordinator.state(CODE), AuthorizationState::Idle);
    }

    #[test]
    fn consent_ok_authorizes() {
        let mut f = fixture(28);
        f.coordinator.ensure_authorized_then_run(CODE);

        assert_eq!(
            f.coordinator.resume(Resumption::Consent {
                code: 1,
                status: ResultStatus::Ok,
            }),
            Progress::Authorized(CODE)
        );
    }

    #[test]
    fn unknown_codes_are_ignored() {
        let mut f = fixture(30);

        assert_eq!(
            f.coordinator.resume(Resumption::Consent {
                code: 99,
                status: ResultStatus::Ok,
            }),
            Progress::Ignored
        );
        assert_eq!(
            f.coordinator.resume(Resumption::Permission {
                code: 1,
                grants: vec![PermissionStatus::Granted],
            }),
            Progress::Ignored
        );
    }

    #[test]
    fn rationale_confirmation_without_notice_is_ignored() {
        let mut f = fixture(30);
        assert_eq!(f.coordinator.confirm_rationale(CODE), Progress::Ignored);
        assert!(f.platform.permission_requests().is_empty());
    }

    #[test]
    fn account_is_resolved_on_every_check() {
        let mut f = fixture(28);
        f.authority.approve();

        f.coordinator.ensure_authorized_then_run(CODE);
        f.coordinator.ensure_authorized_then_run(CODE);

        assert_eq!(f.authority.account_lookups(), 2);
    }
}
