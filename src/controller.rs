use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::coordinator::AuthorizationCoordinator;
use crate::dispatcher::{ActionDispatcher, Dispatch};
use crate::error::Error;
use crate::feed::SensorFeed;
use crate::logging::{Log, LogPipeline};
use crate::notice::{NoticeAction, NoticeSurface};
use crate::probe::{AccountAuthority, CapabilityProbe, Platform};
use crate::registry::Unregistration;
use crate::request::RequestCode;
use crate::resumption::Resumption;
use crate::session::DataSourceSession;
use crate::state::Progress;

/// The external subsystems a controller talks to.
pub struct Collaborators {
    /// OS permission registry and prompts
    pub platform: Rc<dyn Platform>,
    /// Account consent subsystem
    pub authority: Rc<dyn AccountAuthority>,
    /// Where notices are shown
    pub notices: Rc<dyn NoticeSurface>,
    /// Data-source provider
    pub session: Rc<dyn DataSourceSession>,
}

/// Host-facing entry point wiring authorization, dispatch and the feed.
///
/// The host calls [`start`](Self::start) once, forwards every permission
/// and consent callback to [`resume`](Self::resume), and forwards notice
/// confirmations to [`on_notice_action`](Self::on_notice_action). Whenever a
/// step confirms authorization the bound action runs before the call
/// returns.
///
/// # Examples
///
/// ```
/// use fit_sensors::{
///     Collaborators, Config, Progress, RequestCode, SensorController,
///     testing::{FakeAuthority, FakePlatform, FakeSession, RecordingNotices},
/// };
/// use std::rc::Rc;
///
/// let authority = Rc::new(FakeAuthority::new());
/// authority.approve();
/// let collaborators = Collaborators {
///     platform: Rc::new(FakePlatform::new(28)),
///     authority,
///     notices: Rc::new(RecordingNotices::new()),
///     session: Rc::new(FakeSession::new()),
/// };
///
/// let mut controller =
///     SensorController::new(Config::new("com.example.sensors"), collaborators).unwrap();
///
/// assert_eq!(
///     controller.start().unwrap(),
///     Progress::Authorized(RequestCode::FindDataSources)
/// );
/// ```
pub struct SensorController {
    coordinator: AuthorizationCoordinator,
    dispatcher: ActionDispatcher<SensorFeed>,
    feed: SensorFeed,
    platform: Rc<dyn Platform>,
    log: Log,
}

impl SensorController {
    /// Creates a controller that logs through `tracing` only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails validation.
    pub fn new(config: Config, collaborators: Collaborators) -> Result<Self, Error> {
        let log = Log::new(&config.log_tag);
        Self::assemble(config, collaborators, log)
    }

    /// Creates a controller whose log records also flow through `pipeline`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails validation.
    pub fn with_pipeline(
        config: Config,
        collaborators: Collaborators,
        pipeline: LogPipeline,
    ) -> Result<Self, Error> {
        let log = Log::new(&config.log_tag).with_pipeline(pipeline);
        Self::assemble(config, collaborators, log)
    }

    fn assemble(config: Config, collaborators: Collaborators, log: Log) -> Result<Self, Error> {
        config.validate()?;

        let Collaborators {
            platform,
            authority,
            notices,
            session,
        } = collaborators;

        let probe = CapabilityProbe::new(
            platform.clone(),
            authority,
            config.runtime_permission_threshold,
        );
        let coordinator = AuthorizationCoordinator::new(probe, notices, &config, log.clone());
        let feed = SensorFeed::new(session, &config, log.clone());

        let mut dispatcher = ActionDispatcher::new();
        dispatcher.bind(RequestCode::FindDataSources, |feed: &mut SensorFeed| {
            feed.find_data_sources()
        });

        Ok(Self {
            coordinator,
            dispatcher,
            feed,
            platform,
            log,
        })
    }

    /// Logs readiness and requests the sensor feed.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn start(&mut self) -> Result<Progress, Error> {
        self.log.info(format_args!("Ready"));
        self.request(RequestCode::FindDataSources)
    }

    /// Authorizes `code` and runs its action if nothing is missing.
    ///
    /// # Errors
    ///
    /// Returns the bound action's error; only the direct discovery variant
    /// produces one.
    pub fn request(&mut self, code: RequestCode) -> Result<Progress, Error> {
        let progress = self.coordinator.ensure_authorized_then_run(code);
        self.settle(progress)
    }

    /// Feeds a permission or consent callback back into the state machine.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn resume(&mut self, resumption: Resumption) -> Result<Progress, Error> {
        let progress = self.coordinator.resume(resumption);
        self.settle(progress)
    }

    /// The user confirmed a notice.
    ///
    /// Confirming the rationale issues the platform prompt. Confirming the
    /// denial notice opens the settings page; returning from settings does
    /// not retry anything, so that case reports [`Progress::Ignored`].
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn on_notice_action(&mut self, action: &NoticeAction) -> Result<Progress, Error> {
        match action {
            NoticeAction::RequestPermission(code) => {
                let progress = self.coordinator.confirm_rationale(*code);
                self.settle(progress)
            }
            NoticeAction::OpenSettings(link) => {
                self.log
                    .info(format_args!("Opening settings at {}", link.uri()));
                self.platform.open_settings(link);
                Ok(Progress::Ignored)
            }
        }
    }

    /// Removes the active listener, if any.
    pub fn unregister_listener(&mut self) -> Unregistration {
        self.feed.unregister_listener()
    }

    /// The authorization state machine.
    pub fn coordinator(&self) -> &AuthorizationCoordinator {
        &self.coordinator
    }

    /// The sensor feed and its listener registry.
    pub fn feed(&self) -> &SensorFeed {
        &self.feed
    }

    fn settle(&mut self, progress: Progress) -> Result<Progress, Error> {
        if let Progress::Authorized(code) = progress {
            if self.dispatcher.dispatch(code, &mut self.feed)? == Dispatch::Unbound {
                self.log
                    .debug(format_args!("No action bound to {}", code));
            }
        }
        Ok(progress)
    }
}

impl fmt::Debug for SensorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorController")
            .field("dispatcher", &self.dispatcher)
            .field("pending", &self.coordinator.pending())
            .field("listener", &self.feed.registry().handle())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{DataSourceDescriptor, DataSourceType, DataType};
    use crate::error::{ProviderError, ProviderErrorKind};
    use crate::config::DiscoveryMode;
    use crate::probe::{Permission, PermissionStatus};
    use crate::testing::{FakeAuthority, FakePlatform, FakeSession, RecordingNotices};

    fn gps() -> DataSourceDescriptor {
        DataSourceDescriptor::new(DataType::location_sample(), DataSourceType::Raw, "gps")
    }

    struct Parts {
        platform: Rc<FakePlatform>,
        authority: Rc<FakeAuthority>,
        notices: Rc<RecordingNotices>,
        session: Rc<FakeSession>,
    }

    fn controller(sdk: u32, config: Config) -> (SensorController, Parts) {
        let parts = Parts {
            platform: Rc::new(FakePlatform::new(sdk)),
            authority: Rc::new(FakeAuthority::new()),
            notices: Rc::new(RecordingNotices::new()),
            session: Rc::new(FakeSession::new().with_batch(vec![gps()])),
        };
        let collaborators = Collaborators {
            platform: parts.platform.clone(),
            authority: parts.authority.clone(),
            notices: parts.notices.clone(),
            session: parts.session.clone(),
        };
        (SensorController::new(config, collaborators).unwrap(), parts)
    }

    #[test]
    fn invalid_config_is_rejected() {
        let collaborators = Collaborators {
            platform: Rc::new(FakePlatform::new(30)),
            authority: Rc::new(FakeAuthority::new()),
            notices: Rc::new(RecordingNotices::new()),
            session: Rc::new(FakeSession::new()),
        };
        let result = SensorController::new(Config::new(""), collaborators);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn authorized_start_registers_a_listener() {
        let (mut controller, parts) = controller(28, Config::new("com.example.sensors"));
        parts.authority.approve();

        controller.start().unwrap();

        assert!(controller.feed().registry().is_active());
        assert_eq!(parts.session.discovery_calls(), 1);
    }

    #[test]
    fn consent_round_trip_runs_the_action_once() {
        let (mut controller, parts) = controller(28, Config::new("com.example.sensors"));

        controller.start().unwrap();
        assert_eq!(parts.session.discovery_calls(), 0);

        controller
            .resume(Resumption::Consent {
                code: 1,
                status: crate::resumption::ResultStatus::Ok,
            })
            .unwrap();
        assert_eq!(parts.session.discovery_calls(), 1);

        let duplicate = controller
            .resume(Resumption::Consent {
                code: 1,
                status: crate::resumption::ResultStatus::Ok,
            })
            .unwrap();
        assert_eq!(duplicate, Progress::Ignored);
        assert_eq!(parts.session.discovery_calls(), 1);
    }

    #[test]
    fn settings_action_opens_settings_without_retry() {
        let (mut controller, parts) = controller(30, Config::new("com.example.sensors"));
        controller.start().unwrap();
        controller
            .resume(Resumption::Permission {
                code: 1,
                grants: vec![PermissionStatus::Denied],
            })
            .unwrap();

        let notice = parts.notices.last().unwrap();
        let progress = controller.on_notice_action(&notice.action).unwrap();

        assert_eq!(progress, Progress::Ignored);
        assert_eq!(parts.platform.opened_settings().len(), 1);
        assert_eq!(parts.platform.permission_requests().len(), 1);
        assert_eq!(parts.session.discovery_calls(), 0);
    }

    #[test]
    fn rationale_confirmation_goes_through_the_controller() {
        let (mut controller, parts) = controller(30, Config::new("com.example.sensors"));
        parts.platform.set_rationale(true);
        controller.start().unwrap();

        let notice = parts.notices.last().unwrap();
        controller.on_notice_action(&notice.action).unwrap();

        assert_eq!(
            parts.platform.permission_requests(),
            vec![(vec![Permission::ACCESS_FINE_LOCATION], 1)]
        );
    }

    #[test]
    fn direct_discovery_error_surfaces_from_start() {
        let parts_session = Rc::new(
            FakeSession::new().failing_discovery(ProviderError::new(ProviderErrorKind::Discovery)),
        );
        let authority = Rc::new(FakeAuthority::new());
        authority.approve();
        let collaborators = Collaborators {
            platform: Rc::new(FakePlatform::new(28)),
            authority,
            notices: Rc::new(RecordingNotices::new()),
            session: parts_session,
        };
        let config =
            Config::new("com.example.sensors").with_discovery(DiscoveryMode::DirectAwait);
        let mut controller = SensorController::new(config, collaborators).unwrap();

        assert!(matches!(controller.start(), Err(Error::Provider(_))));
    }

    #[test]
    fn unregister_after_start_removes_listener() {
        let (mut controller, parts) = controller(28, Config::new("com.example.sensors"));
        parts.authority.approve();
        controller.start().unwrap();

        assert_eq!(controller.unregister_listener(), Unregistration::Removed);
        assert_eq!(
            controller.unregister_listener(),
            Unregistration::NotRegistered
        );
        assert_eq!(parts.session.unregister_calls(), 1);
    }
}
