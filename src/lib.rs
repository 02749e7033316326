//! Permission-gated sensor feed core.
//!
//! This crate drives a privileged action (finding location data sources and
//! attaching a listener) through two independent authorization flows before
//! running it:
//! - **OS permission**: granted implicitly on old platforms, otherwise read
//!   from the platform registry and prompted for, with a rationale notice
//!   when the user dismissed an earlier prompt
//! - **Account consent**: checked and requested from the account subsystem
//! - **Resumption**: each flow answers asynchronously with the integer
//!   request code it was started with; the code is matched back to a typed
//!   [`RequestCode`] and the bound action runs once authorization is complete
//!
//! # Core Types
//!
//! - [`CapabilityProbe`]: pure checks of the OS permission and account scope
//! - [`AuthorizationCoordinator`]: per-request state machine over both flows
//! - [`ActionDispatcher`]: continuation table from request code to action
//! - [`ListenerRegistry`]: owner of the single active listener handle
//! - [`SensorController`]: host-facing entry point wiring it all together
//!
//! # Examples
//!
//! ```
//! use fit_sensors::{
//!     Collaborators, Config, PermissionStatus, Progress, RequestCode, ResultStatus,
//!     Resumption, SensorController,
//!     testing::{FakeAuthority, FakePlatform, FakeSession, RecordingNotices},
//! };
//! use std::rc::Rc;
//!
//! let collaborators = Collaborators {
//!     platform: Rc::new(FakePlatform::new(30)),
//!     authority: Rc::new(FakeAuthority::new()),
//!     notices: Rc::new(RecordingNotices::new()),
//!     session: Rc::new(FakeSession::new()),
//! };
//! let mut controller =
//!     SensorController::new(Config::new("com.example.sensors"), collaborators).unwrap();
//!
//! // Permission is missing, so the platform prompt is issued and we wait.
//! assert!(matches!(controller.start().unwrap(), Progress::Suspended(_)));
//!
//! // The platform grants; consent is still missing, so we wait again.
//! controller
//!     .resume(Resumption::Permission { code: 1, grants: vec![PermissionStatus::Granted] })
//!     .unwrap();
//!
//! // Consent arrives and the action runs.
//! let done = controller
//!     .resume(Resumption::Consent { code: 1, status: ResultStatus::Ok })
//!     .unwrap();
//! assert_eq!(done, Progress::Authorized(RequestCode::FindDataSources));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capability;
mod config;
mod controller;
mod coordinator;
mod dispatcher;
mod error;
mod feed;
pub mod logging;
mod notice;
mod pending;
mod probe;
mod registry;
mod request;
mod resumption;
mod session;
mod settings;
mod state;
pub mod testing;

pub use capability::{
    same_data_type, AccessType, CapabilityRequirement, CapabilityRequirementBuilder,
    DataSourceDescriptor, DataSourceType, DataType,
};
pub use config::{Config, DiscoveryMode};
pub use controller::{Collaborators, SensorController};
pub use coordinator::AuthorizationCoordinator;
pub use dispatcher::{Action, ActionDispatcher, Dispatch};
pub use error::{ConfigError, Error, ProviderError, ProviderErrorKind};
pub use feed::SensorFeed;
pub use notice::{Notice, NoticeAction, NoticeDuration, NoticeKind, NoticeSurface};
pub use probe::{AccountAuthority, CapabilityProbe, Permission, PermissionStatus, Platform};
pub use registry::{ListenerRegistry, Registration, Unregistration};
pub use request::{PrincipalAccount, RequestCode, UnknownRequestCode};
pub use resumption::{ResultStatus, Resumption};
pub use session::{
    DataPoint, DataPointCallback, DataSourceSession, DataSourcesRequest, DataSourcesResult,
    ListenerHandle, SensorRequest, Value,
};
pub use settings::SettingsLink;
pub use state::{AuthorizationOutcome, AuthorizationState, Progress};
