//! User-facing notices raised by the coordinator.

use crate::request::RequestCode;
use crate::settings::SettingsLink;

/// Message shown before re-requesting a previously dismissed permission.
pub const PERMISSION_RATIONALE: &str = "Location permission is needed for core functionality";
/// Message shown after the permission has been denied.
pub const PERMISSION_DENIED_EXPLANATION: &str =
    "Permission was denied, but is needed for core functionality.";
/// Label of the rationale notice action.
pub const OK_LABEL: &str = "OK";
/// Label of the denial notice action.
pub const SETTINGS_LABEL: &str = "Settings";

/// Why the notice is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Explains the permission before the platform prompt is issued
    Rationale,
    /// Tells the user the permission was refused and offers settings
    PermissionDenied,
}

/// How long the notice stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeDuration {
    /// Until the user acts on it
    Indefinite,
    /// Briefly
    Short,
}

/// What confirming the notice does. Handed back to
/// [`SensorController::on_notice_action`](crate::SensorController::on_notice_action).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeAction {
    /// Issue the platform permission prompt for this request
    RequestPermission(RequestCode),
    /// Open the application's settings page
    OpenSettings(SettingsLink),
}

/// A dismissible notice with a single primary action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Why it is shown
    pub kind: NoticeKind,
    /// Body text
    pub message: String,
    /// Label of the action button
    pub action_label: String,
    /// What the action button does
    pub action: NoticeAction,
    /// How long it stays visible
    pub duration: NoticeDuration,
}

impl Notice {
    /// Rationale shown before re-requesting the permission for `code`.
    pub fn rationale(code: RequestCode) -> Self {
        Self {
            kind: NoticeKind::Rationale,
            message: PERMISSION_RATIONALE.to_string(),
            action_label: OK_LABEL.to_string(),
            action: NoticeAction::RequestPermission(code),
            duration: NoticeDuration::Indefinite,
        }
    }

    /// Persistent denial notice pointing at the settings page.
    pub fn permission_denied(link: SettingsLink) -> Self {
        Self {
            kind: NoticeKind::PermissionDenied,
            message: PERMISSION_DENIED_EXPLANATION.to_string(),
            action_label: SETTINGS_LABEL.to_string(),
            action: NoticeAction::OpenSettings(link),
            duration: NoticeDuration::Indefinite,
        }
    }
}

/// Where notices are displayed.
pub trait NoticeSurface {
    /// Shows `notice`. The host reports the user's confirmation back through
    /// the controller.
    fn show(&self, notice: Notice);
}
