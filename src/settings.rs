/// Deep link to the application's page in the OS settings.
///
/// Used only as the target of the permission-denied notice.
///
/// # Examples
///
/// ```
/// use fit_sensors::SettingsLink;
///
/// let link = SettingsLink::application_details("com.example.sensors");
/// assert_eq!(link.uri(), "package:com.example.sensors");
/// assert!(link.new_task());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLink {
    action: &'static str,
    uri: String,
    new_task: bool,
}

impl SettingsLink {
    /// Intent action for the application details screen.
    pub const APPLICATION_DETAILS_SETTINGS: &'static str =
        "android.settings.APPLICATION_DETAILS_SETTINGS";

    /// Builds the link for `package_name`, launched in a new task.
    pub fn application_details(package_name: &str) -> Self {
        Self {
            action: Self::APPLICATION_DETAILS_SETTINGS,
            uri: format!("package:{}", package_name),
            new_task: true,
        }
    }

    /// Returns the intent action.
    pub fn action(&self) -> &str {
        self.action
    }

    /// Returns the `package:` URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether the settings screen opens in its own task.
    pub fn new_task(&self) -> bool {
        self.new_task
    }
}
