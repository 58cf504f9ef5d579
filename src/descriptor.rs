//! Declared and observed application descriptors
//!
//! [`DesiredApplication`] is what a user declares; every optional field is
//! an explicit `Option`, and `None` means "leave it as it is". The Reader
//! produces an [`ApplicationDescriptor`] describing what the broker has.

use anyhow::{Result, bail};
use brokerkit::{ApplicationPatch, ApplicationType, BrokerApplication, NewApplication};
use declarative::Ensure;
use serde::{Deserialize, Serialize};

/// A published application as declared by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesiredApplication {
    /// Name, unique within the desktop group
    pub name: String,
    /// Executable location
    #[serde(default)]
    pub path: String,
    /// Desktop delivery group the application is published to
    #[serde(alias = "desktop_group_name")]
    pub desktop_group: String,
    /// Delivery type; fixed once the application exists
    #[serde(default)]
    pub application_type: Option<ApplicationType>,
    #[serde(default)]
    pub arguments: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Name shown to end users
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub ensure: Ensure,
}

impl DesiredApplication {
    pub fn new(name: &str, path: &str, desktop_group: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            desktop_group: desktop_group.to_string(),
            application_type: None,
            arguments: None,
            working_directory: None,
            description: None,
            display_name: None,
            enabled: None,
            visible: None,
            ensure: Ensure::Present,
        }
    }

    /// Check the fields needed to look the application up
    pub fn validate_identity(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("application name must not be empty");
        }
        if self.desktop_group.trim().is_empty() {
            bail!("desktop group name for '{}' must not be empty", self.name);
        }
        Ok(())
    }

    /// Check the fields needed to test or set the application
    pub fn validate(&self) -> Result<()> {
        self.validate_identity()?;
        if self.ensure.is_present() && self.path.trim().is_empty() {
            bail!("path for '{}' must not be empty", self.name);
        }
        Ok(())
    }

    /// Settings to send to the broker: the path plus every field that was set
    pub fn patch(&self) -> ApplicationPatch {
        ApplicationPatch {
            command_line_executable: Some(self.path.clone()),
            command_line_arguments: self.arguments.clone(),
            working_directory: self.working_directory.clone(),
            description: self.description.clone(),
            published_name: self.display_name.clone(),
            enabled: self.enabled,
            visible: self.visible,
        }
    }

    /// Creation request, with defaults filled in for unset fields
    pub fn new_application(&self, desktop_group_uid: u64) -> NewApplication {
        let mut settings = self.patch();
        settings.published_name = Some(
            self.display_name
                .clone()
                .unwrap_or_else(|| self.name.clone()),
        );
        settings.enabled = Some(self.enabled.unwrap_or(true));
        settings.visible = Some(self.visible.unwrap_or(true));

        NewApplication {
            name: self.name.clone(),
            application_type: self.application_type.unwrap_or_default(),
            desktop_group_uid,
            settings,
        }
    }
}

/// Snapshot of a published application as the broker reports it
///
/// When `ensure` is `Absent` only the identifying fields are filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationDescriptor {
    pub name: String,
    pub path: Option<String>,
    pub desktop_group_name: String,
    pub application_type: Option<ApplicationType>,
    pub arguments: Option<String>,
    pub working_directory: Option<String>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub enabled: Option<bool>,
    pub visible: Option<bool>,
    pub ensure: Ensure,
}

impl ApplicationDescriptor {
    /// Descriptor for an application the broker does not have
    pub fn absent(name: &str, desktop_group: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            desktop_group_name: desktop_group.to_string(),
            application_type: None,
            arguments: None,
            working_directory: None,
            description: None,
            display_name: None,
            enabled: None,
            visible: None,
            ensure: Ensure::Absent,
        }
    }

    /// Descriptor for an application record
    pub fn from_broker(desktop_group: &str, application: &BrokerApplication) -> Self {
        Self {
            name: application.name.clone(),
            path: Some(application.command_line_executable.clone()),
            desktop_group_name: desktop_group.to_string(),
            application_type: Some(application.application_type),
            arguments: application.command_line_arguments.clone(),
            working_directory: application.working_directory.clone(),
            description: application.description.clone(),
            display_name: application.display_name().map(str::to_string),
            enabled: Some(application.enabled),
            visible: Some(application.visible),
            ensure: Ensure::Present,
        }
    }
}
