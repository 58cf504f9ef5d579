//! Broker record types.
//!
//! Field names follow the broker's own attribute names so the JSON the
//! snap-in emits deserializes directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a published application is delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationType {
    /// Runs on a hosted session machine in the desktop group
    #[default]
    HostedOnDesktop,
    /// Runs from the client device's local installation
    InstalledOnClient,
}

impl ApplicationType {
    /// All application types.
    pub fn all() -> &'static [ApplicationType] {
        &[Self::HostedOnDesktop, Self::InstalledOnClient]
    }

    /// Name used by the broker API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostedOnDesktop => "HostedOnDesktop",
            Self::InstalledOnClient => "InstalledOnClient",
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                format!("invalid application type '{s}' (expected HostedOnDesktop or InstalledOnClient)")
            })
    }
}

/// A desktop delivery group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DesktopGroup {
    /// Broker identifier
    pub uid: u64,
    /// Group name
    pub name: String,
}

/// A published application record as the broker reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BrokerApplication {
    /// Broker identifier
    pub uid: u64,
    /// Administrative name
    pub name: String,
    /// Executable location
    pub command_line_executable: String,
    /// Delivery type
    pub application_type: ApplicationType,
    /// Command-line arguments
    #[serde(default)]
    pub command_line_arguments: Option<String>,
    /// Working directory
    #[serde(default)]
    pub working_directory: Option<String>,
    /// Administrative description
    #[serde(default)]
    pub description: Option<String>,
    /// Name shown to end users
    #[serde(default)]
    pub published_name: Option<String>,
    /// Browser (client) name
    #[serde(default)]
    pub browser_name: Option<String>,
    /// Whether users can launch it
    pub enabled: bool,
    /// Whether users can see it
    pub visible: bool,
}

impl BrokerApplication {
    /// Name shown to end users, falling back to the browser name.
    pub fn display_name(&self) -> Option<&str> {
        self.published_name
            .as_deref()
            .or(self.browser_name.as_deref())
    }
}

/// Result of looking up an application by name within a desktop group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Located {
    /// The desktop group, if it exists
    #[serde(default)]
    pub desktop_group: Option<DesktopGroup>,
    /// The application, if the group exists and contains it
    #[serde(default)]
    pub application: Option<BrokerApplication>,
}

/// Settings sent with a create or update.
///
/// Only `Some` fields reach the broker; `None` leaves the remote value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPatch {
    pub command_line_executable: Option<String>,
    pub command_line_arguments: Option<String>,
    pub working_directory: Option<String>,
    pub description: Option<String>,
    pub published_name: Option<String>,
    pub enabled: Option<bool>,
    pub visible: Option<bool>,
}

impl ApplicationPatch {
    /// Check if the patch carries no field at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the `Some` fields onto a record
    pub fn apply_to(&self, application: &mut BrokerApplication) {
        if let Some(v) = &self.command_line_executable {
            application.command_line_executable.clone_from(v);
        }
        if let Some(v) = &self.command_line_arguments {
            application.command_line_arguments = Some(v.clone());
        }
        if let Some(v) = &self.working_directory {
            application.working_directory = Some(v.clone());
        }
        if let Some(v) = &self.description {
            application.description = Some(v.clone());
        }
        if let Some(v) = &self.published_name {
            application.published_name = Some(v.clone());
        }
        if let Some(v) = self.enabled {
            application.enabled = v;
        }
        if let Some(v) = self.visible {
            application.visible = v;
        }
    }
}

/// Everything needed to create an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    /// Administrative name (also used as the browser name)
    pub name: String,
    /// Delivery type, fixed for the application's lifetime
    pub application_type: ApplicationType,
    /// Desktop group the application is published to
    pub desktop_group_uid: u64,
    /// Remaining settings; the icon is read from `command_line_executable`
    pub settings: ApplicationPatch,
}

impl NewApplication {
    /// Executable the icon is resolved from
    pub fn executable_path(&self) -> &str {
        self.settings
            .command_line_executable
            .as_deref()
            .unwrap_or_default()
    }
}

/// Alternate principal for remote execution.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account name, e.g. `CORP\svc-citrix`
    pub username: String,
    /// Plain-text password; only ever handed to the child process environment
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Default PowerShell host.
pub const DEFAULT_POWERSHELL: &str = "powershell.exe";

/// Default broker snap-in.
pub const DEFAULT_SNAPIN: &str = "Citrix.Broker.Admin.V2";

/// How to reach the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Delivery controller to run against; `None` runs on this machine
    pub admin_address: Option<String>,
    /// PowerShell host executable
    pub powershell: String,
    /// Snap-in providing the broker cmdlets
    pub snapin: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            admin_address: None,
            powershell: DEFAULT_POWERSHELL.to_string(),
            snapin: DEFAULT_SNAPIN.to_string(),
        }
    }
}
