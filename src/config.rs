use anyhow::{Context, Result, bail};
use brokerkit::{ConnectOptions, DEFAULT_POWERSHELL, DEFAULT_SNAPIN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptor::DesiredApplication;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("xdapp"))
}

/// Default config file location
pub fn default_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Alternate principal for broker calls
    #[serde(default)]
    pub credential: Option<CredentialConfig>,

    /// Declared applications, converged by `diff` and `apply`
    #[serde(default, rename = "application")]
    pub applications: Vec<DesiredApplication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Delivery controller; unset means this machine
    #[serde(default)]
    pub admin_address: Option<String>,
    #[serde(default = "default_powershell")]
    pub powershell: String,
    #[serde(default = "default_snapin")]
    pub snapin: String,
}

fn default_powershell() -> String {
    DEFAULT_POWERSHELL.to_string()
}

fn default_snapin() -> String {
    DEFAULT_SNAPIN.to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            admin_address: None,
            powershell: default_powershell(),
            snapin: default_snapin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    pub username: String,
    /// Environment variable holding the password (default: XDAPP_PASSWORD)
    #[serde(default)]
    pub password_env: Option<String>,
}

impl Config {
    /// Load the config file.
    ///
    /// An explicit path must exist. A missing default file yields an empty
    /// config, so single-application commands work without one.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let path = PathBuf::from(shellexpand::tilde(path).as_ref());
                Self::load_from(&path)
            }
            None => {
                let path = default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    log::debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for app in &self.applications {
            app.validate()?;
        }
        for (i, app) in self.applications.iter().enumerate() {
            let duplicate = self.applications[..i].iter().any(|other| {
                other.name.eq_ignore_ascii_case(&app.name)
                    && other.desktop_group.eq_ignore_ascii_case(&app.desktop_group)
            });
            if duplicate {
                bail!(
                    "application '{}' is declared twice in desktop group '{}'",
                    app.name,
                    app.desktop_group
                );
            }
        }
        Ok(())
    }

    /// Connection settings, with an optional command-line admin address
    pub fn connect_options(&self, admin_address: Option<&str>) -> ConnectOptions {
        ConnectOptions {
            admin_address: admin_address
                .map(str::to_string)
                .or_else(|| self.broker.admin_address.clone()),
            powershell: self.broker.powershell.clone(),
            snapin: self.broker.snapin.clone(),
        }
    }
}
