//! Alternate credential for broker calls
//!
//! The password is never read from the command line or the config file:
//! 1. The config names an environment variable (default `XDAPP_PASSWORD`)
//! 2. If it is unset, the user is prompted once, without echo
//! 3. The password lives only in memory and in the PowerShell child's environment

use anyhow::{Context, Result};
use brokerkit::Credential;

use crate::config::CredentialConfig;

/// Variable read when the config does not name one
pub const DEFAULT_PASSWORD_ENV: &str = "XDAPP_PASSWORD";

/// Resolve the credential from config, environment and an interactive prompt.
///
/// Returns `None` when no username is configured or given on the command line.
pub fn resolve(config: Option<&CredentialConfig>, username: Option<&str>) -> Result<Option<Credential>> {
    resolve_with(
        config,
        username,
        |name| std::env::var(name).ok(),
        prompt_password,
    )
}

/// [`resolve`] with injectable environment lookup and prompt
pub fn resolve_with<E, P>(
    config: Option<&CredentialConfig>,
    username: Option<&str>,
    env: E,
    prompt: P,
) -> Result<Option<Credential>>
where
    E: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Result<String>,
{
    let Some(username) = username.or(config.map(|c| c.username.as_str())) else {
        return Ok(None);
    };

    let variable = config
        .and_then(|c| c.password_env.as_deref())
        .unwrap_or(DEFAULT_PASSWORD_ENV);

    let password = match env(variable).filter(|p| !p.is_empty()) {
        Some(password) => {
            log::debug!("Using password for {username} from ${variable}");
            password
        }
        None => prompt(username)?,
    };

    Ok(Some(Credential::new(username, password)))
}

fn prompt_password(username: &str) -> Result<String> {
    eprintln!();
    eprintln!("  Broker calls will run as {username}");
    eprintln!();

    dialoguer::Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()
        .context("Failed to read password")
}
