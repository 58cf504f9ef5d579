//! Remote execution channels.
//!
//! A channel runs one unit of work (a PowerShell script using the broker
//! snap-in) and hands back its standard output. Whether that happens under
//! the caller's own identity or an alternate principal is decided once, by
//! [`open_channel`], so scripts never need to know.

use crate::error::{Error, Result};
use crate::script::quote;
use crate::types::{ConnectOptions, Credential};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

/// Environment variable carrying the alternate password to the child process
pub const PASSWORD_ENV: &str = "XDAPP_REMOTE_PASSWORD";

/// Executes broker scripts.
pub trait RemoteChannel: Send + Sync {
    /// Run `script` and return its standard output.
    ///
    /// `operation` names the cmdlet being driven, for error reporting.
    fn invoke(&self, operation: &str, script: &str) -> Result<String>;

    /// Human-readable description (for logs)
    fn describe(&self) -> String;
}

/// Runs scripts as the current user, locally or on the admin address.
#[derive(Debug, Clone)]
pub struct DirectChannel {
    options: ConnectOptions,
}

impl DirectChannel {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }

    /// The full script handed to PowerShell
    pub fn wrap(&self, script: &str) -> String {
        let body = snapin_body(&self.options.snapin, script);
        let work = match &self.options.admin_address {
            Some(address) => format!(
                "Invoke-Command -ComputerName {} -ErrorAction Stop -ScriptBlock {{ {body} }}",
                quote(address)
            ),
            None => body,
        };
        guarded(&work)
    }
}

impl RemoteChannel for DirectChannel {
    fn invoke(&self, operation: &str, script: &str) -> Result<String> {
        run_powershell(&self.options.powershell, &self.wrap(script), None, operation)
    }

    fn describe(&self) -> String {
        match &self.options.admin_address {
            Some(address) => format!("broker on {address}"),
            None => "local broker".to_string(),
        }
    }
}

/// Runs scripts under an alternate principal.
///
/// The password never appears on a command line; it reaches PowerShell
/// through [`PASSWORD_ENV`] in the child's environment only.
#[derive(Debug, Clone)]
pub struct CredentialedChannel {
    options: ConnectOptions,
    credential: Credential,
}

impl CredentialedChannel {
    pub fn new(options: ConnectOptions, credential: Credential) -> Self {
        Self {
            options,
            credential,
        }
    }

    /// The full script handed to PowerShell
    pub fn wrap(&self, script: &str) -> String {
        let body = snapin_body(&self.options.snapin, script);
        let computer = self
            .options
            .admin_address
            .as_deref()
            .map_or_else(|| "$env:COMPUTERNAME".to_string(), quote);
        let work = format!(
            "$secure = ConvertTo-SecureString -String $env:{PASSWORD_ENV} -AsPlainText -Force; \
             $credential = New-Object -TypeName System.Management.Automation.PSCredential -ArgumentList {}, $secure; \
             Invoke-Command -ComputerName {computer} -Credential $credential -Authentication Credssp -ErrorAction Stop -ScriptBlock {{ {body} }}",
            quote(&self.credential.username)
        );
        guarded(&work)
    }
}

impl RemoteChannel for CredentialedChannel {
    fn invoke(&self, operation: &str, script: &str) -> Result<String> {
        run_powershell(
            &self.options.powershell,
            &self.wrap(script),
            Some(&self.credential.password),
            operation,
        )
    }

    fn describe(&self) -> String {
        let target = self.options.admin_address.as_deref().unwrap_or("local broker");
        format!("{target} as {}", self.credential.username)
    }
}

/// Pick the channel for the given credential.
pub fn open_channel(
    options: ConnectOptions,
    credential: Option<Credential>,
) -> Box<dyn RemoteChannel> {
    match credential {
        Some(credential) => Box::new(CredentialedChannel::new(options, credential)),
        None => Box::new(DirectChannel::new(options)),
    }
}

/// Load the snap-in, then run the script.
fn snapin_body(snapin: &str, script: &str) -> String {
    let snapin = quote(snapin);
    format!(
        "if (-not (Get-PSSnapin -Name {snapin} -ErrorAction SilentlyContinue)) {{ Add-PSSnapin -Name {snapin} -ErrorAction Stop }}; {script}"
    )
}

/// Make any terminating error surface as stderr plus a non-zero exit code.
fn guarded(work: &str) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'; $ProgressPreference = 'SilentlyContinue'; \
         try {{ {work} }} catch {{ [Console]::Error.WriteLine($_.Exception.Message); exit 1 }}"
    )
}

fn run_powershell(
    powershell: &str,
    script: &str,
    password: Option<&str>,
    operation: &str,
) -> Result<String> {
    log::trace!("{operation}: {script}");

    let mut command = Command::new(powershell);
    command
        .args(["-NoLogo", "-NoProfile", "-NonInteractive", "-Command", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(password) = password {
        command.env(PASSWORD_ENV, password);
    }

    let mut child = command.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::PowerShellNotFound {
            path: powershell.to_string(),
        },
        _ => Error::Io(e),
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(script.as_bytes())?;
        stdin.write_all(b"\n")?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::from_remote_output(&stderr, operation));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_options() -> ConnectOptions {
        ConnectOptions {
            admin_address: Some("ddc01.corp.local".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_direct_local_runs_body_only() {
        let wrapped = DirectChannel::new(ConnectOptions::default()).wrap("Get-BrokerSite");

        assert!(wrapped.contains("Add-PSSnapin -Name 'Citrix.Broker.Admin.V2'"));
        assert!(wrapped.contains("Get-BrokerSite"));
        assert!(!wrapped.contains("Invoke-Command"));
        assert!(!wrapped.contains("-Credential"));
    }

    #[test]
    fn test_direct_remote_uses_admin_address() {
        let wrapped = DirectChannel::new(remote_options()).wrap("Get-BrokerSite");
        assert!(wrapped.contains("Invoke-Command -ComputerName 'ddc01.corp.local'"));
        assert!(!wrapped.contains("-Credential"));
    }

    #[test]
    fn test_credentialed_keeps_password_out_of_script() {
        let channel = CredentialedChannel::new(
            remote_options(),
            Credential::new(r"CORP\svc-citrix", "s3cret'pass"),
        );
        let wrapped = channel.wrap("Get-BrokerSite");

        assert!(wrapped.contains(r"-ArgumentList 'CORP\svc-citrix', $secure"));
        assert!(wrapped.contains(&format!("$env:{PASSWORD_ENV}")));
        assert!(wrapped.contains("-Credential $credential"));
        assert!(!wrapped.contains("s3cret"));
    }

    #[test]
    fn test_credentialed_without_address_targets_this_machine() {
        let channel = CredentialedChannel::new(
            ConnectOptions::default(),
            Credential::new("svc", "pw"),
        );
        assert!(channel.wrap("Get-BrokerSite").contains("-ComputerName $env:COMPUTERNAME"));
    }

    #[test]
    fn test_open_channel_selects_by_credential() {
        let direct = open_channel(remote_options(), None);
        assert_eq!(direct.describe(), "broker on ddc01.corp.local");

        let alternate = open_channel(remote_options(), Some(Credential::new("svc", "pw")));
        assert_eq!(alternate.describe(), "ddc01.corp.local as svc");
    }

    #[test]
    fn test_missing_powershell_is_connection_error() {
        let options = ConnectOptions {
            powershell: "/nonexistent/xdapp-test-powershell".into(),
            ..Default::default()
        };
        let err = DirectChannel::new(options)
            .invoke("Get-BrokerSite", "Get-BrokerSite")
            .unwrap_err();
        assert!(err.is_connection());
    }
}
