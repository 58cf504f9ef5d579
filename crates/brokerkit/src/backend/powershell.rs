//! Broker backend driving the Citrix PowerShell snap-in.

use crate::backend::Broker;
use crate::channel::RemoteChannel;
use crate::error::{Error, Result};
use crate::script::{Invocation, emit_json, literal_name};
use crate::types::{ApplicationPatch, BrokerApplication, Located, NewApplication};
use serde::de::DeserializeOwned;

/// Prefix marking an icon failure in stderr, so it is not taken for a rejected create.
const ICON_FAILURE: &str = "Icon resolution failed:";

/// Properties selected from application records.
///
/// `ApplicationType` is an enum on the broker side; it is stringified so
/// the JSON carries its name rather than its numeric value.
const APPLICATION_PROPERTIES: &str = "Uid, Name, CommandLineExecutable, \
    @{ Name = 'ApplicationType'; Expression = { [string]$_.ApplicationType } }, \
    CommandLineArguments, WorkingDirectory, Description, PublishedName, BrowserName, \
    Enabled, Visible";

/// Backend that runs broker cmdlets through a [`RemoteChannel`].
pub struct PowerShellBroker {
    channel: Box<dyn RemoteChannel>,
}

impl PowerShellBroker {
    pub fn new(channel: Box<dyn RemoteChannel>) -> Self {
        Self { channel }
    }

    /// Run a script and parse its JSON output, treating no output as no record.
    fn query<T: DeserializeOwned>(&self, operation: &str, script: &str) -> Result<Option<T>> {
        let stdout = self.channel.invoke(operation, script)?;
        parse_optional(operation, &stdout)
    }
}

/// Script looking up a desktop group and an application in it.
///
/// Always emits one `{DesktopGroup, Application}` object; either member is
/// null when it does not exist.
pub fn locate_script(name: &str, desktop_group: &str) -> String {
    let group_lookup = Invocation::new("Get-BrokerDesktopGroup")
        .expression("Name", literal_name(desktop_group))
        .expression("ErrorAction", "SilentlyContinue".into())
        .render();
    let application_lookup = Invocation::new("Get-BrokerApplication")
        .expression("Name", literal_name(name))
        .expression("AssociatedDesktopGroupUid", "($group.Uid)".into())
        .expression("ErrorAction", "SilentlyContinue".into())
        .render();
    format!(
        "$group = {group_lookup} | Select-Object -First 1 -Property Uid, Name; \
         $application = $null; \
         if ($group) {{ $application = {application_lookup} | Select-Object -First 1 -Property {APPLICATION_PROPERTIES} }}; \
         [pscustomobject]@{{ DesktopGroup = $group; Application = $application }} | ConvertTo-Json -Compress -Depth 3"
    )
}

/// Script registering the executable's icon and creating an application with it.
pub fn new_application_script(application: &NewApplication) -> String {
    let read_icon = Invocation::new("Get-BrokerIcon")
        .string("FileName", application.executable_path())
        .number("Index", 0)
        .render();
    let create = with_settings(
        Invocation::new("New-BrokerApplication")
            .string("Name", &application.name)
            .string("BrowserName", &application.name)
            .string("ApplicationType", application.application_type.as_str())
            .number("DesktopGroup", application.desktop_group_uid)
            .expression("IconUid", "($icon.Uid)".into()),
        &application.settings,
    )
    .render();
    let created = emit_json(&format!(
        "{create} | Select-Object -Property {APPLICATION_PROPERTIES}"
    ));
    format!(
        "try {{ $icon = {read_icon} | New-BrokerIcon }} catch {{ throw \"{ICON_FAILURE} $($_.Exception.Message)\" }}; \
         if (-not $icon) {{ throw '{ICON_FAILURE} no icon returned' }}; \
         {created}"
    )
}

/// Script updating an application in place.
pub fn set_application_script(uid: u64, patch: &ApplicationPatch) -> String {
    let target = Invocation::new("Get-BrokerApplication").number("Uid", uid).render();
    let update = with_settings(Invocation::new("Set-BrokerApplication"), patch).render();
    format!("{target} | {update}")
}

/// Script deleting an application.
pub fn remove_application_script(uid: u64) -> String {
    let target = Invocation::new("Get-BrokerApplication").number("Uid", uid).render();
    format!("{target} | Remove-BrokerApplication")
}

fn with_settings(invocation: Invocation, patch: &ApplicationPatch) -> Invocation {
    invocation
        .opt_string("CommandLineExecutable", patch.command_line_executable.as_deref())
        .opt_string("CommandLineArguments", patch.command_line_arguments.as_deref())
        .opt_string("WorkingDirectory", patch.working_directory.as_deref())
        .opt_string("Description", patch.description.as_deref())
        .opt_string("PublishedName", patch.published_name.as_deref())
        .opt_bool("Enabled", patch.enabled)
        .opt_bool("Visible", patch.visible)
}

fn parse_optional<T: DeserializeOwned>(operation: &str, stdout: &str) -> Result<Option<T>> {
    if stdout.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(stdout)
        .map(Some)
        .map_err(|e| Error::Protocol {
            operation: operation.to_string(),
            message: e.to_string(),
        })
}

fn no_output(operation: &str) -> Error {
    Error::Protocol {
        operation: operation.to_string(),
        message: "no output returned".to_string(),
    }
}

impl Broker for PowerShellBroker {
    fn locate(&self, name: &str, desktop_group: &str) -> Result<Located> {
        let operation = "Get-BrokerApplication";
        let located: Located = self
            .query(operation, &locate_script(name, desktop_group))?
            .ok_or_else(|| no_output(operation))?;
        if located.desktop_group.is_none() {
            log::debug!("desktop group '{desktop_group}' not found");
        }
        Ok(located)
    }

    fn new_application(&self, application: &NewApplication) -> Result<BrokerApplication> {
        let operation = "New-BrokerApplication";
        let path = application.executable_path();
        if path.is_empty() {
            return Err(Error::Icon {
                path: String::new(),
                message: "no executable path given".to_string(),
            });
        }

        self.query(operation, &new_application_script(application))
            .map_err(|e| match e {
                Error::Rejected { message, .. } if message.contains(ICON_FAILURE) => Error::Icon {
                    path: path.to_string(),
                    message: message.replacen(ICON_FAILURE, "", 1).trim().to_string(),
                },
                other => other,
            })?
            .ok_or_else(|| no_output(operation))
    }

    fn set_application(&self, uid: u64, patch: &ApplicationPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.channel
            .invoke("Set-BrokerApplication", &set_application_script(uid, patch))?;
        Ok(())
    }

    fn remove_application(&self, uid: u64) -> Result<()> {
        self.channel
            .invoke("Remove-BrokerApplication", &remove_application_script(uid))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.channel.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::types::ApplicationType;
    use std::sync::{Arc, Mutex};

    const NOTEPAD_JSON: &str = r#"{"Uid":7,"Name":"Notepad","CommandLineExecutable":"C:\\Windows\\notepad.exe","ApplicationType":"HostedOnDesktop","CommandLineArguments":"","WorkingDirectory":null,"Description":null,"PublishedName":"Notepad","BrowserName":"Notepad","Enabled":true,"Visible":true}"#;

    type Scripts = Arc<Mutex<Vec<String>>>;

    /// Channel replaying canned output and remembering every script it ran
    struct CannedChannel {
        output: std::result::Result<String, String>,
        scripts: Scripts,
    }

    impl RemoteChannel for CannedChannel {
        fn invoke(&self, operation: &str, script: &str) -> Result<String> {
            self.scripts.lock().unwrap().push(script.to_string());
            match &self.output {
                Ok(out) => Ok(out.clone()),
                Err(stderr) => Err(Error::from_remote_output(stderr, operation)),
            }
        }

        fn describe(&self) -> String {
            "canned".into()
        }
    }

    fn broker(output: std::result::Result<&str, &str>) -> (PowerShellBroker, Scripts) {
        let scripts = Scripts::default();
        let channel = CannedChannel {
            output: output.map(str::to_string).map_err(str::to_string),
            scripts: Arc::clone(&scripts),
        };
        (PowerShellBroker::new(Box::new(channel)), scripts)
    }

    fn new_notepad(path: &str) -> NewApplication {
        NewApplication {
            name: "Notepad".into(),
            application_type: ApplicationType::HostedOnDesktop,
            desktop_group_uid: 3,
            settings: ApplicationPatch {
                command_line_executable: Some(path.into()),
                enabled: Some(true),
                visible: Some(true),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_locate_script() {
        let script = locate_script("Notepad", "Sales*");
        assert!(script.contains("Get-BrokerDesktopGroup -Name ([WildcardPattern]::Escape('Sales*'))"));
        assert!(script.contains("Select-Object -First 1 -Property Uid, Name"));
        assert!(script.contains(
            "Get-BrokerApplication -Name ([WildcardPattern]::Escape('Notepad')) -AssociatedDesktopGroupUid ($group.Uid)"
        ));
        assert!(script.contains("[string]$_.ApplicationType"));
        assert!(script.contains("DesktopGroup = $group; Application = $application"));
    }

    #[test]
    fn test_locate_is_one_round_trip() {
        let json = format!(r#"{{"DesktopGroup":{{"Uid":4,"Name":"Sales"}},"Application":{NOTEPAD_JSON}}}"#);
        let (broker, scripts) = broker(Ok(&json));

        let located = broker.locate("Notepad", "Sales").unwrap();

        assert_eq!(scripts.lock().unwrap().len(), 1);
        assert_eq!(located.desktop_group.unwrap().uid, 4);
        let application = located.application.unwrap();
        assert_eq!(application.uid, 7);
        assert_eq!(application.command_line_executable, r"C:\Windows\notepad.exe");
    }

    #[test]
    fn test_locate_missing_application() {
        let (broker, _) = broker(Ok(r#"{"DesktopGroup":{"Uid":4,"Name":"Sales"},"Application":null}"#));

        let located = broker.locate("Notepad", "Sales").unwrap();

        assert!(located.desktop_group.is_some());
        assert!(located.application.is_none());
    }

    #[test]
    fn test_locate_missing_group() {
        let (broker, _) = broker(Ok(r#"{"DesktopGroup":null,"Application":null}"#));
        assert_eq!(broker.locate("Notepad", "Sales").unwrap(), Located::default());
    }

    #[test]
    fn test_locate_without_output_is_protocol_error() {
        let (broker, _) = broker(Ok(""));
        let err = broker.locate("Notepad", "Sales").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_malformed_output_is_protocol_error() {
        let (broker, _) = broker(Ok("WARNING: not json"));
        let err = broker.locate("Notepad", "Sales").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_connection_failure_propagates() {
        let (broker, _) = broker(Err("Connecting to remote server ddc01 failed"));
        let err = broker.locate("Notepad", "Sales").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_new_application_script() {
        let script = new_application_script(&new_notepad(r"C:\Windows\notepad.exe"));

        assert!(script.contains(
            r"$icon = Get-BrokerIcon -FileName 'C:\Windows\notepad.exe' -Index 0 | New-BrokerIcon"
        ));
        assert!(script.contains(
            r"New-BrokerApplication -Name 'Notepad' -BrowserName 'Notepad' -ApplicationType 'HostedOnDesktop' -DesktopGroup 3 -IconUid ($icon.Uid) -CommandLineExecutable 'C:\Windows\notepad.exe' -Enabled $true -Visible $true"
        ));
        assert!(!script.contains("-Description"));
    }

    #[test]
    fn test_create_is_one_round_trip() {
        let (broker, scripts) = broker(Ok(NOTEPAD_JSON));

        let created = broker
            .new_application(&new_notepad(r"C:\Windows\notepad.exe"))
            .unwrap();

        assert_eq!(created.uid, 7);
        assert_eq!(scripts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_icon_failure_is_icon_error() {
        let (broker, _) = broker(Err("Icon resolution failed: Cannot find file"));
        let err = broker
            .new_application(&new_notepad(r"C:\missing.exe"))
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Icon);
        assert!(err.to_string().contains("Cannot find file"));
    }

    #[test]
    fn test_create_rejection_is_not_an_icon_error() {
        let (broker, _) = broker(Err("New-BrokerApplication : The name is already in use"));
        let err = broker
            .new_application(&new_notepad(r"C:\Windows\notepad.exe"))
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Rejected);
    }

    #[test]
    fn test_create_without_path_makes_no_call() {
        let (broker, scripts) = broker(Ok(NOTEPAD_JSON));
        let err = broker.new_application(&new_notepad("")).unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Icon);
        assert!(scripts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_application_script_is_partial() {
        let script = set_application_script(
            5,
            &ApplicationPatch {
                command_line_arguments: Some("/A".into()),
                ..Default::default()
            },
        );
        assert_eq!(
            script,
            "Get-BrokerApplication -Uid 5 | Set-BrokerApplication -CommandLineArguments '/A'"
        );
    }

    #[test]
    fn test_empty_patch_skips_remote_call() {
        let (broker, scripts) = broker(Err("unreachable"));
        broker.set_application(5, &ApplicationPatch::default()).unwrap();
        assert!(scripts.lock().unwrap().is_empty());
    }
}
