//! In-process broker.
//!
//! Keeps desktop groups and applications in memory and records every call,
//! so callers can assert on exactly which operations reached the broker.

use crate::backend::Broker;
use crate::error::{Error, Result};
use crate::types::{ApplicationPatch, BrokerApplication, DesktopGroup, Located, NewApplication};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call that reached the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Locate { name: String, desktop_group: String },
    NewApplication(NewApplication),
    SetApplication { uid: u64, patch: ApplicationPatch },
    RemoveApplication(u64),
}

impl Call {
    /// Whether this call changes broker state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::NewApplication(_)
                | Self::SetApplication { .. }
                | Self::RemoveApplication(_)
        )
    }
}

#[derive(Debug, Default)]
struct State {
    groups: Vec<DesktopGroup>,
    applications: Vec<(u64, BrokerApplication)>,
    next_uid: u64,
    calls: Vec<Call>,
    offline: bool,
    iconless: HashSet<String>,
}

impl State {
    fn allocate_uid(&mut self) -> u64 {
        self.next_uid += 1;
        self.next_uid
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(Error::Connection {
                message: "broker session could not be established".to_string(),
            });
        }
        Ok(())
    }

    fn application_mut(&mut self, uid: u64, operation: &str) -> Result<&mut BrokerApplication> {
        self.applications
            .iter_mut()
            .map(|(_, app)| app)
            .find(|app| app.uid == uid)
            .ok_or_else(|| Error::Rejected {
                operation: operation.to_string(),
                message: format!("no application with Uid {uid}"),
            })
    }
}

/// Broker held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    state: Mutex<State>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a desktop group, returning its uid.
    pub fn add_desktop_group(&self, name: &str) -> u64 {
        let mut state = self.lock();
        let uid = state.allocate_uid();
        state.groups.push(DesktopGroup {
            uid,
            name: name.to_string(),
        });
        uid
    }

    /// Builder form of [`Self::add_desktop_group`].
    pub fn with_desktop_group(self, name: &str) -> Self {
        self.add_desktop_group(name);
        self
    }

    /// Seed an application into an existing group, returning its uid.
    ///
    /// The `uid` of `application` is replaced.
    pub fn add_application(&self, desktop_group: &str, mut application: BrokerApplication) -> Result<u64> {
        let mut state = self.lock();
        let group_uid = state
            .groups
            .iter()
            .find(|g| g.name == desktop_group)
            .map(|g| g.uid)
            .ok_or_else(|| Error::DesktopGroupNotFound {
                name: desktop_group.to_string(),
            })?;
        let uid = state.allocate_uid();
        application.uid = uid;
        state.applications.push((group_uid, application));
        Ok(uid)
    }

    /// Change an application behind the caller's back.
    pub fn modify_application<F>(&self, uid: u64, change: F) -> Result<()>
    where
        F: FnOnce(&mut BrokerApplication),
    {
        let mut state = self.lock();
        change(state.application_mut(uid, "modify")?);
        Ok(())
    }

    /// Snapshot of an application by name and group name.
    pub fn application(&self, name: &str, desktop_group: &str) -> Option<BrokerApplication> {
        let state = self.lock();
        let group_uid = state.groups.iter().find(|g| g.name == desktop_group)?.uid;
        state
            .applications
            .iter()
            .find(|(g, app)| *g == group_uid && app.name == name)
            .map(|(_, app)| app.clone())
    }

    /// Make every call fail as if the session could not be opened.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Make icon resolution fail for an executable.
    pub fn without_icon(self, executable_path: &str) -> Self {
        self.lock().iconless.insert(executable_path.to_string());
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls that changed broker state.
    pub fn mutations(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl Broker for MemoryBroker {
    fn locate(&self, name: &str, desktop_group: &str) -> Result<Located> {
        let mut state = self.lock();
        state.check_online()?;
        state.calls.push(Call::Locate {
            name: name.to_string(),
            desktop_group: desktop_group.to_string(),
        });

        let Some(group) = state.groups.iter().find(|g| g.name == desktop_group).cloned() else {
            return Ok(Located::default());
        };
        let application = state
            .applications
            .iter()
            .find(|(g, app)| *g == group.uid && app.name == name)
            .map(|(_, app)| app.clone());
        Ok(Located {
            desktop_group: Some(group),
            application,
        })
    }

    fn new_application(&self, application: &NewApplication) -> Result<BrokerApplication> {
        let mut state = self.lock();
        state.check_online()?;
        state.calls.push(Call::NewApplication(application.clone()));

        let path = application.executable_path();
        if path.is_empty() || state.iconless.contains(path) {
            return Err(Error::Icon {
                path: path.to_string(),
                message: "file contains no icon".to_string(),
            });
        }

        if !state.groups.iter().any(|g| g.uid == application.desktop_group_uid) {
            return Err(Error::Rejected {
                operation: "New-BrokerApplication".to_string(),
                message: format!("no desktop group with Uid {}", application.desktop_group_uid),
            });
        }
        let duplicate = state.applications.iter().any(|(g, app)| {
            *g == application.desktop_group_uid && app.name == application.name
        });
        if duplicate {
            return Err(Error::Rejected {
                operation: "New-BrokerApplication".to_string(),
                message: format!("application '{}' already exists", application.name),
            });
        }

        let settings = &application.settings;
        let mut created = BrokerApplication {
            uid: state.allocate_uid(),
            name: application.name.clone(),
            command_line_executable: String::new(),
            application_type: application.application_type,
            command_line_arguments: Some(String::new()),
            working_directory: None,
            description: None,
            published_name: None,
            browser_name: Some(application.name.clone()),
            enabled: true,
            visible: true,
        };
        settings.apply_to(&mut created);
        state
            .applications
            .push((application.desktop_group_uid, created.clone()));
        Ok(created)
    }

    fn set_application(&self, uid: u64, patch: &ApplicationPatch) -> Result<()> {
        let mut state = self.lock();
        state.check_online()?;
        state.calls.push(Call::SetApplication {
            uid,
            patch: patch.clone(),
        });
        patch.apply_to(state.application_mut(uid, "Set-BrokerApplication")?);
        Ok(())
    }

    fn remove_application(&self, uid: u64) -> Result<()> {
        let mut state = self.lock();
        state.check_online()?;
        state.calls.push(Call::RemoveApplication(uid));
        state.application_mut(uid, "Remove-BrokerApplication")?;
        state.applications.retain(|(_, app)| app.uid != uid);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory broker".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApplicationType;

    fn new_notepad(group_uid: u64) -> NewApplication {
        NewApplication {
            name: "Notepad".into(),
            application_type: ApplicationType::HostedOnDesktop,
            desktop_group_uid: group_uid,
            settings: ApplicationPatch {
                command_line_executable: Some(r"C:\Windows\notepad.exe".into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_create_locate_remove() {
        let broker = MemoryBroker::new();
        let group = broker.add_desktop_group("Sales");

        let created = broker.new_application(&new_notepad(group)).unwrap();
        assert!(created.enabled && created.visible);

        let located = broker.locate("Notepad", "Sales").unwrap();
        assert_eq!(located.desktop_group.unwrap().uid, group);
        assert_eq!(located.application, Some(created.clone()));

        broker.remove_application(created.uid).unwrap();
        assert_eq!(broker.locate("Notepad", "Sales").unwrap().application, None);
    }

    #[test]
    fn test_locate_missing_group() {
        let broker = MemoryBroker::new();
        assert_eq!(broker.locate("Notepad", "Sales").unwrap(), Located::default());
        assert_eq!(broker.calls().len(), 1);
    }

    #[test]
    fn test_application_lookup_is_scoped_to_group() {
        let broker = MemoryBroker::new();
        let sales = broker.add_desktop_group("Sales");
        broker.add_desktop_group("Finance");
        broker.new_application(&new_notepad(sales)).unwrap();

        let located = broker.locate("Notepad", "Finance").unwrap();
        assert!(located.desktop_group.is_some());
        assert!(located.application.is_none());
    }

    #[test]
    fn test_duplicate_create_is_rejected() {
        let broker = MemoryBroker::new();
        let group = broker.add_desktop_group("Sales");
        broker.new_application(&new_notepad(group)).unwrap();

        let err = broker.new_application(&new_notepad(group)).unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
    }

    #[test]
    fn test_offline_fails_every_call() {
        let broker = MemoryBroker::new().with_desktop_group("Sales");
        broker.set_offline(true);

        let err = broker.locate("Notepad", "Sales").unwrap_err();
        assert!(err.is_connection());
        assert!(broker.calls().is_empty());
    }

    #[test]
    fn test_iconless_executable_creates_nothing() {
        let broker = MemoryBroker::new().without_icon(r"C:\Windows\notepad.exe");
        let group = broker.add_desktop_group("Sales");

        let err = broker.new_application(&new_notepad(group)).unwrap_err();
        assert!(matches!(err, Error::Icon { .. }));
        assert!(broker.application("Notepad", "Sales").is_none());
    }

    #[test]
    fn test_mutations_filter() {
        let broker = MemoryBroker::new();
        let group = broker.add_desktop_group("Sales");
        broker.locate("Notepad", "Sales").unwrap();
        broker.new_application(&new_notepad(group)).unwrap();

        assert_eq!(broker.calls().len(), 2);
        assert_eq!(broker.mutations().len(), 1);
    }
}
