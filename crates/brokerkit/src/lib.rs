//! # brokerkit
//!
//! Client for the Citrix broker administration service.
//!
//! This crate provides:
//! - Typed desktop group and application records
//! - A [`Broker`](backend::Broker) trait covering lookups and
//!   create/update/delete of published applications
//! - Remote execution channels, direct or under alternate credentials
//! - A PowerShell snap-in backend and an in-memory backend
//!
//! ## Example
//!
//! ```no_run
//! use brokerkit::{Client, ConnectOptions};
//!
//! let options = ConnectOptions {
//!     admin_address: Some("ddc01.corp.local".into()),
//!     ..Default::default()
//! };
//! let client = Client::connect(options, None);
//!
//! let located = client.locate("Notepad", "Sales").expect("broker unreachable");
//! match located.application {
//!     Some(app) => println!("{} -> {}", app.name, app.command_line_executable),
//!     None => println!("not published"),
//! }
//! ```
//!
//! ## No retries
//!
//! Every call is made exactly once. Failures surface unchanged, categorized
//! by [`ErrorCategory`].

#![warn(clippy::all)]

pub mod backend;
pub mod channel;
pub mod error;
pub mod script;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{
    ApplicationPatch, ApplicationType, BrokerApplication, ConnectOptions, Credential,
    DEFAULT_POWERSHELL, DEFAULT_SNAPIN, DesktopGroup, Located, NewApplication,
};

use backend::{Broker, powershell::PowerShellBroker};
use std::fmt;

/// High-level client for broker operations.
pub struct Client {
    backend: Box<dyn Broker>,
}

impl Client {
    /// Create a client driving the broker snap-in.
    ///
    /// With a credential, every call runs under that principal.
    pub fn connect(options: ConnectOptions, credential: Option<Credential>) -> Self {
        let channel = channel::open_channel(options, credential);
        Self {
            backend: Box::new(PowerShellBroker::new(channel)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Broker>) -> Self {
        Self { backend }
    }

    /// Where calls go (for logs)
    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Find an application by name within a named desktop group.
    ///
    /// A missing group or a missing application is not an error; the
    /// corresponding field is `None`. Session failures are returned as-is.
    pub fn locate(&self, name: &str, desktop_group: &str) -> Result<Located> {
        self.backend.locate(name, desktop_group)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create an application, registering the icon of its executable.
    ///
    /// Fails with [`Error::Icon`] before anything is created when the icon
    /// cannot be resolved.
    pub fn new_application(&self, application: &NewApplication) -> Result<BrokerApplication> {
        self.backend.new_application(application)
    }

    /// Update the `Some` fields of an application.
    pub fn set_application(&self, uid: u64, patch: &ApplicationPatch) -> Result<()> {
        self.backend.set_application(uid, patch)
    }

    /// Delete an application.
    pub fn remove_application(&self, uid: u64) -> Result<()> {
        self.backend.remove_application(uid)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("backend", &self.backend.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::memory::{Call, MemoryBroker};
    use std::sync::Arc;

    fn sample_application() -> BrokerApplication {
        BrokerApplication {
            uid: 0,
            name: "Notepad".into(),
            command_line_executable: r"C:\Windows\notepad.exe".into(),
            application_type: ApplicationType::HostedOnDesktop,
            command_line_arguments: Some(String::new()),
            working_directory: None,
            description: None,
            published_name: Some("Notepad".into()),
            browser_name: Some("Notepad".into()),
            enabled: true,
            visible: true,
        }
    }

    #[test]
    fn test_locate_is_a_single_call() {
        let broker = Arc::new(MemoryBroker::new());
        let client = Client::with_backend(Box::new(Arc::clone(&broker)));

        let located = client.locate("Notepad", "Sales").unwrap();

        assert_eq!(located, Located::default());
        assert_eq!(
            broker.calls(),
            vec![Call::Locate {
                name: "Notepad".into(),
                desktop_group: "Sales".into(),
            }]
        );
    }

    #[test]
    fn test_locate_missing_application() {
        let broker = Arc::new(MemoryBroker::new().with_desktop_group("Sales"));
        let client = Client::with_backend(Box::new(Arc::clone(&broker)));

        let located = client.locate("Notepad", "Sales").unwrap();

        assert!(located.desktop_group.is_some());
        assert!(located.application.is_none());
    }

    #[test]
    fn test_locate_found() {
        let broker = Arc::new(MemoryBroker::new().with_desktop_group("Sales"));
        broker.add_application("Sales", sample_application()).unwrap();
        let client = Client::with_backend(Box::new(Arc::clone(&broker)));

        let located = client.locate("Notepad", "Sales").unwrap();

        assert_eq!(located.application.unwrap().name, "Notepad");
    }

    #[test]
    fn test_locate_propagates_connection_failure() {
        let broker = Arc::new(MemoryBroker::new());
        broker.set_offline(true);
        let client = Client::with_backend(Box::new(Arc::clone(&broker)));

        let err = client.locate("Notepad", "Sales").unwrap_err();
        assert!(err.is_connection());
    }

    #[test]
    fn test_client_debug_names_backend() {
        let client = Client::with_backend(Box::new(MemoryBroker::new()));
        assert!(format!("{client:?}").contains("in-memory broker"));
    }
}
