//! Backend abstraction for broker operations.
//!
//! The [`Broker`] trait is the whole surface this crate needs from the
//! broker administration service:
//! - PowerShell snap-in execution ([`powershell::PowerShellBroker`])
//! - An in-process broker for tests ([`memory::MemoryBroker`])

pub mod memory;
pub mod powershell;

use crate::error::Result;
use crate::types::{ApplicationPatch, BrokerApplication, Located, NewApplication};
use std::sync::Arc;

/// Broker administration operations.
///
/// Every method is one round trip to the broker. Only transport or
/// session failures and rejected changes are errors.
pub trait Broker: Send + Sync {
    /// Find a desktop group and, within it, an application, both by exact name.
    ///
    /// A missing group or application is reported as `None`, not as an error.
    fn locate(&self, name: &str, desktop_group: &str) -> Result<Located>;

    /// Register the icon of the executable and create the application with it.
    fn new_application(&self, application: &NewApplication) -> Result<BrokerApplication>;

    /// Update the `Some` fields of an application.
    fn set_application(&self, uid: u64, patch: &ApplicationPatch) -> Result<()>;

    /// Delete an application.
    fn remove_application(&self, uid: u64) -> Result<()>;

    /// Human-readable description (for logs)
    fn describe(&self) -> String;
}

impl<B: Broker + ?Sized> Broker for Arc<B> {
    fn locate(&self, name: &str, desktop_group: &str) -> Result<Located> {
        (**self).locate(name, desktop_group)
    }

    fn new_application(&self, application: &NewApplication) -> Result<BrokerApplication> {
        (**self).new_application(application)
    }

    fn set_application(&self, uid: u64, patch: &ApplicationPatch) -> Result<()> {
        (**self).set_application(uid, patch)
    }

    fn remove_application(&self, uid: u64) -> Result<()> {
        (**self).remove_application(uid)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
