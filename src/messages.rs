//! User-facing diagnostic messages
//!
//! All trace and error text about applications is produced here so the
//! wording stays consistent between commands.

use brokerkit::BrokerApplication;
use declarative::{Ensure, PropertyDiff};

pub fn property_mismatch(id: &str, diff: &PropertyDiff) -> String {
    format!(
        "{id}: property '{}' is not in desired state (expected '{}', actual '{}')",
        diff.name, diff.desired, diff.current
    )
}

pub fn ensure_mismatch(id: &str, desired: Ensure, current: Ensure) -> String {
    format!("{id}: expected Ensure={desired}, actual Ensure={current}")
}

pub fn in_desired_state(id: &str) -> String {
    format!("{id}: in desired state")
}

pub fn creating(id: &str, path: &str) -> String {
    format!("{id}: creating application for '{path}'")
}

pub fn updating(id: &str, application: &BrokerApplication) -> String {
    format!("{id}: updating application (Uid {})", application.uid)
}

pub fn removing(id: &str, application: &BrokerApplication) -> String {
    format!("{id}: removing application (Uid {})", application.uid)
}

pub fn already_absent(id: &str) -> String {
    format!("{id}: application is absent as declared; nothing to remove")
}

pub fn desktop_group_missing(id: &str, desktop_group: &str) -> String {
    format!("{id}: desktop group '{desktop_group}' does not exist")
}
