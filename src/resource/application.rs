//! Published application resource - one application in one desktop group
//!
//! - [`PublishedApplication::get`] reads what the broker has (Reader)
//! - [`Resource::drift`] / [`Resource::test`] compare it with the declaration (Comparator)
//! - [`Resource::set`] creates, updates or removes it (Reconciler)

use anyhow::{Context, Result};
use brokerkit::{Client, Located};
use declarative::{
    ApplyContext, ApplyResult, Comparison, DriftReport, Ensure, Property, Resource, evaluate,
};
use std::sync::Arc;

use crate::descriptor::{ApplicationDescriptor, DesiredApplication};
use crate::messages;

type AppProperty = Property<DesiredApplication, ApplicationDescriptor>;

/// Text the broker may report as null; null and empty compare equal.
fn text(desired: Option<&str>, current: Option<&str>) -> Comparison {
    Comparison::supplied(desired, Some(current.unwrap_or_default()))
}

/// Comparable properties, in reporting order.
///
/// Name and desktop group identify the application and are never compared.
fn properties() -> [AppProperty; 8] {
    [
        Property::mutable("Path", |d: &DesiredApplication, c: &ApplicationDescriptor| {
            Comparison::supplied_ignore_case(Some(d.path.as_str()), c.path.as_deref())
        }),
        Property::immutable(
            "ApplicationType",
            |d: &DesiredApplication, c: &ApplicationDescriptor| {
                // an omitted type means the default one a create would use
                let desired = d.application_type.unwrap_or_default();
                Comparison::supplied(Some(&desired), c.application_type.as_ref())
            },
        ),
        Property::mutable("Arguments", |d: &DesiredApplication, c: &ApplicationDescriptor| {
            text(d.arguments.as_deref(), c.arguments.as_deref())
        }),
        Property::mutable(
            "WorkingDirectory",
            |d: &DesiredApplication, c: &ApplicationDescriptor| {
                Comparison::supplied_ignore_case(
                    d.working_directory.as_deref(),
                    Some(c.working_directory.as_deref().unwrap_or_default()),
                )
            },
        ),
        Property::mutable(
            "Description",
            |d: &DesiredApplication, c: &ApplicationDescriptor| {
                text(d.description.as_deref(), c.description.as_deref())
            },
        ),
        Property::mutable(
            "DisplayName",
            |d: &DesiredApplication, c: &ApplicationDescriptor| {
                text(d.display_name.as_deref(), c.display_name.as_deref())
            },
        ),
        Property::mutable("Enabled", |d: &DesiredApplication, c: &ApplicationDescriptor| {
            Comparison::supplied(d.enabled.as_ref(), c.enabled.as_ref())
        }),
        Property::mutable("Visible", |d: &DesiredApplication, c: &ApplicationDescriptor| {
            Comparison::supplied(d.visible.as_ref(), c.visible.as_ref())
        }),
    ]
}

/// A published application, declared and bound to a broker client
#[derive(Debug)]
pub struct PublishedApplication {
    desired: DesiredApplication,
    client: Arc<Client>,
}

impl PublishedApplication {
    pub fn new(desired: DesiredApplication, client: Arc<Client>) -> Self {
        Self { desired, client }
    }

    /// Read the application's current state.
    ///
    /// A missing desktop group or application yields `Ensure::Absent`;
    /// only a failed broker session is an error.
    pub fn get(&self) -> Result<ApplicationDescriptor> {
        self.read().map(|(_, descriptor)| descriptor)
    }

    fn read(&self) -> Result<(Located, ApplicationDescriptor)> {
        self.desired.validate_identity()?;

        let located = self
            .client
            .locate(&self.desired.name, &self.desired.desktop_group)
            .with_context(|| format!("Failed to read {}", self.id()))?;

        let descriptor = match &located.application {
            Some(application) => {
                ApplicationDescriptor::from_broker(&self.desired.desktop_group, application)
            }
            None => ApplicationDescriptor::absent(&self.desired.name, &self.desired.desktop_group),
        };

        Ok((located, descriptor))
    }

    /// Property differences between the declaration and a present application.
    ///
    /// Fails if the declaration changes an immutable property.
    fn property_drift(&self, current: &ApplicationDescriptor) -> Result<Vec<declarative::PropertyDiff>> {
        evaluate(&properties(), &self.desired, current)
            .with_context(|| format!("{} cannot be converged", self.id()))
    }
}

impl Resource for PublishedApplication {
    fn id(&self) -> String {
        format!("{}/{}", self.desired.desktop_group, self.desired.name)
    }

    fn description(&self) -> String {
        match self.desired.ensure {
            Ensure::Present => format!(
                "Publish {} ({}) in {}",
                self.desired.name, self.desired.path, self.desired.desktop_group
            ),
            Ensure::Absent => format!(
                "Remove {} from {}",
                self.desired.name, self.desired.desktop_group
            ),
        }
    }

    fn resource_type(&self) -> &'static str {
        "application"
    }

    fn drift(&self) -> Result<DriftReport> {
        self.desired.validate()?;
        let id = self.id();
        let current = self.get()?;
        let mut report = DriftReport::new(current.ensure, self.desired.ensure);

        if current.ensure != self.desired.ensure {
            log::info!(
                "{}",
                messages::ensure_mismatch(&id, self.desired.ensure, current.ensure)
            );
        } else if current.ensure.is_present() {
            let diffs = self.property_drift(&current)?;
            for diff in &diffs {
                log::info!("{}", messages::property_mismatch(&id, diff));
            }
            report = report.with_properties(diffs);
        }

        if report.is_in_desired_state() {
            log::debug!("{}", messages::in_desired_state(&id));
        }
        Ok(report)
    }

    fn set(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        self.desired.validate()?;
        let id = self.id();
        let (located, current) = self.read()?;

        match (located.application, self.desired.ensure) {
            (Some(application), Ensure::Present) => {
                self.property_drift(&current)?;
                log::info!("{}", messages::updating(&id, &application));
                if ctx.dry_run {
                    return Ok(ApplyResult::Skipped {
                        reason: "Dry run: would update".into(),
                    });
                }
                self.client
                    .set_application(application.uid, &self.desired.patch())
                    .with_context(|| format!("Failed to update {id}"))?;
                Ok(ApplyResult::Modified)
            }
            (Some(application), Ensure::Absent) => {
                log::info!("{}", messages::removing(&id, &application));
                if ctx.dry_run {
                    return Ok(ApplyResult::Skipped {
                        reason: "Dry run: would remove".into(),
                    });
                }
                self.client
                    .remove_application(application.uid)
                    .with_context(|| format!("Failed to remove {id}"))?;
                Ok(ApplyResult::Removed)
            }
            (None, Ensure::Present) => {
                let Some(group) = located.desktop_group else {
                    log::warn!(
                        "{}",
                        messages::desktop_group_missing(&id, &self.desired.desktop_group)
                    );
                    return Err(brokerkit::Error::DesktopGroupNotFound {
                        name: self.desired.desktop_group.clone(),
                    })
                    .with_context(|| format!("Cannot create {id}"));
                };
                log::info!("{}", messages::creating(&id, &self.desired.path));
                if ctx.dry_run {
                    return Ok(ApplyResult::Skipped {
                        reason: "Dry run: would create".into(),
                    });
                }
                self.client
                    .new_application(&self.desired.new_application(group.uid))
                    .with_context(|| format!("Failed to create {id}"))?;
                Ok(ApplyResult::Created)
            }
            (None, Ensure::Absent) => {
                log::debug!("{}", messages::already_absent(&id));
                Ok(ApplyResult::NoChange)
            }
        }
    }
}
