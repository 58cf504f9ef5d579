//! Property-level drift detection
//!
//! Each resource declares its comparable properties once, as a table of
//! [`Property`] triples. [`evaluate`] walks that table, so which fields are
//! compared and which of them may never change is fixed at compile time.

use crate::resource::{BoxedResource, Resource};
use crate::types::Ensure;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rendering used for a current value the remote side does not have
pub const NO_VALUE: &str = "<none>";

/// Whether a property can be converged in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutability {
    /// Can be updated on an existing resource
    Mutable,
    /// Fixed once the resource is created
    Immutable,
}

/// Outcome of comparing one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The caller did not declare a value; nothing to compare
    NotSupplied,
    /// Declared value matches the current value
    Equal,
    /// Declared value differs from the current value
    Differs { desired: String, current: String },
}

impl Comparison {
    /// Compare a declared value against the current one.
    ///
    /// A `None` desired value means the caller left the property unset.
    pub fn supplied<T>(desired: Option<&T>, current: Option<&T>) -> Self
    where
        T: PartialEq + fmt::Display + ?Sized,
    {
        match desired {
            None => Self::NotSupplied,
            Some(d) if current == Some(d) => Self::Equal,
            Some(d) => Self::Differs {
                desired: d.to_string(),
                current: current.map_or_else(|| NO_VALUE.to_string(), ToString::to_string),
            },
        }
    }

    /// Compare declared text against current text, ignoring ASCII case.
    ///
    /// For values the remote side treats case-insensitively, such as
    /// Windows paths.
    pub fn supplied_ignore_case(desired: Option<&str>, current: Option<&str>) -> Self {
        match (desired, current) {
            (Some(d), Some(c)) if d.eq_ignore_ascii_case(c) => Self::Equal,
            _ => Self::supplied(desired, current),
        }
    }

    /// Check if this comparison found a difference
    pub fn is_difference(&self) -> bool {
        matches!(self, Self::Differs { .. })
    }
}

/// A comparable property of a resource
///
/// `D` is the declared (desired) type, `C` the observed (current) type.
pub struct Property<D, C> {
    /// Property name as users see it
    pub name: &'static str,
    /// Whether drift on this property can be converged
    pub mutability: Mutability,
    /// Comparison between declared and observed state
    pub compare: fn(&D, &C) -> Comparison,
}

impl<D, C> Property<D, C> {
    /// A property that can be updated in place
    pub const fn mutable(name: &'static str, compare: fn(&D, &C) -> Comparison) -> Self {
        Self {
            name,
            mutability: Mutability::Mutable,
            compare,
        }
    }

    /// A property fixed at creation time
    pub const fn immutable(name: &'static str, compare: fn(&D, &C) -> Comparison) -> Self {
        Self {
            name,
            mutability: Mutability::Immutable,
            compare,
        }
    }
}

impl<D, C> fmt::Debug for Property<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("mutability", &self.mutability)
            .finish_non_exhaustive()
    }
}

/// A declared property whose current value differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDiff {
    pub name: String,
    pub desired: String,
    pub current: String,
}

/// An immutable property was declared with a value different from the current one.
///
/// This cannot be converged by an update; the resource has to be removed
/// and created again by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "property '{property}' is immutable: current value '{current}' cannot be changed to '{desired}' without removing and recreating the resource"
)]
pub struct ImmutablePropertyError {
    pub property: String,
    pub desired: String,
    pub current: String,
}

/// Compare declared state against current state, property by property.
///
/// Unset properties are skipped. The first immutable property that differs
/// aborts the evaluation.
pub fn evaluate<D, C>(
    properties: &[Property<D, C>],
    desired: &D,
    current: &C,
) -> Result<Vec<PropertyDiff>, ImmutablePropertyError> {
    let mut diffs = Vec::new();

    for property in properties {
        if let Comparison::Differs {
            desired: want,
            current: have,
        } = (property.compare)(desired, current)
        {
            if property.mutability == Mutability::Immutable {
                return Err(ImmutablePropertyError {
                    property: property.name.to_string(),
                    desired: want,
                    current: have,
                });
            }
            diffs.push(PropertyDiff {
                name: property.name.to_string(),
                desired: want,
                current: have,
            });
        }
    }

    Ok(diffs)
}

/// Drift between declared and current state of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Whether the resource currently exists
    pub current: Ensure,
    /// Whether the resource should exist
    pub desired: Ensure,
    /// Properties that differ (only meaningful when both sides are present)
    pub properties: Vec<PropertyDiff>,
}

impl DriftReport {
    /// A report with no property differences
    pub fn new(current: Ensure, desired: Ensure) -> Self {
        Self {
            current,
            desired,
            properties: Vec::new(),
        }
    }

    /// Attach property differences
    pub fn with_properties(mut self, properties: Vec<PropertyDiff>) -> Self {
        self.properties = properties;
        self
    }

    /// Check if the resource should be created
    pub fn is_addition(&self) -> bool {
        self.current.is_absent() && self.desired.is_present()
    }

    /// Check if the resource should be removed
    pub fn is_removal(&self) -> bool {
        self.current.is_present() && self.desired.is_absent()
    }

    /// Check if the resource should be updated in place
    pub fn is_modification(&self) -> bool {
        self.current.is_present() && self.desired.is_present() && !self.properties.is_empty()
    }

    /// True iff nothing needs to change
    pub fn is_in_desired_state(&self) -> bool {
        self.current == self.desired && self.properties.is_empty()
    }
}

/// Drift of a single resource, with identity for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// What differs
    pub report: DriftReport,
}

impl ResourceDiff {
    /// Create a diff from a resource, returning None if no changes needed
    pub fn from_resource(resource: &dyn Resource) -> Result<Option<Self>> {
        let report = resource.drift()?;

        if report.is_in_desired_state() {
            return Ok(None);
        }

        Ok(Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            report,
        }))
    }
}

/// Compute diffs for a list of resources
///
/// Returns only resources that are out of desired state. The first error
/// (connection failure, immutable property) is returned as-is.
pub fn compute_diffs(resources: &[BoxedResource]) -> Result<Vec<ResourceDiff>> {
    let mut diffs = Vec::new();
    for resource in resources {
        if let Some(diff) = ResourceDiff::from_resource(resource.as_ref())? {
            diffs.push(diff);
        }
    }
    Ok(diffs)
}
