//! Resource trait for desired-state management
//!
//! A Resource is something that exists (or not) on a system we manage,
//! with properties we can compare and converge.

use crate::context::ApplyContext;
use crate::diff::DriftReport;
use crate::types::ApplyResult;
use anyhow::Result;
use std::fmt;

/// Core trait for declarative resources
///
/// Every resource provides:
/// - Identity (id, description, type)
/// - Drift detection (the "test" half of the contract)
/// - Convergence (the "set" half)
///
/// Reading a full typed snapshot ("get") is left to the concrete type,
/// since its shape differs per resource.
pub trait Resource: fmt::Debug {
    /// Unique identifier for this resource
    ///
    /// Stable and unique within its type, e.g. "Sales/Notepad".
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping and filtering
    fn resource_type(&self) -> &'static str;

    /// Compare declared state against the current state.
    ///
    /// Must not mutate anything. Implementations return an error when the
    /// current state cannot be read or cannot be converged at all.
    fn drift(&self) -> Result<DriftReport>;

    /// Check whether the resource is in its desired state
    fn test(&self) -> Result<bool> {
        Ok(self.drift()?.is_in_desired_state())
    }

    /// Apply changes to reach the desired state
    ///
    /// Should respect `ctx.dry_run` and return `Skipped` instead of mutating.
    fn set(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;
