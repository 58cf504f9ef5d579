//! # Declarative
//!
//! The desired-state contract shared by every managed resource.
//!
//! A resource answers three questions:
//!
//! - **Get**: what does the system look like right now?
//! - **Test**: does that match what was declared?
//! - **Set**: make it match.
//!
//! ## Core Concepts
//!
//! - **Ensure**: whether a resource should exist at all
//! - **Property**: a statically declared `(name, compare, mutability)` triple
//! - **DriftReport**: the properties that differ between desired and current state
//! - **ExecutionPlan**: the resources to converge, applied strictly in order
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     ApplyContext, ApplyResult, DriftReport, Ensure, Resource,
//! };
//!
//! #[derive(Debug)]
//! struct Marker { path: String }
//!
//! impl Resource for Marker {
//!     fn id(&self) -> String { self.path.clone() }
//!     fn description(&self) -> String { format!("Marker file {}", self.path) }
//!     fn resource_type(&self) -> &'static str { "marker" }
//!
//!     fn drift(&self) -> anyhow::Result<DriftReport> {
//!         let current = if std::path::Path::new(&self.path).exists() {
//!             Ensure::Present
//!         } else {
//!             Ensure::Absent
//!         };
//!         Ok(DriftReport::new(current, Ensure::Present))
//!     }
//!
//!     fn set(&self, ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
//!         if ctx.dry_run {
//!             return Ok(ApplyResult::Skipped { reason: "Dry run".into() });
//!         }
//!         std::fs::write(&self.path, "")?;
//!         Ok(ApplyResult::Created)
//!     }
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This keeps the crate free of any particular terminal UI.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use diff::{
    Comparison, DriftReport, ImmutablePropertyError, Mutability, Property, PropertyDiff,
    ResourceDiff, compute_diffs, evaluate,
};
pub use executor::{execute, execute_simple};
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource};
pub use types::{ApplyResult, Ensure, ExecuteOptions, ExecuteSummary};
