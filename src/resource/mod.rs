//! Resources managed by xdapp
//!
//! Every managed object implements [`declarative::Resource`]:
//! - Drift detection against the broker (test)
//! - Convergence through the broker (set)

pub mod application;

pub use application::PublishedApplication;
