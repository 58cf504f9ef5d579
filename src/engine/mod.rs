//! Execution engine for xdapp
//!
//! 1. Planning - one resource per declared application
//! 2. Diffing - current vs desired state, shown before any change
//! 3. Executing - delegated to [`declarative::execute`]

pub mod differ;

use brokerkit::Client;
use declarative::ExecutionPlan;
use std::sync::Arc;

use crate::descriptor::DesiredApplication;
use crate::resource::PublishedApplication;

/// Build a plan from declared applications, in declaration order
pub fn build_plan(applications: &[DesiredApplication], client: &Arc<Client>) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new();
    for desired in applications {
        plan.add_resource(Box::new(PublishedApplication::new(
            desired.clone(),
            Arc::clone(client),
        )));
    }
    plan
}
