//! Execution engine - tests every resource, then sets the drifted ones
//!
//! Resources are handled one at a time. Two passes against the same
//! remote object are not serialized against each other; each `set`
//! re-reads current state right before acting.

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::planner::ExecutionPlan;
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, verbose)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, asked once before any change
///
/// # Returns
/// Summary of execution results
pub fn execute<P, C>(
    plan: ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut summary = ExecuteSummary::default();
    let mut drifted: Vec<&dyn Resource> = Vec::new();

    for resource in &plan.resources {
        match resource.test() {
            Ok(true) => summary.add_result(&ApplyResult::NoChange),
            Ok(false) => drifted.push(resource.as_ref()),
            Err(e) => {
                log::warn!("{}: {:#}", resource.id(), e);
                let result = ApplyResult::Failed {
                    error: format!("{e:#}"),
                };
                progress.on_resource_complete(&resource.id(), &result);
                summary.add_result(&result);
            }
        }
    }

    if drifted.is_empty() {
        return Ok(summary);
    }

    if opts.dry_run {
        for resource in drifted {
            let result = ApplyResult::Skipped {
                reason: "Dry run".into(),
            };
            progress.on_resource_complete(&resource.id(), &result);
            summary.add_result(&result);
        }
        return Ok(summary);
    }

    let prompt = format!("Apply changes to {} resource(s)?", drifted.len());
    if !confirm.confirm(&prompt)? {
        summary.skipped += drifted.len();
        return Ok(summary);
    }

    progress.on_batch_start(drifted.len());
    for resource in drifted {
        progress.on_resource_start(&resource.id(), &resource.description());
        let result = apply_resource(resource, opts.verbose);
        progress.on_resource_complete(&resource.id(), &result);
        summary.add_result(&result);
    }
    progress.on_batch_complete();

    Ok(summary)
}

/// Apply a single resource
fn apply_resource(resource: &dyn Resource, verbose: bool) -> ApplyResult {
    let mut ctx = ApplyContext::new(false, verbose);

    match resource.set(&mut ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(plan: ExecutionPlan, opts: &ExecuteOptions) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, opts, &mut NoProgress, &mut AutoConfirm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::diff::DriftReport;
    use crate::types::Ensure;
    use std::cell::Cell;

    #[derive(Debug)]
    struct TestResource {
        id: String,
        should_change: bool,
        broken: bool,
        set_calls: Cell<usize>,
    }

    impl TestResource {
        fn new(id: &str, should_change: bool) -> Self {
            Self {
                id: id.into(),
                should_change,
                broken: false,
                set_calls: Cell::new(0),
            }
        }
    }

    impl Resource for TestResource {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn description(&self) -> String {
            format!("Test resource {}", self.id)
        }

        fn resource_type(&self) -> &'static str {
            "test"
        }

        fn drift(&self) -> Result<DriftReport> {
            if self.broken {
                anyhow::bail!("session could not be established");
            }
            if self.should_change {
                Ok(DriftReport::new(Ensure::Absent, Ensure::Present))
            } else {
                Ok(DriftReport::new(Ensure::Present, Ensure::Present))
            }
        }

        fn set(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
            if ctx.dry_run {
                return Ok(ApplyResult::Skipped {
                    reason: "Dry run".into(),
                });
            }
            self.set_calls.set(self.set_calls.get() + 1);
            Ok(ApplyResult::Created)
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let result = execute_simple(ExecutionPlan::new(), &ExecuteOptions::default()).unwrap();
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn test_execute_no_changes() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", false)));

        let result = execute_simple(plan, &ExecuteOptions::default()).unwrap();

        assert_eq!(result.no_change, 1);
        assert_eq!(result.total_changes(), 0);
    }

    #[test]
    fn test_execute_with_changes() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", true)));
        plan.add_resource(Box::new(TestResource::new("test2", false)));

        let result = execute(
            plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(result.created, 1);
        assert_eq!(result.no_change, 1);
    }

    #[test]
    fn test_execute_dry_run_skips_drifted() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", true)));

        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = execute_simple(plan, &opts).unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.total_changes(), 0);
    }

    #[test]
    fn test_execute_declined() {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(TestResource::new("test1", true)));

        let result = execute(
            plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.created, 0);
    }

    #[test]
    fn test_execute_records_test_failures() {
        let mut broken = TestResource::new("broken", true);
        broken.broken = true;

        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(broken));
        plan.add_resource(Box::new(TestResource::new("ok", true)));

        let result = execute_simple(plan, &ExecuteOptions::default()).unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.created, 1);
        assert!(!result.is_success());
    }
}
