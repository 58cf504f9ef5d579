//! Declarative commands over configured applications
//!
//! - `diff` - Preview what apply would change
//! - `apply` - Make every configured application match its declaration

use anyhow::{Result, bail};
use declarative::{ExecuteOptions, ExecutionPlan, ResourceDiff, execute};

use crate::Context;
use crate::engine::{self, differ};
use crate::progress::{SpinnerProgress, TerminalConfirm};
use crate::ui;

fn plan(ctx: &Context, target: Option<&str>) -> ExecutionPlan {
    engine::build_plan(&ctx.config.applications, &ctx.client).filter_by_target(target)
}

/// Drift of every resource in the plan.
///
/// Resources that cannot be read or converged are reported and counted
/// instead of stopping the whole diff.
fn collect_diffs(plan: &ExecutionPlan) -> (Vec<ResourceDiff>, usize) {
    let mut diffs = Vec::new();
    let mut failed = 0;

    for resource in &plan.resources {
        match ResourceDiff::from_resource(resource.as_ref()) {
            Ok(Some(diff)) => diffs.push(diff),
            Ok(None) => {}
            Err(e) => {
                failed += 1;
                ui::error(&format!("{}: {:#}", resource.id(), e));
            }
        }
    }

    (diffs, failed)
}

pub fn diff(ctx: &Context, target: Option<&str>) -> Result<()> {
    let plan = plan(ctx, target);
    if plan.is_empty() {
        ui::info("No configured applications match");
        return Ok(());
    }

    log::info!(
        "Comparing {} application(s) against {}",
        plan.total_resources(),
        ctx.client.describe()
    );

    let (diffs, failed) = collect_diffs(&plan);
    display(ctx, &diffs);

    if failed > 0 {
        bail!("{failed} application(s) could not be compared");
    }
    Ok(())
}

pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool, yes: bool) -> Result<()> {
    ui::header("Applying Configuration");

    if dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let plan = plan(ctx, target);
    if plan.is_empty() {
        ui::info("No configured applications match");
        return Ok(());
    }

    let (diffs, failed) = collect_diffs(&plan);
    display(ctx, &diffs);
    if diffs.is_empty() && failed == 0 {
        return Ok(());
    }

    let opts = ExecuteOptions {
        dry_run,
        verbose: ctx.verbose > 0,
    };
    let summary = execute(
        plan,
        &opts,
        &mut SpinnerProgress::new(),
        &mut TerminalConfirm { yes },
    )?;

    if !ctx.quiet {
        differ::print_summary(&summary);
    }

    if !summary.is_success() {
        bail!("{} application(s) failed", summary.failed);
    }
    Ok(())
}

fn display(ctx: &Context, diffs: &[ResourceDiff]) {
    if !ctx.quiet {
        differ::display_diff(diffs);
    }
}
