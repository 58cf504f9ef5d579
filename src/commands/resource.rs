//! Single-application commands: get, test, set

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{ApplyContext, ApplyResult, Resource};
use std::sync::Arc;

use crate::Context;
use crate::cli::{ApplicationArgs, GetArgs, SetArgs};
use crate::descriptor::{ApplicationDescriptor, DesiredApplication};
use crate::resource::PublishedApplication;
use crate::ui;

fn resource(ctx: &Context, desired: DesiredApplication) -> PublishedApplication {
    PublishedApplication::new(desired, Arc::clone(&ctx.client))
}

pub fn get(ctx: &Context, args: &GetArgs) -> Result<()> {
    let desired = DesiredApplication::new(
        &args.name,
        args.path.as_deref().unwrap_or_default(),
        &args.desktop_group,
    );
    let current = resource(ctx, desired).get()?;

    if args.json {
        let json = serde_json::to_string_pretty(&current).context("Failed to render JSON")?;
        println!("{json}");
    } else {
        show(&current);
    }
    Ok(())
}

fn show(current: &ApplicationDescriptor) {
    ui::header(&format!("{} ({})", current.name, current.desktop_group_name));
    ui::kv("Ensure", &current.ensure.to_string());
    if current.ensure.is_absent() {
        return;
    }

    let flag = |value: Option<bool>| value.map(|v| v.to_string());
    ui::kv("Path", &ui::or_none(current.path.as_deref()));
    ui::kv(
        "ApplicationType",
        &ui::or_none(current.application_type.map(|t| t.as_str())),
    );
    ui::kv("Arguments", &ui::or_none(current.arguments.as_deref()));
    ui::kv("WorkingDirectory", &ui::or_none(current.working_directory.as_deref()));
    ui::kv("Description", &ui::or_none(current.description.as_deref()));
    ui::kv("DisplayName", &ui::or_none(current.display_name.as_deref()));
    ui::kv("Enabled", &ui::or_none(flag(current.enabled).as_deref()));
    ui::kv("Visible", &ui::or_none(flag(current.visible).as_deref()));
}

/// Returns whether the application is in its declared state
pub fn test(ctx: &Context, args: &ApplicationArgs) -> Result<bool> {
    let resource = resource(ctx, args.to_desired());
    let in_state = resource.test()?;

    if !ctx.quiet {
        if in_state {
            ui::success(&format!("{} is in desired state", resource.id()));
        } else {
            ui::warn(&format!("{} is not in desired state", resource.id()));
        }
    }
    Ok(in_state)
}

pub fn set(ctx: &Context, args: &SetArgs) -> Result<()> {
    let resource = resource(ctx, args.application.to_desired());
    let mut apply_ctx = ApplyContext::new(args.dry_run, ctx.verbose > 0);

    let result = resource.set(&mut apply_ctx)?;

    if !ctx.quiet {
        let line = format!("{}: {}", resource.id(), result);
        match result {
            ApplyResult::NoChange => println!("{} {}", "○".dimmed(), line),
            ApplyResult::Skipped { .. } => ui::info(&line),
            _ => ui::success(&line),
        }
    }
    Ok(())
}
