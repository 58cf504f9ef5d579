//! Diff and summary display

use colored::Colorize;
use declarative::{ExecuteSummary, ResourceDiff};

/// Symbol and short state for one drifted resource
fn describe(diff: &ResourceDiff) -> (colored::ColoredString, String) {
    let report = &diff.report;
    if report.is_addition() {
        ("+".green(), "(not published)".to_string())
    } else if report.is_removal() {
        ("-".red(), "(will remove)".to_string())
    } else if report.is_modification() {
        let names: Vec<_> = report.properties.iter().map(|p| p.name.as_str()).collect();
        ("~".yellow(), names.join(", "))
    } else {
        ("?".dimmed(), String::new())
    }
}

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Diff".bold()
    );
    println!("│");
    println!("│ {}", "Published applications".bold());

    for diff in diffs {
        let (symbol, state) = describe(diff);
        println!("│   {} {:<30} {}", symbol, diff.resource_id, state.dimmed());

        for property in &diff.report.properties {
            println!(
                "│       {}: {} → {}",
                property.name.dimmed(),
                property.current.red(),
                property.desired.green()
            );
        }
    }
    println!("│");

    let additions = diffs.iter().filter(|d| d.report.is_addition()).count();
    let removals = diffs.iter().filter(|d| d.report.is_removal()).count();
    let modifications = diffs.len() - additions - removals;

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} to create, {} to update, {} to remove)",
        diffs.len().to_string().bold(),
        additions.to_string().green(),
        modifications.to_string().yellow(),
        removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display the outcome of an apply
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.total_changes() == 0 && summary.failed == 0 && summary.skipped == 0 {
        println!("  {} Everything is in desired state", "✓".green());
        return;
    }

    let mut parts = Vec::new();
    if summary.created > 0 {
        parts.push(format!("{} created", summary.created).green().to_string());
    }
    if summary.modified > 0 {
        parts.push(format!("{} modified", summary.modified).yellow().to_string());
    }
    if summary.removed > 0 {
        parts.push(format!("{} removed", summary.removed).red().to_string());
    }
    if summary.no_change > 0 {
        parts.push(format!("{} unchanged", summary.no_change).dimmed().to_string());
    }
    if summary.skipped > 0 {
        parts.push(format!("{} skipped", summary.skipped).dimmed().to_string());
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed).red().bold().to_string());
    }

    let symbol = if summary.is_success() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!("  {} {}", symbol, parts.join(", "));
}
