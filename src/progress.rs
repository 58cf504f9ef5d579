//! Terminal progress and confirmation for xdapp.

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyResult, ConfirmCallback, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// One spinner per resource, replaced by a result line when it completes
#[derive(Default)]
pub struct SpinnerProgress {
    current: Option<ProgressBar>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_batch_start(&mut self, count: usize) {
        println!();
        println!("  {} Applying {} resource(s)...", "→".cyan(), count);
    }

    fn on_resource_start(&mut self, _id: &str, description: &str) {
        self.current = Some(spinner(description));
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        let symbol = match result {
            ApplyResult::Failed { .. } => "✗".red(),
            ApplyResult::Skipped { .. } => "○".dimmed(),
            ApplyResult::NoChange => "✓".dimmed(),
            _ => "✓".green(),
        };
        println!("    {} {:<40} {}", symbol, id, result.to_string().dimmed());
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

/// Ask on the terminal, unless `--yes` was given
pub struct TerminalConfirm {
    pub yes: bool,
}

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}
