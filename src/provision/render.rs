//! Progress narration on stdout

use colored::Colorize;

use super::orchestrator::SetupStep;
use super::report::{Disposition, SetupReport};
use crate::state::Snapshot;

const RULE_WIDTH: usize = 60;

/// Title box printed once at the start of a run
pub fn banner(title: &str, region: &str) {
    let rule = "═".repeat(RULE_WIDTH);
    println!();
    println!("{}", rule.bright_cyan());
    println!("  {}", title.bright_cyan().bold());
    println!("  {} {}", "Region:".dimmed(), region.cyan());
    println!("{}", rule.bright_cyan());
}

pub fn step_header(step: SetupStep) {
    let header = format!("─ Step {} · {} ", step.number(), step.title());
    println!();
    println!(
        "{}{}{}",
        "┌".bright_cyan(),
        header.bright_cyan(),
        "─".repeat(RULE_WIDTH.saturating_sub(header.chars().count() + 1))
            .bright_cyan()
    );
}

pub fn done(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn reused(message: &str) {
    println!("{} {}", "↻".cyan(), message);
}

pub fn pending(message: &str) {
    println!("{} {}", "→".cyan(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message.yellow());
}

pub fn detail(label: &str, value: &str) {
    println!("  {} {}", format!("{}:", label).dimmed(), value);
}

fn disposition_marker(disposition: Disposition) -> String {
    match disposition {
        Disposition::Created => "✓ created".green().to_string(),
        Disposition::Updated => "✓ updated".green().to_string(),
        Disposition::Reused => "↻ reused".cyan().to_string(),
    }
}

/// Snapshot fields, one per line
pub fn snapshot_fields(snapshot: &Snapshot) {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".dimmed().to_string());
    detail("Gateway URL", &show(&snapshot.gateway_url));
    detail("Gateway ID", &show(&snapshot.gateway_id));
    detail("Gateway ARN", &show(&snapshot.gateway_arn));
    detail("Region", &show(&snapshot.region));
    detail("Lambda ARN", &show(&snapshot.compute_arn));
    let client = snapshot
        .client_info
        .as_ref()
        .map(|c| c.client_id.clone())
        .unwrap_or_else(|| "-".dimmed().to_string());
    detail("OAuth client", &client);
}

pub fn summary(report: &SetupReport) {
    let rule = "═".repeat(RULE_WIDTH);
    println!();
    println!("{}", rule.green());
    println!("  {}", "Gateway setup complete!".green().bold());
    println!("{}", rule.green());
    for action in &report.actions {
        println!(
            "  {:<18} {}  {}",
            action.kind.to_string(),
            disposition_marker(action.disposition),
            action.identifier.dimmed()
        );
    }
    for drift in &report.warnings {
        warning(drift);
    }
    println!();
    snapshot_fields(&report.snapshot);
    println!();
    println!(
        "Configuration saved to: {}",
        report.state_file.display().to_string().cyan()
    );
}
