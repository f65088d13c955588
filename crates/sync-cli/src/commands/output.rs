//! Action and summary rendering

use colored::{ColoredString, Colorize};
use serde_json::json;
use sync_core::{ActionSummary, ChangeType, SyncAction};

use crate::error::{CliError, Result};

fn change_label(change: ChangeType) -> ColoredString {
    let label = format!("{:<13}", change.as_str());
    if change.is_failure() {
        label.red().bold()
    } else if change.has_changes() {
        label.yellow()
    } else {
        label.dimmed()
    }
}

/// Print actions with a summary line, or as one JSON object.
///
/// Returns an error when any action failed, so the process exits non-zero.
pub fn print_actions(title: &str, actions: &[SyncAction], json: bool) -> Result<()> {
    let summary = ActionSummary::of(actions);

    if json {
        let value = json!({ "actions": actions, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} {}", "=>".blue().bold(), title);
        for action in actions {
            let marker = if action.success { "+".green() } else { "!".red() };
            let file = action.file.as_deref().unwrap_or_default();
            println!("   {} {} {} {}", marker, change_label(action.change), action.name, file.dimmed());
            if let Some(message) = &action.message {
                println!("       {}", message);
            }
            for detail in &action.details {
                println!(
                    "       {} {}: {} -> {}",
                    "~".cyan(),
                    detail.path,
                    detail.old_value.as_deref().unwrap_or("-"),
                    detail.new_value.as_deref().unwrap_or("-"),
                );
            }
        }
        print_summary(&summary);
    }

    if summary.has_failures() {
        return Err(CliError::user(format!("{} of {} item(s) failed", summary.failed, summary.total)));
    }
    Ok(())
}

fn print_summary(summary: &ActionSummary) {
    if summary.total == 0 {
        println!("{} Nothing to do.", "OK".green().bold());
        return;
    }
    let counts: Vec<String> = summary
        .by_change
        .iter()
        .map(|(change, count)| format!("{} {}", count, change))
        .collect();
    let status = if summary.has_failures() {
        "FAILED".red().bold()
    } else {
        "OK".green().bold()
    };
    println!();
    println!("{} {} item(s): {}", status, summary.total, counts.join(", "));
}
