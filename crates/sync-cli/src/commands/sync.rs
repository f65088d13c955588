//! Report, import and export command implementations

use colored::Colorize;
use serde_json::json;
use sync_core::Progress;
use uuid::Uuid;

use super::Workspace;
use super::output::print_actions;
use crate::error::Result;

fn progress<'a>() -> Progress<'a> {
    Progress::new(|item, count, total| tracing::debug!(item, count, total, "processed"))
}

/// Run the report command
///
/// Classifies every document against the store without changing either.
pub fn run_report(workspace: &Workspace, json: bool) -> Result<()> {
    let actions = workspace.service.report(workspace.handler_filter(), &mut progress())?;
    print_actions("Comparing documents with the store...", &actions, json)
}

/// Run the import command
pub fn run_import(workspace: &Workspace, force: bool, json: bool) -> Result<()> {
    let actions = workspace
        .service
        .import_all(workspace.handler_filter(), force, &mut progress())?;
    print_actions("Importing documents...", &actions, json)
}

/// Run the export command
pub fn run_export(workspace: &Workspace, json: bool) -> Result<()> {
    let actions = workspace.service.export_all(workspace.handler_filter(), &mut progress())?;
    print_actions("Exporting entities...", &actions, json)
}

/// Run the export-item command
pub fn run_export_item(workspace: &Workspace, key: Uuid, json: bool) -> Result<()> {
    let handler = workspace.single_handler()?;
    let action = workspace.service.export_key(&handler, key)?;
    print_actions("Exporting entity...", &[action], json)
}

/// Run the clean-marker command
pub fn run_clean_marker(workspace: &Workspace, parent: Uuid, json: bool) -> Result<()> {
    let handler = workspace.single_handler()?;
    let path = workspace.service.write_clean_marker(&handler, parent)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "file": path.as_str() }))?);
    } else {
        println!("{} Clean marker written to {}", "OK".green().bold(), path.as_str().cyan());
    }
    Ok(())
}
