//! Dependency listing

use colored::Colorize;
use sync_core::DependencyFlags;
use uuid::Uuid;

use super::Workspace;
use crate::error::Result;

/// Run the deps command
///
/// Lists the entity and what it depends on, highest order first.
pub fn run_deps(workspace: &Workspace, key: Uuid, flags: DependencyFlags, json: bool) -> Result<()> {
    let handler = workspace.single_handler()?;
    let dependencies = workspace.service.dependencies(&handler, key, &flags)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dependencies)?);
        return Ok(());
    }

    println!("{} Dependencies of {}", "=>".blue().bold(), key.to_string().cyan());
    for dependency in &dependencies {
        println!(
            "   {:>5} {} {} {}",
            dependency.order,
            dependency.key.to_string().dimmed(),
            dependency.name,
            format!("({})", dependency.item_type).dimmed()
        );
    }
    Ok(())
}
