//! Handler listing

use colored::Colorize;
use serde_json::json;
use sync_core::HandlerAction;

use super::Workspace;
use crate::error::Result;

const ACTIONS: [HandlerAction; 4] = [
    HandlerAction::Report,
    HandlerAction::Import,
    HandlerAction::Export,
    HandlerAction::Save,
];

/// Run the handlers command
pub fn run_handlers(workspace: &Workspace, json: bool) -> Result<()> {
    let service = &workspace.service;
    if json {
        let mut rows = Vec::new();
        for handler in service.registry().iter() {
            let meta = handler.meta();
            let settings = handler.settings();
            let enabled: Vec<String> = ACTIONS
                .iter()
                .filter(|action| settings.is_enabled_for(**action))
                .map(|action| format!("{:?}", action))
                .collect();
            rows.push(json!({
                "alias": meta.alias,
                "name": meta.name,
                "entity_type": meta.entity_type,
                "priority": meta.priority,
                "folder": service.handler_folder(handler).as_str(),
                "actions": enabled,
                "guid_names": settings.guid_names,
                "flat_structure": settings.flat_structure,
                "batch_save": settings.batch_save,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} Configured handlers:", "=>".blue().bold());
    for handler in service.registry().iter() {
        let meta = handler.meta();
        let settings = handler.settings();
        let status = if settings.enabled {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        println!(
            "   {} {} ({}) priority {} {}",
            meta.alias.cyan(),
            meta.name,
            meta.entity_type,
            meta.priority,
            status
        );
        println!("       {}", service.handler_folder(handler).as_str().dimmed());
    }
    Ok(())
}
