//! Controls command - list the loaded control catalog.

use std::path::PathBuf;

use panelbridge::control::{ControlDescriptor, ValueKind};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the controls command.
pub struct ControlsArgs {
    pub definitions: Vec<PathBuf>,
    /// Case-insensitive substring matched against identifier and category.
    pub filter: Option<String>,
}

/// Run the controls command.
pub fn run(runner: CliRunner, args: ControlsArgs) -> Result<(), CliError> {
    let registry = runner.load_registry(&args.definitions)?;
    let filter = args.filter.map(|f| f.to_lowercase());

    let mut controls: Vec<&ControlDescriptor> = registry
        .all_controls()
        .filter(|c| filter.as_deref().map_or(true, |f| matches(c, f)))
        .collect();
    controls.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.identifier.cmp(&b.identifier))
    });

    let mut current_category = None;
    for control in &controls {
        if current_category != Some(control.category.as_str()) {
            if current_category.is_some() {
                println!();
            }
            println!("[{}]", display_category(&control.category));
            current_category = Some(control.category.as_str());
        }
        println!("  {}", describe(control));
    }

    println!();
    println!("{} of {} controls", controls.len(), registry.len());
    Ok(())
}

fn matches(control: &ControlDescriptor, filter: &str) -> bool {
    control.identifier.to_lowercase().contains(filter)
        || control.category.to_lowercase().contains(filter)
}

fn display_category(category: &str) -> &str {
    if category.is_empty() {
        "Uncategorized"
    } else {
        category
    }
}

fn describe(control: &ControlDescriptor) -> String {
    let layout = match control.value_kind {
        ValueKind::Integer => format!(
            "0x{:04X} mask 0x{:04X} >> {}",
            control.address, control.mask, control.shift
        ),
        ValueKind::String => format!(
            "0x{:04X} string[{}]",
            control.address,
            control.max_length.unwrap_or(0)
        ),
    };
    if control.description.is_empty() {
        format!("{:<32} {}", control.identifier, layout)
    } else {
        format!(
            "{:<32} {:<28} {}",
            control.identifier, layout, control.description
        )
    }
}
