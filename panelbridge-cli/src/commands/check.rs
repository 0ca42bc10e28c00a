//! Check command - validate a binding file against the control catalog.

use std::path::PathBuf;

use panelbridge::binding::BindingSet;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the check command.
pub struct CheckArgs {
    pub definitions: Vec<PathBuf>,
    /// Binding file; defaults to the configured one.
    pub file: Option<PathBuf>,
    /// Print every binding in canonical form.
    pub export: bool,
}

/// Run the check command.
pub fn run(runner: CliRunner, args: CheckArgs) -> Result<(), CliError> {
    let registry = runner.load_registry(&args.definitions)?;
    let path = args
        .file
        .or_else(|| runner.config().bindings.file.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No bindings file. Set bindings.file in config.ini or pass a path.".to_string(),
            )
        })?;

    let mut bindings = BindingSet::new();
    let report = bindings
        .import_file(&path, &registry)
        .map_err(|e| CliError::Bindings(format!("{}: {}", path.display(), e)))?;

    println!("Checked {}", path.display());
    println!("  Valid bindings: {}", report.imported);
    println!(
        "  Converters:     {}",
        bindings.iter().map(|b| b.converters().len()).sum::<usize>()
    );
    println!("  Errors:         {}", report.errors.len());

    if !report.errors.is_empty() {
        println!();
        for error in &report.errors {
            println!("  {}", error);
        }
    }

    if args.export {
        println!();
        let lines = bindings
            .export_lines()
            .map_err(|e| CliError::Bindings(e.to_string()))?;
        for line in lines {
            println!("{}", line);
        }
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::Bindings(format!(
            "{} invalid line(s) in {}",
            report.errors.len(),
            path.display()
        )))
    }
}
