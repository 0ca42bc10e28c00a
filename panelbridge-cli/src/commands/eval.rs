//! Eval command - evaluate a formula against supplied control values.

use std::collections::HashMap;
use std::path::PathBuf;

use panelbridge::formula::{truncate_result, Formula};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the eval command.
pub struct EvalArgs {
    pub definitions: Vec<PathBuf>,
    pub expression: String,
    /// `NAME=VALUE` assignments.
    pub values: Vec<String>,
}

/// Run the eval command.
pub fn run(runner: CliRunner, args: EvalArgs) -> Result<(), CliError> {
    let registry = runner.load_registry(&args.definitions)?;
    let formula = Formula::new(args.expression, &registry)?;
    let values = parse_assignments(&args.values)?;

    for name in values.keys() {
        if !formula.variables().contains(name) {
            eprintln!("Warning: {} is not used by this formula", name);
        }
    }

    println!("Formula:   {}", formula);
    println!("Variables:");
    for variable in formula.variables() {
        match values.get(variable) {
            Some(value) => println!("  {} = {}", variable, value),
            None => println!("  {} = 0 (not set)", variable),
        }
    }

    let result = formula.evaluate(&values)?;
    println!("Result:    {}", result);
    println!("Display:   {}", truncate_result(result));
    Ok(())
}

/// Parse `NAME=VALUE` pairs.
fn parse_assignments(assignments: &[String]) -> Result<HashMap<String, f64>, CliError> {
    assignments
        .iter()
        .map(|assignment| {
            let (name, value) = assignment.split_once('=').ok_or_else(|| {
                CliError::Config(format!("Expected NAME=VALUE, got '{}'", assignment))
            })?;
            let value: f64 = value.trim().parse().map_err(|_| {
                CliError::Config(format!("Invalid number for {}: '{}'", name, value))
            })?;
            Ok((name.trim().to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments() {
        let values =
            parse_assignments(&["AAP_EGIPWR=4".to_string(), "HSI_HDG = 270.5".to_string()])
                .unwrap();
        assert_eq!(values.get("AAP_EGIPWR"), Some(&4.0));
        assert_eq!(values.get("HSI_HDG"), Some(&270.5));
    }

    #[test]
    fn test_parse_assignments_rejects_bad_input() {
        assert!(parse_assignments(&["AAP_EGIPWR".to_string()]).is_err());
        assert!(parse_assignments(&["AAP_EGIPWR=on".to_string()]).is_err());
    }
}
