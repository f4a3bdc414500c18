use std::path::Path;

use anyhow::Result;

use herald_config::{HeraldConfig, Severity, ValidationResult, validate};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn check_config(config: &HeraldConfig, path: &Path) -> Result<()> {
    eprintln!("Checking {}\n", path.display());

    let result = validate(config);
    print_diagnostics(&result);

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Refuse to touch Telegram or the store with a broken config.
pub fn ensure_valid(config: &HeraldConfig) -> Result<()> {
    let result = validate(config);
    if result.has_errors() {
        print_diagnostics(&result);
        anyhow::bail!(
            "configuration has {} error(s); run `herald validate` for details",
            result.count(Severity::Error)
        );
    }
    for d in &result.diagnostics {
        tracing::warn!(path = %d.path, "{}", d.message);
    }
    Ok(())
}

fn print_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
    }

    if !result.diagnostics.is_empty() {
        eprintln!();
    }
}
