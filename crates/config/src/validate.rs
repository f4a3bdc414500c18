//! Configuration validation.
//!
//! Reports everything that would make a run pointless or unsafe before any
//! network or database work starts.

use std::collections::BTreeSet;

use secrecy::ExposeSecret;

use crate::{
    env_subst::has_placeholder,
    schema::{HeraldConfig, normalize_handle},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "check.workers"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// A handle usable in a canonical link: word characters and underscores.
#[must_use]
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a loaded configuration.
#[must_use]
pub fn validate(config: &HeraldConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let token = config.bot.token.expose_secret();
    if !config.bot.has_token() {
        result.push(Severity::Error, "bot.token", "bot token is empty");
    } else if has_placeholder(token) {
        result.push(
            Severity::Error,
            "bot.token",
            "bot token contains an unresolved ${...} placeholder",
        );
    }

    if config.group_chat_id == 0 {
        result.push(Severity::Error, "group_chat_id", "destination group is not set");
    }

    if config.forward_mapping.is_empty() {
        result.push(
            Severity::Error,
            "forward_mapping",
            "no channels configured",
        );
    }

    let mut seen = BTreeSet::new();
    for raw in config.forward_mapping.keys() {
        let handle = normalize_handle(raw);
        let path = format!("forward_mapping.{raw}");
        if !is_valid_handle(handle) {
            result.push(
                Severity::Error,
                path,
                "handle must contain only letters, digits and underscores",
            );
        } else if !seen.insert(handle.to_ascii_lowercase()) {
            result.push(
                Severity::Error,
                path,
                format!("channel '{handle}' is configured more than once"),
            );
        }
    }

    if config.check.workers == 0 {
        result.push(Severity::Error, "check.workers", "must be at least 1");
    }
    if config.check.request_timeout_secs == 0 {
        result.push(
            Severity::Error,
            "check.request_timeout_secs",
            "must be at least 1",
        );
    }
    if config.forward.send_delay_ms == 0 {
        result.push(
            Severity::Warning,
            "forward.send_delay_ms",
            "sending without a delay is likely to hit destination rate limits",
        );
    }

    result
}
