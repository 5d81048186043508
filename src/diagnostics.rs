//! Structured diagnostics for registry cross-reference validation.
//!
//! Every finding carries a stable code, a severity, and enough context
//! (plugin name, offending path) to be actionable from a CI log alone.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A finding that fails the run.
    Error,
    /// An advisory finding that never fails the run.
    Warning,
    /// Progress information; never counted.
    Info,
}

impl Severity {
    /// Console label used as the line prefix.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// A structured diagnostic produced while validating the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Stable code (e.g., `"R001"`, `"E005"`, `"W001"`).
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Registry entry the diagnostic belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Filesystem path the diagnostic is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Suggested fix (actionable text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with the given severity, code, and message.
    #[must_use]
    pub fn new(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            plugin: None,
            path: None,
            suggestion: None,
        }
    }

    /// Shorthand for an error diagnostic.
    #[must_use]
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Shorthand for a warning diagnostic.
    #[must_use]
    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Shorthand for an info diagnostic.
    #[must_use]
    pub fn info(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    /// Set the registry entry this diagnostic belongs to.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set the path this diagnostic is about.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set a suggested fix for this diagnostic.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Returns `true` if this diagnostic is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns `true` if this diagnostic is a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Returns `true` if this diagnostic is informational.
    #[must_use]
    pub fn is_info(&self) -> bool {
        self.severity == Severity::Info
    }
}

/// Console format: `ERROR: message`, `WARNING: message`, `INFO: message`.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.message)
    }
}

// ── Code constants ──────────────────────────────────────────────────────

// Run-level errors (R001–R004). Each stops the run.

/// Registry file not found.
pub const R001: &str = "R001";
/// Registry file is not valid JSON.
pub const R002: &str = "R002";
/// Registry has no `plugins` array.
pub const R003: &str = "R003";
/// The run was aborted by an unexpected I/O error.
pub const R004: &str = "R004";

// Entry errors (E001–E009)

/// Registry entry is not an object.
pub const E001: &str = "E001";
/// Registry entry has no usable `name`.
pub const E002: &str = "E002";
/// Plugin source path rejected (path traversal).
pub const E003: &str = "E003";
/// Plugin directory not found.
pub const E004: &str = "E004";
/// Plugin directory is a symlink.
pub const E005: &str = "E005";
/// Directory name does not match plugin name.
pub const E006: &str = "E006";
/// Plugin descriptor not found.
pub const E007: &str = "E007";
/// Plugin descriptor cannot be parsed.
pub const E008: &str = "E008";
/// Descriptor name does not match registry name.
pub const E009: &str = "E009";

// Advisory warnings (W001–W002)

/// Plugin has no conventional skills directory.
pub const W001: &str = "W001";
/// Conventional skills path exists but is not a directory.
pub const W002: &str = "W002";

// Informational (I001–I002)

/// Plugin validation started.
pub const I001: &str = "I001";
/// Registry lists no plugins.
pub const I002: &str = "I002";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_severity_label() {
        let e = Diagnostic::error(E004, "Plugin directory not found: /x");
        let w = Diagnostic::warning(W001, "Plugin \"foo\" has no skills/ directory");
        let i = Diagnostic::info(I001, "Validating plugin: foo");
        assert_eq!(e.to_string(), "ERROR: Plugin directory not found: /x");
        assert_eq!(
            w.to_string(),
            "WARNING: Plugin \"foo\" has no skills/ directory"
        );
        assert_eq!(i.to_string(), "INFO: Validating plugin: foo");
    }

    #[test]
    fn severity_predicates() {
        let d = Diagnostic::error(E001, "test");
        assert!(d.is_error() && !d.is_warning() && !d.is_info());
        let d = Diagnostic::warning(W001, "test");
        assert!(!d.is_error() && d.is_warning() && !d.is_info());
        let d = Diagnostic::info(I001, "test");
        assert!(!d.is_error() && !d.is_warning() && d.is_info());
    }

    #[test]
    fn builder_pattern_chains() {
        let d = Diagnostic::error(E006, "mismatch")
            .with_plugin("foo")
            .with_path("/w/plugins/bar")
            .with_suggestion("Rename the directory to \"foo\"");
        assert_eq!(d.plugin.as_deref(), Some("foo"));
        assert_eq!(d.path, Some(PathBuf::from("/w/plugins/bar")));
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn serialize_json_omits_none_fields() {
        let d = Diagnostic::error(R001, "Marketplace file not found");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["code"], "R001");
        assert!(json.get("plugin").is_none());
        assert!(json.get("path").is_none());
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn serialize_json_with_context() {
        let d = Diagnostic::warning(W002, "skills is not a directory")
            .with_plugin("foo")
            .with_path("/w/plugins/foo/skills");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["plugin"], "foo");
        assert_eq!(json["path"], "/w/plugins/foo/skills");
    }

    #[test]
    fn codes_are_unique() {
        let codes = [
            R001, R002, R003, R004, E001, E002, E003, E004, E005, E006, E007, E008, E009, W001,
            W002, I001, I002,
        ];
        let mut seen = std::collections::HashSet::new();
        for code in &codes {
            assert!(seen.insert(code), "duplicate code: {code}");
        }
    }
}
