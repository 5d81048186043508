//! Registry (`marketplace.json`) loading and the top-level validation run.

use std::io;
use std::path::Path;

use serde_json::Value;

use crate::config::XrefConfig;
use crate::diagnostics::{Diagnostic, I002, R001, R002, R003, R004};
use crate::errors::{Result, XrefError};
use crate::fs_util::{OsFs, PluginFs};
use crate::plugin::{PluginValidator, Step};
use crate::reporter::{Reporter, Status};
use crate::resolver::PathResolver;

/// Load the registry and return its `plugins` entries.
///
/// A missing, unparsable, or malformed registry is recorded as a single
/// document-level error and yields [`Step::Abort`].
pub fn load_registry(
    path: &Path,
    fs: &dyn PluginFs,
    reporter: &mut Reporter,
) -> Result<Step<Vec<Value>>> {
    let label = path.display();
    let parse_error = |reason: String| {
        Diagnostic::error(R002, format!("Failed to parse {label}: {reason}")).with_path(path)
    };

    if !fs.exists(path).map_err(|e| XrefError::io(path, e))? {
        reporter.record(
            Diagnostic::error(R001, format!("Marketplace file not found: {label}"))
                .with_path(path),
        );
        return Ok(Step::Abort);
    }
    if fs.is_dir(path).map_err(|e| XrefError::io(path, e))? {
        reporter.record(parse_error("is a directory".to_string()));
        return Ok(Step::Abort);
    }

    let content = match fs.read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            reporter.record(parse_error("file is not valid UTF-8".to_string()));
            return Ok(Step::Abort);
        }
        Err(e) => return Err(XrefError::io(path, e)),
    };
    let doc: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            reporter.record(parse_error(e.to_string()));
            return Ok(Step::Abort);
        }
    };

    let plugins = match doc {
        Value::Object(mut map) => map.remove("plugins"),
        _ => None,
    };
    if let Some(Value::Array(plugins)) = plugins {
        return Ok(Step::Continue(plugins));
    }
    reporter.record(
        Diagnostic::error(R003, format!("{label} must have a \"plugins\" array"))
            .with_path(path)
            .with_suggestion("Add \"plugins\": [] listing each plugin entry"),
    );
    Ok(Step::Abort)
}

/// Validate the registry under `base` and every plugin entry it lists.
///
/// Entries are checked in document order and independently of each other.
pub fn validate_registry(
    config: &XrefConfig,
    base: &Path,
    fs: &dyn PluginFs,
    reporter: &mut Reporter,
) -> Result<()> {
    let registry_file = config.registry_file(base);
    tracing::debug!(registry = %registry_file.display(), "loading registry");

    let Step::Continue(plugins) = load_registry(&registry_file, fs, reporter)? else {
        return Ok(());
    };

    if plugins.is_empty() {
        let name = registry_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.info(I002, format!("No plugins defined in {name}"));
        return Ok(());
    }

    let resolver = PathResolver::new(base, &config.plugins_root);
    let validator = PluginValidator::new(config, &resolver, fs);
    for entry in &plugins {
        validator.validate(entry, reporter)?;
    }
    tracing::debug!(
        entries = plugins.len(),
        errors = reporter.error_count(),
        warnings = reporter.warning_count(),
        "registry validated"
    );
    Ok(())
}

/// Validate the registry under `base` and report the outcome.
///
/// An unexpected error stops the run and is recorded as one more error
/// (R004), so the counts and the status always agree.
pub fn check_workspace(
    config: &XrefConfig,
    base: &Path,
    fs: &dyn PluginFs,
    reporter: &mut Reporter,
) -> Status {
    if let Err(e) = validate_registry(config, base, fs, reporter) {
        record_abort(&e, reporter);
    }
    reporter.status()
}

fn record_abort(err: &XrefError, reporter: &mut Reporter) {
    tracing::debug!(error = ?err, "validation aborted");
    let mut diag = Diagnostic::error(R004, format!("Validation aborted: {err}"));
    if let XrefError::Io { path, .. } = err {
        diag = diag.with_path(path);
    }
    reporter.record(diag);
}

/// Validate the workspace described by `config` on the real filesystem.
pub fn run(config: &XrefConfig, reporter: &mut Reporter) -> Status {
    match config.absolute_base() {
        Ok(base) => check_workspace(config, &base, &OsFs, reporter),
        Err(e) => {
            record_abort(&e, reporter);
            reporter.status()
        }
    }
}
