//! Per-entry cross-reference checks.
//!
//! Each registry entry runs through an ordered pipeline. A step either hands
//! its result to the next step or aborts the entry; the remaining entries
//! are unaffected either way.
//!
//! | Step | Check                               | On failure        |
//! |------|-------------------------------------|-------------------|
//! | 1    | entry is an object with a `name`    | E001/E002, abort  |
//! | 2    | source resolves under plugins root  | E003, abort       |
//! | 3    | plugin directory exists             | E004, abort       |
//! | 4    | plugin directory is not a symlink   | E005, abort       |
//! | 5    | directory name equals `name`        | E006, continue    |
//! | 6    | descriptor file exists              | E007, abort       |
//! | 7    | descriptor parses as JSON           | E008, abort       |
//! | 8    | descriptor `name` equals `name`     | E009, continue    |
//! | 9    | conventional subdirectory present   | W001/W002         |

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::XrefConfig;
use crate::diagnostics::{
    Diagnostic, E001, E002, E003, E004, E005, E006, E007, E008, E009, I001, W001, W002,
};
use crate::errors::{Result, XrefError};
use crate::fs_util::PluginFs;
use crate::reporter::Reporter;
use crate::resolver::{PathRejection, PathResolver};

/// Outcome of a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// Proceed with the value produced by this step.
    Continue(T),
    /// Stop checking this entry.
    Abort,
}

/// Runs the per-entry checks against a filesystem.
pub struct PluginValidator<'a> {
    config: &'a XrefConfig,
    resolver: &'a PathResolver,
    fs: &'a dyn PluginFs,
    registry_label: String,
}

impl<'a> PluginValidator<'a> {
    #[must_use]
    pub fn new(
        config: &'a XrefConfig,
        resolver: &'a PathResolver,
        fs: &'a dyn PluginFs,
    ) -> Self {
        let registry_label = file_label(&config.registry_path);
        Self {
            config,
            resolver,
            fs,
            registry_label,
        }
    }

    /// Validate one registry entry, recording findings into `reporter`.
    ///
    /// Returns `Err` only for unexpected I/O failures; every expected
    /// problem is a diagnostic.
    pub fn validate(&self, entry: &Value, reporter: &mut Reporter) -> Result<()> {
        let Step::Continue(name) = self.check_entry_shape(entry, reporter) else {
            return Ok(());
        };
        reporter.record(
            Diagnostic::info(I001, format!("Validating plugin: {name}")).with_plugin(name),
        );

        let Step::Continue(dir) = self.resolve_source(entry, name, reporter) else {
            return Ok(());
        };
        tracing::debug!(plugin = name, dir = %dir.display(), "resolved plugin directory");

        if self.check_exists(name, &dir, reporter)? == Step::Abort {
            return Ok(());
        }
        if self.check_not_symlink(name, &dir, reporter)? == Step::Abort {
            return Ok(());
        }
        self.check_dir_name(name, &dir, reporter);

        let descriptor_path = dir.join(&self.config.descriptor_path);
        if self.check_descriptor_exists(name, &descriptor_path, reporter)? == Step::Abort {
            return Ok(());
        }
        let Step::Continue(descriptor) =
            self.parse_descriptor(name, &descriptor_path, reporter)?
        else {
            return Ok(());
        };
        self.check_descriptor_name(name, &descriptor_path, &descriptor, reporter);

        self.check_convention_dir(name, &dir, reporter)
    }

    /// Step 1: the entry is an object carrying a non-empty string `name`.
    fn check_entry_shape<'e>(&self, entry: &'e Value, reporter: &mut Reporter) -> Step<&'e str> {
        let Some(obj) = entry.as_object() else {
            reporter.record(Diagnostic::error(
                E001,
                format!(
                    "Invalid plugin entry in {}: expected an object but got {entry}",
                    self.registry_label
                ),
            ));
            return Step::Abort;
        };

        match obj.get("name") {
            Some(Value::String(name)) if !name.is_empty() => Step::Continue(name.as_str()),
            None | Some(Value::Null) => {
                reporter.record(
                    Diagnostic::error(E002, "Plugin entry missing \"name\" field")
                        .with_suggestion("Add a \"name\" matching the plugin's directory"),
                );
                Step::Abort
            }
            Some(other) => {
                reporter.record(Diagnostic::error(
                    E002,
                    format!("Plugin entry \"name\" must be a non-empty string, got {other}"),
                ));
                Step::Abort
            }
        }
    }

    /// Step 2: the entry's source (or the default) resolves under the
    /// plugins root.
    fn resolve_source(
        &self,
        entry: &Value,
        name: &str,
        reporter: &mut Reporter,
    ) -> Step<PathBuf> {
        let (source, resolved) = match entry.get("source") {
            None | Some(Value::Null) => {
                let source = self.config.default_source(name);
                let resolved = self.resolver.resolve(&source);
                (source, resolved)
            }
            Some(Value::String(s)) if s.is_empty() => {
                let source = self.config.default_source(name);
                let resolved = self.resolver.resolve(&source);
                (source, resolved)
            }
            Some(Value::String(s)) => (s.clone(), self.resolver.resolve(s)),
            Some(other) => (other.to_string(), Err(PathRejection::NotAString)),
        };

        match resolved {
            Ok(dir) => Step::Continue(dir),
            Err(reason) => {
                tracing::debug!(plugin = name, %source, %reason, "source rejected");
                reporter.record(
                    Diagnostic::error(
                        E003,
                        format!(
                            "Invalid or disallowed plugin path (path traversal): {source} ({reason})"
                        ),
                    )
                    .with_plugin(name)
                    .with_suggestion(format!(
                        "Use a relative path under {}/",
                        self.config.plugins_root
                    )),
                );
                Step::Abort
            }
        }
    }

    /// Step 3: the plugin directory exists.
    fn check_exists(&self, name: &str, dir: &Path, reporter: &mut Reporter) -> Result<Step<()>> {
        if self.fs.exists(dir).map_err(|e| XrefError::io(dir, e))? {
            return Ok(Step::Continue(()));
        }
        reporter.record(
            Diagnostic::error(
                E004,
                format!(
                    "Plugin directory not found: {} (referenced by \"{name}\" in {})",
                    dir.display(),
                    self.registry_label
                ),
            )
            .with_plugin(name)
            .with_path(dir),
        );
        Ok(Step::Abort)
    }

    /// Step 4: the plugin directory itself is not a symlink.
    fn check_not_symlink(
        &self,
        name: &str,
        dir: &Path,
        reporter: &mut Reporter,
    ) -> Result<Step<()>> {
        if !self.fs.is_symlink(dir).map_err(|e| XrefError::io(dir, e))? {
            return Ok(Step::Continue(()));
        }
        reporter.record(
            Diagnostic::error(
                E005,
                format!(
                    "Plugin directory cannot be a symlink: {} (security risk)",
                    dir.display()
                ),
            )
            .with_plugin(name)
            .with_path(dir)
            .with_suggestion("Replace the symlink with the plugin directory itself"),
        );
        Ok(Step::Abort)
    }

    /// Step 5: the directory basename equals the registry name, byte for
    /// byte. Never aborts.
    fn check_dir_name(&self, name: &str, dir: &Path, reporter: &mut Reporter) {
        let dir_name = dir.file_name();
        if dir_name == Some(OsStr::new(name)) {
            return;
        }
        let shown = dir_name
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.record(
            Diagnostic::error(
                E006,
                format!(
                    "Directory name \"{shown}\" doesn't match plugin name \"{name}\" in {}",
                    self.registry_label
                ),
            )
            .with_plugin(name)
            .with_path(dir)
            .with_suggestion(format!("Rename the directory to \"{name}\"")),
        );
    }

    /// Step 6: the descriptor file exists.
    fn check_descriptor_exists(
        &self,
        name: &str,
        path: &Path,
        reporter: &mut Reporter,
    ) -> Result<Step<()>> {
        if self.fs.exists(path).map_err(|e| XrefError::io(path, e))? {
            return Ok(Step::Continue(()));
        }
        reporter.record(
            Diagnostic::error(
                E007,
                format!(
                    "{} not found: {}",
                    file_label(&self.config.descriptor_path),
                    path.display()
                ),
            )
            .with_plugin(name)
            .with_path(path),
        );
        Ok(Step::Abort)
    }

    /// Step 7: the descriptor is UTF-8 JSON.
    fn parse_descriptor(
        &self,
        name: &str,
        path: &Path,
        reporter: &mut Reporter,
    ) -> Result<Step<Value>> {
        let parse_error = |reason: String| {
            Diagnostic::error(E008, format!("Failed to parse {}: {reason}", path.display()))
                .with_plugin(name)
                .with_path(path)
        };

        if self.fs.is_dir(path).map_err(|e| XrefError::io(path, e))? {
            reporter.record(parse_error("is a directory".to_string()));
            return Ok(Step::Abort);
        }
        let content = match self.fs.read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                reporter.record(parse_error("file is not valid UTF-8".to_string()));
                return Ok(Step::Abort);
            }
            Err(e) => return Err(XrefError::io(path, e)),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(v) => Ok(Step::Continue(v)),
            Err(e) => {
                reporter.record(parse_error(e.to_string()));
                Ok(Step::Abort)
            }
        }
    }

    /// Step 8: the descriptor's own `name` equals the registry name. Never
    /// aborts.
    fn check_descriptor_name(
        &self,
        name: &str,
        path: &Path,
        descriptor: &Value,
        reporter: &mut Reporter,
    ) {
        let actual = descriptor.get("name");
        if actual.and_then(Value::as_str) == Some(name) {
            return;
        }
        let shown = actual.map_or_else(|| "nothing".to_string(), Value::to_string);
        reporter.record(
            Diagnostic::error(
                E009,
                format!(
                    "Name mismatch: {} says \"{name}\", but {} says {shown}",
                    self.registry_label,
                    path.display()
                ),
            )
            .with_plugin(name)
            .with_path(path),
        );
    }

    /// Step 9: the conventional subdirectory exists and is a directory.
    /// Advisory only.
    fn check_convention_dir(
        &self,
        name: &str,
        dir: &Path,
        reporter: &mut Reporter,
    ) -> Result<()> {
        let conv = &self.config.convention_dir;
        let path = dir.join(conv);
        if !self.fs.exists(&path).map_err(|e| XrefError::io(&path, e))? {
            reporter.record(
                Diagnostic::warning(W001, format!("Plugin \"{name}\" has no {conv}/ directory"))
                    .with_plugin(name)
                    .with_path(path),
            );
        } else if !self.fs.is_dir(&path).map_err(|e| XrefError::io(&path, e))? {
            reporter.record(
                Diagnostic::warning(W002, format!("Plugin \"{name}\": {conv} is not a directory"))
                    .with_plugin(name)
                    .with_path(path),
            );
        }
        Ok(())
    }
}

/// Final path component for messages (`marketplace.json`, `plugin.json`).
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
