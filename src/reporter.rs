//! Diagnostic accumulation, streaming, and final run status.

use crate::diagnostics::{Diagnostic, Severity};

/// Where recorded diagnostics are echoed as they arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emit {
    /// Print each record immediately: errors and warnings to stderr,
    /// info to stdout.
    #[default]
    Console,
    /// Accumulate only.
    Silent,
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No errors were recorded (warnings allowed).
    Success,
    /// At least one error was recorded.
    Failure,
}

impl Status {
    /// Process exit code for this status.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
        }
    }
}

/// Collects every diagnostic of a run in order.
#[derive(Debug, Default)]
pub struct Reporter {
    emit: Emit,
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Reporter {
    /// An empty reporter that echoes records according to `emit`.
    #[must_use]
    pub fn new(emit: Emit) -> Self {
        Self {
            emit,
            ..Self::default()
        }
    }

    /// A reporter that never prints.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(Emit::Silent)
    }

    /// Record a diagnostic, echoing it according to the emit mode.
    pub fn record(&mut self, diag: Diagnostic) {
        if self.emit == Emit::Console {
            match diag.severity {
                Severity::Error | Severity::Warning => {
                    eprintln!("{diag}");
                    if let Some(s) = &diag.suggestion {
                        eprintln!("  hint: {s}");
                    }
                }
                Severity::Info => println!("{diag}"),
            }
        }
        match diag.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => {}
        }
        self.diagnostics.push(diag);
    }

    /// Record an error with no plugin or path context.
    pub fn error(&mut self, code: &'static str, message: impl Into<String>) {
        self.record(Diagnostic::error(code, message));
    }

    /// Record a warning with no plugin or path context.
    pub fn warning(&mut self, code: &'static str, message: impl Into<String>) {
        self.record(Diagnostic::warning(code, message));
    }

    /// Record an informational message.
    pub fn info(&mut self, code: &'static str, message: impl Into<String>) {
        self.record(Diagnostic::info(code, message));
    }

    /// Number of errors recorded so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Number of warnings recorded so far.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// All recorded diagnostics, info included, in record order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Errors and warnings only, in record order.
    pub fn findings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_info())
    }

    /// Failure iff any error was recorded.
    #[must_use]
    pub fn status(&self) -> Status {
        if self.errors > 0 {
            Status::Failure
        } else {
            Status::Success
        }
    }

    /// End-of-run summary block.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "=== Summary ===\nErrors: {}\nWarnings: {}",
            self.errors, self.warnings
        )
    }
}
