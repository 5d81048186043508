//! Cross-reference validation between a plugin marketplace registry and the
//! plugin packages it lists.

pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod fs_util;
pub mod plugin;
pub mod registry;
pub mod reporter;
pub mod resolver;

// Re-export key types at crate root for convenience.
pub use config::XrefConfig;
pub use diagnostics::{Diagnostic, Severity};
pub use errors::{Result, XrefError};
pub use fs_util::{MemFs, OsFs, PluginFs};
pub use plugin::{PluginValidator, Step};
pub use registry::{check_workspace, load_registry, run, validate_registry};
pub use reporter::{Emit, Reporter, Status};
pub use resolver::{normalize, PathRejection, PathResolver};
