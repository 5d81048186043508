//! Filesystem capability used by the validators.
//!
//! All filesystem access in the check pipeline goes through [`PluginFs`] so
//! that the whole validator can run against [`MemFs`] in tests. [`OsFs`] is
//! the real implementation; it uses `symlink_metadata()` where a check must
//! not follow links.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::resolver::normalize;

/// Upper bound on symlink hops when resolving paths in [`MemFs`].
const MAX_SYMLINK_HOPS: usize = 40;

/// Read-only filesystem operations needed by the cross-reference checks.
///
/// "Not found" is an answer, not an error: implementations return
/// `Ok(false)` for missing paths and reserve `Err` for conditions that
/// should abort the run (permission denied, symlink loops, ...).
pub trait PluginFs {
    /// Returns `true` if the path exists, following symlinks.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Returns `true` if the path itself is a symlink (not followed).
    fn is_symlink(&self, path: &Path) -> io::Result<bool>;

    /// Returns `true` if the path is a directory, following symlinks.
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Missing paths and paths through a non-directory both mean "absent".
fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl PluginFs for OsFs {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if is_absent(&e) => Ok(false),
            // A link that cannot be followed (dangling or looping) does not exist.
            Err(_) if path.symlink_metadata().is_ok() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn is_symlink(&self, path: &Path) -> io::Result<bool> {
        match path.symlink_metadata() {
            Ok(m) => Ok(m.file_type().is_symlink()),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(m) => Ok(m.is_dir()),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// A node in the in-memory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir,
    File(String),
    Symlink(PathBuf),
}

/// An in-memory filesystem tree for exercising the validators without I/O.
///
/// Paths should be absolute. Adding a file or symlink creates its parent
/// directories. Relative symlink targets resolve against the link's parent.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    nodes: BTreeMap<PathBuf, Node>,
}

impl MemFs {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory (and its parents).
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.nodes.insert(path, Node::Dir);
        self
    }

    /// Add a file with the given contents (and its parent directories).
    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> &mut Self {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.nodes.insert(path, Node::File(contents.into()));
        self
    }

    /// Add a symlink at `link` pointing to `target`.
    pub fn add_symlink(
        &mut self,
        link: impl AsRef<Path>,
        target: impl Into<PathBuf>,
    ) -> &mut Self {
        let link = normalize(link.as_ref());
        self.add_parents(&link);
        self.nodes.insert(link, Node::Symlink(target.into()));
        self
    }

    fn add_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    /// Resolve symlinks along `path`. The final component is only followed
    /// when `follow_last` is set.
    fn resolve(&self, path: &Path, follow_last: bool) -> io::Result<PathBuf> {
        let path = normalize(path);
        let components: Vec<_> = path.components().collect();
        let mut current = PathBuf::new();
        let mut hops = 0;
        for (idx, component) in components.iter().enumerate() {
            current.push(component);
            let is_last = idx + 1 == components.len();
            if is_last && !follow_last {
                break;
            }
            while let Some(Node::Symlink(target)) = self.nodes.get(&current) {
                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    return Err(io::Error::other(format!(
                        "too many levels of symbolic links: {}",
                        path.display()
                    )));
                }
                let parent = current.parent().map(Path::to_path_buf).unwrap_or_default();
                current = normalize(&parent.join(target));
            }
        }
        Ok(current)
    }

    fn node(&self, path: &Path, follow_last: bool) -> io::Result<Option<&Node>> {
        let resolved = self.resolve(path, follow_last)?;
        Ok(self.nodes.get(&resolved))
    }
}

impl PluginFs for MemFs {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        match self.node(path, true) {
            Ok(node) => Ok(node.is_some()),
            Err(_) if self.is_symlink(path)? => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn is_symlink(&self, path: &Path) -> io::Result<bool> {
        Ok(matches!(self.node(path, false)?, Some(Node::Symlink(_))))
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(matches!(self.node(path, true)?, Some(Node::Dir)))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.node(path, true)? {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a file: {}", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )),
        }
    }
}

/// A [`MemFs`] whose reads of files named `denied` fail with
/// `PermissionDenied`, for exercising run-aborting I/O errors.
#[cfg(test)]
pub(crate) struct DeniedFs<'a> {
    pub inner: &'a MemFs,
    pub denied: &'a str,
}

#[cfg(test)]
impl PluginFs for DeniedFs<'_> {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        self.inner.exists(path)
    }

    fn is_symlink(&self, path: &Path) -> io::Result<bool> {
        self.inner.is_symlink(path)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        self.inner.is_dir(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if path.file_name().is_some_and(|n| n == self.denied) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        self.inner.read_to_string(path)
    }
}
