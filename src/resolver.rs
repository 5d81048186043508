//! Lexical path resolution under an allowed root.
//!
//! Resolution is pure path arithmetic: nothing here touches the filesystem.
//! Symlinks are deliberately not resolved; the plugin pipeline rejects a
//! symlinked plugin directory as a separate check.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Why a raw path was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathRejection {
    /// The raw path was empty.
    #[error("path is empty")]
    Empty,
    /// The raw value was not a string.
    #[error("path is not a string")]
    NotAString,
    /// The path is absolute.
    #[error("absolute paths are not allowed")]
    Absolute,
    /// The normalized path climbs above its starting point with `..`.
    #[error("path escapes the workspace with `..`")]
    Escapes,
    /// The path resolves outside the allowed root.
    #[error("path resolves outside {}", .0.display())]
    OutsideRoot(PathBuf),
}

/// Resolve `.` and `..` segments lexically.
///
/// Leading `..` segments that cannot be cancelled are kept; `..` directly
/// under the root is dropped. An empty result becomes `.`.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            _ => out.push(component),
        }
    }
    if out.is_empty() {
        PathBuf::from(".")
    } else {
        out.iter().collect()
    }
}

/// Resolves workspace-relative paths, refusing anything outside the allowed
/// root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base: PathBuf,
    allowed_root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for paths relative to `base` that must land under
    /// `base/root`. `base` should be absolute.
    #[must_use]
    pub fn new(base: impl AsRef<Path>, root: impl AsRef<Path>) -> Self {
        let base = normalize(base.as_ref());
        let allowed_root = normalize(&base.join(root));
        Self { base, allowed_root }
    }

    /// The normalized absolute allowed root.
    #[must_use]
    pub fn allowed_root(&self) -> &Path {
        &self.allowed_root
    }

    /// The normalized workspace base.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve `raw` to an absolute path under the allowed root.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, PathRejection> {
        if raw.is_empty() {
            return Err(PathRejection::Empty);
        }

        let trimmed = raw.strip_prefix("./").unwrap_or(raw);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let normalized = normalize(Path::new(trimmed));

        if normalized.is_absolute() || normalized.has_root() {
            return Err(PathRejection::Absolute);
        }
        if matches!(normalized.components().next(), Some(Component::ParentDir)) {
            return Err(PathRejection::Escapes);
        }

        let full = normalize(&self.base.join(&normalized));
        if !full.starts_with(&self.allowed_root) {
            return Err(PathRejection::OutsideRoot(self.allowed_root.clone()));
        }
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/work/repo", "plugins")
    }

    // ── normalize ───────────────────────────────────────────────────

    #[test]
    fn normalize_cancels_parent_segments() {
        assert_eq!(
            normalize(Path::new("plugins/a/../b")),
            PathBuf::from("plugins/b")
        );
    }

    #[test]
    fn normalize_keeps_leading_parent_segments() {
        assert_eq!(normalize(Path::new("../../etc")), PathBuf::from("../../etc"));
        assert_eq!(normalize(Path::new("a/../../x")), PathBuf::from("../x"));
    }

    #[test]
    fn normalize_drops_current_dir_segments() {
        assert_eq!(
            normalize(Path::new("./plugins/./foo")),
            PathBuf::from("plugins/foo")
        );
    }

    #[test]
    fn normalize_empty_becomes_dot() {
        assert_eq!(normalize(Path::new("")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn normalize_parent_at_root_is_dropped() {
        assert_eq!(normalize(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    // ── resolve: accepted ───────────────────────────────────────────

    #[test]
    fn resolves_default_source() {
        assert_eq!(
            resolver().resolve("plugins/foo").unwrap(),
            PathBuf::from("/work/repo/plugins/foo")
        );
    }

    #[test]
    fn strips_leading_dot_slash_and_trailing_slash() {
        assert_eq!(
            resolver().resolve("./plugins/foo/").unwrap(),
            PathBuf::from("/work/repo/plugins/foo")
        );
    }

    #[test]
    fn neutralized_parent_segments_are_accepted() {
        assert_eq!(
            resolver().resolve("plugins/bar/../foo").unwrap(),
            PathBuf::from("/work/repo/plugins/foo")
        );
    }

    #[test]
    fn allowed_root_itself_is_contained() {
        assert_eq!(
            resolver().resolve("plugins").unwrap(),
            PathBuf::from("/work/repo/plugins")
        );
    }

    // ── resolve: rejected ───────────────────────────────────────────

    #[test]
    fn rejects_empty() {
        assert_eq!(resolver().resolve(""), Err(PathRejection::Empty));
    }

    #[test]
    fn rejects_parent_escape() {
        assert_eq!(resolver().resolve("../../etc"), Err(PathRejection::Escapes));
        assert_eq!(resolver().resolve("./../x"), Err(PathRejection::Escapes));
        assert_eq!(
            resolver().resolve("plugins/../../x"),
            Err(PathRejection::Escapes)
        );
    }

    #[test]
    fn rejects_absolute() {
        assert_eq!(resolver().resolve("/etc"), Err(PathRejection::Absolute));
        assert_eq!(
            resolver().resolve("/work/repo/plugins/foo"),
            Err(PathRejection::Absolute)
        );
    }

    #[test]
    fn rejects_paths_outside_allowed_root() {
        assert!(matches!(
            resolver().resolve("src/lib"),
            Err(PathRejection::OutsideRoot(_))
        ));
        assert!(matches!(
            resolver().resolve("plugins/foo/../../etc"),
            Err(PathRejection::OutsideRoot(_))
        ));
        assert!(matches!(
            resolver().resolve("./"),
            Err(PathRejection::OutsideRoot(_))
        ));
    }

    #[test]
    fn sibling_with_shared_prefix_is_outside() {
        assert!(matches!(
            resolver().resolve("plugins-evil/foo"),
            Err(PathRejection::OutsideRoot(_))
        ));
    }

    #[test]
    fn dotdot_prefixed_name_is_not_an_escape() {
        // "..foo" is an ordinary name; it is still outside `plugins/`.
        assert!(matches!(
            resolver().resolve("..foo"),
            Err(PathRejection::OutsideRoot(_))
        ));
        assert_eq!(
            resolver().resolve("plugins/..foo").unwrap(),
            PathBuf::from("/work/repo/plugins/..foo")
        );
    }

    // ── properties ──────────────────────────────────────────────────

    #[test]
    fn escapes_and_absolutes_rejected_for_any_root() {
        let raws = ["..", "../", "../plugins/foo", "a/../../b", "/etc", "/plugins/foo"];
        for root in ["plugins", "ext/plugins", ".", "p"] {
            let r = PathResolver::new("/work/repo", root);
            for raw in raws {
                assert!(r.resolve(raw).is_err(), "{raw:?} accepted under {root:?}");
            }
        }
    }

    #[test]
    fn accepted_paths_are_absolute_and_prefixed_by_root() {
        let r = resolver();
        let raws = [
            "plugins/a",
            "./plugins/b/",
            "plugins/c/d",
            "plugins/x/../e",
            "plugins/./f",
            "plugins",
        ];
        for raw in raws {
            let resolved = r.resolve(raw).unwrap();
            assert!(resolved.is_absolute(), "{raw:?} -> {}", resolved.display());
            assert!(
                resolved.starts_with(r.allowed_root()),
                "{raw:?} -> {}",
                resolved.display()
            );
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let r = resolver();
        for raw in ["plugins/foo", "../x", "plugins-evil", ""] {
            assert_eq!(r.resolve(raw), r.resolve(raw));
        }
    }

    #[test]
    fn root_is_normalized() {
        let r = PathResolver::new("/work/repo/", "./plugins/");
        assert_eq!(r.allowed_root(), Path::new("/work/repo/plugins"));
        assert_eq!(r.base(), Path::new("/work/repo"));
    }
}
