//! Sandboxed asset path validation.
//!
//! Haptic pattern paths arrive as user-entered strings relative to a bundled
//! asset root (Unity's `StreamingAssets`, Flutter's `assets/`, ...). Before a
//! path reaches native code it must be relative, free of parent-directory
//! segments, and resolve to an existing regular file strictly inside the root.
//!
//! Results are never cached: a file removed between validation and playback
//! is reported by the native player, not here.

use std::path::{Component, Path, PathBuf};

use crate::error::AssetPathError;

/// Default prefix the iOS player expects in front of bundled asset paths.
pub const DEFAULT_IOS_BUNDLE_PREFIX: &str = "Data/Raw/";

/// Returns `true` when `relative` names an existing file inside `root`.
pub fn is_valid(root: &Path, relative: &str) -> bool {
    check(root, relative).is_ok()
}

/// Validate `relative` against `root`, returning the canonical target path.
///
/// # Errors
/// - [`AssetPathError::Empty`] for an empty string
/// - [`AssetPathError::Traversal`] when the path contains `..`
/// - [`AssetPathError::Absolute`] for rooted paths or drive prefixes
/// - [`AssetPathError::Io`] when root or target cannot be canonicalized
/// - [`AssetPathError::OutsideRoot`] when the canonical target escapes root
/// - [`AssetPathError::NotAFile`] when the target is a directory or special file
pub fn check(root: &Path, relative: &str) -> Result<PathBuf, AssetPathError> {
    if relative.is_empty() {
        return Err(AssetPathError::Empty);
    }
    if relative.contains("..") {
        return Err(AssetPathError::Traversal);
    }
    if is_rooted(relative) {
        return Err(AssetPathError::Absolute);
    }

    let canonical_root = canonicalize(root)?;
    let target = canonicalize(&root.join(relative))?;

    // Symlinks are resolved by canonicalize, so a link pointing out of the
    // sandbox fails here as well.
    if target == canonical_root || !target.starts_with(&canonical_root) {
        return Err(AssetPathError::OutsideRoot);
    }

    let metadata = std::fs::metadata(&target).map_err(|err| AssetPathError::Io {
        path: target.display().to_string(),
        reason: err.to_string(),
    })?;
    if !metadata.is_file() {
        return Err(AssetPathError::NotAFile);
    }

    Ok(target)
}

/// Inverse of [`check`]: turn an absolute path chosen by a file picker into a
/// root-relative path.
///
/// Returns `None` when the selection is not inside `root`. Separators in the
/// result are always `/`. Logging the rejection is left to the caller.
pub fn resolve(root: &Path, absolute: &Path) -> Option<String> {
    let root = normalize(root);
    let selected = normalize(absolute);

    let relative = selected.strip_prefix(&root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Owned asset root used by presets and the public API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoot {
    root: PathBuf,
    ios_bundle_prefix: String,
}

impl AssetRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ios_bundle_prefix: DEFAULT_IOS_BUNDLE_PREFIX.to_string(),
        }
    }

    pub fn with_ios_bundle_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ios_bundle_prefix = prefix.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn is_valid(&self, relative: &str) -> bool {
        is_valid(&self.root, relative)
    }

    pub fn check(&self, relative: &str) -> Result<PathBuf, AssetPathError> {
        check(&self.root, relative)
    }

    pub fn resolve(&self, absolute: impl AsRef<Path>) -> Option<String> {
        resolve(&self.root, absolute.as_ref())
    }

    /// Path as the iOS player expects it inside the app bundle.
    pub fn ios_bundle_path(&self, relative: &str) -> String {
        let prefix = self.ios_bundle_prefix.trim_end_matches('/');
        let relative = relative.trim_start_matches('/');
        if prefix.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", prefix, relative)
        }
    }
}

fn is_rooted(relative: &str) -> bool {
    if relative.starts_with('/') || relative.starts_with('\\') {
        return true;
    }
    let bytes = relative.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return true;
    }
    let path = Path::new(relative);
    path.is_absolute() || path.has_root()
}

fn canonicalize(path: &Path) -> Result<PathBuf, AssetPathError> {
    path.canonicalize().map_err(|err| AssetPathError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Canonical form when the path exists, lexical normalization otherwise.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn asset_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets/sounds")).unwrap();
        fs::write(dir.path().join("assets/sounds/a.hac"), b"{}").unwrap();
        fs::write(dir.path().join("a.hac"), b"{}").unwrap();
        dir
    }

    #[test]
    fn test_accepts_file_inside_root() {
        let dir = asset_tree();
        let root = dir.path().join("assets");
        assert!(is_valid(&root, "sounds/a.hac"));
        assert!(is_valid(&root, "./sounds/a.hac"));
    }

    #[test]
    fn test_rejects_traversal_even_when_target_exists() {
        let dir = asset_tree();
        let root = dir.path().join("assets");
        assert_eq!(check(&root, "../a.hac"), Err(AssetPathError::Traversal));
        assert_eq!(
            check(&root, "sounds/../../a.hac"),
            Err(AssetPathError::Traversal)
        );
    }

    #[test]
    fn test_rejects_rooted_paths() {
        let dir = asset_tree();
        let root = dir.path().join("assets");
        assert_eq!(check(&root, "/etc/passwd"), Err(AssetPathError::Absolute));
        assert_eq!(check(&root, "\\share\\a.hac"), Err(AssetPathError::Absolute));
        assert_eq!(check(&root, "C:\\a.hac"), Err(AssetPathError::Absolute));
    }

    #[test]
    fn test_rejects_empty_missing_and_directories() {
        let dir = asset_tree();
        let root = dir.path().join("assets");
        assert_eq!(check(&root, ""), Err(AssetPathError::Empty));
        assert!(matches!(
            check(&root, "sounds/missing.hac"),
            Err(AssetPathError::Io { .. })
        ));
        assert_eq!(check(&root, "sounds"), Err(AssetPathError::NotAFile));
        assert_eq!(check(&root, "."), Err(AssetPathError::OutsideRoot));
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlink_escaping_root() {
        let dir = asset_tree();
        let root = dir.path().join("assets");
        std::os::unix::fs::symlink(dir.path().join("a.hac"), root.join("escape.hac")).unwrap();
        assert_eq!(check(&root, "escape.hac"), Err(AssetPathError::OutsideRoot));
    }

    #[test]
    fn test_resolve_inside_and_outside_root() {
        let dir = asset_tree();
        let root = dir.path().join("assets");

        assert_eq!(
            resolve(&root, &root.join("sounds/a.hac")),
            Some("sounds/a.hac".to_string())
        );
        assert_eq!(resolve(&root, &dir.path().join("a.hac")), None);
        assert_eq!(resolve(&root, Path::new("/other/x.hac")), None);
        assert_eq!(resolve(&root, &root), None);
    }

    #[test]
    fn test_resolve_does_not_confuse_sibling_prefix() {
        let dir = asset_tree();
        fs::create_dir_all(dir.path().join("assets2")).unwrap();
        fs::write(dir.path().join("assets2/b.hac"), b"{}").unwrap();
        let root = dir.path().join("assets");
        assert_eq!(resolve(&root, &dir.path().join("assets2/b.hac")), None);
    }

    #[test]
    fn test_ios_bundle_path() {
        let root = AssetRoot::new("StreamingAssets");
        assert_eq!(
            root.ios_bundle_path("iOSSamples/Button.ahap"),
            "Data/Raw/iOSSamples/Button.ahap"
        );
        let bare = AssetRoot::new("StreamingAssets").with_ios_bundle_prefix("");
        assert_eq!(bare.ios_bundle_path("/x.ahap"), "x.ahap");
    }
}
