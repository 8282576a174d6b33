//! Ignore matching for watched paths.

use crate::error::WatchError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Decides which paths under a root are ignored by a checker.
///
/// The patterns name what the checker watches; everything else is ignored.
/// Directories are never ignored, so the watcher can descend into them.
/// Exclusions added with [`IgnoreMatcher::with_excludes`] win over the
/// watched patterns.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    root: Utf8PathBuf,
    globs: GlobSet,
    excludes: GlobSet,
}

impl IgnoreMatcher {
    /// Builds a matcher for `patterns`, each relative to `root`.
    ///
    /// A pattern without wildcards naming an existing directory also matches
    /// everything below it.
    pub fn new<S: AsRef<str>>(root: &Utf8Path, patterns: &[S]) -> Result<Self, WatchError> {
        Ok(Self {
            root: root.to_owned(),
            globs: build_globs(root, patterns)?,
            excludes: GlobSet::empty(),
        })
    }

    /// Ignores every path matching one of `patterns`, even a watched one.
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, WatchError> {
        self.excludes = build_globs(&self.root, patterns)?;
        Ok(self)
    }

    /// Returns the root the patterns are resolved against.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns true if `path` is ignored.
    ///
    /// `is_dir` saves a stat when the caller already knows the file type. A
    /// path that cannot be stat'ed (e.g. just deleted) counts as a file.
    pub fn is_ignored(&self, path: &Utf8Path, is_dir: Option<bool>) -> bool {
        if path
            .components()
            .any(|c| matches!(c, Utf8Component::Normal("node_modules")))
        {
            return true;
        }

        if path == self.root {
            return false;
        }

        let relative = relative_to(&self.root, path);
        if self.excludes.is_match(&relative) {
            return true;
        }

        if self.globs.is_match(&relative) {
            return false;
        }

        !is_dir.unwrap_or_else(|| path.is_dir())
    }
}

/// Compiles `patterns`, each relative to `root`, into one set.
///
/// A pattern without wildcards naming an existing directory also matches
/// everything below it.
fn build_globs<S: AsRef<str>>(root: &Utf8Path, patterns: &[S]) -> Result<GlobSet, WatchError> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let resolved = root.join(pattern);
        let relative = relative_to(root, &resolved);

        let mut expanded = vec![relative.clone()];
        if !relative.contains('*') && resolved.is_dir() {
            expanded.push(if relative.is_empty() {
                "**/*".to_string()
            } else {
                format!("{relative}/**/*")
            });
        }

        for glob in expanded.into_iter().filter(|g| !g.is_empty()) {
            let glob = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|source| WatchError::InvalidGlob {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
        }
    }

    builder.build().map_err(|source| WatchError::InvalidGlob {
        pattern: patterns
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", "),
        source,
    })
}

/// Returns `path` relative to `root` with `/` separators and `.` removed.
fn relative_to(root: &Utf8Path, path: &Utf8Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter(|c| !matches!(c, Utf8Component::CurDir))
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/")
}
