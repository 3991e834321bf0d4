use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use globset::{GlobSet, GlobSetBuilder};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::collector::{ReferenceSet, SchemaReference};
use crate::error::{Result, SchemaGcError};

/// Canonical paths of every schema file found under a base directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileInventory(BTreeSet<SchemaReference>);

impl FileInventory {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, reference: &SchemaReference) -> bool {
        self.0.contains(reference)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaReference> {
        self.0.iter()
    }

    /// Files on disk that no reference reaches
    pub fn unreferenced<'a>(
        &'a self,
        references: &'a ReferenceSet,
    ) -> impl Iterator<Item = &'a SchemaReference> + 'a {
        self.0.iter().filter(move |r| !references.contains(r))
    }

    /// Files on disk that are reachable
    pub fn referenced<'a>(
        &'a self,
        references: &'a ReferenceSet,
    ) -> impl Iterator<Item = &'a SchemaReference> + 'a {
        self.0.iter().filter(move |r| references.contains(r))
    }
}

impl FromIterator<SchemaReference> for FileInventory {
    fn from_iter<I: IntoIterator<Item = SchemaReference>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Recursive scanner for schema files
#[derive(Debug, Clone)]
pub struct SchemaInventory {
    /// File extensions to include, lowercase, without the dot
    extensions: Vec<String>,
    /// Paths (relative to the base directory) that are never inventoried
    exclude_set: Option<GlobSet>,
    /// Follow symbolic links
    follow_symlinks: bool,
}

impl SchemaInventory {
    pub fn new() -> Self {
        Self {
            extensions: vec!["xsd".to_string()],
            exclude_set: None,
            follow_symlinks: false,
        }
    }

    /// Set schema file extensions (`xsd`, `.XSD` and `Xsd` are equivalent)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Add exclude patterns, matched against the path relative to the base directory
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        if patterns.is_empty() {
            self.exclude_set = None;
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = globset::GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| SchemaGcError::InvalidPattern {
                    pattern: pattern.clone(),
                    details: e.to_string(),
                })?;
            builder.add(glob);
        }

        self.exclude_set = Some(builder.build().map_err(|e| SchemaGcError::InvalidPattern {
            pattern: "<exclude set>".to_string(),
            details: e.to_string(),
        })?);
        Ok(self)
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// List every schema file under `base_dir`.
    ///
    /// Directories that cannot be listed are skipped without failing the scan;
    /// only a missing or non-directory `base_dir` is an error.
    pub async fn inventory_xsd_files(&self, base_dir: &Path) -> Result<FileInventory> {
        let inventory_error = |reason: String| SchemaGcError::Inventory {
            path: base_dir.to_path_buf(),
            reason,
        };

        let base = fs::canonicalize(base_dir)
            .await
            .map_err(|e| inventory_error(e.to_string()))?;
        let metadata = fs::metadata(&base)
            .await
            .map_err(|e| inventory_error(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(inventory_error("not a directory".to_string()));
        }

        let mut files = BTreeSet::new();
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut pending_dirs = vec![base.clone()];
        seen_dirs.insert(base.clone());

        while let Some(dir) = pending_dirs.pop() {
            let mut read_dir = match fs::read_dir(&dir).await {
                Ok(read_dir) => read_dir,
                Err(e) => {
                    debug!("Skipping unreadable directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            loop {
                let entry = match read_dir.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        debug!("Stopped listing {}: {}", dir.display(), e);
                        break;
                    }
                };
                let entry_path = entry.path();

                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        debug!("Skipping {}: {}", entry_path.display(), e);
                        continue;
                    }
                };

                let (is_dir, is_file) = if file_type.is_symlink() {
                    if !self.follow_symlinks {
                        continue;
                    }
                    match fs::metadata(&entry_path).await {
                        Ok(target) => (target.is_dir(), target.is_file()),
                        Err(e) => {
                            debug!("Skipping dangling link {}: {}", entry_path.display(), e);
                            continue;
                        }
                    }
                } else {
                    (file_type.is_dir(), file_type.is_file())
                };

                if self.is_excluded(&base, &entry_path) {
                    debug!("Excluded {}", entry_path.display());
                    continue;
                }

                if is_dir {
                    // Symlinked directories can loop back on themselves.
                    match fs::canonicalize(&entry_path).await {
                        Ok(canonical) if seen_dirs.insert(canonical.clone()) => {
                            pending_dirs.push(canonical)
                        }
                        Ok(_) => {}
                        Err(e) => debug!("Skipping {}: {}", entry_path.display(), e),
                    }
                } else if is_file && self.should_process(&entry_path) {
                    match SchemaReference::canonicalize(&entry_path).await {
                        Ok(reference) => {
                            files.insert(reference);
                        }
                        Err(e) => debug!("Skipping {}: {}", entry_path.display(), e),
                    }
                }
            }
        }

        debug!("Inventoried {} schema file(s) under {}", files.len(), base.display());
        Ok(FileInventory(files))
    }

    /// Check if a file has one of the schema extensions
    pub fn should_process(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    fn is_excluded(&self, base: &Path, path: &Path) -> bool {
        let Some(exclude_set) = &self.exclude_set else {
            return false;
        };
        let relative = path.strip_prefix(base).unwrap_or(path);
        exclude_set.is_match(relative)
    }
}

impl Default for SchemaInventory {
    fn default() -> Self {
        Self::new()
    }
}
