//! Schema reference discovery
//!
//! Walks `schemaLocation` references outward from the schema fragments of one or
//! more root documents and produces the closed set of schema files they reach.
//! Identity is the canonical path, so `./a.xsd`, `a.xsd` and `sub/../a.xsd`
//! all name the same schema.
//!
//! The walk is an explicit depth-first worklist. Every reference is resolved
//! against the directory of the document that wrote it, not the root's.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ParseError, Result, ResolutionError};
use crate::wsdl::{self, Directive, LocationRef, RootDocument, RootKind, SchemaFragment};

/// Canonical absolute path of one schema document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaReference(PathBuf);

impl SchemaReference {
    /// Resolve a raw `schemaLocation` against the referencing document's directory.
    ///
    /// The location is read as a URI reference first, so `my%20types.xsd` and
    /// `file:///schemas/my%20types.xsd` name `my types.xsd`. The literal text is
    /// tried second for locations that are not valid URI references.
    pub async fn resolve(
        base_dir: &Path,
        location: &str,
    ) -> std::result::Result<Self, ResolutionError> {
        let location = location.trim();
        if is_remote(location) {
            return Err(ResolutionError::Remote {
                location: location.to_string(),
            });
        }

        let literal = base_dir.join(strip_file_scheme(location));
        let mut candidates = Vec::with_capacity(2);
        if let Some(decoded) = uri_to_path(base_dir, location) {
            candidates.push(decoded);
        }
        if !candidates.contains(&literal) {
            candidates.push(literal);
        }

        let mut reason = String::new();
        for candidate in &candidates {
            match existing_file(candidate).await {
                Ok(canonical) => return Ok(Self(canonical)),
                Err(e) => reason = e,
            }
        }

        Err(ResolutionError::NotFound {
            location: location.to_string(),
            base_dir: base_dir.to_path_buf(),
            target: candidates[0].clone(),
            reason,
        })
    }

    /// Canonicalize a path that is expected to exist on disk
    pub async fn canonicalize(path: &Path) -> std::io::Result<Self> {
        tokio::fs::canonicalize(path).await.map(Self)
    }

    /// Wrap a path the caller already knows to be canonical
    pub(crate) fn from_canonical(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory that this schema's own references resolve against
    pub fn base_dir(&self) -> &Path {
        self.0.parent().unwrap_or(Path::new("/"))
    }

}

impl AsRef<Path> for SchemaReference {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SchemaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// `http:`, `https:`, `urn:` and the like. A `file:` URL or a Windows drive
/// letter is local.
fn is_remote(location: &str) -> bool {
    let Some((scheme, _)) = location.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && !scheme.eq_ignore_ascii_case("file")
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join a location onto `base_dir` as a URI reference and decode it to a path
fn uri_to_path(base_dir: &Path, location: &str) -> Option<PathBuf> {
    let base = Url::from_directory_path(base_dir).ok()?;
    let url = base.join(location).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

async fn existing_file(candidate: &Path) -> std::result::Result<PathBuf, String> {
    let canonical = tokio::fs::canonicalize(candidate)
        .await
        .map_err(|e| e.to_string())?;
    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|e| e.to_string())?;
    if !metadata.is_file() {
        return Err("not a regular file".to_string());
    }
    Ok(canonical)
}

fn strip_file_scheme(location: &str) -> &str {
    match location.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("file:") => {
            let rest = &location[5..];
            // file:///abs -> /abs
            rest.strip_prefix("//").unwrap_or(rest)
        }
        _ => location,
    }
}

/// Set of schema references, iterated in path order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceSet(BTreeSet<SchemaReference>);

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reference; returns false if it was already present
    pub fn insert(&mut self, reference: SchemaReference) -> bool {
        self.0.insert(reference)
    }

    pub fn contains(&self, reference: &SchemaReference) -> bool {
        self.0.contains(reference)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.0.contains(&SchemaReference(path.to_path_buf()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaReference> {
        self.0.iter()
    }
}

impl FromIterator<SchemaReference> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = SchemaReference>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ReferenceSet {
    type Item = &'a SchemaReference;
    type IntoIter = std::collections::btree_set::Iter<'a, SchemaReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Cycle and diamond suppression for one discovery pass
#[derive(Debug, Default)]
pub struct VisitedSet(HashSet<SchemaReference>);

impl VisitedSet {
    /// Mark a reference as visited; returns false if it already was
    pub fn mark(&mut self, reference: &SchemaReference) -> bool {
        if self.0.contains(reference) {
            return false;
        }
        self.0.insert(reference.clone())
    }

    pub fn contains(&self, reference: &SchemaReference) -> bool {
        self.0.contains(reference)
    }
}

/// A recoverable problem met while following references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ReferenceIssue {
    /// The location names no local file (missing, or remote)
    Unresolved {
        referrer: PathBuf,
        directive: Directive,
        error: ResolutionError,
    },
    /// The file exists but could not be read or parsed, so its own
    /// references are unknown
    Unparsable {
        referrer: PathBuf,
        directive: Directive,
        error: ParseError,
    },
}

impl ReferenceIssue {
    pub fn referrer(&self) -> &Path {
        match self {
            ReferenceIssue::Unresolved { referrer, .. }
            | ReferenceIssue::Unparsable { referrer, .. } => referrer,
        }
    }

    pub fn is_unparsable(&self) -> bool {
        matches!(self, ReferenceIssue::Unparsable { .. })
    }

    /// Local path a missing schema was expected at
    pub fn missing_target(&self) -> Option<&Path> {
        match self {
            ReferenceIssue::Unresolved { error, .. } => error.missing_target(),
            ReferenceIssue::Unparsable { .. } => None,
        }
    }
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (directive, error): (&Directive, &dyn fmt::Display) = match self {
            ReferenceIssue::Unresolved {
                directive, error, ..
            } => (directive, error as &dyn fmt::Display),
            ReferenceIssue::Unparsable {
                directive, error, ..
            } => (directive, error as &dyn fmt::Display),
        };
        write!(
            f,
            "{} ({}): {}",
            self.referrer().display(),
            directive.as_str(),
            error
        )
    }
}

/// How complete a finished walk is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkOutcome {
    /// Every reference resolved and parsed
    Complete,
    /// Some locations named no local file; the set is still closed
    Partial,
    /// Some referenced schema could not be parsed; the set may be missing
    /// whatever that schema references
    Degraded,
}

/// Result of a finished discovery pass
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub roots: Vec<PathBuf>,
    pub references: ReferenceSet,
    pub issues: Vec<ReferenceIssue>,
}

impl CollectionReport {
    pub fn outcome(&self) -> WalkOutcome {
        if self.issues.iter().any(ReferenceIssue::is_unparsable) {
            WalkOutcome::Degraded
        } else if !self.issues.is_empty() {
            WalkOutcome::Partial
        } else {
            WalkOutcome::Complete
        }
    }

    pub fn unparsable_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_unparsable()).count()
    }
}

#[derive(Debug)]
struct PendingReference {
    referrer: PathBuf,
    base_dir: PathBuf,
    location: LocationRef,
}

/// Collects every schema transitively reachable from the fragments fed to it.
///
/// One instance is one pass: the visited set lives here and is dropped with it.
#[derive(Debug, Default)]
pub struct SchemaReferenceCollector {
    visited: VisitedSet,
    references: ReferenceSet,
    issues: Vec<ReferenceIssue>,
    roots: Vec<PathBuf>,
}

impl SchemaReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every root document, then walk them all.
    ///
    /// Roots are loaded up front so that a broken root fails the pass before
    /// any reference is followed.
    pub async fn collect_from_paths(paths: &[PathBuf]) -> Result<CollectionReport> {
        let mut roots = Vec::with_capacity(paths.len());
        for path in paths {
            roots.push(wsdl::load_root(path).await?);
        }

        let mut collector = Self::new();
        for root in &roots {
            collector.collect_root(root).await;
        }
        Ok(collector.finish())
    }

    /// Walk every schema fragment of a parsed root document
    pub async fn collect_root(&mut self, root: &RootDocument) -> &ReferenceSet {
        debug!(
            "Collecting from root {} ({} fragment(s))",
            root.path.display(),
            root.fragments.len()
        );
        self.roots.push(root.path.clone());

        if root.kind == RootKind::Schema {
            // A standalone XSD root is itself a live schema file.
            let itself = SchemaReference::from_canonical(root.path.clone());
            if self.visited.mark(&itself) {
                self.references.insert(itself);
            }
        }

        for fragment in &root.fragments {
            self.collect_references(fragment, root.base_dir()).await;
        }
        &self.references
    }

    /// Follow every reference of one schema element, transitively
    pub async fn collect_references(
        &mut self,
        fragment: &SchemaFragment,
        base_dir: &Path,
    ) -> &ReferenceSet {
        let mut pending: Vec<PendingReference> = Vec::new();
        push_fragment(&mut pending, fragment, base_dir);

        while let Some(next) = pending.pop() {
            let reference =
                match SchemaReference::resolve(&next.base_dir, &next.location.location).await {
                    Ok(reference) => reference,
                    Err(error) => {
                        warn!("Skipping reference from {}: {}", next.referrer.display(), error);
                        self.issues.push(ReferenceIssue::Unresolved {
                            referrer: next.referrer,
                            directive: next.location.directive,
                            error,
                        });
                        continue;
                    }
                };

            if !self.visited.mark(&reference) {
                debug!("Already visited {}", reference);
                continue;
            }

            debug!(
                "Found {} via {} in {}",
                reference,
                next.location.directive.as_str(),
                next.referrer.display()
            );
            self.references.insert(reference.clone());

            match wsdl::load_schema(reference.path()).await {
                Ok(child) => push_fragment(&mut pending, &child, reference.base_dir()),
                Err(error) => {
                    warn!("Cannot follow references of {}: {}", reference, error.details);
                    self.issues.push(ReferenceIssue::Unparsable {
                        referrer: next.referrer,
                        directive: next.location.directive,
                        error,
                    });
                }
            }
        }

        &self.references
    }

    pub fn finish(self) -> CollectionReport {
        CollectionReport {
            roots: self.roots,
            references: self.references,
            issues: self.issues,
        }
    }
}

/// Queue a fragment's locations so they pop in document order
fn push_fragment(pending: &mut Vec<PendingReference>, fragment: &SchemaFragment, base_dir: &Path) {
    pending.extend(fragment.locations.iter().rev().map(|location| PendingReference {
        referrer: fragment.document.clone(),
        base_dir: base_dir.to_path_buf(),
        location: location.clone(),
    }));
}
