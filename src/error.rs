use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Main application error type for everything that ends a pass
#[derive(Error, Debug)]
pub enum SchemaGcError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Schema inventory failed: {path} - {reason}")]
    Inventory { path: PathBuf, reason: String },

    #[error("Invalid glob pattern '{pattern}': {details}")]
    InvalidPattern { pattern: String, details: String },

    #[error(
        "Refusing to prune: {unparsable} referenced schema(s) could not be parsed, \
         so the reference set may be incomplete (use --force to override)"
    )]
    PruneRefused { unparsable: usize },

    #[error(
        "Refusing to prune: {candidates} unreferenced schema(s) share a file name with a \
         schemaLocation that did not resolve (use --force to override)"
    )]
    UnresolvedMatch { candidates: usize },
}

/// A WSDL or XSD document could not be read or is not well-formed.
///
/// Fatal for a root document, recorded as an issue for a referenced schema.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Failed to parse {path}: {details}")]
pub struct ParseError {
    pub path: PathBuf,
    pub details: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            details: details.into(),
        }
    }
}

/// A `schemaLocation` value that does not name a local file
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionError {
    #[error("schemaLocation '{location}' does not resolve under {base_dir}: {reason}")]
    NotFound {
        location: String,
        base_dir: PathBuf,
        /// Decoded path the location was expected at
        target: PathBuf,
        reason: String,
    },

    #[error("schemaLocation '{location}' is remote and was not fetched")]
    Remote { location: String },
}

impl ResolutionError {
    pub fn location(&self) -> &str {
        match self {
            ResolutionError::NotFound { location, .. } | ResolutionError::Remote { location } => {
                location
            }
        }
    }

    /// Where a local location pointed, when nothing was there
    pub fn missing_target(&self) -> Option<&Path> {
        match self {
            ResolutionError::NotFound { target, .. } => Some(target),
            ResolutionError::Remote { .. } => None,
        }
    }
}

/// A file scheduled for pruning that could not be removed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Failed to delete {path}: {reason}")]
pub struct DeletionError {
    pub path: PathBuf,
    pub reason: String,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SchemaGcError>;
