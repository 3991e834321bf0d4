//! # schema-gc Library
//!
//! Discovers every XML Schema file transitively referenced from WSDL documents
//! through `xs:import`/`xs:include` `schemaLocation` attributes, and diffs that
//! set against the schema files on disk so the unreferenced ones can be reported
//! or pruned.

pub mod cli;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod output;
pub mod pruner;
pub mod wsdl;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use collector::{
    CollectionReport, ReferenceIssue, ReferenceSet, SchemaReference, SchemaReferenceCollector,
    VisitedSet, WalkOutcome,
};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider};
pub use engine::{PassPhase, PassReport, SchemaGcEngine};
pub use error::{DeletionError, ParseError, ResolutionError, SchemaGcError};
pub use inventory::{FileInventory, SchemaInventory};
pub use output::Output;
pub use pruner::{PruneReport, Pruner, prune_unreferenced};
pub use wsdl::{Directive, LocationRef, RootDocument, RootKind, SchemaFragment};
