use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures
    Quiet,
    /// Show the schema listing and a summary
    #[default]
    Normal,
    /// Also list every reference issue
    Verbose,
}

impl VerbosityLevel {
    /// Default `tracing` filter directive for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per schema, then a summary
    #[default]
    Human,
    /// The full pass report as a JSON document
    Json,
    /// Counts only
    Summary,
}

/// Discover the XML Schemas reachable from WSDL documents and prune the rest
#[derive(Parser, Debug, Clone)]
#[command(name = "schema-gc")]
#[command(
    about = "List the XSD files reachable from WSDL documents and optionally delete the unreferenced ones"
)]
#[command(version)]
pub struct Cli {
    /// WSDL (or XSD) documents whose schema references are followed
    #[arg(required = true, help = "WSDL or XSD root documents")]
    pub roots: Vec<PathBuf>,

    /// Directory scanned for schema files
    #[arg(
        short = 'b',
        long = "base-dir",
        help = "Directory holding the schema files (default: directory of the first root)"
    )]
    pub base_dir: Option<PathBuf>,

    /// Delete schema files that no root references
    #[arg(long = "prune")]
    pub prune: bool,

    /// Report what --prune would delete without deleting it
    #[arg(short = 'n', long = "dry-run", requires = "prune")]
    pub dry_run: bool,

    /// Prune even if some referenced schema could not be parsed
    #[arg(long = "force", requires = "prune")]
    pub force: bool,

    /// Schema file extensions (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "Schema file extensions (e.g., 'xsd,xs')"
    )]
    pub extensions: Option<String>,

    /// Paths relative to the base directory that are never inventoried or pruned
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Follow symbolic links while scanning the base directory
    #[arg(long = "follow-symlinks")]
    pub follow_symlinks: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (failures only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        for root in &self.roots {
            if !root.is_file() {
                return Err(format!("Root document does not exist: {}", root.display()));
            }
        }
        if let Some(base_dir) = &self.base_dir
            && !base_dir.is_dir()
        {
            return Err(format!("Base directory does not exist: {}", base_dir.display()));
        }
        Ok(())
    }
}
