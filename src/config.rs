use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub inventory: InventoryConfig,
    pub prune: PruneConfig,
    pub output: OutputConfig,
}

/// Schema file scan configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InventoryConfig {
    /// Directory scanned for schema files (default: directory of the first root)
    pub base_dir: Option<PathBuf>,
    /// Schema file extensions
    pub extensions: Vec<String>,
    /// Exclude patterns (glob syntax, relative to the base directory)
    pub exclude_patterns: Vec<String>,
    /// Follow symbolic links during the scan
    pub follow_symlinks: bool,
}

/// Prune step configuration.
///
/// `enabled` and `force` are never read from a file or the environment; only
/// `--prune` and `--force` turn them on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PruneConfig {
    /// Delete unreferenced schema files
    #[serde(skip_deserializing)]
    pub enabled: bool,
    /// Report candidates without deleting
    pub dry_run: bool,
    /// Prune even when the reference set may be incomplete
    #[serde(skip_deserializing)]
    pub force: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbose: bool,
    pub quiet: bool,
}

impl OutputConfig {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            extensions: vec!["xsd".to_string()],
            exclude_patterns: vec![],
            follow_symlinks: false,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli).await
    }

    /// Load configuration reading the environment through `env`
    pub async fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        // Missing sections and keys fall back to defaults
        let mut config = if let Some(config_path) = &cli.config {
            Self::load_from_file(config_path).await?
        } else {
            Self::find_config_file().await?.unwrap_or_default()
        };

        config = Self::apply_environment_overrides_with(env, config)?;

        // CLI arguments have the highest precedence
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "schema-gc.toml",
            "schema-gc.json",
            ".schema-gc.toml",
            ".schema-gc.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("schema-gc");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        fn parse_bool(key: &str, value: &str) -> Result<bool> {
            value.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid {} value: {}", key, value))
            })
        }

        fn split_list(value: &str) -> Vec<String> {
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }

        // Inventory settings
        if let Some(base_dir) = env.get("SCHEMA_GC_BASE_DIR") {
            config.inventory.base_dir = Some(PathBuf::from(base_dir));
        }

        if let Some(extensions) = env.get("SCHEMA_GC_EXTENSIONS") {
            config.inventory.extensions = split_list(&extensions);
        }

        if let Some(exclude) = env.get("SCHEMA_GC_EXCLUDE") {
            config.inventory.exclude_patterns = split_list(&exclude);
        }

        if let Some(follow) = env.get("SCHEMA_GC_FOLLOW_SYMLINKS") {
            config.inventory.follow_symlinks = parse_bool("SCHEMA_GC_FOLLOW_SYMLINKS", &follow)?;
        }

        // Prune settings
        if let Some(dry_run) = env.get("SCHEMA_GC_DRY_RUN") {
            config.prune.dry_run = parse_bool("SCHEMA_GC_DRY_RUN", &dry_run)?;
        }

        // Output settings
        if let Some(verbose) = env.get("SCHEMA_GC_VERBOSE") {
            config.output.verbose = parse_bool("SCHEMA_GC_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("SCHEMA_GC_QUIET") {
            config.output.quiet = parse_bool("SCHEMA_GC_QUIET", &quiet)?;
        }

        if let Some(format) = env.get("SCHEMA_GC_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "json" => OutputFormat::Json,
                "summary" => OutputFormat::Summary,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid SCHEMA_GC_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence).
    ///
    /// Boolean flags can only switch a setting on, except the destructive
    /// prune switches, which come from the command line alone.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        // Inventory settings
        if let Some(base_dir) = &cli.base_dir {
            config.inventory.base_dir = Some(base_dir.clone());
        }
        if let Some(extensions) = cli.get_extensions() {
            config.inventory.extensions = extensions;
        }
        if !cli.exclude_patterns.is_empty() {
            config.inventory.exclude_patterns = cli.exclude_patterns.clone();
        }
        config.inventory.follow_symlinks |= cli.follow_symlinks;

        // Prune settings
        config.prune.enabled = cli.prune;
        config.prune.dry_run |= cli.dry_run;
        config.prune.force = cli.force;

        // Output settings
        if let Some(format) = cli.format {
            config.output.format = format;
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.inventory.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one schema file extension must be specified".to_string(),
            ));
        }

        for ext in &config.inventory.extensions {
            let ext = ext.trim_start_matches('.');
            if ext.is_empty() || ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "Invalid schema file extension: {}",
                    ext
                )));
            }
        }

        for pattern in &config.inventory.exclude_patterns {
            globset::Glob::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
        }

        Ok(())
    }
}
