use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use schema_gc::{Cli, Config, ConfigManager, Output, PassReport, SchemaGcEngine, VerbosityLevel};

/// Exit code when the pass ran but some deletions failed
const EXIT_DELETION_FAILURES: u8 = 2;

fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli, config: Config) -> anyhow::Result<PassReport> {
    let engine = SchemaGcEngine::new(config);
    let base_dir = engine.resolve_base_dir(&cli.roots);
    engine.run(&cli.roots).await.with_context(|| {
        format!(
            "schema discovery from {} root(s) under {} failed",
            cli.roots.len(),
            base_dir.display()
        )
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::FAILURE;
    }

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.output.verbosity());
    let output = Output::new(config.output.format, config.output.verbosity());

    match run(&cli, config).await {
        Ok(report) => {
            print!("{}", output.format_report(&report));
            if report.has_deletion_failures() {
                ExitCode::from(EXIT_DELETION_FAILURES)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
