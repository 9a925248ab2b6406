// auditfill
// Main entry point for the auditfill binary

use auditfill_engine::cli::{Cli, Command, ConfigAction};
use auditfill_engine::config::Config;
use auditfill_engine::handlers::{
    handle_config_show, handle_config_validate, handle_context, handle_doctor, handle_run,
    OutputFormat,
};
use auditfill_engine::telemetry::init_telemetry_with_level;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Make GEMINI_API_KEY from a local .env visible to the secret resolver
    let dotenv_path = dotenvy::dotenv().ok();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log > config; RUST_LOG still wins inside the subscriber
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("auditfill v{} ({} - {})", version, commit, timestamp);
    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {:?}", path);
    }

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    match cli.command {
        Command::Run {
            data,
            templates,
            company,
            output,
        } => {
            tracing::info!("Filling {} template path(s)", templates.len());
            handle_run(data, templates, company, output, &config, format).await
        }

        Command::Context {
            data,
            company,
            output,
        } => {
            tracing::info!("Generating system context only");
            handle_context(data, company, output, &config, format).await
        }

        Command::Config { action } => {
            tracing::info!("Config management: {:?}", action);
            match action {
                ConfigAction::Show => handle_config_show(&config, format),
                ConfigAction::Validate => {
                    handle_config_validate(&config, cli.config.as_deref(), format)
                }
            }
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }
    }
}
