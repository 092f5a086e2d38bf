//! CLI entrypoint for llm-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    AppState, ConversationService, SettingsService, TurnController, TurnOutcome, TurnPolicy,
};
use council_domain::{ConversationId, OutputFormat, Settings};
use council_infrastructure::{
    CachedModelCatalog, ConfigLoader, FileConfig, FileSettingsStore, HttpCouncilClient,
    JsonlConversationLogger, MirroredSettingsStore,
};
use council_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputConfig, ReplConfig, run_turn,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;

    let log_dir = cli.log_dir.clone().or_else(|| config.logging.dir.clone());
    let _guard = init_logging(cli.verbose, log_dir.as_ref());
    info!("Starting llm-council");

    // === Dependency Injection ===
    let base_url = cli
        .backend
        .clone()
        .unwrap_or_else(|| config.backend.base_url.clone());
    let client = Arc::new(
        HttpCouncilClient::new(&base_url)?
            .with_request_timeout(config.backend.timeout())
            .with_idle_timeout(config.backend.idle_timeout()),
    );
    info!("Council backend: {}", client.base_url());

    let data_dir = ConfigLoader::data_dir();
    let defaults = config.council.to_settings();
    let state = Arc::new(AppState::new(defaults.clone()));

    let conversations = ConversationService::new(Arc::clone(&client), Arc::clone(&state));

    let policy = turn_policy(&config);
    let mut controller = TurnController::new(Arc::clone(&client), conversations.clone(), policy);
    if let Some(path) = &config.logging.transcript {
        match JsonlConversationLogger::new(path) {
            Some(logger) => controller = controller.with_logger(Arc::new(logger)),
            None => warn!("Transcript disabled: cannot open {}", path.display()),
        }
    }

    let mut catalog = CachedModelCatalog::new(Arc::clone(&client), config.catalog.cache_ttl());
    let snapshot_path = config
        .catalog
        .snapshot_path
        .clone()
        .or_else(|| data_dir.as_ref().map(|d| d.join("models.json")));
    if let Some(path) = snapshot_path {
        catalog = catalog.with_snapshot(path);
    }

    let settings_path = data_dir
        .as_ref()
        .map(|d| d.join("settings.json"))
        .unwrap_or_else(|| PathBuf::from(".council-settings.json"));
    let local_settings = Arc::new(FileSettingsStore::new(settings_path, defaults));
    let settings_store = Arc::new(MirroredSettingsStore::new(Arc::clone(&client), local_settings));
    let settings = SettingsService::new(settings_store, Arc::new(catalog), Arc::clone(&state));

    let output = output_config(&cli, &config);
    if !output.color {
        colored::control::set_override(false);
    }

    // === Settings and catalog commands ===
    if cli.list_models {
        settings.load().await;
        let models = settings.list_models(cli.refresh).await;
        print!("{}", ConsoleFormatter::format_models(&models, &settings.get()));
        return Ok(());
    }

    if cli.reset_settings {
        let reset = settings.reset().await?;
        println!("Settings restored to defaults");
        print!("{}", ConsoleFormatter::format_settings(&reset));
        return Ok(());
    }

    let loaded = settings.load().await;
    if let Some(notice) = &loaded.notice
        && !cli.quiet
    {
        eprintln!("{}", notice);
    }

    if cli.has_council_override() {
        let current = settings.get();
        let council_models = if cli.council_models.is_empty() {
            current.council_models
        } else {
            cli.council_models.clone()
        };
        let chairman = cli.chairman.clone().unwrap_or(current.chairman_model);
        settings
            .save(Settings::new(council_models, chairman))
            .await
            .context("Failed to apply council settings")?;
    }

    if cli.show_settings {
        print!("{}", ConsoleFormatter::format_settings(&settings.get()));
        return Ok(());
    }

    // Chat mode
    if cli.chat {
        let repl_config = ReplConfig {
            show_progress: !cli.quiet && config.repl.show_progress,
            history_file: config.repl.history_file.as_ref().map(PathBuf::from),
        };
        let repl = ChatRepl::new(controller, conversations, settings)
            .with_output(output)
            .with_config(repl_config);

        repl.run().await?;
        return Ok(());
    }

    // Single question mode - question is required
    let question = match cli.question {
        Some(ref q) if !q.trim().is_empty() => q.clone(),
        _ => bail!("Question is required. Use --chat for interactive mode."),
    };

    let conversation_id = match &cli.conversation {
        Some(id) => {
            let id = ConversationId::new(id.as_str());
            conversations
                .select(&id)
                .await
                .with_context(|| format!("Failed to load conversation {}", id))?;
            id
        }
        None => conversations
            .create()
            .await
            .context("Failed to create conversation")?,
    };

    if !cli.quiet && output.format != OutputFormat::Json {
        let current = settings.get();
        println!();
        println!("+============================================================+");
        println!("|                    LLM Council                             |");
        println!("+============================================================+");
        println!();
        println!("Question: {}", question);
        println!("Council: {}", current.council_models.join(", "));
        println!("Chairman: {}", current.chairman_model);
        println!();
    }

    let outcome = run_turn(
        &controller,
        &conversation_id,
        &question,
        &output,
        !cli.quiet,
    )
    .await;

    match outcome {
        TurnOutcome::Completed { .. } => Ok(()),
        TurnOutcome::Cancelled { .. } => bail!("Cancelled"),
        other => match other.error() {
            Some(error) => bail!("Turn failed: {}", error),
            None => bail!("Nothing was sent"),
        },
    }
}

/// Initialize logging based on verbosity level, optionally with a
/// daily-rolling log file.
fn init_logging(verbose: u8, log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "llm-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            None
        }
    }
}

fn turn_policy(config: &FileConfig) -> TurnPolicy {
    TurnPolicy {
        serialize_turns: config.behavior.serialize_turns,
        rollback_on_transport_failure: config.behavior.rollback_on_transport_failure,
    }
}

/// CLI flags take priority over the `[output]` section.
fn output_config(cli: &Cli, config: &FileConfig) -> OutputConfig {
    let format = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();
    OutputConfig {
        format,
        color: config.output.color,
    }
}
