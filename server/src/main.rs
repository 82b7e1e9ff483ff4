//! Server entrypoint for conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection: config loading, logging, provider registration
//! from the environment, and the stdio protocol server.

use anyhow::{Result, bail};
use clap::Parser;
use conclave_application::{
    ConversationStore, Dispatcher, ExchangeLogger, NoExchangeLogger, ProviderPort,
    ProviderRegistry, RestrictionPolicy, ToolContext, builtin_tools,
};
use conclave_domain::ValidationIssue;
use conclave_infrastructure::{
    ConfigLoader, FileConfig, GeminiProvider, JsonlExchangeLogger, LocalFileReader,
    OpenAiProvider, StdioServer, XaiProvider,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Multi-provider AI orchestration server speaking JSON-RPC over stdio.
#[derive(Parser, Debug)]
#[command(name = "conclave", version, about)]
struct Cli {
    /// Explicit config file path (overrides discovery)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip config files entirely and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Print config file locations and exit
    #[arg(long)]
    show_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Disable file logging (console only)
    #[arg(long)]
    no_log_file: bool,
}

/// Handles that keep telemetry alive for the process lifetime.
struct Telemetry {
    /// Flushes buffered file logs when dropped.
    _file_guard: Option<WorkerGuard>,
    /// Where the exchange transcript should be written, if anywhere.
    exchange_log: Option<PathBuf>,
}

/// Wire up tracing and pick the exchange transcript location.
///
/// Two layers: stderr always (stdout carries the JSON-RPC protocol and may
/// never see a log line), plus a per-session file at debug level unless
/// `--no-log-file` is set or the directory cannot be created. A `RUST_LOG`
/// value takes precedence over the `-v` mapping for the stderr layer.
fn setup_logging(cli: &Cli) -> Telemetry {
    const LEVELS: [&str; 4] = ["warn", "info", "debug", "trace"];
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LEVELS[cli.verbose.min(3) as usize]));
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let mut file_guard = None;
    let mut exchange_log = None;
    let file_layer = if cli.no_log_file {
        None
    } else {
        let log_dir = cli
            .log_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("conclave").join("logs")))
            .unwrap_or_else(|| PathBuf::from(".conclave").join("logs"));

        match std::fs::create_dir_all(&log_dir) {
            Ok(()) => {
                // One stamp names both files of a session.
                let stamp = format!(
                    "conclave-{}.{}",
                    chrono::Local::now().format("%Y%m%d-%H%M%S"),
                    std::process::id()
                );
                let (writer, guard) = tracing_appender::non_blocking(
                    tracing_appender::rolling::never(&log_dir, format!("{}.log", stamp)),
                );
                file_guard = Some(guard);
                exchange_log = Some(log_dir.join(format!("{}.exchange.jsonl", stamp)));

                let file_level = if cli.verbose >= 3 { "trace" } else { "debug" };
                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(writer)
                        .with_filter(EnvFilter::new(file_level)),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: log directory {} unavailable ({}); continuing without file logs",
                    log_dir.display(),
                    e
                );
                None
            }
        }
    };

    // A `None` layer is a no-op, so one init covers every combination.
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Telemetry {
        _file_guard: file_guard,
        exchange_log,
    }
}

/// Register every provider whose credentials are configured.
fn build_registry(config: &FileConfig) -> ProviderRegistry {
    let restrictions = RestrictionPolicy::from_env()
        .with_global_allow(config.restrictions.allow.iter().cloned())
        .with_global_deny(config.restrictions.deny.iter().cloned());
    let mut registry = ProviderRegistry::new(restrictions);

    if config.providers.gemini.enabled
        && let Some(provider) = GeminiProvider::from_env(config.providers.gemini.base_url.as_deref())
    {
        registry.register(Arc::new(provider) as Arc<dyn ProviderPort>);
    }
    if config.providers.openai.enabled
        && let Some(provider) = OpenAiProvider::from_env(config.providers.openai.base_url.as_deref())
    {
        registry.register(Arc::new(provider) as Arc<dyn ProviderPort>);
    }
    if config.providers.xai.enabled
        && let Some(provider) = XaiProvider::from_env(config.providers.xai.base_url.as_deref())
    {
        registry.register(Arc::new(provider) as Arc<dyn ProviderPort>);
    }

    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle --show-config flag
    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // Load configuration (respecting --no-config flag)
    let config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config file: {}", e);
            ConfigLoader::load_defaults()
        })
    };

    // Validate configuration
    let config_issues = config.validate();
    for issue in &config_issues {
        match issue.severity {
            conclave_domain::Severity::Warning => eprintln!("Warning: {}", issue.message),
            conclave_domain::Severity::Error => eprintln!("Error: {}", issue.message),
        }
    }
    if ValidationIssue::has_errors(&config_issues) {
        bail!("Invalid configuration");
    }

    let telemetry = setup_logging(&cli);

    // Exchange transcript: fall back to the no-op logger rather than refuse
    // to serve when the file cannot be opened.
    let exchange_logger: Arc<dyn ExchangeLogger> = match telemetry.exchange_log.as_deref() {
        Some(path) => match JsonlExchangeLogger::create(path) {
            Ok(logger) => {
                info!("Exchange transcript: {}", logger.path().display());
                Arc::new(logger)
            }
            Err(e) => {
                eprintln!("Warning: exchange transcript disabled: {}", e);
                Arc::new(NoExchangeLogger)
            }
        },
        None => Arc::new(NoExchangeLogger),
    };

    info!("Starting conclave");

    // Create cancellation token for graceful shutdown
    let cancellation_token = CancellationToken::new();

    // Set up Ctrl+C signal handler
    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\nInterrupted. Shutting down gracefully...");
                shutdown_token.cancel();
            }
            Err(e) => {
                eprintln!("Failed to listen for Ctrl+C signal: {}", e);
            }
        }
    });

    // === Dependency Injection ===
    let registry = Arc::new(build_registry(&config));
    if registry.provider_count() == 0 {
        bail!(
            "No providers configured. Set at least one of GEMINI_API_KEY, \
             OPENAI_API_KEY, or XAI_API_KEY."
        );
    }
    info!(
        "{} provider(s) registered, {} model(s) available",
        registry.provider_count(),
        registry.list_available().len()
    );

    let context = ToolContext {
        registry: Arc::clone(&registry),
        store: Arc::new(ConversationStore::new()),
        files: Arc::new(LocalFileReader::new()),
        logger: exchange_logger,
        cancel: cancellation_token.clone(),
        expert_model: config.expert.model.clone(),
    };
    let dispatcher = Arc::new(Dispatcher::new(builtin_tools(context)));

    let server = StdioServer::new(dispatcher, registry, cancellation_token);
    server.run().await?;

    info!("conclave stopped");
    Ok(())
}
