use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use codeditor_core::config::{ConfigLoader, EditorConfig, ExecutionBackend};
use codeditor_core::editor::{Document, EditorSurface};
use codeditor_core::executors::remote::HttpCodeExecutor;
use codeditor_core::navigation::RecordingNavigator;
use codeditor_core::session::StaticSessions;
use codeditor_core::{EditorError, EditorFactory, ExecutionRequest, ExecutionResult, Registry};
use codeditor_server::{shutdown_signal, BackendServer, CorsPolicy, ServerConfig};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod terminal;

use terminal::TerminalEditor;

const DEFAULT_CONFIG: &str = "codeditor.yaml";

#[derive(Parser, Debug)]
#[clap(name = "CodeDitor", author, version = "0.1.0", about = "CodeDitor editor page and backend")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, global = true, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Overrides `logging.level` from the configuration
    #[clap(long, short, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive editor
    Edit {
        /// File to open; the language is inferred from its extension
        file: Option<PathBuf>,

        /// Sign in as this user so the document can be saved
        #[clap(long)]
        user: Option<String>,
    },
    /// Execute a source file once and exit with its status
    Run {
        file: PathBuf,

        /// Language id, overrides the file extension
        #[clap(long)]
        language: Option<String>,
    },
    /// List supported languages and the backend that runs them
    Languages,
    /// Serve the execution and document endpoints over HTTP
    Serve {
        #[clap(long = "bind", default_value = "127.0.0.1:3000")]
        bind_addr: String,

        #[clap(long, help = "Disable CORS headers")]
        no_cors: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;
    let log_level_filter = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.level)
        .parse()
        .unwrap_or(LevelFilter::Info);

    match &cli.command {
        Commands::Edit { .. } => {
            // Keep the terminal clean for the editor; logs go to a file.
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open("codeditor.log")
            {
                Ok(log_file) => env_logger::Builder::new()
                    .filter_level(log_level_filter)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init(),
                Err(_) => env_logger::Builder::new()
                    .filter_level(LevelFilter::Off)
                    .init(),
            }
        }
        _ => {
            env_logger::Builder::new()
                .filter_level(log_level_filter)
                .init();
        }
    }

    match cli.command {
        Commands::Edit { file, user } => run_editor(&config, file, user).await,
        Commands::Run { file, language } => run_file(&config, &file, language.as_deref()).await,
        Commands::Languages => list_languages(&config),
        Commands::Serve { bind_addr, no_cors } => serve(&config, &bind_addr, !no_cors).await,
    }
}

/// Falls back to `<config dir>/codeditor/codeditor.yaml` when the default
/// path is not present in the working directory. Runs before the logger exists.
async fn load_config(config: &str) -> Result<EditorConfig> {
    let mut path = PathBuf::from(config);
    if config == DEFAULT_CONFIG && !path.exists() {
        if let Some(dir) = dirs::config_dir() {
            path = dir.join("codeditor").join(DEFAULT_CONFIG);
        }
    }
    let config = ConfigLoader::from_file_or_default(&path)
        .await
        .with_context(|| format!("Invalid configuration at {}", path.display()))?;
    Ok(config)
}

async fn run_editor(
    config: &EditorConfig,
    file: Option<PathBuf>,
    user: Option<String>,
) -> Result<()> {
    let sessions = match user.as_deref() {
        Some(user) => StaticSessions::signed_in(user),
        None => StaticSessions::anonymous(),
    };
    let navigator = RecordingNavigator::default();
    let mut parts =
        EditorFactory::create_from_config(config, Arc::new(sessions), Arc::new(navigator.clone()))?;

    if let Some(path) = file {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let language =
            Registry::infer_from_path(&path).unwrap_or(config.editor.default_language);
        parts.surface = EditorSurface::new(
            Document::new(&content, language),
            config.editor.default_theme,
        );
        log::info!("Opened {} as {}", path.display(), language);
    }

    check_remote_backend(config).await;
    TerminalEditor::run(parts, navigator).await
}

async fn run_file(config: &EditorConfig, file: &Path, language: Option<&str>) -> Result<()> {
    let language = match language {
        Some(id) => Registry::lookup(id)?.id,
        None => match Registry::infer_from_path(file) {
            Some(language) => language,
            None => bail!(
                "Cannot infer a language for {}, pass --language",
                file.display()
            ),
        },
    };
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Cannot read {}", file.display()))?;

    let channel = EditorFactory::configure_channel(&config.execution)?;
    let result = match channel.execute(&ExecutionRequest::new(&content, language)).await {
        Ok(result) => result,
        Err(e) => ExecutionResult::from_failure(&EditorError::from(e), 0),
    };

    print!("{}", result.stdout);
    eprint!("{}", result.stderr);
    log::info!(
        "{} exited with {} after {} ms",
        file.display(),
        result.exit_status,
        result.duration_ms
    );
    std::process::exit(result.exit_status);
}

fn list_languages(config: &EditorConfig) -> Result<()> {
    let router = EditorFactory::configure_router(&config.execution)?;
    for entry in Registry::languages() {
        let backend = if router.supports(entry.id) {
            entry.backend.unwrap_or("-")
        } else {
            "not runnable"
        };
        println!(
            "{:<12} {:<12} {:<14} .{}",
            entry.id,
            entry.label,
            backend,
            entry.extensions.join(" .")
        );
    }
    Ok(())
}

/// Logs whether a remote execution backend answers; an unhealthy one is not fatal.
async fn check_remote_backend(config: &EditorConfig) {
    if let ExecutionBackend::Remote { url } = &config.execution.backend {
        let executor = HttpCodeExecutor::new(url).with_timeout(Duration::from_secs(3));
        match executor.health_check().await {
            Ok(()) => log::info!("Execution backend at {} is healthy", executor.base_url()),
            Err(e) => log::warn!(
                "Execution backend at {} is not answering: {}",
                executor.base_url(),
                e
            ),
        }
    }
}

async fn serve(config: &EditorConfig, bind_addr: &str, enable_cors: bool) -> Result<()> {
    check_remote_backend(config).await;
    let channel = EditorFactory::configure_channel(&config.execution)?;
    let store = EditorFactory::configure_store(&config.persistence);
    let server_config = ServerConfig::new()
        .with_bind_addr(bind_addr)?
        .with_cors(if enable_cors {
            CorsPolicy::AnyOrigin
        } else {
            CorsPolicy::Disabled
        });

    BackendServer::with_config(channel, store, server_config)
        .serve_with_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
