// crates/score-ledger-cli/src/main.rs
// ============================================================================
// Module: Score Ledger CLI Entry Point
// Description: Command dispatcher for the score ledger server and tooling.
// Purpose: Provide a localized CLI for serving, config checks, and schema init.
// Dependencies: clap, score-ledger-config, score-ledger-http, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The Score Ledger CLI starts the HTTP server, validates configuration, and
//! initializes the store schema offline. All user-facing strings are routed
//! through the i18n catalog.


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use score_ledger_cli::i18n::Locale;
use score_ledger_cli::i18n::set_locale;
use score_ledger_cli::t;
use score_ledger_config::LedgerConfig;
use score_ledger_config::StoreType;
use score_ledger_config::config_toml_example;
use score_ledger_core::ScoreStore;
use score_ledger_http::LedgerServer;
use score_ledger_http::ServerError;
use score_ledger_http::build_store;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "SCORE_LEDGER_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "score-ledger", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `SCORE_LEDGER_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the leaderboard HTTP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Store utilities.
    Db {
        /// Selected store subcommand.
        #[command(subcommand)]
        command: DbCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to score-ledger.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigFileArgs),
    /// Print a canonical example config.
    Example,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Create the schema when absent.
    Init(ConfigFileArgs),
}

/// Arguments shared by commands that only need a config file.
#[derive(Args, Debug)]
struct ConfigFileArgs {
    /// Optional config file path (defaults to score-ledger.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Spanish.
    Es,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Es => Self::Es,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    set_locale(resolve_locale(cli.lang, env_lang.as_deref())?);

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Db {
            command,
        } => command_db(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = LedgerConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let bind = config
        .server
        .bind_addr()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    for notice in serve_notices(&config, bind) {
        write_stderr_line(&notice).map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let store_label = config.store.store_type.label();

    let server = tokio::task::spawn_blocking(move || LedgerServer::from_config(config))
        .await
        .map_err(|err| {
            CliError::new(t!("serve.init_failed", error = format!("init join failed: {err}")))
        })?
        .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?;
    write_stderr_line(&t!("serve.starting", bind = bind, store = store_label))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server
        .serve()
        .await
        .map_err(|err: ServerError| CliError::new(t!("serve.failed", error = err)))?;

    Ok(ExitCode::SUCCESS)
}

/// Startup notices for deployments that lose data or accept remote writes.
fn serve_notices(config: &LedgerConfig, bind: SocketAddr) -> Vec<String> {
    let mut notices = Vec::new();
    if config.store.store_type == StoreType::Memory {
        notices.push(t!("serve.warn.memory_store"));
    }
    if !bind.ip().is_loopback() {
        notices.push(t!(
            "serve.warn.non_loopback",
            bind = bind,
            access = config.access.origin_policy().label()
        ));
    }
    notices
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => command_config_example(),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigFileArgs) -> CliResult<ExitCode> {
    let config = LedgerConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let settings = config
        .ledger_settings()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&t!(
        "config.validate.summary",
        store = config.store.store_type.label(),
        retention = settings.retention.retention_size(),
        ceiling = settings.retention.capacity_ceiling(),
        access = config.access.origin_policy().label()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the canonical example config.
fn command_config_example() -> CliResult<ExitCode> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(config_toml_example().as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Db Commands
// ============================================================================

/// Dispatches store subcommands.
fn command_db(command: DbCommand) -> CliResult<ExitCode> {
    match command {
        DbCommand::Init(command) => command_db_init(&command),
    }
}

/// Opens the configured store and ensures the schema exists.
fn command_db_init(command: &ConfigFileArgs) -> CliResult<ExitCode> {
    let config = LedgerConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let store = build_store(&config.store)
        .map_err(|err| CliError::new(t!("db.init.failed", error = err)))?;
    store.initialize().map_err(|err| CliError::new(t!("db.init.failed", error = err)))?;
    let count = store.count().map_err(|err| CliError::new(t!("db.init.failed", error = err)))?;
    write_stdout_line(&t!("db.init.ok", store = config.store.store_type.label(), count = count))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the output locale from the flag, then the environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
