//! Bastion - directory-backed admin gate
//!
//! Authenticates a user against LDAP and checks that they hold one of the
//! configured admin roles.

mod commands;

use bastion_core::config::{BastionConfig, LogFormat, LoggingConfig};
use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bastion")]
#[command(author = "Bastion Team")]
#[command(version = bastion_core::VERSION)]
#[command(about = "Directory-backed admin gate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BASTION_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "BASTION_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate a user and check admin access
    Authenticate {
        /// Username to authenticate
        #[arg(short, long)]
        username: String,

        /// Environment variable holding the password; read from stdin when unset
        #[arg(long, default_value = "BASTION_PASSWORD")]
        password_env: String,

        /// Client address recorded with the request
        #[arg(long)]
        client_address: Option<String>,
    },

    /// Validate the configuration and print a summary
    CheckConfig,

    /// Bind with the service account and read the server's root DSE
    TestConnection,

    /// Show version information
    Version,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (config, ignored) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(commands::EXIT_ERROR);
        }
    };

    init_logging(&config.logging, cli.log_level.as_deref());
    for notice in &ignored {
        warn!("{}", notice);
    }
    debug!(
        "Loaded configuration from {}",
        cli.config.as_deref().unwrap_or("environment")
    );

    let ctx = CommandContext {
        config,
        output_format: cli.output,
    };

    let result = match cli.command {
        Commands::Authenticate {
            username,
            password_env,
            client_address,
        } => {
            commands::authenticate::execute(&ctx, &username, &password_env, client_address).await
        }
        Commands::CheckConfig => commands::check_config::execute(&ctx),
        Commands::TestConnection => commands::test_connection::execute(&ctx).await,
        Commands::Version => {
            println!("bastion {}", bastion_core::VERSION);
            Ok(commands::EXIT_OK)
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            ctx.error(&format!("error: {:#}", e));
            ExitCode::from(commands::EXIT_ERROR)
        }
    }
}

/// Load the file (or defaults), then environment overrides. Overrides that
/// were ignored are returned for reporting once logging is up.
fn load_config(path: Option<&str>) -> anyhow::Result<(BastionConfig, Vec<String>)> {
    let mut config = match path {
        Some(path) => BastionConfig::from_file(path)?,
        None => BastionConfig::default(),
    };
    let ignored = config.apply_env_overrides();
    Ok((config, ignored))
}

/// Logs go to stderr so that stdout stays machine-readable.
fn init_logging(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }
}
