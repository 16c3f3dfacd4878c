//! Tokengate - JWT issuance and validation CLI
//!
//! Issues and validates tokens against the configured signing method and
//! allow-list. Login and HTTP serving remain the host application's job.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokengate::token::{ClaimsProvider, TokenService};
use tokengate::Config;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Tokengate - JWT issuance and validation with a signing-method allow-list
#[derive(Parser, Debug)]
#[command(name = "tokengate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a token for ad-hoc claims
    Issue {
        /// Claims as KEY=VALUE pairs
        #[arg(short = 'C', long = "claim", value_name = "KEY=VALUE")]
        claims: Vec<String>,
    },
    /// Validate a token and print its claims as JSON
    Validate { token: String },
}

/// Claims assembled from `--claim` arguments
struct AdHocClaims(HashMap<String, Value>);

impl ClaimsProvider for AdHocClaims {
    fn claims(&self) -> HashMap<String, Value> {
        self.0.clone()
    }
}

fn parse_claims(pairs: &[String]) -> anyhow::Result<HashMap<String, Value>> {
    let mut claims = HashMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("claim '{}' is not KEY=VALUE", pair))?;
        claims.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(claims)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Tokengate v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&args.config)?;
    info!("Loaded configuration from {:?}", args.config);

    let service = TokenService::from_config(&config.auth)?;

    match args.command {
        Command::Issue { claims } => {
            let provider = AdHocClaims(parse_claims(&claims)?);
            let token = service.issue(&provider, config.auth.token_expiry())?;
            println!("{}", token);
        }
        Command::Validate { token } => {
            let claims = service.validate(&token)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }

    Ok(())
}
