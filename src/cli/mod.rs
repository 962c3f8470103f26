//! # Command Line Interface
//!
//! Runs single rotation steps, coordinator events and password generation.
//!
//! Exit status tells a coordinator what to do next:
//! - `0`: the step succeeded
//! - `75` (`EX_TEMPFAIL`): the error is retryable and attempts remain
//! - `1`: the error is permanent, or the retry budget is spent

use crate::config::AppConfig;
use crate::errors::RotationError;
use crate::observability::{init_logging, log_config_info};
use crate::rotation::{RotationEngine, RotationEvent, RotationStep};
use crate::secrets::SecretStore;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

/// Exit status for a retryable failure
pub const EXIT_TEMPFAIL: i32 = 75;

#[derive(Parser)]
#[command(name = "secret-rotator")]
#[command(about = "Four-step database credential rotation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one rotation step
    Step {
        /// Secret identifier (name or ARN)
        #[arg(long)]
        secret_id: String,

        /// Client request token identifying the rotation
        #[arg(long)]
        token: String,

        /// createSecret, setSecret, testSecret or finishSecret
        #[arg(long)]
        step: RotationStep,

        /// Which attempt of this step this is, starting at 1
        #[arg(long, default_value_t = 1)]
        attempt: u32,
    },

    /// Run a coordinator event (`{"SecretId", "ClientRequestToken", "Step"}`)
    Event {
        /// Event file; read from stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,

        /// Which attempt of this step this is, starting at 1
        #[arg(long, default_value_t = 1)]
        attempt: u32,
    },

    /// Print a password drawn from the configured policy
    GeneratePassword {
        /// Override the configured length
        #[arg(long)]
        length: Option<usize>,
    },
}

/// Run CLI commands, returning the process exit status
pub async fn run_cli() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    run(cli).await
}

pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config.observability, cli.verbose)?;
    log_config_info(&config);

    match cli.command {
        Commands::GeneratePassword { length } => {
            let mut policy = config.password.clone();
            if let Some(length) = length {
                policy.length = length;
                policy.validate().map_err(RotationError::from)?;
            }
            println!("{}", policy.generate()?.expose_secret());
            Ok(0)
        }
        Commands::Step { secret_id, token, step, attempt } => {
            let engine = RotationEngine::from_config(build_store(&config).await?, &config);
            let event = RotationEvent::new(secret_id, token, step);
            Ok(execute(&engine, &event, attempt, config.max_retries).await)
        }
        Commands::Event { file, attempt } => {
            let event = read_event(file.as_deref())?;
            let engine = RotationEngine::from_config(build_store(&config).await?, &config);
            Ok(execute(&engine, &event, attempt, config.max_retries).await)
        }
    }
}

/// Run one event and map the outcome to an exit status
pub async fn execute(
    engine: &RotationEngine,
    event: &RotationEvent,
    attempt: u32,
    max_retries: u32,
) -> i32 {
    let result = engine.handle_event(event).await;
    if let Err(e) = &result {
        eprintln!("{} failed for {}: {}", event.step, event.secret_id, e);
    }
    exit_code(&result, attempt, max_retries)
}

pub fn exit_code(result: &crate::Result<()>, attempt: u32, max_retries: u32) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) if e.is_retryable() && attempt < max_retries => EXIT_TEMPFAIL,
        Err(_) => 1,
    }
}

/// Read a coordinator event from `file`, or stdin when `None`
pub fn read_event(file: Option<&Path>) -> anyhow::Result<RotationEvent> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw).context("failed to read event from stdin")?;
            raw
        }
    };
    Ok(RotationEvent::from_json(&raw)?)
}

#[cfg(feature = "aws")]
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SecretStore>> {
    let store = crate::secrets::AwsSecretStore::new(&config.store).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "aws"))]
async fn build_store(_config: &AppConfig) -> anyhow::Result<Arc<dyn SecretStore>> {
    anyhow::bail!("no secret store backend compiled in; rebuild with `--features aws`")
}
