//! CLI entry point for SkillGate.
//!
//! This binary provides the `skillgate` command with subcommands for
//! listing skills, matching requests, checking tool availability, and
//! running skills.

mod cli;
mod commands;
mod config;
mod tools;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::App;
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(dir) = cli.skills {
        config.skills_dir = dir;
    }
    init_tracing(&config.log_level);

    let approve_all = match &cli.command {
        Commands::Run { yes, .. } | Commands::Chat { yes, .. } => *yes,
        _ => false,
    };
    let app = App::build(config, approve_all)?;

    match cli.command {
        Commands::List => app.list(),
        Commands::Match { text, all } => app.match_input(&text, all),
        Commands::Check { skill_id } => app.check(&skill_id).await?,
        Commands::Run {
            skill_id,
            params,
            input,
            ..
        } => app.run(&skill_id, params, input).await?,
        Commands::Chat { text, .. } => app.chat(&text).await?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
