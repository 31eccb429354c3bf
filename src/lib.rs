//! rChecklist library root.
//! Exposes the CLI parser, the high-level run() function and the sync engine.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod remote;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::{AppError, AppResult};
use models::role::Role;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => commands::init::handle(cli, cfg),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg),
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg),
        Commands::Template { .. } => commands::template::handle(&cli.command, cfg).await,
        Commands::Status { .. } => commands::status::handle(&cli.command, cfg).await,
        Commands::Toggle { .. } | Commands::Value { .. } | Commands::Comment { .. } => {
            commands::task::handle(&cli.command, cfg).await
        }
        Commands::Photo { .. } => commands::photo::handle(&cli.command, cfg).await,
        Commands::Finalize { .. } => commands::finalize::handle(&cli.command, cfg).await,
        Commands::Override { .. } | Commands::Review { .. } | Commands::Reopen { .. } => {
            commands::manage::handle(&cli.command, cfg).await
        }
        Commands::Watch { .. } => commands::watch::handle(&cli.command, cfg).await,
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // 2️⃣ load config once
    let mut cfg = Config::load();

    // 3️⃣ command line overrides
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(user) = &cli.user {
        cfg.user_id = user.clone();
    }
    if let Some(role) = &cli.role {
        cfg.role = Role::from_code(role).ok_or_else(|| AppError::InvalidRole(role.clone()))?;
    }

    // 4️⃣ dispatch on a single-threaded runtime
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(&cli, &cfg))
}
