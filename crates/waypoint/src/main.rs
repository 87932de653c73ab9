// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waypoint - a tiered decision cascade for a multilingual transit assistant.
//!
//! This is the binary entry point. Each subcommand drives one slice of the
//! cascade from the command line.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod runtime;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use waypoint_config::WaypointConfig;

/// Waypoint - a tiered decision cascade for a multilingual transit assistant.
#[derive(Parser, Debug)]
#[command(name = "waypoint", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print collected metrics to stderr before exiting.
    #[cfg(feature = "prometheus")]
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a message through the full cascade.
    Ask {
        text: String,
        /// Locale tag such as `en`, `ja` or `zh-TW`.
        #[arg(long)]
        locale: Option<String>,
    },
    /// Show the decision level assigned to a message.
    Classify { text: String },
    /// Try a message against the response templates only.
    Match {
        text: String,
        #[arg(long)]
        locale: Option<String>,
    },
    /// Manage Waypoint configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Load and validate configuration, reporting every problem found.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> Option<WaypointConfig> {
    let loaded = match path {
        Some(path) => waypoint_config::load_and_validate_path(path),
        None => waypoint_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            waypoint_config::render_errors(&errors);
            None
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waypoint={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_ref()) else {
        return ExitCode::FAILURE;
    };
    init_tracing(&config.agent.log_level);

    #[cfg(feature = "prometheus")]
    let exporter = match waypoint_prometheus::PrometheusAdapter::new() {
        Ok(exporter) => Some(exporter),
        Err(e) => {
            tracing::warn!(error = %e, "metrics disabled");
            None
        }
    };

    let result = match cli.command {
        Commands::Ask { text, locale } => commands::run_ask(&config, &text, locale.as_deref()).await,
        Commands::Classify { text } => commands::run_classify(&config, &text).await,
        Commands::Match { text, locale } => commands::run_match(&config, &text, locale.as_deref()),
        Commands::Config {
            action: ConfigAction::Check,
        } => {
            commands::run_config_check(&config);
            Ok(())
        }
    };

    #[cfg(feature = "prometheus")]
    {
        if let Some(exporter) = exporter.as_ref().filter(|_| cli.metrics) {
            eprintln!("{}", exporter.render());
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
