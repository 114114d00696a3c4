//! Orbit command-line interface.

pub mod commands;
pub mod output;
pub mod prompt;

use clap::{Parser, Subcommand};
use output::Output;

/// Orbit - switch provider CLI identities without logging out
#[derive(Parser)]
#[command(name = "orbit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Machine-readable JSON output
    #[arg(long, global = true, env = "ORBIT_JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Add a new provider profile
    Add(commands::add::AddArgs),

    /// List all profiles across providers
    #[command(alias = "ls")]
    List,

    /// Remove a provider profile
    #[command(alias = "rm")]
    Remove {
        /// Provider name (e.g. vercel)
        provider: String,
        /// Profile name to remove
        profile: String,
    },

    /// Set the active profile for a provider
    Use {
        /// Provider name
        provider: String,
        /// Profile name to activate
        profile: String,
    },

    /// Run the provider CLI once as a specific profile
    Run {
        /// Provider name
        provider: String,
        /// Profile name to run as
        profile: String,
        /// Arguments passed to the provider CLI
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Run the provider CLI as the active profile
    Exec {
        /// Provider name
        provider: String,
        /// Arguments passed to the provider CLI
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Show the active profile for each provider
    Current,

    /// Rotate the local encryption key and re-encrypt stored tokens
    RotateKey,
}

/// Log filter for `-v` count when `RUST_LOG` is unset.
pub fn default_log_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    ["orbit_core", "orbit_vault", "orbit_providers", "orbit_switch", "orbit_cli"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Run the CLI. Returns the process exit code.
pub async fn run(cli: Cli, output: &Output) -> anyhow::Result<i32> {
    let app = commands::App::from_env()?;

    match cli.command {
        Commands::Add(args) => commands::add::run(&app, args, output).await,
        Commands::List => commands::list::list(&app, output),
        Commands::Remove { provider, profile } => {
            commands::remove::run(&app, &provider, &profile, output).await
        }
        Commands::Use { provider, profile } => {
            commands::switch::run(&app, &provider, &profile, output).await
        }
        Commands::Run {
            provider,
            profile,
            args,
        } => commands::exec::run_as(&app, &provider, &profile, args, output).await,
        Commands::Exec { provider, args } => {
            commands::exec::exec_current(&app, &provider, args, output).await
        }
        Commands::Current => commands::list::current(&app, output),
        Commands::RotateKey => commands::rotate::run(&app, output),
    }
}
