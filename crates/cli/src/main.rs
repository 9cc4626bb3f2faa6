//! Donation Desk CLI - interactive shell and account tools.
//!
//! # Usage
//!
//! ```bash
//! # Interactive menus on an in-memory ledger with the demo accounts
//! dd-cli --demo
//!
//! # Same, saved to ./data
//! dd-cli --data-dir ./data shell
//!
//! # Create the first administrator
//! dd-cli --data-dir ./data users create -n "Admin" -e admin@doacao.com -s s3cret -r administrator
//!
//! # Load a fixture file
//! dd-cli --data-dir ./data seed --file fixtures.yaml
//!
//! # Print what an account can see
//! dd-cli --data-dir ./data requests list -e carlos@doador.com -s 123 --json
//!
//! # Print every account, as an administrator
//! dd-cli --data-dir ./data users list -e admin@doacao.com -s 123
//! ```
//!
//! # Commands
//!
//! - `shell` - Interactive menus (default)
//! - `users create` - Create an account of any role
//! - `users list` - Authenticate as an administrator and print every account
//! - `seed` - Load users and requests from YAML
//! - `requests list` - Authenticate and print visible requests

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;
use crate::error::CommandError;

mod commands;
mod config;
mod error;
mod render;
mod shell;
mod workspace;

#[derive(Parser)]
#[command(name = "dd-cli")]
#[command(author, version, about = "Donation Desk request manager")]
struct Cli {
    /// Directory for the flat data files (overrides `DONATION_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Load the demo accounts into an empty ledger
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive menus
    Shell,
    /// Manage accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Load users and requests from a YAML file
    Seed {
        /// Path to the YAML fixture
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Inspect requests
    Requests {
        #[command(subcommand)]
        action: RequestsAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Create a new account
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Login email
        #[arg(short, long)]
        email: String,

        /// Login secret
        #[arg(short, long)]
        secret: String,

        /// Role (`administrator`, `institution`, `donor`)
        #[arg(short, long, default_value = "donor")]
        role: String,
    },
    /// List every account (administrators only)
    List {
        /// Administrator email
        #[arg(short, long)]
        email: String,

        /// Administrator secret
        #[arg(short, long)]
        secret: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RequestsAction {
    /// List the requests visible to an account
    List {
        /// Login email
        #[arg(short, long)]
        email: String,

        /// Login secret
        #[arg(short, long)]
        secret: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never mix with menus or JSON on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("donation_desk_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CommandError> {
    let config = CliConfig::from_env()?.with_overrides(cli.data_dir, cli.demo);

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => commands::shell::run(&config)?,
        Commands::Users { action } => match action {
            UsersAction::Create {
                name,
                email,
                secret,
                role,
            } => {
                commands::users::create_user(
                    &config,
                    &name,
                    &email,
                    &SecretString::from(secret),
                    &role,
                )?;
            }
            UsersAction::List {
                email,
                secret,
                json,
            } => {
                let stdout = std::io::stdout();
                commands::users::list(
                    &config,
                    &email,
                    &SecretString::from(secret),
                    json,
                    &mut stdout.lock(),
                )?;
            }
        },
        Commands::Seed { file } => {
            commands::seed::from_file(&config, &file)?;
        }
        Commands::Requests { action } => match action {
            RequestsAction::List {
                email,
                secret,
                json,
            } => {
                let stdout = std::io::stdout();
                commands::requests::list(
                    &config,
                    &email,
                    &SecretString::from(secret),
                    json,
                    &mut stdout.lock(),
                )?;
            }
        },
    }
    Ok(())
}
