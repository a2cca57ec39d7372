//! Plated CLI - Database migrations and admin bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! plated-cli migrate
//!
//! # Create the platform admin (password read from PLATED_ADMIN_PASSWORD)
//! plated-cli admin create -e admin@plated.dev -n "Ops Admin"
//!
//! # Check whether the admin exists
//! plated-cli admin exists
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "plated-cli")]
#[command(author, version, about = "Plated CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the platform admin
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Register the platform admin
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Optional phone number
        #[arg(long)]
        phone: Option<String>,

        /// Admin password
        #[arg(short, long, env = "PLATED_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Report whether the platform admin exists
    Exists,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                phone,
                password,
            } => {
                commands::admin::create(&name, &email, phone, &password).await?;
            }
            AdminAction::Exists => {
                let exists = commands::admin::exists().await?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{exists}");
                }
            }
        },
    }
    Ok(())
}
