//! MiniMart Online CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema migrations
//! minimart-cli migrate
//!
//! # Create an admin account
//! minimart-cli admin create -e admin@minimart.ph -p 'long passphrase' -n "Store Admin"
//!
//! # Insert the sample catalog into an empty store
//! minimart-cli seed
//!
//! # Report store latency and table access
//! minimart-cli check
//! ```
//!
//! Every command reads `DATABASE_URL` (a `.env` file is loaded if present).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "minimart-cli")]
#[command(author, version, about = "MiniMart Online CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert the sample products if the catalog is empty
    Seed,
    /// Check store connectivity and table access
    Check,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Display name (defaults to the email)
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minimart_cli=info,minimart_admin=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let pool = commands::connect().await?;
    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                name,
            } => {
                commands::admin::create(pool, &email, &password, name.as_deref()).await?;
            }
        },
        Commands::Seed => commands::seed::run(pool).await?,
        Commands::Check => commands::check::run(pool).await?,
    }
    Ok(())
}
