//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Storefront and back-office API server
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Debug-level logs regardless of RUST_LOG
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Env file loaded before reading configuration (default: .env)
    #[arg(short, long, global = true, env = "STOREFRONT_ENV_FILE")]
    pub env_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Run the email worker or inspect its queue
    Jobs(JobsArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Bind address, overrides SERVER_HOST
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Listen port, overrides SERVER_PORT
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Apply pending migrations
    Up,
    /// Roll back the most recent migrations
    Down {
        #[arg(short = 'n', long, default_value_t = 1)]
        steps: u32,
    },
    /// List migrations and whether each is applied
    Status,
    /// Drop every table and rebuild the schema
    Fresh {
        /// Required, the command destroys all data
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Parser, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub action: JobsAction,
}

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// Deliver queued emails until interrupted
    Work,
    /// Email job counts by status
    List,
    /// Delete emails that exhausted their retries
    Clear,
}
