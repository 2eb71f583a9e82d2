//! # gateway-setup
//!
//! Provisions an AgentCore MCP gateway that exposes a Lambda-backed refund
//! tool, and keeps re-running safe.
//!
//! ## Features
//!
//! - **Idempotent setup**: existing resources are discovered and reused, only missing ones are created
//! - **Saved state**: identifiers land in `gateway_config.json` for the next run and for clients
//! - **Race tolerant**: "already exists" answers from AWS count as success
//! - **Testable core**: every AWS call goes through a trait with an in-memory implementation
//!
//! ## Example
//!
//! ```rust,no_run
//! use gateway_setup::cloud::memory::MemoryCloud;
//! use gateway_setup::config::Config;
//! use gateway_setup::provision::{Orchestrator, SetupOptions};
//! use gateway_setup::state::StateStore;
//!
//! # async fn demo() -> gateway_setup::Result<()> {
//! let cloud = MemoryCloud::new();
//! let options = SetupOptions::from_config(&Config::default(), "us-east-1", None);
//! let report = Orchestrator::new(cloud.clients(), StateStore::new("gateway_config.json"), options)
//!     .run()
//!     .await?;
//! println!("{:?}", report.snapshot.gateway_url);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod provision;
pub mod schema;
pub mod state;

// Re-export commonly used types and functions
pub use error::{Result, SetupError};
pub use provision::{Orchestrator, SetupOptions, SetupReport};
pub use state::{Snapshot, StateStore};
use cli::{Cli, Commands};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_command(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref())?;
    let state_file = cli
        .state_file
        .clone()
        .unwrap_or_else(|| config.state_file.clone().into());

    match cli.command() {
        Commands::Setup => {
            handlers::handle_setup(&config, cli.region, cli.role_arn, state_file)
                .await
                .map(|_| ())
        }
        Commands::Status { offline } => {
            handlers::handle_status(&config, cli.region, state_file, offline).await
        }
    }
}
