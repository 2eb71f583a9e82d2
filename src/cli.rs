use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gateway-setup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Provision an AgentCore gateway with a Lambda refund tool")]
#[command(long_about = "Creates, or reuses when they already exist, the refund Lambda function, an OAuth authorizer, an MCP gateway and the gateway target binding them together. Identifiers are saved to a local state file so repeated runs converge without duplicating resources.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// AWS region (defaults to the AWS environment, then the configured default)
    #[arg(long, global = true, value_name = "REGION")]
    pub region: Option<String>,

    /// Execution role for the gateway (one is created if not provided)
    #[arg(long, global = true, value_name = "ROLE_ARN")]
    pub role_arn: Option<String>,

    /// Where provisioned identifiers are saved
    #[arg(long, global = true, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create or reuse every resource and save their identifiers (default)
    Setup,

    /// Show the saved identifiers and check the gateway is still there
    Status {
        /// Only print the saved file, without calling AWS
        #[arg(long)]
        offline: bool,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }

    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Setup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_default() {
        let cli = Cli::parse_from(["gateway-setup"]);
        assert_eq!(cli.command(), Commands::Setup);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "gateway-setup",
            "status",
            "--offline",
            "--region",
            "eu-central-1",
            "--state-file",
            "out/gw.json",
            "-vv",
        ]);
        assert_eq!(cli.command(), Commands::Status { offline: true });
        assert_eq!(cli.region.as_deref(), Some("eu-central-1"));
        assert_eq!(cli.state_file, Some(PathBuf::from("out/gw.json")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_role_arn_flag() {
        let cli = Cli::parse_from([
            "gateway-setup",
            "--role-arn",
            "arn:aws:iam::123456789012:role/GatewayRole",
        ]);
        assert_eq!(
            cli.role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/GatewayRole")
        );
    }
}
