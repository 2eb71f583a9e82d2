use clap::Parser;
use gateway_setup::cli::Cli;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    if let Err(e) = gateway_setup::run_command(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
