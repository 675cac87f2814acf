use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let parsed = imgd::cli::Cli::parse();

    // Dispatch to the CLI handler
    parsed.dispatch().await
}
