use clap::Parser;
use scotty_cli::Cli;
use scotty_cli::run_main;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_main(cli).await
}
