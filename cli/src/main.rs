use clap::Parser;
use vchat_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    vchat_cli::run_main(cli).await
}
