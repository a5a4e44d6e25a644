use clap::Parser;

use closed_group::cli::{run, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    run(args).await
}
