use clap::Parser;
use screenshare_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    screenshare_server::run(config).await
}
