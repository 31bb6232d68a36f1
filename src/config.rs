//! Runtime configuration

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line configuration for the server
#[derive(Debug, Parser)]
#[command(name = "screenshare-server", version, about)]
pub struct Config {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8030")]
    pub listen: SocketAddr,

    /// Directory where recordings are stored.
    #[arg(long, default_value = "recordings")]
    pub data_dir: PathBuf,

    /// Seconds a live session may sit idle before it is failed and evicted.
    #[arg(long, default_value_t = 3600)]
    pub session_ttl_secs: u64,
}

impl Config {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
