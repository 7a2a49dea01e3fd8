//! Serve command
//!
//! Loads configuration and runs the storage server in the foreground.

use anyhow::Result;
use logvault::{config, server};

pub async fn execute() -> Result<()> {
    let cfg = config::load_config()?;
    server::start_server(cfg).await
}
