//! Config command
//!
//! Shows or validates the effective configuration.

use anyhow::Result;
use colored::Colorize;
use logvault::config;

pub fn show() -> Result<()> {
    let cfg = config::load_config()?;
    println!("{}", toml::to_string_pretty(&cfg)?);
    Ok(())
}

pub fn validate() -> Result<()> {
    match config::load_config() {
        Ok(_) => {
            println!("{}", "Configuration is valid".green());
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("Configuration is invalid: {}", e).red());
            Err(e)
        }
    }
}
