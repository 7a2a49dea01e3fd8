use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use logvault::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_tracing();

    match args.command {
        cli::Commands::Serve => {
            commands::serve::execute().await?;
        }
        cli::Commands::Search(search_args) => {
            commands::search::execute(search_args).await?;
        }
        cli::Commands::Statuses(statuses_args) => {
            commands::statuses::execute(statuses_args).await?;
        }
        cli::Commands::Maintain(maintain_args) => {
            commands::maintain::execute(maintain_args).await?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show()?,
            cli::ConfigCommands::Validate => commands::config::validate()?,
        },
        cli::Commands::Version => {
            println!("logvault v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
