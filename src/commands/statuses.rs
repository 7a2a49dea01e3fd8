//! Statuses command
//!
//! Shows recently updated application statuses from the status table.

use crate::cli::StatusesArgs;
use anyhow::Result;
use chrono::TimeDelta;
use colored::Colorize;
use logvault::config;
use logvault::store::{ApplicationStatus, Clock, LogStore};

pub async fn execute(args: StatusesArgs) -> Result<()> {
    let cfg = config::load_config()?;
    let database_url = format!("sqlite:{}", cfg.storage.database_path);
    let store = LogStore::open(&database_url, Clock::system()).await?;

    let since = store.clock().now() - TimeDelta::minutes(args.since_minutes);
    let statuses = store.get_application_statuses(since).await?;

    if statuses.is_empty() {
        println!(
            "{}",
            format!("No status reported in the last {} minute(s)", args.since_minutes).yellow()
        );
        return Ok(());
    }

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&statuses)?;
            println!("{}", json);
        }
        _ => display_statuses_text(&statuses),
    }

    Ok(())
}

fn display_statuses_text(statuses: &[ApplicationStatus]) {
    for status in statuses {
        println!(
            "{} [{}]",
            status.application_path.cyan().bold(),
            status.server
        );

        match (status.cpu, status.memory, status.last_perf_update_utc) {
            (cpu, memory, Some(at)) => println!(
                "    cpu {:>5.1}%  memory {:>12.0}  updated {}",
                cpu.unwrap_or(0.0),
                memory.unwrap_or(0.0),
                at.format("%Y-%m-%d %H:%M:%S")
            ),
            _ => println!("    {}", "no performance data reported".dimmed()),
        }

        if let Some(at) = status.last_error_time_utc {
            println!(
                "    last error {} at {}",
                status.last_error_type.as_deref().unwrap_or("unknown").red(),
                at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
    println!("\n{} application(s)", statuses.len());
}
