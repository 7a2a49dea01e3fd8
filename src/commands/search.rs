//! Search command
//!
//! Queries stored log records directly from the database file.

use crate::cli::SearchArgs;
use anyhow::Result;
use chrono::TimeDelta;
use colored::Colorize;
use logvault::config;
use logvault::store::{Clock, KeywordFilters, LogLevel, LogRecord, LogSearchCriteria, LogStore};

pub async fn execute(args: SearchArgs) -> Result<()> {
    let cfg = config::load_config()?;
    let database_url = format!("sqlite:{}", cfg.storage.database_path);
    let store = LogStore::open(&database_url, Clock::system()).await?;

    let levels = args
        .level
        .iter()
        .map(|l| l.parse::<LogLevel>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;

    let now = store.clock().now();
    let criteria = LogSearchCriteria {
        from_utc: now - TimeDelta::minutes(args.since_minutes),
        to_utc: now,
        application_path: args.application.clone(),
        levels,
        server: args.server.clone(),
        keywords: KeywordFilters {
            url: args.url.clone(),
            message: args.grep.clone(),
            ..Default::default()
        },
        limit: args.limit,
        offset: args.offset,
    };

    let logs = store.search_logs(&criteria).await?;

    if logs.is_empty() {
        println!("{}", "No logs found matching the criteria".yellow());
        return Ok(());
    }

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&logs)?;
            println!("{}", json);
        }
        _ => display_logs_text(&logs),
    }

    Ok(())
}

fn display_logs_text(logs: &[LogRecord]) {
    for log in logs {
        let level = format!("{:5}", log.log_level.as_str().to_uppercase());
        let level = match log.log_level {
            LogLevel::Fatal | LogLevel::Error => level.red().bold(),
            LogLevel::Warn => level.yellow(),
            LogLevel::Info => level.green(),
            LogLevel::Debug | LogLevel::Trace => level.dimmed(),
        };

        println!(
            "{} {} {} [{}] {}",
            log.time_utc.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
            level,
            log.application_path.cyan(),
            log.server.as_deref().unwrap_or("-"),
            log.message.as_deref().unwrap_or(""),
        );

        if let Some(exception_type) = &log.exception_type {
            println!(
                "        {} {}",
                exception_type.red(),
                log.exception_message.as_deref().unwrap_or("")
            );
        }
    }
    println!("\n{} record(s)", logs.len());
}
