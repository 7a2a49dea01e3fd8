//! Maintain command
//!
//! Runs partition maintenance once with the configured (or overridden)
//! retention settings.

use crate::cli::MaintainArgs;
use anyhow::Result;
use chrono::TimeDelta;
use colored::Colorize;
use logvault::config;
use logvault::store::{run_maintenance_now, Clock, LogStore};

pub async fn execute(args: MaintainArgs) -> Result<()> {
    let cfg = config::load_config()?;
    let database_url = format!("sqlite:{}", cfg.storage.database_path);
    let store = LogStore::open(&database_url, Clock::system()).await?;

    let keep_time = match args.keep_days {
        Some(days) => TimeDelta::days(days as i64),
        None => cfg.retention.keep_time(),
    };
    let per_application = cfg.retention.per_application_keep();
    let per_application = (!per_application.is_empty()).then_some(&per_application);

    let report = run_maintenance_now(&store, keep_time, per_application).await?;

    println!(
        "Maintained {} table(s): {} partition(s) added, {} dropped",
        report.tables_maintained, report.partitions_added, report.partitions_dropped
    );
    if !report.failed_tables.is_empty() {
        println!(
            "{}",
            format!("{} table(s) failed: {}", report.failed_tables.len(), report.failed_tables.join(", "))
                .red()
        );
        anyhow::bail!("maintenance finished with failures");
    }

    Ok(())
}
