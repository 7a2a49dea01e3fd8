use metrics::{counter, describe_counter, describe_histogram, gauge, describe_gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    init_metric_descriptions();

    handle
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "logvault_records_ingested_total",
        "Total number of log records ingested"
    );
    describe_counter!(
        "logvault_tables_created_total",
        "Total number of application tables created"
    );
    describe_counter!(
        "logvault_partitions_added_total",
        "Total number of partitions added by maintenance or first-use creation"
    );
    describe_counter!(
        "logvault_partitions_dropped_total",
        "Total number of partitions dropped by retention maintenance"
    );
    describe_histogram!(
        "logvault_search_duration_seconds",
        "Log search duration in seconds"
    );
    describe_gauge!(
        "logvault_info",
        "logvault version and build information"
    );

    gauge!("logvault_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record ingested log records
pub fn record_ingested(count: u64) {
    counter!("logvault_records_ingested_total").increment(count);
}

/// Record a first-use application table creation
pub fn record_table_created() {
    counter!("logvault_tables_created_total").increment(1);
}

/// Record partitions added during a maintenance run
pub fn record_partitions_added(count: u64) {
    if count > 0 {
        counter!("logvault_partitions_added_total").increment(count);
    }
}

/// Record partitions dropped during a maintenance run
pub fn record_partitions_dropped(count: u64) {
    if count > 0 {
        counter!("logvault_partitions_dropped_total").increment(count);
    }
}

/// Record a search duration
pub fn record_search_duration(duration: Duration) {
    histogram!("logvault_search_duration_seconds").record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global recorder can only be installed once per process; these
    // helpers must be safe to call without one.
    #[test]
    fn test_recorders_are_noops_without_exporter() {
        record_ingested(3);
        record_table_created();
        record_partitions_added(2);
        record_partitions_dropped(0);
        record_search_duration(Duration::from_millis(12));
    }
}
