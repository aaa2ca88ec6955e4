use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register descriptions for every metric the sync cycle emits. Idempotent.
pub fn describe() {
    describe_counter!(
        "leaderboard_cycles_total",
        "Sync cycles finished, labelled by outcome (updated, empty or the error kind)."
    );
    describe_histogram!(
        "leaderboard_fetch_latency_ms",
        "Latency of GET /leaderboard in milliseconds, including failed requests."
    );
    describe_gauge!(
        "leaderboard_rows_rendered",
        "Rows shown after the most recent successful cycle."
    );
    describe_gauge!(
        "leaderboard_last_success_unixtime",
        "Unix time of the most recent cycle that rendered rows."
    );
    describe_counter!("tracing_error_events", "ERROR-level tracing events.");
}
