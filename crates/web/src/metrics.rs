use anyhow::{Context, Result};
use metrics::describe_gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn describe() {
    board::metrics::describe();
    describe_gauge!(
        "leaderboard_web_build_info",
        "Build info for the leaderboard dashboard (value is always 1)."
    );
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
///
/// Upkeep runs on each `/metrics` request rather than on a background task.
pub fn init_global() -> Result<PrometheusHandle> {
    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    describe();

    let git_sha = std::env::var("GIT_SHA").unwrap_or_else(|_| "unknown".to_string());
    ::metrics::gauge!(
        "leaderboard_web_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
        "git_sha" => git_sha,
    )
    .set(1.0);

    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}
