use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::base_url::{leaderboard_url, normalize_base_url};
use crate::client::{LeaderboardFetcher, RawResponse};
use crate::config::Badges;
use crate::error::{preview, CycleError};
use crate::render::render_rows;
use crate::sinks::{RowSink, StatusSink};
use crate::types::LeaderboardRow;

pub const LOADING_STATUS: &str = "Loading...";
pub const EMPTY_STATUS: &str = "No participants yet";
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConfigCheck,
    Fetching,
    ValidatingHttp,
    ValidatingContentType,
    ParsingJson,
    ValidatingShape,
    Rendering,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigCheck => "config_check",
            Self::Fetching => "fetching",
            Self::ValidatingHttp => "validating_http",
            Self::ValidatingContentType => "validating_content_type",
            Self::ParsingJson => "parsing_json",
            Self::ValidatingShape => "validating_shape",
            Self::Rendering => "rendering",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Updated { rows: usize },
    Empty,
    Failed(CycleError),
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Empty => "empty",
            Self::Failed(e) => e.kind(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One fetch-validate-render pass over the leaderboard. Holds no state between
/// cycles; every call to [`LeaderboardSync::run_once`] starts from scratch.
pub struct LeaderboardSync<F> {
    base_url: Option<String>,
    fetcher: F,
    status: Arc<dyn StatusSink>,
    rows: Arc<dyn RowSink>,
    badges: Badges,
}

impl<F> LeaderboardSync<F>
where
    F: LeaderboardFetcher + Send + Sync,
{
    /// `base_url: None` means not configured; cycles then fail without any I/O.
    pub fn new(
        base_url: Option<String>,
        fetcher: F,
        status: Arc<dyn StatusSink>,
        rows: Arc<dyn RowSink>,
    ) -> Self {
        Self {
            base_url,
            fetcher,
            status,
            rows,
            badges: Badges::default(),
        }
    }

    #[must_use]
    pub fn with_badges(mut self, badges: Badges) -> Self {
        self.badges = badges;
        self
    }

    pub async fn run_once(&self) -> CycleOutcome {
        let started = Instant::now();

        let outcome = match self.execute().await {
            Ok(0) => {
                self.status.set_status(EMPTY_STATUS);
                CycleOutcome::Empty
            }
            Ok(rows) => {
                let now = chrono::Local::now();
                self.status
                    .set_status(&format!("Updated at {}", now.format("%H:%M:%S")));
                metrics::gauge!("leaderboard_last_success_unixtime").set(now.timestamp() as f64);
                CycleOutcome::Updated { rows }
            }
            Err(e) => {
                trace_stage(Stage::Failed);
                report_failure(&e);
                self.status.set_status(&e.status_text());
                CycleOutcome::Failed(e)
            }
        };
        if !outcome.is_failure() {
            trace_stage(Stage::Done);
        }

        metrics::counter!("leaderboard_cycles_total", "outcome" => outcome.label()).increment(1);
        info!(
            outcome = outcome.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "leaderboard cycle finished"
        );
        outcome
    }

    async fn execute(&self) -> Result<usize, CycleError> {
        trace_stage(Stage::ConfigCheck);
        let base = normalize_base_url(self.base_url.as_deref());
        if base.is_empty() {
            return Err(CycleError::Configuration);
        }
        let url = leaderboard_url(&base);

        trace_stage(Stage::Fetching);
        info!(url = %url, "fetching leaderboard");
        self.status.set_status(LOADING_STATUS);

        let fetch_started = Instant::now();
        let res = self.fetcher.fetch(&url).await;
        metrics::histogram!("leaderboard_fetch_latency_ms")
            .record(fetch_started.elapsed().as_secs_f64() * 1000.0);
        let resp = res.map_err(|e| CycleError::Transport {
            url: url.clone(),
            detail: format!("{e:#}"),
        })?;

        let values = validate_response(&resp)?;

        trace_stage(Stage::Rendering);
        let decoded = decode_rows(values)?;
        let rendered = render_rows(&decoded, &self.badges).map_err(|(index, e)| CycleError::Row {
            index,
            reason: e.to_string(),
        })?;

        let count = rendered.len();
        self.rows.replace_rows(rendered);
        metrics::gauge!("leaderboard_rows_rendered").set(count as f64);
        Ok(count)
    }
}

/// HTTP status, content type, JSON syntax and array shape, in that order.
/// Returns the array elements, still undecoded.
pub fn validate_response(resp: &RawResponse) -> Result<Vec<Value>, CycleError> {
    trace_stage(Stage::ValidatingHttp);
    if !(200..=299).contains(&resp.status) {
        return Err(CycleError::HttpStatus {
            status: resp.status,
        });
    }

    trace_stage(Stage::ValidatingContentType);
    if !resp.content_type.as_deref().is_some_and(is_json_content_type) {
        return Err(CycleError::ContentType {
            content_type: resp.content_type.clone(),
            preview: preview(&resp.body, PREVIEW_CHARS),
        });
    }

    trace_stage(Stage::ParsingJson);
    let value: Value = serde_json::from_str(&resp.body).map_err(|source| {
        if is_number_out_of_range(&source) {
            CycleError::NumberOutOfRange {
                line: source.line(),
                column: source.column(),
            }
        } else {
            CycleError::Parse {
                source,
                preview: preview(&resp.body, PREVIEW_CHARS),
            }
        }
    })?;

    trace_stage(Stage::ValidatingShape);
    match value {
        Value::Array(items) => Ok(items),
        other => Err(CycleError::Shape {
            found: json_kind(&other),
            preview: preview(&resp.body, PREVIEW_CHARS),
        }),
    }
}

/// `application/json` or any `+json` structured syntax, parameters ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn decode_rows(values: Vec<Value>) -> Result<Vec<LeaderboardRow>, CycleError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, v)| {
            serde_json::from_value(v).map_err(|e| CycleError::Row {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Syntactically valid JSON whose number does not fit an `f64` (`1e400`).
fn is_number_out_of_range(err: &serde_json::Error) -> bool {
    err.to_string().starts_with("number out of range")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn trace_stage(stage: Stage) {
    debug!(stage = stage.as_str(), "leaderboard cycle stage");
}

fn report_failure(err: &CycleError) {
    match err {
        CycleError::Configuration => {
            warn!(kind = err.kind(), "leaderboard base URL is not set, skipping fetch");
        }
        CycleError::HttpStatus { status } => {
            error!(kind = err.kind(), status = *status, "leaderboard request rejected");
        }
        CycleError::ContentType { content_type, .. } => {
            error!(
                kind = err.kind(),
                content_type = content_type.as_deref().unwrap_or(""),
                preview = err.preview().unwrap_or(""),
                "unexpected content-type from leaderboard"
            );
        }
        _ => {
            error!(
                kind = err.kind(),
                error = %err,
                preview = err.preview().unwrap_or(""),
                "leaderboard cycle failed"
            );
        }
    }
}
