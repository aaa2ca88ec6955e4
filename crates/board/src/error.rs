use thiserror::Error;

/// Why one sync cycle stopped. Every variant is recovered inside the cycle and
/// reported through the status sink; none reach the scheduler.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("leaderboard base URL is not configured")]
    Configuration,

    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    #[error("leaderboard returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("expected JSON, got content-type {content_type:?}")]
    ContentType {
        content_type: Option<String>,
        preview: String,
    },

    #[error("malformed JSON body: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        preview: String,
    },

    #[error("expected a JSON array, got {found}")]
    Shape {
        found: &'static str,
        preview: String,
    },

    #[error("row {index} is invalid: {reason}")]
    Row { index: usize, reason: String },

    #[error("number out of range at line {line} column {column}")]
    NumberOutOfRange { line: usize, column: usize },
}

impl CycleError {
    /// User-facing status text. Fixed per category; never carries payload detail.
    pub fn status_text(&self) -> String {
        match self {
            Self::Configuration => "Leaderboard base URL not set".to_string(),
            Self::Transport { .. } => "Error loading leaderboard".to_string(),
            Self::HttpStatus { status } => format!("Error loading leaderboard: HTTP {status}"),
            Self::ContentType { .. } => "Error loading leaderboard: non-JSON response".to_string(),
            Self::Parse { .. } => "Error loading leaderboard: malformed JSON".to_string(),
            Self::Shape { .. } => "Error loading leaderboard: unexpected data format".to_string(),
            Self::Row { .. } | Self::NumberOutOfRange { .. } => {
                "Error loading leaderboard: invalid row data".to_string()
            }
        }
    }

    /// Stable label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::ContentType { .. } => "content_type",
            Self::Parse { .. } => "parse",
            Self::Shape { .. } => "shape",
            Self::Row { .. } | Self::NumberOutOfRange { .. } => "row",
        }
    }

    /// Offending payload excerpt, when one was captured.
    pub fn preview(&self) -> Option<&str> {
        match self {
            Self::ContentType { preview, .. }
            | Self::Parse { preview, .. }
            | Self::Shape { preview, .. } => Some(preview),
            _ => None,
        }
    }
}

/// First `max_chars` characters of a payload, for diagnostics only.
pub fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
