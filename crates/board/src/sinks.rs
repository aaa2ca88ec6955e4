use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};

use crate::render::RenderedRow;

/// Single status line, overwritten by every cycle.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, text: &str);
}

/// Ordered table body, replaced as a whole.
pub trait RowSink: Send + Sync {
    fn replace_rows(&self, rows: Vec<RenderedRow>);
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardSnapshot {
    pub status: String,
    pub rows: Vec<RenderedRow>,
    /// Bumped on every `replace_rows`.
    pub generation: u64,
    pub rows_replaced_at: Option<DateTime<Local>>,
}

/// In-memory board shared between the sync cycle (writer) and the dashboard
/// (reader). Each sink call swaps its part under one write lock, so readers
/// never observe a half-written table.
#[derive(Debug, Default)]
pub struct BoardState {
    inner: RwLock<BoardSnapshot>,
}

impl BoardState {
    pub fn new(initial_status: &str) -> Self {
        Self {
            inner: RwLock::new(BoardSnapshot {
                status: initial_status.to_string(),
                ..BoardSnapshot::default()
            }),
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusSink for BoardState {
    fn set_status(&self, text: &str) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.status = text.to_string();
    }
}

impl RowSink for BoardState {
    fn replace_rows(&self, rows: Vec<RenderedRow>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.rows = rows;
        guard.generation += 1;
        guard.rows_replaced_at = Some(Local::now());
    }
}
