//! View models for dashboard templates.
//! Typed structs the templates render; no fetching or validation here.

use board::render::RenderedRow;
use board::sinks::BoardSnapshot;

pub struct BoardView {
    pub status: String,
    pub rows: Vec<RenderedRow>,
    /// Wall-clock time the current rows were written, `HH:MM:SS`.
    pub rows_as_of: Option<String>,
}

impl From<BoardSnapshot> for BoardView {
    fn from(snap: BoardSnapshot) -> Self {
        Self {
            status: snap.status,
            rows: snap.rows,
            rows_as_of: snap
                .rows_replaced_at
                .map(|t| t.format("%H:%M:%S").to_string()),
        }
    }
}
