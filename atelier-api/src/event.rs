//! Events emitted by an editor session to subscribers (preview surface,
//! save indicators, etc.). Purely observational: no acknowledgement and no
//! back-pressure; slow subscribers miss frames.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Events emitted by an editing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EditorEvent {
    /// The document changed; carries the full document for preview
    /// rendering, verbatim in the on-wire shape.
    Preview { document: Document },

    /// The document was persisted under `key`.
    Saved { key: String },

    /// Persisting failed; local edits and history are retained, the save
    /// can be retried.
    SaveFailed { key: String, message: String },
}
