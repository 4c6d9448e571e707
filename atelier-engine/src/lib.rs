//! Atelier Engine - the block-layout editing core.
//!
//! This crate contains:
//! - Mutation operations over block documents (pure, all-or-nothing)
//! - Undo/redo history
//! - Dirty-state tracking against an open-time snapshot
//! - The deterministic image layout calculator
//! - Legacy content migration
//! - SQLite persistence with the two-pass collection reorder protocol

pub mod dirty;
pub mod history;
pub mod layout;
pub mod migrate;
pub mod ops;
pub mod persistence;

mod error;

pub use error::EngineError;
pub use history::{History, DEFAULT_HISTORY_CAP};
pub use persistence::{OrderedItem, Store};

use atelier_api::{BlockId, BlockKind, ColumnLayout, Document, EditorEvent};
use serde_json::Value;
use tokio::sync::broadcast;

/// One editing session: owns the current document, its undo/redo history,
/// the open-time snapshot, and the preview channel.
///
/// Sessions are plain owned values; nothing here is global, so any number
/// of sessions (tabs, tests) run independently. All methods are synchronous
/// and the session must not be shared across threads mid-mutation; the
/// surrounding application serializes user actions.
pub struct EditorSession {
    key: String,
    history: History,
    baseline: dirty::DirtyTracker<Document>,
    event_tx: broadcast::Sender<EditorEvent>,
    store: Option<Store>,
}

impl EditorSession {
    /// Open a session for the document stored under `key`. A missing or
    /// unreadable record opens as an empty document; the store itself is
    /// optional so purely local editing works the same way.
    pub fn open(store: Option<Store>, key: &str) -> (Self, broadcast::Receiver<EditorEvent>) {
        let document = match &store {
            Some(store) => match store.load_document(key) {
                Ok(Some(document)) => document,
                Ok(None) => Document::empty(),
                Err(e) => {
                    tracing::warn!("Failed to load document {key}: {e}");
                    Document::empty()
                }
            },
            None => Document::empty(),
        };

        Self::with_document(document, store, key)
    }

    /// Open a session over an already-loaded document.
    pub fn from_document(document: Document, key: &str) -> (Self, broadcast::Receiver<EditorEvent>) {
        Self::with_document(document, None, key)
    }

    fn with_document(
        document: Document,
        store: Option<Store>,
        key: &str,
    ) -> (Self, broadcast::Receiver<EditorEvent>) {
        let (event_tx, event_rx) = broadcast::channel(1024);
        let session = Self {
            key: key.to_owned(),
            baseline: dirty::DirtyTracker::new(&document),
            history: History::new(document),
            event_tx,
            store,
        };
        (session, event_rx)
    }

    /// The current document.
    pub fn document(&self) -> &Document {
        self.history.present()
    }

    /// The key this session saves under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.event_tx.subscribe()
    }

    /// Emit a session event. Subscribers are optional; send errors mean
    /// nobody is listening and are ignored.
    fn emit(&self, event: EditorEvent) {
        let _ = self.event_tx.send(event);
    }

    fn emit_preview(&self) {
        self.emit(EditorEvent::Preview {
            document: self.document().clone(),
        });
    }

    /// Record the outcome of a mutation operation: a new document becomes
    /// the present history state and is pushed to the preview channel; an
    /// error leaves everything untouched.
    fn apply(&mut self, result: Result<Document, EngineError>) -> Result<(), EngineError> {
        match result {
            Ok(document) => {
                self.history.push(document);
                self.emit_preview();
                Ok(())
            }
            Err(e) => {
                tracing::debug!("rejected mutation: {e}");
                Err(e)
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn add_block_to_row(&mut self, kind: BlockKind, row: usize) -> Result<(), EngineError> {
        self.apply(ops::add_block_to_row(self.document(), kind, row))
    }

    pub fn delete_block(&mut self, id: &BlockId) -> Result<(), EngineError> {
        self.apply(ops::delete_block(self.document(), id))
    }

    pub fn update_block(&mut self, id: &BlockId, patch: &Value) -> Result<(), EngineError> {
        self.apply(ops::update_block(self.document(), id, patch))
    }

    pub fn reorder_blocks(&mut self, id: &BlockId, destination: usize) -> Result<(), EngineError> {
        self.apply(ops::reorder_blocks(self.document(), id, destination))
    }

    pub fn move_block_to_row(
        &mut self,
        id: &BlockId,
        target_row: usize,
        position_in_row: usize,
    ) -> Result<(), EngineError> {
        self.apply(ops::move_block_to_row(
            self.document(),
            id,
            target_row,
            position_in_row,
        ))
    }

    pub fn change_row_layout(
        &mut self,
        row: usize,
        layout: ColumnLayout,
    ) -> Result<(), EngineError> {
        self.apply(ops::change_row_layout(self.document(), row, layout))
    }

    pub fn add_row(&mut self, layout: Option<ColumnLayout>) -> Result<(), EngineError> {
        self.apply(ops::add_row(self.document(), layout))
    }

    pub fn delete_row(&mut self, row: usize) -> Result<(), EngineError> {
        self.apply(ops::delete_row(self.document(), row))
    }

    pub fn reorder_rows(&mut self, source: usize, destination: usize) -> Result<(), EngineError> {
        self.apply(ops::reorder_rows(self.document(), source, destination))
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Step back one edit. No-op (returns false) with nothing to undo.
    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo();
        if undone {
            self.emit_preview();
        }
        undone
    }

    /// Step forward one undone edit.
    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo();
        if redone {
            self.emit_preview();
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // =========================================================================
    // Dirty state / persistence
    // =========================================================================

    /// Whether the document differs from the open-time snapshot.
    pub fn is_dirty(&self) -> bool {
        self.baseline.is_dirty(self.document())
    }

    /// Human-facing count of differences from the open-time snapshot.
    pub fn change_count(&self) -> usize {
        self.baseline.change_count(self.document())
    }

    /// Discard local edits: the snapshot becomes the present state (as a
    /// fresh copy) and a new history entry, so the revert itself is
    /// undoable.
    pub fn revert(&mut self) {
        let restored = self.baseline.revert();
        self.history.push(restored);
        self.emit_preview();
    }

    /// Persist the current document. Failure leaves the document, history
    /// and snapshot untouched so nothing is lost and the save can be
    /// retried. A successful save does not move the dirty-state baseline;
    /// call [`EditorSession::reset_baseline`] to start a fresh session
    /// against the saved state.
    pub fn save(&mut self) -> anyhow::Result<()> {
        let Some(store) = &self.store else {
            anyhow::bail!("no persistence store attached to session {}", self.key);
        };

        match store.save_document(&self.key, self.document()) {
            Ok(()) => {
                self.emit(EditorEvent::Saved {
                    key: self.key.clone(),
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to save document {}: {e}", self.key);
                self.emit(EditorEvent::SaveFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Re-capture the dirty-state baseline from the current document.
    pub fn reset_baseline(&mut self) {
        let current = self.document().clone();
        self.baseline.reset(&current);
    }

    /// Get a reference to the persistence store.
    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    /// Get a mutable reference to the persistence store (collection
    /// reordering needs a transaction).
    pub fn store_mut(&mut self) -> Option<&mut Store> {
        self.store.as_mut()
    }
}
