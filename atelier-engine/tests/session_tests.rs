//! Integration tests for editor sessions.
//!
//! These drive full editing scenarios through `EditorSession` the way the
//! admin UI does: discrete mutations, undo/redo, dirty tracking against the
//! open-time snapshot, and persistence through the SQLite store, including
//! the two-pass collection reorder.

use atelier_api::{BlockKind, ColumnLayout, Document, EditorEvent};
use atelier_engine::{EditorSession, Store};
use serde_json::json;
use tokio::sync::broadcast;

/// Test harness owning a session and its event stream.
struct EditorTest {
    session: EditorSession,
    rx: broadcast::Receiver<EditorEvent>,
}

impl EditorTest {
    /// Open a session over an in-memory store.
    fn new(key: &str) -> Self {
        let store = Store::open_in_memory().expect("Failed to open store");
        let (session, rx) = EditorSession::open(Some(store), key);
        Self { session, rx }
    }

    /// Drain the event channel, returning the preview documents seen.
    fn drain_previews(&mut self) -> Vec<Document> {
        let mut previews = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            if let EditorEvent::Preview { document } = event {
                previews.push(document);
            }
        }
        previews
    }

    /// Build the canonical two-row page used across scenarios: a full-width
    /// hero row and a two-column text row.
    fn build_page(&mut self) {
        self.session.add_row(Some(ColumnLayout::One)).unwrap();
        self.session
            .add_block_to_row(BlockKind::HeroImage, 0)
            .unwrap();
        self.session.add_row(Some(ColumnLayout::Two)).unwrap();
        self.session.add_block_to_row(BlockKind::Text, 1).unwrap();
        self.session.add_block_to_row(BlockKind::Text, 1).unwrap();
    }
}

#[test]
fn test_build_and_save_page() {
    let mut t = EditorTest::new("work/knot-study");
    t.build_page();

    let doc = t.session.document();
    assert_eq!(doc.blocks.len(), 3);
    assert_eq!(doc.effective_rows().len(), 2);
    doc.validate().unwrap();

    t.session.save().unwrap();

    let saved = t
        .session
        .store()
        .unwrap()
        .load_document("work/knot-study")
        .unwrap()
        .expect("document was saved");
    assert_eq!(&saved, t.session.document());
}

#[test]
fn test_undo_redo_round_trip() {
    let mut t = EditorTest::new("news/article");
    let original = t.session.document().clone();

    t.build_page();
    let edited = t.session.document().clone();
    assert_ne!(original, edited);

    // Five mutations went in; five undos restore the original exactly.
    let mut undone = 0;
    while t.session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 5);
    assert_eq!(t.session.document(), &original);

    let mut redone = 0;
    while t.session.redo() {
        redone += 1;
    }
    assert_eq!(redone, 5);
    assert_eq!(t.session.document(), &edited);
}

#[test]
fn test_dirty_state_and_revert() {
    let mut t = EditorTest::new("about/page");
    assert!(!t.session.is_dirty());
    assert_eq!(t.session.change_count(), 0);

    t.build_page();
    assert!(t.session.is_dirty());
    assert!(t.session.change_count() > 0);

    t.session.revert();
    assert!(!t.session.is_dirty());
    assert_eq!(t.session.document().blocks.len(), 0);

    // The revert itself is an edit in history.
    assert!(t.session.undo());
    assert_eq!(t.session.document().blocks.len(), 3);
}

#[test]
fn test_save_does_not_move_baseline() {
    let mut t = EditorTest::new("news/article");
    t.build_page();
    t.session.save().unwrap();

    // Saved, but still dirty relative to the open-time snapshot.
    assert!(t.session.is_dirty());

    t.session.reset_baseline();
    assert!(!t.session.is_dirty());
}

#[test]
fn test_rejected_mutation_leaves_session_usable() {
    let mut t = EditorTest::new("news/article");
    t.session.add_row(Some(ColumnLayout::One)).unwrap();
    t.session.add_block_to_row(BlockKind::Text, 0).unwrap();

    let before = t.session.document().clone();
    let err = t.session.add_block_to_row(BlockKind::Text, 0).unwrap_err();
    assert_eq!(
        err,
        atelier_engine::EngineError::RowFull {
            row: 0,
            capacity: 1
        }
    );

    // Nothing changed, nothing recorded, editing continues.
    assert_eq!(t.session.document(), &before);
    t.session
        .change_row_layout(0, ColumnLayout::Two)
        .unwrap();
    t.session.add_block_to_row(BlockKind::Text, 0).unwrap();
    assert_eq!(t.session.document().blocks.len(), 2);
}

#[test]
fn test_shrink_splits_overflow_into_trailing_row() {
    let mut t = EditorTest::new("news/article");
    t.session.add_row(Some(ColumnLayout::Two)).unwrap();
    t.session.add_block_to_row(BlockKind::Text, 0).unwrap();
    t.session.add_block_to_row(BlockKind::Image, 0).unwrap();

    t.session.change_row_layout(0, ColumnLayout::One).unwrap();

    let doc = t.session.document();
    let rows = doc.effective_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].layout, ColumnLayout::One);
    assert_eq!(rows[0].block_count, 1);
    assert_eq!(rows[1].layout, ColumnLayout::One);
    assert_eq!(rows[1].block_count, 1);
    // Order preserved: text first, image second.
    assert_eq!(doc.blocks[0].kind(), BlockKind::Text);
    assert_eq!(doc.blocks[1].kind(), BlockKind::Image);
    doc.validate().unwrap();
}

#[test]
fn test_update_block_via_session() {
    let mut t = EditorTest::new("news/article");
    t.session.add_row(None).unwrap();
    t.session.add_block_to_row(BlockKind::Text, 0).unwrap();

    let id = t.session.document().blocks[0].id.clone();
    t.session
        .update_block(&id, &json!({"content": "Hello"}))
        .unwrap();

    match &t.session.document().blocks[0].body {
        atelier_api::BlockBody::Text { content, .. } => assert_eq!(content, "Hello"),
        other => panic!("expected text block, got {other:?}"),
    }
}

#[test]
fn test_preview_events_follow_every_change() {
    let mut t = EditorTest::new("news/article");
    t.build_page();

    let previews = t.drain_previews();
    assert_eq!(previews.len(), 5);
    // The last frame is the current document, verbatim.
    assert_eq!(previews.last().unwrap(), t.session.document());

    t.session.undo();
    let previews = t.drain_previews();
    assert_eq!(previews.len(), 1);
}

#[test]
fn test_save_without_store_keeps_edits() {
    let (mut session, _rx) = EditorSession::from_document(Document::empty(), "scratch");
    session.add_row(None).unwrap();
    session.add_block_to_row(BlockKind::Divider, 0).unwrap();

    assert!(session.save().is_err());
    // Local edits and history survive the failed save.
    assert_eq!(session.document().blocks.len(), 1);
    assert!(session.can_undo());
}

#[test]
fn test_session_loads_existing_document() {
    let store = Store::open_in_memory().unwrap();
    let mut doc = Document::empty();
    doc.blocks
        .push(atelier_api::Block::new(BlockKind::Heading));
    store.save_document("news/existing", &doc).unwrap();

    let (session, _rx) = EditorSession::open(Some(store), "news/existing");
    assert_eq!(session.document().blocks.len(), 1);
    assert!(!session.is_dirty());
}

#[test]
fn test_sessions_are_independent() {
    let (mut a, _rx_a) = EditorSession::from_document(Document::empty(), "a");
    let (mut b, _rx_b) = EditorSession::from_document(Document::empty(), "b");

    a.add_row(None).unwrap();
    a.add_block_to_row(BlockKind::Text, 0).unwrap();
    b.add_row(Some(ColumnLayout::Three)).unwrap();

    assert_eq!(a.document().blocks.len(), 1);
    assert_eq!(b.document().blocks.len(), 0);
    assert!(a.is_dirty());
}

#[test]
fn test_collection_reorder_through_session_store() {
    let mut t = EditorTest::new("news/article");

    {
        let store = t.session.store().unwrap();
        for i in 0..4 {
            store
                .add_item("news", &format!("article-{i}"), &format!("Article {i}"))
                .unwrap();
        }
    }

    let store = t.session.store_mut().unwrap();
    store.reorder("news", "article-3", 1).unwrap();

    let ids: Vec<String> = store
        .items("news")
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec!["article-0", "article-3", "article-1", "article-2"]);
}

#[test]
fn test_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atelier.db");

    {
        let store = Store::open(&path).unwrap();
        let (mut session, _rx) = EditorSession::open(Some(store), "work/persisted");
        session.add_row(None).unwrap();
        session.add_block_to_row(BlockKind::Text, 0).unwrap();
        session.save().unwrap();
    }

    let store = Store::open(&path).unwrap();
    let (session, _rx) = EditorSession::open(Some(store), "work/persisted");
    assert_eq!(session.document().blocks.len(), 1);
}
