//! Undo/redo history over document values.
//!
//! A plain past/present/future stack of owned documents. Entries are
//! values, never references into live editor state, so undoing can never
//! observe a later mutation. Single-threaded by design: one editing session
//! owns one history.

use std::collections::VecDeque;

use atelier_api::Document;

/// Default maximum number of undo steps retained.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Undo/redo stack.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Document>,
    present: Document,
    future: Vec<Document>,
    cap: usize,
}

impl History {
    /// Start a history at `present` with the default capacity.
    pub fn new(present: Document) -> Self {
        Self::with_cap(present, DEFAULT_HISTORY_CAP)
    }

    /// Start a history with an explicit undo capacity.
    pub fn with_cap(present: Document, cap: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: Vec::new(),
            cap: cap.max(1),
        }
    }

    /// The current document.
    pub fn present(&self) -> &Document {
        &self.present
    }

    /// Record a new present state. The old present becomes undoable, any
    /// redoable states are discarded, and the oldest entry is evicted once
    /// the capacity is exceeded.
    pub fn push(&mut self, next: Document) {
        let old = std::mem::replace(&mut self.present, next);
        self.past.push_back(old);
        if self.past.len() > self.cap {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back one state. Returns false (and changes nothing) when there
    /// is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.past.pop_back() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.present, previous);
                self.future.push(current);
                true
            }
            None => false,
        }
    }

    /// Step forward one state. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.future.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.present, next);
                self.past.push_back(current);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_api::{Block, BlockKind};

    /// Deterministic document per `n`, so equal inputs compare equal.
    fn doc_with(n: usize) -> Document {
        let mut doc = Document::empty();
        for i in 0..n {
            let mut block = Block::new(BlockKind::Divider);
            block.id = atelier_api::BlockId(format!("block-{i}"));
            block.order = i as u32;
            doc.blocks.push(block);
        }
        doc
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let original = doc_with(0);
        let mut history = History::new(original.clone());

        let states: Vec<Document> = (1..=4).map(doc_with).collect();
        for state in &states {
            history.push(state.clone());
        }

        for _ in 0..4 {
            assert!(history.undo());
        }
        assert_eq!(history.present(), &original);
        assert!(!history.undo());

        for _ in 0..4 {
            assert!(history.redo());
        }
        assert_eq!(history.present(), states.last().unwrap());
        assert!(!history.redo());
    }

    #[test]
    fn test_push_clears_future() {
        let mut history = History::new(doc_with(0));
        history.push(doc_with(1));
        history.undo();
        assert!(history.can_redo());

        history.push(doc_with(2));
        assert!(!history.can_redo());
        assert_eq!(history.present(), &doc_with(2));
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = History::with_cap(doc_with(0), 3);
        for i in 1..=5 {
            history.push(doc_with(i));
        }

        let mut undone = 0;
        while history.undo() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        // The oldest surviving state is the one pushed two evictions in.
        assert_eq!(history.present(), &doc_with(2));
    }
}
