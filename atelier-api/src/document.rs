//! The aggregate document: a flat ordered block list plus row assignments.
//!
//! Blocks are stored flat; `rowConfig` partitions the flat sequence into
//! horizontal rows of 1-3 columns. A row's `blockCount` says how many blocks
//! it consumes from the sequence, in order. Documents with no row config
//! render as a single column (the legacy shape).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::{Block, BlockId, ColumnLayout};

/// Current stored format version.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Configuration for a single row: its column count and how many blocks it
/// consumes from the flat sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowConfig {
    pub layout: ColumnLayout,
    pub block_count: u32,
}

impl RowConfig {
    pub fn new(layout: ColumnLayout, block_count: u32) -> Self {
        Self {
            layout,
            block_count,
        }
    }
}

/// The full ordered collection of blocks plus their row assignments for one
/// page. This is the on-wire shape: `{ blocks, version, rowConfig? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub blocks: Vec<Block>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_config: Option<Vec<RowConfig>>,
}

/// Structural invariant violations detected by [`Document::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("duplicate block id: {0}")]
    DuplicateBlockId(BlockId),

    #[error("row config covers {covered} blocks but document holds {actual}")]
    CountMismatch { covered: u32, actual: u32 },

    #[error("row {row} holds {count} blocks but has only {capacity} columns")]
    RowOverflow {
        row: usize,
        count: u32,
        capacity: usize,
    },

    #[error("block at index {index} has order {found}, expected {expected}")]
    OrderGap {
        index: usize,
        found: u32,
        expected: u32,
    },
}

impl Document {
    /// An empty document in the current format version.
    pub fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            version: DOCUMENT_VERSION.to_owned(),
            row_config: None,
        }
    }

    /// Parse a document from untrusted JSON. Never fails: anything that does
    /// not deserialize into the document shape yields an empty document.
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| Self::empty())
    }

    /// The row partition actually in effect, normalized so that every block
    /// is covered: rows are taken from `rowConfig` as far as it goes
    /// (clamped to the blocks that exist), and every block left over gets a
    /// full-width row of its own.
    pub fn effective_rows(&self) -> Vec<RowConfig> {
        let total = self.blocks.len() as u32;
        let mut rows = Vec::new();
        let mut covered: u32 = 0;

        if let Some(config) = &self.row_config {
            for row in config {
                let count = row.block_count.min(total - covered);
                rows.push(RowConfig::new(row.layout, count));
                covered += count;
            }
        }

        for _ in covered..total {
            rows.push(RowConfig::new(ColumnLayout::One, 1));
        }

        rows
    }

    /// Group blocks into row slices according to `rowConfig`, consuming the
    /// flat sequence in order. Missing config yields a single row holding
    /// everything; blocks left after all config entries are exhausted are
    /// appended as one extra fallback row so nothing is dropped.
    pub fn rows(&self) -> Vec<&[Block]> {
        let config = match &self.row_config {
            Some(config) if !config.is_empty() => config,
            _ => return vec![&self.blocks[..]],
        };

        let mut rows = Vec::with_capacity(config.len());
        let mut index = 0usize;

        for row in config {
            let count = row.block_count as usize;
            let end = (index + count).min(self.blocks.len());
            rows.push(&self.blocks[index..end]);
            index = end;
        }

        if index < self.blocks.len() {
            rows.push(&self.blocks[index..]);
        }

        rows
    }

    /// Check the structural invariants: unique ids, row counts summing to
    /// the block count, no row over its column capacity, contiguous order.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = std::collections::HashSet::new();
        for block in &self.blocks {
            if !seen.insert(&block.id) {
                return Err(DocumentError::DuplicateBlockId(block.id.clone()));
            }
        }

        if let Some(config) = &self.row_config {
            let covered: u32 = config.iter().map(|r| r.block_count).sum();
            let actual = self.blocks.len() as u32;
            if covered != actual {
                return Err(DocumentError::CountMismatch { covered, actual });
            }

            for (row, entry) in config.iter().enumerate() {
                let capacity = entry.layout.columns();
                if entry.block_count as usize > capacity {
                    return Err(DocumentError::RowOverflow {
                        row,
                        count: entry.block_count,
                        capacity,
                    });
                }
            }
        }

        for (index, block) in self.blocks.iter().enumerate() {
            let expected = index as u32;
            if block.order != expected {
                return Err(DocumentError::OrderGap {
                    index,
                    found: block.order,
                    expected,
                });
            }
        }

        Ok(())
    }

    /// Find a block by id.
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Flat index of a block by id.
    pub fn block_index(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

/// Generate a row config for `block_count` blocks from a list of desired
/// column layouts. Each row consumes as many blocks as it has columns,
/// clamped to what remains; layouts beyond the last block are dropped.
pub fn generate_row_config(block_count: u32, layouts: &[ColumnLayout]) -> Vec<RowConfig> {
    let mut remaining = block_count;
    let mut result = Vec::new();

    for &layout in layouts {
        if remaining == 0 {
            break;
        }
        let count = (layout.columns() as u32).min(remaining);
        result.push(RowConfig::new(layout, count));
        remaining -= count;
    }

    result
}
