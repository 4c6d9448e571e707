//! Layout mutation operations.
//!
//! Every operation is pure: current document + arguments in, new document
//! out. The input is never mutated, and an error return means no new state
//! was produced, so callers keep exactly what they had. After any change
//! the flat sequence is re-indexed to contiguous `order` values and the row
//! config is re-written to cover every block.

use atelier_api::{Block, BlockId, BlockKind, ColumnLayout, Document, RowConfig};
use serde_json::Value;

use crate::error::EngineError;

/// Start/end offsets of each row in the flat block sequence.
fn row_spans(rows: &[RowConfig]) -> Vec<(usize, usize)> {
    let mut spans = Vec::with_capacity(rows.len());
    let mut start = 0usize;
    for row in rows {
        let end = start + row.block_count as usize;
        spans.push((start, end));
        start = end;
    }
    spans
}

/// Which row a flat index falls in.
fn row_of(spans: &[(usize, usize)], index: usize) -> Option<usize> {
    spans
        .iter()
        .position(|&(start, end)| index >= start && index < end)
}

/// Re-assign contiguous order values over the flat sequence.
fn reindex(blocks: &mut [Block]) {
    for (i, block) in blocks.iter_mut().enumerate() {
        block.order = i as u32;
    }
}

/// Create a block of `kind` and insert it at the end of the target row.
/// A full row is an error; the caller must resize the row first.
pub fn add_block_to_row(
    doc: &Document,
    kind: BlockKind,
    row_index: usize,
) -> Result<Document, EngineError> {
    let mut rows = doc.effective_rows();
    if row_index >= rows.len() {
        return Err(EngineError::RowIndexOutOfRange(row_index));
    }

    let capacity = rows[row_index].layout.columns();
    if rows[row_index].block_count as usize >= capacity {
        return Err(EngineError::RowFull {
            row: row_index,
            capacity,
        });
    }

    let insert_at = row_spans(&rows)[row_index].1;
    rows[row_index].block_count += 1;

    let mut next = doc.clone();
    next.blocks.insert(insert_at, Block::new(kind));
    reindex(&mut next.blocks);
    next.row_config = Some(rows);
    Ok(next)
}

/// Remove a block. A row emptied by the removal is collapsed away.
pub fn delete_block(doc: &Document, id: &BlockId) -> Result<Document, EngineError> {
    let index = doc
        .block_index(id)
        .ok_or_else(|| EngineError::UnknownBlock(id.to_string()))?;

    let mut rows = doc.effective_rows();
    let spans = row_spans(&rows);
    let row = row_of(&spans, index).ok_or(EngineError::IndexOutOfRange(index))?;

    let mut next = doc.clone();
    next.blocks.remove(index);
    rows[row].block_count -= 1;
    if rows[row].block_count == 0 {
        rows.remove(row);
    }

    reindex(&mut next.blocks);
    next.row_config = Some(rows);
    Ok(next)
}

/// Merge a partial payload into the addressed block. Placement and identity
/// are untouched: `id`, `type` and `order` keys in the patch are ignored,
/// and a patch that breaks the block's shape is rejected whole.
pub fn update_block(doc: &Document, id: &BlockId, patch: &Value) -> Result<Document, EngineError> {
    let index = doc
        .block_index(id)
        .ok_or_else(|| EngineError::UnknownBlock(id.to_string()))?;

    let Value::Object(fields) = patch else {
        return Err(EngineError::InvalidPatch("patch must be an object".into()));
    };

    let mut merged = serde_json::to_value(&doc.blocks[index])
        .map_err(|e| EngineError::InvalidPatch(e.to_string()))?;
    let Value::Object(target) = &mut merged else {
        return Err(EngineError::InvalidPatch(
            "block did not serialize to an object".into(),
        ));
    };

    for (key, value) in fields {
        if matches!(key.as_str(), "id" | "type" | "order") {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }

    let updated: Block =
        serde_json::from_value(merged).map_err(|e| EngineError::InvalidPatch(e.to_string()))?;

    let mut next = doc.clone();
    next.blocks[index] = updated;
    Ok(next)
}

/// Move a block to a new position in the flat sequence, constrained to its
/// current row: the destination is clamped to the row's span, so this is
/// the same-row column re-ordering primitive.
pub fn reorder_blocks(
    doc: &Document,
    source_id: &BlockId,
    destination_index: usize,
) -> Result<Document, EngineError> {
    let source = doc
        .block_index(source_id)
        .ok_or_else(|| EngineError::UnknownBlock(source_id.to_string()))?;
    if destination_index >= doc.blocks.len() {
        return Err(EngineError::IndexOutOfRange(destination_index));
    }

    let rows = doc.effective_rows();
    let spans = row_spans(&rows);
    let row = row_of(&spans, source).ok_or(EngineError::IndexOutOfRange(source))?;
    let (start, end) = spans[row];
    let destination = destination_index.clamp(start, end - 1);

    let mut next = doc.clone();
    let block = next.blocks.remove(source);
    next.blocks.insert(destination, block);
    reindex(&mut next.blocks);
    next.row_config = Some(rows);
    Ok(next)
}

/// Relocate a block into another row at `position_in_row`. The source row
/// collapses if emptied; a target row at capacity rejects the move.
pub fn move_block_to_row(
    doc: &Document,
    block_id: &BlockId,
    target_row: usize,
    position_in_row: usize,
) -> Result<Document, EngineError> {
    let source_index = doc
        .block_index(block_id)
        .ok_or_else(|| EngineError::UnknownBlock(block_id.to_string()))?;

    let mut rows = doc.effective_rows();
    if target_row >= rows.len() {
        return Err(EngineError::RowIndexOutOfRange(target_row));
    }

    let spans = row_spans(&rows);
    let source_row = row_of(&spans, source_index).ok_or(EngineError::IndexOutOfRange(source_index))?;

    if source_row != target_row {
        let capacity = rows[target_row].layout.columns();
        if rows[target_row].block_count as usize >= capacity {
            return Err(EngineError::RowFull {
                row: target_row,
                capacity,
            });
        }
    }

    // Occupancy the target row will have at insertion time (the moved block
    // is already out when positions are counted).
    let slots = rows[target_row].block_count as usize
        - usize::from(source_row == target_row);
    if position_in_row > slots {
        return Err(EngineError::PositionOutOfRange {
            row: target_row,
            position: position_in_row,
        });
    }

    let mut next = doc.clone();
    let block = next.blocks.remove(source_index);
    rows[source_row].block_count -= 1;

    let destination = row_spans(&rows)[target_row].0 + position_in_row;
    next.blocks.insert(destination, block);
    rows[target_row].block_count += 1;

    if rows[source_row].block_count == 0 && source_row != target_row {
        rows.remove(source_row);
    }

    reindex(&mut next.blocks);
    next.row_config = Some(rows);
    Ok(next)
}

/// Change a row's column count. Shrinking below the current occupancy
/// pushes each excess tail block into its own full-width row directly
/// after, so no block is ever dropped and no row exceeds its capacity.
pub fn change_row_layout(
    doc: &Document,
    row_index: usize,
    new_layout: ColumnLayout,
) -> Result<Document, EngineError> {
    let mut rows = doc.effective_rows();
    if row_index >= rows.len() {
        return Err(EngineError::RowIndexOutOfRange(row_index));
    }

    rows[row_index].layout = new_layout;

    let capacity = new_layout.columns() as u32;
    let count = rows[row_index].block_count;
    if count > capacity {
        rows[row_index].block_count = capacity;
        for offset in 0..(count - capacity) as usize {
            rows.insert(
                row_index + 1 + offset,
                RowConfig::new(ColumnLayout::One, 1),
            );
        }
    }

    let mut next = doc.clone();
    next.row_config = Some(rows);
    Ok(next)
}

/// Append an empty row (full width unless a layout is given).
pub fn add_row(doc: &Document, layout: Option<ColumnLayout>) -> Result<Document, EngineError> {
    let mut rows = doc.effective_rows();
    rows.push(RowConfig::new(layout.unwrap_or_default(), 0));

    let mut next = doc.clone();
    next.row_config = Some(rows);
    Ok(next)
}

/// Remove a row and every block assigned to it. Block loss is intentional
/// here; callers confirm with the user first.
pub fn delete_row(doc: &Document, row_index: usize) -> Result<Document, EngineError> {
    let mut rows = doc.effective_rows();
    if row_index >= rows.len() {
        return Err(EngineError::RowIndexOutOfRange(row_index));
    }

    let (start, end) = row_spans(&rows)[row_index];
    rows.remove(row_index);

    let mut next = doc.clone();
    next.blocks.drain(start..end);
    reindex(&mut next.blocks);
    next.row_config = Some(rows);
    Ok(next)
}

/// Move a whole row, with its blocks as a unit, to a new row position.
pub fn reorder_rows(
    doc: &Document,
    source_row: usize,
    destination_row: usize,
) -> Result<Document, EngineError> {
    let rows = doc.effective_rows();
    if source_row >= rows.len() {
        return Err(EngineError::RowIndexOutOfRange(source_row));
    }
    if destination_row >= rows.len() {
        return Err(EngineError::RowIndexOutOfRange(destination_row));
    }

    let (start, end) = row_spans(&rows)[source_row];

    let mut next = doc.clone();
    let chunk: Vec<Block> = next.blocks.drain(start..end).collect();

    let mut new_rows = rows;
    let moved = new_rows.remove(source_row);
    new_rows.insert(destination_row, moved);

    let insert_at: usize = new_rows[..destination_row]
        .iter()
        .map(|r| r.block_count as usize)
        .sum();
    next.blocks.splice(insert_at..insert_at, chunk);

    reindex(&mut next.blocks);
    next.row_config = Some(new_rows);
    Ok(next)
}
