//! SQLite-backed persistence for documents and ordered collections.
//!
//! This module provides:
//! - Document storage (one JSON blob per page key)
//! - Uniquely-ordered collections (articles, projects, navigation items)
//!   with the two-pass reorder protocol
//!
//! Every collection enforces `UNIQUE (collection, ord)`, so a reorder can
//! never write final order values directly: the member being moved and the
//! member currently holding the target slot would collide mid-update.
//! [`Store::reorder`] stages every member at a disjoint negative order
//! first, then writes the final values, all inside one transaction.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

use atelier_api::Document;

use crate::migrate;

/// Database version for migrations.
const SCHEMA_VERSION: i32 = 1;

/// Offset for temporary staging orders during a reorder. Position `i` is
/// staged at `-(i + STAGING_OFFSET)`, disjoint from all real orders.
const STAGING_OFFSET: i64 = 100;

/// The persistence store backed by SQLite.
pub struct Store {
    conn: Connection,
}

/// One member of a uniquely-ordered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedItem {
    pub id: String,
    pub title: String,
    pub ord: i64,
}

impl Store {
    /// Open or create the database at the default location
    /// (~/.atelier/atelier.db).
    pub fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(&path)
    }

    /// Open or create the database at a specific path.
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;

        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests and previews).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize(&mut self) -> Result<()> {
        let version = self.get_schema_version()?;

        if version == 0 {
            self.create_schema()?;
        } else if version < SCHEMA_VERSION {
            self.migrate_schema(version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(&self) -> Result<i32> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |_| Ok(true),
            )
            .unwrap_or(false);

        if !exists {
            return Ok(0);
        }

        let version: i32 = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| {
                    let v: String = row.get(0)?;
                    Ok(v.parse().unwrap_or(0))
                },
            )
            .unwrap_or(0);

        Ok(version)
    }

    /// Create the initial schema.
    fn create_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- Metadata table for schema versioning
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- One document (block content JSON) per page key
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Uniquely-ordered collection members. The (collection, ord)
            -- constraint is what the reorder protocol stages around.
            CREATE TABLE IF NOT EXISTS collection_items (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                ord INTEGER NOT NULL,
                PRIMARY KEY (collection, id),
                UNIQUE (collection, ord)
            );

            -- Set schema version
            INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');
        "#,
        )?;

        Ok(())
    }

    /// Migrate from an older schema version.
    fn migrate_schema(&mut self, _from_version: i32) -> Result<()> {
        // Future migrations go here
        Ok(())
    }

    // =========================================================================
    // Document operations
    // =========================================================================

    /// Persist a document under `key`, replacing any previous content.
    pub fn save_document(&self, key: &str, document: &Document) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let content = migrate::serialize_content(document);
        self.conn
            .execute(
                "INSERT OR REPLACE INTO documents (key, content, updated_at) VALUES (?1, ?2, ?3)",
                params![key, content, now],
            )
            .with_context(|| format!("Failed to save document: {key}"))?;
        Ok(())
    }

    /// Load the document stored under `key`, adapting legacy content shapes.
    pub fn load_document(&self, key: &str) -> Result<Option<Document>> {
        let content: Option<String> = self
            .conn
            .query_row(
                "SELECT content FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(content.map(|raw| migrate::parse_content(&raw)))
    }

    /// When the stored content was last written.
    pub fn document_updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let updated: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(updated.map(parse_datetime))
    }

    // =========================================================================
    // Ordered collections
    // =========================================================================

    /// Append a member at the end of a collection, returning its order.
    pub fn add_item(&self, collection: &str, id: &str, title: &str) -> Result<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(ord) + 1, 0) FROM collection_items WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;

        self.conn
            .execute(
                "INSERT INTO collection_items (collection, id, title, ord) VALUES (?1, ?2, ?3, ?4)",
                params![collection, id, title, next],
            )
            .with_context(|| format!("Failed to insert into collection: {collection}"))?;

        Ok(next)
    }

    /// All members of a collection, ordered.
    pub fn items(&self, collection: &str) -> Result<Vec<OrderedItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, ord FROM collection_items WHERE collection = ?1 ORDER BY ord ASC",
        )?;

        let items = stmt
            .query_map(params![collection], |row| {
                Ok(OrderedItem {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    ord: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Remove a member and close the gap it leaves, keeping orders
    /// contiguous. Runs in a transaction using the same staging scheme as
    /// [`Store::reorder`].
    pub fn remove_item(&mut self, collection: &str, member_id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM collection_items WHERE collection = ?1 AND id = ?2",
            params![collection, member_id],
        )?;
        if removed == 0 {
            bail!("unknown member {member_id} in collection {collection}");
        }

        let ids = ordered_ids(&tx, collection)?;
        stage_then_finalize(&tx, collection, &ids)?;

        tx.commit()?;
        Ok(())
    }

    /// Move one member of a collection to `target` (clamped to the valid
    /// range), keeping every order unique and contiguous.
    ///
    /// Runs entirely inside one transaction. The first pass parks every
    /// member at a negative staging order so that no intermediate write can
    /// collide with a real order under the uniqueness constraint; the
    /// second pass writes the final 0..n sequence. Writing final values
    /// directly would trip the constraint whenever the moved member and a
    /// displaced neighbor swap over each other's old values.
    pub fn reorder(&mut self, collection: &str, member_id: &str, target: usize) -> Result<()> {
        let tx = self.conn.transaction()?;

        let mut ids = ordered_ids(&tx, collection)?;
        let Some(position) = ids.iter().position(|id| id == member_id) else {
            bail!("unknown member {member_id} in collection {collection}");
        };

        let moved = ids.remove(position);
        let target = target.min(ids.len());
        ids.insert(target, moved);

        stage_then_finalize(&tx, collection, &ids)?;

        tx.commit()?;
        Ok(())
    }
}

/// Member ids of a collection in current order.
fn ordered_ids(conn: &Connection, collection: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT id FROM collection_items WHERE collection = ?1 ORDER BY ord ASC")?;
    let ids = stmt
        .query_map(params![collection], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Write the given sequence as the collection's order: first pass parks
/// every member at a disjoint negative order, second pass assigns 0..n.
fn stage_then_finalize(conn: &Connection, collection: &str, ids: &[String]) -> Result<()> {
    for (i, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE collection_items SET ord = ?1 WHERE collection = ?2 AND id = ?3",
            params![-(i as i64 + STAGING_OFFSET), collection, id],
        )?;
    }

    for (i, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE collection_items SET ord = ?1 WHERE collection = ?2 AND id = ?3",
            params![i as i64, collection, id],
        )?;
    }

    Ok(())
}

/// Get the default database path.
fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".atelier").join("atelier.db"))
}

/// Parse an RFC3339 datetime string.
fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_api::{Block, BlockKind};

    fn seeded(collection: &str, n: usize) -> Store {
        let store = Store::open_in_memory().unwrap();
        for i in 0..n {
            store
                .add_item(collection, &format!("m{i}"), &format!("Member {i}"))
                .unwrap();
        }
        store
    }

    fn order_of(store: &Store, collection: &str) -> Vec<String> {
        store
            .items(collection)
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect()
    }

    #[test]
    fn test_document_round_trip() {
        let store = Store::open_in_memory().unwrap();

        let mut doc = Document::empty();
        doc.blocks.push(Block::new(BlockKind::Heading));

        store.save_document("news/article-1", &doc).unwrap();
        let loaded = store.load_document("news/article-1").unwrap().unwrap();
        assert_eq!(loaded, doc);

        assert!(store.load_document("news/missing").unwrap().is_none());
        assert!(store.document_updated_at("news/article-1").unwrap().is_some());
    }

    #[test]
    fn test_save_replaces_previous_content() {
        let store = Store::open_in_memory().unwrap();
        store.save_document("page", &Document::empty()).unwrap();

        let mut doc = Document::empty();
        doc.blocks.push(Block::new(BlockKind::Text));
        store.save_document("page", &doc).unwrap();

        let loaded = store.load_document("page").unwrap().unwrap();
        assert_eq!(loaded.blocks.len(), 1);
    }

    #[test]
    fn test_legacy_markdown_loads_as_text_block() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO documents (key, content, updated_at) VALUES (?1, ?2, ?3)",
                params!["legacy", "Just some markdown", Utc::now().to_rfc3339()],
            )
            .unwrap();

        let doc = store.load_document("legacy").unwrap().unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind(), BlockKind::Text);
    }

    #[test]
    fn test_add_item_assigns_contiguous_orders() {
        let store = seeded("news", 3);
        let items = store.items("news").unwrap();
        let orders: Vec<i64> = items.iter().map(|i| i.ord).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_moves_member_to_target() {
        let mut store = seeded("news", 5);

        store.reorder("news", "m3", 0).unwrap();
        assert_eq!(order_of(&store, "news"), vec!["m3", "m0", "m1", "m2", "m4"]);

        let orders: Vec<i64> = store.items("news").unwrap().iter().map(|i| i.ord).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reorder_every_target_keeps_orders_contiguous() {
        for target in 0..6 {
            let mut store = seeded("works", 5);
            store.reorder("works", "m1", target).unwrap();

            let items = store.items("works").unwrap();
            let orders: Vec<i64> = items.iter().map(|i| i.ord).collect();
            assert_eq!(orders, vec![0, 1, 2, 3, 4], "target {target}");

            // Clamped to the last position when past the end.
            let expected = target.min(4);
            assert_eq!(items[expected].id, "m1", "target {target}");
        }
    }

    #[test]
    fn test_reorder_adjacent_swap() {
        // The case a naive single-pass update trips on: both members land
        // on each other's old order value.
        let mut store = seeded("nav", 2);
        store.reorder("nav", "m0", 1).unwrap();
        assert_eq!(order_of(&store, "nav"), vec!["m1", "m0"]);
    }

    #[test]
    fn test_reorder_unknown_member_fails_cleanly() {
        let mut store = seeded("news", 3);
        assert!(store.reorder("news", "ghost", 0).is_err());
        // Untouched after the failed transaction.
        assert_eq!(order_of(&store, "news"), vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_collections_are_independent() {
        let mut store = seeded("news", 3);
        for i in 0..3 {
            store
                .add_item("people", &format!("p{i}"), &format!("Person {i}"))
                .unwrap();
        }

        store.reorder("news", "m2", 0).unwrap();
        assert_eq!(order_of(&store, "people"), vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_remove_item_closes_gap() {
        let mut store = seeded("news", 4);
        store.remove_item("news", "m1").unwrap();

        let items = store.items("news").unwrap();
        let orders: Vec<i64> = items.iter().map(|i| i.ord).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(order_of(&store, "news"), vec!["m0", "m2", "m3"]);
    }
}
