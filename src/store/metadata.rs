use std::path::Path;

use rusqlite::{Connection, ErrorCode, Transaction, params};

use crate::{
    foundation::core::BBox,
    foundation::error::{StoreError, StoreResult},
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    document_id INTEGER PRIMARY KEY AUTOINCREMENT,
    stem        TEXT UNIQUE,
    source_path TEXT UNIQUE
);
CREATE TABLE IF NOT EXISTS layers (
    layer_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    stem        TEXT,
    source_path TEXT,
    asset_path  TEXT,
    order_index INTEGER,
    "left"      INTEGER,
    "top"       INTEGER,
    "right"     INTEGER,
    "bottom"    INTEGER,
    name        TEXT,
    kind        TEXT,
    FOREIGN KEY (source_path) REFERENCES documents (source_path)
);
"#;

/// What happens to the document row when a document is aborted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortPolicy {
    /// The document row is committed up front and survives an abort, so a re-run skips the
    /// document as a duplicate. Assets already written stay on disk.
    #[default]
    Retain,
    /// The document row lives in the document transaction; an abort leaves no row and written
    /// assets are removed.
    Rollback,
}

/// A stored document.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DocumentRow {
    /// Surrogate key.
    pub document_id: i64,
    /// File name without extension.
    pub stem: String,
    /// Path the document was read from.
    pub source_path: String,
}

/// A stored layer asset.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct LayerRow {
    /// Surrogate key.
    pub layer_id: i64,
    /// Owning document stem.
    pub stem: String,
    /// Owning document path.
    pub source_path: String,
    /// Path of the written image.
    pub asset_path: String,
    /// Position among the document's top-level layers, bottom-most is 0.
    pub order_index: i64,
    /// Layer bounds as stored in the document.
    pub bbox: BBox,
    /// Layer name.
    pub name: String,
    /// Layer kind tag.
    pub kind: String,
}

/// Fields of a layer row about to be recorded.
#[derive(Clone, Copy, Debug)]
pub struct NewLayer<'a> {
    /// Position among the document's top-level layers.
    pub order_index: usize,
    /// Layer bounds.
    pub bbox: BBox,
    /// Layer name.
    pub name: &'a str,
    /// Layer kind tag.
    pub kind: &'a str,
    /// Path of the written image.
    pub asset_path: &'a Path,
}

/// Document and layer metadata in a single SQLite database.
pub struct MetadataStore {
    conn: Connection,
    policy: AbortPolicy,
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("path", &self.conn.path())
            .field("policy", &self.policy)
            .finish()
    }
}

impl MetadataStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        // The layers -> documents key is declared only; documents may be deleted on their own.
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        Ok(Self {
            conn,
            policy: AbortPolicy::default(),
        })
    }

    /// Replace the abort policy.
    pub fn with_abort_policy(mut self, policy: AbortPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current abort policy.
    pub fn abort_policy(&self) -> AbortPolicy {
        self.policy
    }

    /// Create both tables if they do not exist yet.
    pub fn ensure_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Register a document and open the transaction its layer rows go into.
    ///
    /// Fails with [`StoreError::DuplicateDocument`] if the stem or path is already recorded; no
    /// state changes in that case.
    #[tracing::instrument(skip(self))]
    pub fn begin_document(&mut self, stem: &str, source_path: &str) -> StoreResult<DocumentHandle<'_>> {
        match self.policy {
            AbortPolicy::Retain => {
                let id = insert_document(&self.conn, stem, source_path)?;
                let tx = self.conn.transaction()?;
                Ok(DocumentHandle::new(tx, id, stem, source_path))
            }
            AbortPolicy::Rollback => {
                let tx = self.conn.transaction()?;
                let id = insert_document(&tx, stem, source_path)?;
                Ok(DocumentHandle::new(tx, id, stem, source_path))
            }
        }
    }

    /// All stored documents, oldest first.
    pub fn documents(&self) -> StoreResult<Vec<DocumentRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT document_id, stem, source_path FROM documents ORDER BY document_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(DocumentRow {
                document_id: row.get(0)?,
                stem: row.get(1)?,
                source_path: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Layer rows of the document with `stem`, by order index.
    pub fn layers_for(&self, stem: &str) -> StoreResult<Vec<LayerRow>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT layer_id, stem, source_path, asset_path, order_index,
                      "left", "top", "right", "bottom", name, kind
               FROM layers WHERE stem = ?1 ORDER BY order_index"#,
        )?;
        let rows = stmt.query_map(params![stem], |row| {
            Ok(LayerRow {
                layer_id: row.get(0)?,
                stem: row.get(1)?,
                source_path: row.get(2)?,
                asset_path: row.get(3)?,
                order_index: row.get(4)?,
                bbox: BBox::new(row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?),
                name: row.get(9)?,
                kind: row.get(10)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Total number of layer rows.
    pub fn layer_count(&self) -> StoreResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM layers", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

fn insert_document(conn: &Connection, stem: &str, source_path: &str) -> StoreResult<i64> {
    match conn.execute(
        "INSERT INTO documents (stem, source_path) VALUES (?1, ?2)",
        params![stem, source_path],
    ) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(StoreError::DuplicateDocument {
                stem: stem.to_string(),
                source_path: source_path.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Open per-document transaction.
///
/// Dropping the handle without [`commit`](Self::commit) rolls the layer rows back.
pub struct DocumentHandle<'a> {
    tx: Transaction<'a>,
    document_id: i64,
    stem: String,
    source_path: String,
}

impl std::fmt::Debug for DocumentHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("document_id", &self.document_id)
            .field("stem", &self.stem)
            .field("source_path", &self.source_path)
            .finish()
    }
}

impl<'a> DocumentHandle<'a> {
    fn new(tx: Transaction<'a>, document_id: i64, stem: &str, source_path: &str) -> Self {
        Self {
            tx,
            document_id,
            stem: stem.to_string(),
            source_path: source_path.to_string(),
        }
    }

    /// Row id of the document.
    pub fn document_id(&self) -> i64 {
        self.document_id
    }

    /// Document stem.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Insert one layer row inside the document transaction.
    pub fn record_layer(&self, layer: &NewLayer<'_>) -> StoreResult<i64> {
        self.tx.execute(
            r#"INSERT INTO layers
                 (stem, source_path, asset_path, order_index, "left", "top", "right", "bottom", name, kind)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                self.stem,
                self.source_path,
                layer.asset_path.to_string_lossy(),
                layer.order_index as i64,
                layer.bbox.left,
                layer.bbox.top,
                layer.bbox.right,
                layer.bbox.bottom,
                layer.name,
                layer.kind,
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    /// Make all layer rows of the document durable.
    pub fn commit(self) -> StoreResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    /// Discard the document's layer rows (and, under [`AbortPolicy::Rollback`], its row).
    pub fn abort(self) -> StoreResult<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/metadata.rs"]
mod tests;
