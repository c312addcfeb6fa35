//! # redb-backed Graph Storage
//!
//! A disk-backed property graph using the redb embedded database:
//! - ACID transactions, crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! ## Commit Modes
//!
//! `RedbGraph` is the transactional collaborator: it implements
//! `TransactionControl` alongside `PropertyGraph`.
//!
//! - **Automatic** (the default): every mutation runs in its own write
//!   transaction and commits immediately.
//! - **Manual**: `begin` opens a write transaction that is held across
//!   mutations until `commit` closes it with a success or failure outcome.
//!   Reads observe the open window.
//!
//! redb admits one live write transaction per database, so while a manual
//! window is open all mutations are routed through it. A manual-mode
//! mutation with no open window is `StoreError::NoTransaction`.

use crate::graph::{PropertyGraph, TransactionControl};
use crate::types::{
    Edge, EdgeId, PropertyValue, StoreError, TransactionMode, TransactionOutcome, Vertex, VertexId,
};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Table for vertices: VertexId(u64) -> serialized Vertex bytes
const VERTICES: TableDefinition<u64, &[u8]> = TableDefinition::new("vertices");

/// Table for edges: EdgeId(u64) -> serialized Edge bytes
const EDGES: TableDefinition<u64, &[u8]> = TableDefinition::new("edges");

/// Table for vertex properties: (vertex_id, name_hash) -> serialized (name, value)
/// The name hash as part of the key enables range queries per vertex.
const VERTEX_PROPERTIES: TableDefinition<(u64, u64), &[u8]> =
    TableDefinition::new("vertex_properties");

/// Table for edge properties: (edge_id, name_hash) -> serialized (name, value)
const EDGE_PROPERTIES: TableDefinition<(u64, u64), &[u8]> =
    TableDefinition::new("edge_properties");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// A disk-backed property graph using redb.
pub struct RedbGraph {
    /// The redb database handle.
    db: Database,
    /// Current commit mode.
    mode: TransactionMode,
    /// The open manual window, if any.
    pending: Option<WriteTransaction>,
    /// Next available vertex id.
    next_vertex_id: u64,
    /// Next available edge id.
    next_edge_id: u64,
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph")
            .field("mode", &self.mode)
            .field("window_open", &self.pending.is_some())
            .field("next_vertex_id", &self.next_vertex_id)
            .field("next_edge_id", &self.next_edge_id)
            .finish_non_exhaustive()
    }
}

impl RedbGraph {
    /// Open or create a graph database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(|e| StoreError::Io(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(VERTICES)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(EDGES)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(VERTEX_PROPERTIES)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(EDGE_PROPERTIES)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(METADATA)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }

        // Load id counters
        let read_txn = db
            .begin_read()
            .map_err(|e| StoreError::Io(e.to_string()))?;
        let (next_vertex_id, next_edge_id) = {
            let table = read_txn
                .open_table(METADATA)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let vertices = table
                .get("next_vertex_id")
                .map_err(|e| StoreError::Io(e.to_string()))?
                .map(|v| v.value())
                .unwrap_or(0);
            let edges = table
                .get("next_edge_id")
                .map_err(|e| StoreError::Io(e.to_string()))?
                .map(|v| v.value())
                .unwrap_or(0);
            (vertices, edges)
        };

        Ok(Self {
            db,
            mode: TransactionMode::Automatic,
            pending: None,
            next_vertex_id,
            next_edge_id,
        })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), StoreError> {
        if self.pending.is_some() {
            return Err(StoreError::TransactionOpen);
        }
        self.db
            .compact()
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    /// All vertices in id order.
    pub fn vertices(&self) -> Result<Vec<Vertex>, StoreError> {
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(VERTICES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                scan_records(&table)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(VERTICES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                scan_records(&table)
            }
        }
    }

    /// All edges in id order.
    pub fn edges(&self) -> Result<Vec<Edge>, StoreError> {
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(EDGES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                scan_records(&table)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(EDGES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                scan_records(&table)
            }
        }
    }

    // =========================================================================
    // WRITE PLUMBING
    // =========================================================================

    /// Run one mutation against the open window, or in its own transaction
    /// when no window is open and the mode is automatic.
    fn with_write<F>(&mut self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&WriteTransaction) -> Result<(), StoreError>,
    {
        match &self.pending {
            Some(txn) => f(txn),
            None => {
                if matches!(self.mode, TransactionMode::Manual) {
                    return Err(StoreError::NoTransaction);
                }
                let txn = self
                    .db
                    .begin_write()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                f(&txn)?;
                txn.commit().map_err(|e| StoreError::Io(e.to_string()))
            }
        }
    }

    fn put_vertex(
        txn: &WriteTransaction,
        vertex: &Vertex,
        next_id: u64,
    ) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(vertex)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        {
            let mut table = txn
                .open_table(VERTICES)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            table
                .insert(vertex.id.0, bytes.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let mut meta = txn
            .open_table(METADATA)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        meta.insert("next_vertex_id", next_id)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    fn put_edge(txn: &WriteTransaction, edge: &Edge, next_id: u64) -> Result<(), StoreError> {
        let bytes =
            postcard::to_allocvec(edge).map_err(|e| StoreError::Serialization(e.to_string()))?;
        {
            let mut table = txn
                .open_table(EDGES)
                .map_err(|e| StoreError::Io(e.to_string()))?;
            table
                .insert(edge.id.0, bytes.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let mut meta = txn
            .open_table(METADATA)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        meta.insert("next_edge_id", next_id)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    fn put_property(
        txn: &WriteTransaction,
        table_def: TableDefinition<'static, (u64, u64), &'static [u8]>,
        owner: u64,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(&(name, value))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut table = txn
            .open_table(table_def)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        table
            .insert((owner, name_hash(name)), bytes.as_slice())
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

// =============================================================================
// READ HELPERS
// =============================================================================

fn name_hash(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

fn get_record<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    key: u64,
) -> Result<Option<T>, StoreError> {
    match table.get(key).map_err(|e| StoreError::Io(e.to_string()))? {
        Some(data) => {
            let record = postcard::from_bytes(data.value())
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

fn scan_records<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
) -> Result<Vec<T>, StoreError> {
    let mut records = Vec::new();
    for entry in table.iter().map_err(|e| StoreError::Io(e.to_string()))? {
        let (_, data) = entry.map_err(|e| StoreError::Io(e.to_string()))?;
        let record = postcard::from_bytes(data.value())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

fn properties_of(
    table: &impl ReadableTable<(u64, u64), &'static [u8]>,
    owner: u64,
) -> Result<Vec<(String, PropertyValue)>, StoreError> {
    let mut result: Vec<(String, PropertyValue)> = Vec::new();
    for entry in table
        .range((owner, 0u64)..=(owner, u64::MAX))
        .map_err(|e| StoreError::Io(e.to_string()))?
    {
        let (_, data) = entry.map_err(|e| StoreError::Io(e.to_string()))?;
        let (name, value): (String, PropertyValue) = postcard::from_bytes(data.value())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        result.push((name, value));
    }
    // The key space orders by name hash; present properties in name order.
    result.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(result)
}

fn table_len(table: &impl ReadableTableMetadata) -> Result<usize, StoreError> {
    let len = table.len().map_err(|e| StoreError::Io(e.to_string()))?;
    Ok(len as usize)
}

// =============================================================================
// PROPERTYGRAPH TRAIT IMPLEMENTATION
// =============================================================================

impl PropertyGraph for RedbGraph {
    fn add_vertex(&mut self, id_hint: &str) -> Result<VertexId, StoreError> {
        let id = VertexId(self.next_vertex_id);
        let next_id = self.next_vertex_id.saturating_add(1);
        let vertex = Vertex::new(id, id_hint);

        self.with_write(|txn| Self::put_vertex(txn, &vertex, next_id))?;

        self.next_vertex_id = next_id;
        Ok(id)
    }

    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>, StoreError> {
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(VERTICES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                get_record(&table, id.0)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(VERTICES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                get_record(&table, id.0)
            }
        }
    }

    fn add_edge(
        &mut self,
        id_hint: &str,
        from: VertexId,
        to: VertexId,
        label: &str,
    ) -> Result<EdgeId, StoreError> {
        if self.vertex(from)?.is_none() {
            return Err(StoreError::VertexNotFound(from));
        }
        if self.vertex(to)?.is_none() {
            return Err(StoreError::VertexNotFound(to));
        }

        let id = EdgeId(self.next_edge_id);
        let next_id = self.next_edge_id.saturating_add(1);
        let edge = Edge::new(id, id_hint, label, from, to);

        self.with_write(|txn| Self::put_edge(txn, &edge, next_id))?;

        self.next_edge_id = next_id;
        Ok(id)
    }

    fn edge(&self, id: EdgeId) -> Result<Option<Edge>, StoreError> {
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(EDGES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                get_record(&table, id.0)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(EDGES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                get_record(&table, id.0)
            }
        }
    }

    fn set_vertex_property(
        &mut self,
        vertex: VertexId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        if self.vertex(vertex)?.is_none() {
            return Err(StoreError::VertexNotFound(vertex));
        }
        self.with_write(|txn| {
            Self::put_property(txn, VERTEX_PROPERTIES, vertex.0, name, &value)
        })
    }

    fn set_edge_property(
        &mut self,
        edge: EdgeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        if self.edge(edge)?.is_none() {
            return Err(StoreError::EdgeNotFound(edge));
        }
        self.with_write(|txn| Self::put_property(txn, EDGE_PROPERTIES, edge.0, name, &value))
    }

    fn vertex_count(&self) -> Result<usize, StoreError> {
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(VERTICES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                table_len(&table)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(VERTICES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                table_len(&table)
            }
        }
    }

    fn edge_count(&self) -> Result<usize, StoreError> {
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(EDGES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                table_len(&table)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(EDGES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                table_len(&table)
            }
        }
    }

    fn vertex_properties(
        &self,
        vertex: VertexId,
    ) -> Result<Vec<(String, PropertyValue)>, StoreError> {
        if self.vertex(vertex)?.is_none() {
            return Err(StoreError::VertexNotFound(vertex));
        }
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(VERTEX_PROPERTIES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                properties_of(&table, vertex.0)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(VERTEX_PROPERTIES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                properties_of(&table, vertex.0)
            }
        }
    }

    fn edge_properties(&self, edge: EdgeId) -> Result<Vec<(String, PropertyValue)>, StoreError> {
        if self.edge(edge)?.is_none() {
            return Err(StoreError::EdgeNotFound(edge));
        }
        match &self.pending {
            Some(txn) => {
                let table = txn
                    .open_table(EDGE_PROPERTIES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                properties_of(&table, edge.0)
            }
            None => {
                let read_txn = self
                    .db
                    .begin_read()
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                let table = read_txn
                    .open_table(EDGE_PROPERTIES)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
                properties_of(&table, edge.0)
            }
        }
    }

    fn transactions(&mut self) -> Option<&mut dyn TransactionControl> {
        Some(self)
    }
}

// =============================================================================
// TRANSACTIONCONTROL TRAIT IMPLEMENTATION
// =============================================================================

impl TransactionControl for RedbGraph {
    fn transaction_mode(&self) -> TransactionMode {
        self.mode
    }

    fn set_transaction_mode(&mut self, mode: TransactionMode) -> Result<(), StoreError> {
        // Leaving manual mode with a window still open closes that window
        // with a success outcome, like the stores this contract descends
        // from.
        if matches!(mode, TransactionMode::Automatic) && self.pending.is_some() {
            self.commit(TransactionOutcome::Success)?;
        }
        self.mode = mode;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.pending.is_some() {
            return Err(StoreError::TransactionOpen);
        }
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Io(e.to_string()))?;
        self.pending = Some(txn);
        Ok(())
    }

    fn commit(&mut self, outcome: TransactionOutcome) -> Result<(), StoreError> {
        let txn = self.pending.take().ok_or(StoreError::NoTransaction)?;
        match outcome {
            TransactionOutcome::Success => {
                txn.commit().map_err(|e| StoreError::Io(e.to_string()))
            }
            TransactionOutcome::Failure => {
                txn.abort().map_err(|e| StoreError::Io(e.to_string()))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
