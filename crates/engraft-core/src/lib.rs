//! # engraft-core
//!
//! Streaming GraphML ingestion for property graph stores - THE LOGIC.
//!
//! This crate turns a GraphML byte stream into graph-store mutations:
//! vertices, labeled edges, and typed properties. The document is consumed
//! as a pull-based XML event stream, so files of arbitrary size import in
//! bounded memory; against transactional stores, mutations are committed in
//! bounded windows so the import never builds an unbounded transaction.
//!
//! ## Architectural Constraints
//!
//! - Single-pass, single-threaded, forward-only over the event stream
//! - Vertex references resolve in any document order; an edge endpoint seen
//!   before (or instead of) its `<node>` element creates the vertex
//! - Declared property types are enforced: unparseable text is a hard
//!   failure, never a silent fallback to string
//! - The graph store is a collaborator behind the [`PropertyGraph`] trait;
//!   [`MemoryGraph`] and [`RedbGraph`] are the in-tree implementations
//! - No async, no network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod graph;
pub mod graphml;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Edge, EdgeId, PropertyValue, StoreError, TransactionMode, TransactionOutcome, ValueType,
    Vertex, VertexId,
};

// =============================================================================
// RE-EXPORTS: Store Contract & Implementations
// =============================================================================

pub use graph::{MemoryGraph, PropertyGraph, TransactionControl};
pub use storage::RedbGraph;

// =============================================================================
// RE-EXPORTS: GraphML Ingestion
// =============================================================================

pub use graphml::{
    DEFAULT_BUFFER_SIZE, GraphMlReader, IngestError, read_graphml, read_graphml_file,
};
