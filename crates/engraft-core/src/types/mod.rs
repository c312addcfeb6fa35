//! # Core Type Definitions
//!
//! This module contains all core types for the engraft ingestion engine:
//! - Store identifiers (`VertexId`, `EdgeId`)
//! - Graph element records (`Vertex`, `Edge`)
//! - Typed property values (`PropertyValue`, `ValueType`)
//! - Transaction capability types (`TransactionMode`, `TransactionOutcome`)
//! - Store error type (`StoreError`)
//!
//! ## Id Model
//!
//! A document refers to vertices by external string ids; the store assigns
//! its own internal ids. The external id is kept on the element as a hint
//! only — two stores loading the same document may assign different
//! internal ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// STORE IDENTIFIERS
// =============================================================================

/// Store-assigned identifier for a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u64);

/// Store-assigned identifier for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

// =============================================================================
// GRAPH ELEMENTS
// =============================================================================

/// A vertex record as held by a store.
///
/// `hint` is the external id the vertex was created under. The store key is
/// `id`; the hint is retained for inspection and export tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    /// The store-assigned identifier.
    pub id: VertexId,
    /// The external id supplied at creation time.
    pub hint: String,
}

impl Vertex {
    /// Create a new vertex record.
    #[must_use]
    pub fn new(id: VertexId, hint: impl Into<String>) -> Self {
        Self {
            id,
            hint: hint.into(),
        }
    }
}

/// A directed, labeled edge record as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// The store-assigned identifier.
    pub id: EdgeId,
    /// The external id supplied at creation time.
    pub hint: String,
    /// The edge label.
    pub label: String,
    /// The tail (out) vertex.
    pub from: VertexId,
    /// The head (in) vertex.
    pub to: VertexId,
}

impl Edge {
    /// Create a new edge record.
    #[must_use]
    pub fn new(
        id: EdgeId,
        hint: impl Into<String>,
        label: impl Into<String>,
        from: VertexId,
        to: VertexId,
    ) -> Self {
        Self {
            id,
            hint: hint.into(),
            label: label.into(),
            from,
            to,
        }
    }
}

// =============================================================================
// PROPERTY VALUES
// =============================================================================

/// A typed property value.
///
/// The six variants mirror the declared types a GraphML `<key>` element may
/// carry. Values with no declaration, or declared as strings, stay strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
}

impl PropertyValue {
    /// Get the string content, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// The closed enumeration of declarable property types.
///
/// Matched exhaustively at coercion time. Unrecognized declaration tokens
/// collapse to `String` so their values pass through as opaque text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Int,
    Long,
    Float,
    Double,
    Boolean,
}

impl ValueType {
    /// Resolve a declared `attr.type` token.
    ///
    /// Unknown tokens are treated as the string type, matching the lenient
    /// handling GraphML producers rely on.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            _ => Self::String,
        }
    }

    /// The GraphML token for this type.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// =============================================================================
// TRANSACTION CAPABILITY TYPES
// =============================================================================

/// Commit mode of a transactional store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Every mutation commits on its own.
    Automatic,
    /// Mutations accumulate until an explicit commit.
    Manual,
}

/// Conclusion passed when closing a transaction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Persist the window.
    Success,
    /// Discard the window.
    Failure,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by a graph store collaborator.
///
/// Ingestion never retries or recovers from these; they abort the parse and
/// surface to the caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested vertex does not exist in the store.
    #[error("vertex not found: {0:?}")]
    VertexNotFound(VertexId),

    /// The requested edge does not exist in the store.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeId),

    /// A mutation was issued in manual mode with no transaction open.
    #[error("no transaction in progress")]
    NoTransaction,

    /// A transaction was begun while another was still open.
    #[error("a transaction is already in progress")]
    TransactionOpen,

    /// A storage I/O failure.
    #[error("storage error: {0}")]
    Io(String),

    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// TESTS
// =============================================================================
