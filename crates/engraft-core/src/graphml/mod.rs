//! # GraphML Ingestion
//!
//! Streaming GraphML reader for property graph stores.
//!
//! The document is consumed as a pull-based XML event stream — it is never
//! materialized — so arbitrarily large files import in bounded memory.
//! Three cooperating pieces:
//!
//! - the event dispatcher and builder state machine (`reader`)
//! - the key declaration table and type coercion (`schema`)
//! - the bounded transaction window machine (`batch`)
//!
//! Entry points: [`GraphMlReader`] for configured reads, [`read_graphml`]
//! and [`read_graphml_file`] for the common cases.

mod batch;
mod reader;
mod schema;

pub use reader::{DEFAULT_BUFFER_SIZE, GraphMlReader, read_graphml, read_graphml_file};

use crate::types::{StoreError, ValueType};
use thiserror::Error;

// =============================================================================
// DOCUMENT TOKENS
// =============================================================================

/// GraphML element and attribute names.
pub mod tokens {
    /// `<key>` — property schema declaration.
    pub const KEY: &str = "key";
    /// `<node>` — vertex element.
    pub const NODE: &str = "node";
    /// `<edge>` — edge element.
    pub const EDGE: &str = "edge";
    /// `<data>` — property value element.
    pub const DATA: &str = "data";

    /// `id` attribute on `key`, `node`, and `edge`.
    pub const ID: &str = "id";
    /// `attr.name` attribute on `key`.
    pub const ATTR_NAME: &str = "attr.name";
    /// `attr.type` attribute on `key`.
    pub const ATTR_TYPE: &str = "attr.type";
    /// `source` attribute on `edge`.
    pub const SOURCE: &str = "source";
    /// `target` attribute on `edge`.
    pub const TARGET: &str = "target";
    /// `label` attribute on `edge`.
    pub const LABEL: &str = "label";
    /// `key` attribute on `data`.
    pub const KEY_REF: &str = "key";

    /// Label assigned to edges that carry no `label` attribute.
    pub const DEFAULT_EDGE_LABEL: &str = "_default";
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by GraphML ingestion.
///
/// Nothing is caught and recovered locally: the first failure aborts the
/// remaining parse and is returned to the caller. Windows committed before
/// the failure stay committed; the open window is left to the store's own
/// abort-on-drop behavior.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The tokenizer reported malformed XML.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An element carried a malformed attribute list.
    #[error("attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Document bytes could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Text content carried an invalid entity or escape sequence.
    #[error("escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// An element or attribute name was not valid UTF-8.
    #[error("utf8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A structurally required attribute was absent.
    #[error("missing required attribute: {0}")]
    MissingAttr(&'static str),

    /// Text content could not be parsed as its declared type.
    #[error("cannot parse {value:?} as {declared} for attribute {attribute:?}")]
    Coercion {
        attribute: String,
        declared: ValueType,
        value: String,
    },

    /// The graph store rejected a mutation or lookup.
    #[error("graph store error: {0}")]
    Store(#[from] StoreError),

    /// The input source failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
