//! # GraphML Reader
//!
//! The streaming parse/build state machine.
//!
//! Events from the tokenizer are dispatched by local element name; the
//! session state lives in [`Ingestion`] and is discarded when the call
//! returns:
//!
//! - the key declaration table (`<key>` schema)
//! - the external-id → store-id map, so vertex references resolve in any
//!   document order (edge endpoints may precede — or replace — their own
//!   `<node>` elements)
//! - the parse cursor: at most one open `<node>` or `<edge>` span at a
//!   time, the target of nested `<data>` elements
//! - the transaction batcher, checked once per consumed event
//!
//! Control flow is single-pass and forward-only; the first failure aborts
//! the parse.

use super::batch::TransactionBatcher;
use super::schema::KeyTable;
use super::{IngestError, tokens};
use crate::graph::PropertyGraph;
use crate::types::{EdgeId, StoreError, ValueType, VertexId};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

/// Default number of mutations per transaction window.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

// =============================================================================
// PUBLIC SURFACE
// =============================================================================

/// A configured GraphML reader.
///
/// The only knob is the transaction window size; it is ignored for
/// non-transactional stores.
#[derive(Debug, Clone)]
pub struct GraphMlReader {
    buffer_size: usize,
}

impl GraphMlReader {
    /// Reader with the default window of [`DEFAULT_BUFFER_SIZE`] mutations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Reader with a custom transaction window.
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { buffer_size }
    }

    /// Ingest a GraphML document from `input` into `graph`.
    ///
    /// Consumes the stream to exhaustion or to the first unrecoverable
    /// error. The document is processed event by event and never
    /// materialized.
    pub fn read<G: PropertyGraph, R: BufRead>(
        &self,
        graph: &mut G,
        input: R,
    ) -> Result<(), IngestError> {
        let mut reader = Reader::from_reader(input);
        // Do not enable global text trimming; whitespace inside <data> is
        // payload. Formatting-only text never reaches a pending payload.
        let mut buf = Vec::new();
        let mut ingestion = Ingestion::open(graph, self.buffer_size)?;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => ingestion.handle_start(&e)?,
                Event::Empty(e) => {
                    // A self-closing element is an open tag immediately
                    // followed by its close tag.
                    ingestion.handle_start(&e)?;
                    ingestion.handle_end(str::from_utf8(e.local_name().as_ref())?)?;
                }
                Event::End(e) => {
                    ingestion.handle_end(str::from_utf8(e.local_name().as_ref())?)?;
                }
                Event::Text(t) => {
                    let text = t.decode()?;
                    let text = quick_xml::escape::unescape(&text)?;
                    ingestion.handle_text(&text);
                }
                Event::CData(c) => {
                    let text = c.decode()?;
                    ingestion.handle_text(&text);
                }
                Event::Eof => break,
                _ => {}
            }
            ingestion.checkpoint()?;
            buf.clear();
        }

        ingestion.finish()
    }
}

impl Default for GraphMlReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Ingest a GraphML document with the default transaction window.
pub fn read_graphml<G: PropertyGraph, R: BufRead>(
    graph: &mut G,
    input: R,
) -> Result<(), IngestError> {
    GraphMlReader::new().read(graph, input)
}

/// Ingest a GraphML file with the default transaction window.
pub fn read_graphml_file<G: PropertyGraph>(
    graph: &mut G,
    path: impl AsRef<Path>,
) -> Result<(), IngestError> {
    let file = File::open(path)?;
    GraphMlReader::new().read(graph, BufReader::new(file))
}

// =============================================================================
// BUILDER STATE
// =============================================================================

/// The open element span targeted by `<data>` children.
///
/// A `<node>` span and an `<edge>` span are mutually exclusive; opening one
/// closes the other.
#[derive(Debug, Clone, Copy)]
enum Cursor {
    None,
    Vertex(VertexId),
    Edge(EdgeId),
}

/// A `<data>` payload being accumulated until its close tag.
#[derive(Debug)]
struct PendingData {
    /// Declared attribute name the key reference resolved to.
    attribute: String,
    /// The element the property lands on, captured at the open tag.
    target: Cursor,
    /// Text content gathered so far.
    text: String,
}

/// Session state for one ingestion call.
struct Ingestion<'g, G: PropertyGraph> {
    graph: &'g mut G,
    keys: KeyTable,
    /// external id -> store-assigned vertex id
    vertex_refs: BTreeMap<String, VertexId>,
    cursor: Cursor,
    pending_data: Option<PendingData>,
    batcher: TransactionBatcher,
}

impl<'g, G: PropertyGraph> Ingestion<'g, G> {
    fn open(graph: &'g mut G, buffer_size: usize) -> Result<Self, IngestError> {
        let batcher = TransactionBatcher::open(graph, buffer_size)?;
        Ok(Self {
            graph,
            keys: KeyTable::default(),
            vertex_refs: BTreeMap::new(),
            cursor: Cursor::None,
            pending_data: None,
            batcher,
        })
    }

    // =========================================================================
    // EVENT HANDLERS
    // =========================================================================

    fn handle_start(&mut self, e: &BytesStart<'_>) -> Result<(), IngestError> {
        let name = e.local_name();
        match str::from_utf8(name.as_ref())? {
            tokens::KEY => {
                let attrs = attrs_to_map(e)?;
                let id = attrs
                    .get(tokens::ID)
                    .ok_or(IngestError::MissingAttr("key@id"))?;
                let attribute = attrs
                    .get(tokens::ATTR_NAME)
                    .ok_or(IngestError::MissingAttr("key@attr.name"))?;
                // Absent attr.type means opaque text, same as "string".
                let declared = attrs
                    .get(tokens::ATTR_TYPE)
                    .map(|t| ValueType::from_token(t))
                    .unwrap_or(ValueType::String);
                self.keys.declare(id, attribute, declared);
            }
            tokens::NODE => {
                let attrs = attrs_to_map(e)?;
                let id = attrs
                    .get(tokens::ID)
                    .ok_or(IngestError::MissingAttr("node@id"))?;
                let vertex = self.resolve_or_create(id)?;
                self.cursor = Cursor::Vertex(vertex);
            }
            tokens::EDGE => {
                let attrs = attrs_to_map(e)?;
                let id = attrs
                    .get(tokens::ID)
                    .ok_or(IngestError::MissingAttr("edge@id"))?;
                let source = attrs
                    .get(tokens::SOURCE)
                    .ok_or(IngestError::MissingAttr("edge@source"))?;
                let target = attrs
                    .get(tokens::TARGET)
                    .ok_or(IngestError::MissingAttr("edge@target"))?;
                let label = attrs
                    .get(tokens::LABEL)
                    .map(String::as_str)
                    .unwrap_or(tokens::DEFAULT_EDGE_LABEL);

                // Endpoints resolve in document order; either may be an
                // implicit creation.
                let from = self.resolve_or_create(source)?;
                let to = self.resolve_or_create(target)?;
                let edge = self.graph.add_edge(id, from, to, label)?;
                self.batcher.record();
                self.cursor = Cursor::Edge(edge);
            }
            tokens::DATA => {
                let attrs = attrs_to_map(e)?;
                // An undeclared (or absent) key reference leaves the element
                // inert: its text is consumed and dropped, by contract.
                let attribute = attrs
                    .get(tokens::KEY_REF)
                    .and_then(|key| self.keys.attribute_name(key))
                    .map(str::to_string);
                self.pending_data = attribute.map(|attribute| PendingData {
                    attribute,
                    target: self.cursor,
                    text: String::new(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_end(&mut self, name: &str) -> Result<(), IngestError> {
        match name {
            tokens::NODE => {
                if matches!(self.cursor, Cursor::Vertex(_)) {
                    self.cursor = Cursor::None;
                }
            }
            tokens::EDGE => {
                if matches!(self.cursor, Cursor::Edge(_)) {
                    self.cursor = Cursor::None;
                }
            }
            tokens::DATA => {
                if let Some(pending) = self.pending_data.take() {
                    self.apply_data(pending)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Accumulate text content for an open `<data>` payload. Text anywhere
    /// else is formatting and is ignored.
    fn handle_text(&mut self, text: &str) {
        if let Some(pending) = self.pending_data.as_mut() {
            pending.text.push_str(text);
        }
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Map an external vertex id to its store vertex, creating it on first
    /// sight. A given external id resolves to the same store vertex for the
    /// whole parse, whether it first appears as a `<node>` or as an edge
    /// endpoint.
    fn resolve_or_create(&mut self, external_id: &str) -> Result<VertexId, IngestError> {
        if let Some(&id) = self.vertex_refs.get(external_id) {
            return match self.graph.vertex(id)? {
                Some(vertex) => Ok(vertex.id),
                None => Err(StoreError::VertexNotFound(id).into()),
            };
        }
        let id = self.graph.add_vertex(external_id)?;
        self.vertex_refs.insert(external_id.to_string(), id);
        self.batcher.record();
        Ok(id)
    }

    /// Coerce a completed `<data>` payload and set it on the element that
    /// was open at the payload's start tag. No open element means the
    /// payload is dropped without error — not even coerced, so a bad value
    /// outside any node/edge span cannot abort the parse.
    fn apply_data(&mut self, pending: PendingData) -> Result<(), IngestError> {
        match pending.target {
            Cursor::Vertex(vertex) => {
                let value = self.keys.coerce(&pending.attribute, &pending.text)?;
                self.graph
                    .set_vertex_property(vertex, &pending.attribute, value)?;
                self.batcher.record();
            }
            Cursor::Edge(edge) => {
                let value = self.keys.coerce(&pending.attribute, &pending.text)?;
                self.graph
                    .set_edge_property(edge, &pending.attribute, value)?;
                self.batcher.record();
            }
            Cursor::None => {}
        }
        Ok(())
    }

    // =========================================================================
    // TRANSACTION WINDOWS
    // =========================================================================

    fn checkpoint(&mut self) -> Result<(), IngestError> {
        self.batcher.checkpoint(&mut *self.graph)?;
        Ok(())
    }

    fn finish(self) -> Result<(), IngestError> {
        self.batcher.finish(&mut *self.graph)?;
        Ok(())
    }
}

// =============================================================================
// ATTRIBUTE HELPERS
// =============================================================================

fn attrs_to_map(e: &BytesStart<'_>) -> Result<BTreeMap<String, String>, IngestError> {
    let mut out = BTreeMap::new();
    for a in e.attributes() {
        let a = a?;
        let key = str::from_utf8(a.key.as_ref())?.to_string();
        let val = a.unescape_value()?.to_string();
        out.insert(key, val);
    }
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::types::PropertyValue;

    fn load(xml: &str) -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        read_graphml(&mut graph, xml.as_bytes()).expect("ingest");
        graph
    }

    #[test]
    fn nodes_and_edges_are_created() {
        let graph = load(
            r#"<graphml><graph>
                <node id="1"/>
                <node id="2"/>
                <edge id="e1" label="knows" source="1" target="2"/>
            </graph></graphml>"#,
        );

        assert_eq!(graph.vertex_count().expect("count"), 2);
        assert_eq!(graph.edge_count().expect("count"), 1);
    }

    #[test]
    fn coercion_fails_before_storing_anything_for_the_element() {
        let mut graph = MemoryGraph::new();
        let result = read_graphml(
            &mut graph,
            r#"<graphml>
                <key id="k1" attr.name="age" attr.type="int"/>
                <graph>
                    <node id="1"><data key="k1">notanumber</data></node>
                </graph>
            </graphml>"#
                .as_bytes(),
        );

        assert!(matches!(result, Err(IngestError::Coercion { .. })));
        let vertex = graph.vertex_by_hint("1").expect("vertex exists").id;
        assert!(graph.vertex_properties(vertex).expect("props").is_empty());
    }

    #[test]
    fn data_before_any_element_is_dropped() {
        let graph = load(
            r#"<graphml>
                <key id="k1" attr.name="name" attr.type="string"/>
                <graph>
                    <data key="k1">orphaned</data>
                    <node id="1"/>
                </graph>
            </graphml>"#,
        );

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        assert!(graph.vertex_properties(vertex).expect("props").is_empty());
    }

    #[test]
    fn text_outside_data_is_ignored() {
        let graph = load(
            r#"<graphml><graph>
                stray text
                <node id="1">more stray text</node>
            </graph></graphml>"#,
        );
        assert_eq!(graph.vertex_count().expect("count"), 1);
    }

    #[test]
    fn entities_in_data_payloads_are_unescaped() {
        let graph = load(
            r#"<graphml>
                <key id="k1" attr.name="name" attr.type="string"/>
                <graph>
                    <node id="1"><data key="k1">A &amp; B &lt;C&gt;</data></node>
                </graph>
            </graphml>"#,
        );

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        let props = graph.vertex_properties(vertex).expect("props");
        assert_eq!(
            props,
            vec![(
                "name".to_string(),
                PropertyValue::String("A & B <C>".to_string())
            )]
        );
    }

    #[test]
    fn cdata_payload_is_taken_literally() {
        let graph = load(
            r#"<graphml>
                <key id="k1" attr.name="snippet" attr.type="string"/>
                <graph>
                    <node id="1"><data key="k1"><![CDATA[<raw & text>]]></data></node>
                </graph>
            </graphml>"#,
        );

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        let props = graph.vertex_properties(vertex).expect("props");
        assert_eq!(
            props,
            vec![(
                "snippet".to_string(),
                PropertyValue::String("<raw & text>".to_string())
            )]
        );
    }

    #[test]
    fn missing_node_id_is_an_error() {
        let mut graph = MemoryGraph::new();
        let result = read_graphml(&mut graph, r#"<graphml><graph><node/></graph></graphml>"#.as_bytes());
        assert!(matches!(result, Err(IngestError::MissingAttr("node@id"))));
    }

    #[test]
    fn missing_edge_endpoint_is_an_error() {
        let mut graph = MemoryGraph::new();
        let result = read_graphml(
            &mut graph,
            r#"<graphml><graph><edge id="e1" source="1"/></graph></graphml>"#.as_bytes(),
        );
        assert!(matches!(
            result,
            Err(IngestError::MissingAttr("edge@target"))
        ));
    }

    #[test]
    fn malformed_xml_propagates_from_the_tokenizer() {
        let mut graph = MemoryGraph::new();
        let result = read_graphml(
            &mut graph,
            r#"<graphml><graph><node id="1"></graph></graphml>"#.as_bytes(),
        );
        assert!(matches!(result, Err(IngestError::Xml(_))));
    }
}
