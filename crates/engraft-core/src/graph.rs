//! # Graph Store Contract
//!
//! The mutation surface the ingestion engine drives, plus an in-memory
//! reference implementation.
//!
//! The engine does not own a storage engine. It talks to any store through
//! `PropertyGraph`: create a vertex for an external id hint, fetch a vertex
//! by store id, create a labeled edge, set typed properties. Stores with
//! transactional semantics additionally expose `TransactionControl` through
//! the `transactions()` capability hook; stores without it leave the hook at
//! its `None` default and ingestion runs untransacted.
//!
//! All fallible operations return `Result<T, StoreError>` so in-memory and
//! persistent backends are driven uniformly.

use crate::types::{
    Edge, EdgeId, PropertyValue, StoreError, TransactionMode, TransactionOutcome, Vertex, VertexId,
};
use std::collections::BTreeMap;

// =============================================================================
// PROPERTYGRAPH TRAIT
// =============================================================================

/// The mutation contract consumed by ingestion.
///
/// Handles are plain store ids; element state lives in the store and is
/// addressed per call, so no stale element object can outlive a mutation.
pub trait PropertyGraph {
    /// Create a vertex. `id_hint` is the external id from the document; the
    /// store assigns the returned id independently of the hint.
    fn add_vertex(&mut self, id_hint: &str) -> Result<VertexId, StoreError>;

    /// Fetch a vertex by store id. `Ok(None)` means the store no longer
    /// knows the id.
    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>, StoreError>;

    /// Create a directed edge from `from` to `to` with the given label.
    /// Both endpoints must exist.
    fn add_edge(
        &mut self,
        id_hint: &str,
        from: VertexId,
        to: VertexId,
        label: &str,
    ) -> Result<EdgeId, StoreError>;

    /// Fetch an edge by store id.
    fn edge(&self, id: EdgeId) -> Result<Option<Edge>, StoreError>;

    /// Set a vertex property. Setting an existing name overwrites its value.
    fn set_vertex_property(
        &mut self,
        vertex: VertexId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError>;

    /// Set an edge property. Setting an existing name overwrites its value.
    fn set_edge_property(
        &mut self,
        edge: EdgeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError>;

    /// Total number of vertices.
    fn vertex_count(&self) -> Result<usize, StoreError>;

    /// Total number of edges.
    fn edge_count(&self) -> Result<usize, StoreError>;

    /// All properties of a vertex, in name order.
    fn vertex_properties(
        &self,
        vertex: VertexId,
    ) -> Result<Vec<(String, PropertyValue)>, StoreError>;

    /// All properties of an edge, in name order.
    fn edge_properties(&self, edge: EdgeId) -> Result<Vec<(String, PropertyValue)>, StoreError>;

    /// The store's transactional capability, if it has one.
    ///
    /// The default is `None`: mutations apply immediately and ingestion
    /// performs no transaction management.
    fn transactions(&mut self) -> Option<&mut dyn TransactionControl> {
        None
    }
}

// =============================================================================
// TRANSACTIONCONTROL TRAIT
// =============================================================================

/// Manual transaction control for stores that support it.
///
/// Ingestion forces the store into `Manual` mode for the duration of a
/// parse, commits in bounded windows, and restores the prior mode at stream
/// end.
pub trait TransactionControl {
    /// The current commit mode.
    fn transaction_mode(&self) -> TransactionMode;

    /// Switch commit mode. Switching to `Automatic` with a window still
    /// open commits that window.
    fn set_transaction_mode(&mut self, mode: TransactionMode) -> Result<(), StoreError>;

    /// Open a transaction window.
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Close the open window, persisting it on `Success` and discarding it
    /// on `Failure`.
    fn commit(&mut self, outcome: TransactionOutcome) -> Result<(), StoreError>;
}

// =============================================================================
// IN-MEMORY IMPLEMENTATION
// =============================================================================

/// An in-memory property graph.
///
/// Uses `BTreeMap` exclusively for deterministic ordering. Ids are assigned
/// sequentially. Non-transactional: `transactions()` stays `None`.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    /// Vertex storage: VertexId -> Vertex
    vertices: BTreeMap<VertexId, Vertex>,

    /// Edge storage: EdgeId -> Edge
    edges: BTreeMap<EdgeId, Edge>,

    /// Vertex properties: VertexId -> name -> value
    vertex_properties: BTreeMap<VertexId, BTreeMap<String, PropertyValue>>,

    /// Edge properties: EdgeId -> name -> value
    edge_properties: BTreeMap<EdgeId, BTreeMap<String, PropertyValue>>,

    /// Next available VertexId
    next_vertex_id: u64,

    /// Next available EdgeId
    next_edge_id: u64,
}

impl MemoryGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All vertices in deterministic order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// All edges in deterministic order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Find a vertex by the external id it was created under.
    #[must_use]
    pub fn vertex_by_hint(&self, hint: &str) -> Option<&Vertex> {
        self.vertices.values().find(|v| v.hint == hint)
    }

    /// Find an edge by the external id it was created under.
    #[must_use]
    pub fn edge_by_hint(&self, hint: &str) -> Option<&Edge> {
        self.edges.values().find(|e| e.hint == hint)
    }
}

impl PropertyGraph for MemoryGraph {
    fn add_vertex(&mut self, id_hint: &str) -> Result<VertexId, StoreError> {
        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id = self.next_vertex_id.saturating_add(1);
        self.vertices.insert(id, Vertex::new(id, id_hint));
        Ok(id)
    }

    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>, StoreError> {
        Ok(self.vertices.get(&id).cloned())
    }

    fn add_edge(
        &mut self,
        id_hint: &str,
        from: VertexId,
        to: VertexId,
        label: &str,
    ) -> Result<EdgeId, StoreError> {
        if !self.vertices.contains_key(&from) {
            return Err(StoreError::VertexNotFound(from));
        }
        if !self.vertices.contains_key(&to) {
            return Err(StoreError::VertexNotFound(to));
        }
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id = self.next_edge_id.saturating_add(1);
        self.edges.insert(id, Edge::new(id, id_hint, label, from, to));
        Ok(id)
    }

    fn edge(&self, id: EdgeId) -> Result<Option<Edge>, StoreError> {
        Ok(self.edges.get(&id).cloned())
    }

    fn set_vertex_property(
        &mut self,
        vertex: VertexId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        if !self.vertices.contains_key(&vertex) {
            return Err(StoreError::VertexNotFound(vertex));
        }
        self.vertex_properties
            .entry(vertex)
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    fn set_edge_property(
        &mut self,
        edge: EdgeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        if !self.edges.contains_key(&edge) {
            return Err(StoreError::EdgeNotFound(edge));
        }
        self.edge_properties
            .entry(edge)
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    fn vertex_count(&self) -> Result<usize, StoreError> {
        Ok(self.vertices.len())
    }

    fn edge_count(&self) -> Result<usize, StoreError> {
        Ok(self.edges.len())
    }

    fn vertex_properties(
        &self,
        vertex: VertexId,
    ) -> Result<Vec<(String, PropertyValue)>, StoreError> {
        if !self.vertices.contains_key(&vertex) {
            return Err(StoreError::VertexNotFound(vertex));
        }
        Ok(self
            .vertex_properties
            .get(&vertex)
            .into_iter()
            .flat_map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect())
    }

    fn edge_properties(&self, edge: EdgeId) -> Result<Vec<(String, PropertyValue)>, StoreError> {
        if !self.edges.contains_key(&edge) {
            return Err(StoreError::EdgeNotFound(edge));
        }
        Ok(self
            .edge_properties
            .get(&edge)
            .into_iter()
            .flat_map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_fetch_vertex() {
        let mut graph = MemoryGraph::new();
        let id = graph.add_vertex("a").expect("add");

        let vertex = graph.vertex(id).expect("fetch");
        assert_eq!(vertex.map(|v| v.hint), Some("a".to_string()));
        assert_eq!(graph.vertex_count().expect("count"), 1);
    }

    #[test]
    fn vertex_ids_are_sequential_and_distinct() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex("a").expect("add");
        let b = graph.add_vertex("b").expect("add");

        assert_ne!(a, b);
        assert_eq!(graph.vertex_count().expect("count"), 2);
    }

    #[test]
    fn same_hint_creates_distinct_vertices() {
        // Deduplication by external id is the reader's job, not the store's.
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex("x").expect("add");
        let b = graph.add_vertex("x").expect("add");

        assert_ne!(a, b);
        assert_eq!(graph.vertex_count().expect("count"), 2);
    }

    #[test]
    fn add_edge_links_existing_vertices() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex("a").expect("add");
        let b = graph.add_vertex("b").expect("add");

        let e = graph.add_edge("e1", a, b, "knows").expect("edge");

        let edge = graph.edge(e).expect("fetch").expect("present");
        assert_eq!(edge.label, "knows");
        assert_eq!(edge.from, a);
        assert_eq!(edge.to, b);
        assert_eq!(graph.edge_count().expect("count"), 1);
    }

    #[test]
    fn add_edge_rejects_dangling_endpoint() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex("a").expect("add");
        let dangling = VertexId(999);

        let result = graph.add_edge("e1", a, dangling, "knows");
        assert!(matches!(result, Err(StoreError::VertexNotFound(id)) if id == dangling));
        assert_eq!(graph.edge_count().expect("count"), 0);
    }

    #[test]
    fn set_property_overwrites() {
        let mut graph = MemoryGraph::new();
        let v = graph.add_vertex("a").expect("add");

        graph
            .set_vertex_property(v, "age", PropertyValue::Int(29))
            .expect("set");
        graph
            .set_vertex_property(v, "age", PropertyValue::Int(30))
            .expect("set");

        let props = graph.vertex_properties(v).expect("props");
        assert_eq!(props, vec![("age".to_string(), PropertyValue::Int(30))]);
    }

    #[test]
    fn properties_listed_in_name_order() {
        let mut graph = MemoryGraph::new();
        let v = graph.add_vertex("a").expect("add");

        graph
            .set_vertex_property(v, "zeta", PropertyValue::Boolean(true))
            .expect("set");
        graph
            .set_vertex_property(v, "alpha", PropertyValue::Long(1))
            .expect("set");

        let names: Vec<_> = graph
            .vertex_properties(v)
            .expect("props")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn set_property_on_missing_vertex_fails() {
        let mut graph = MemoryGraph::new();
        let result =
            graph.set_vertex_property(VertexId(7), "name", PropertyValue::String("x".into()));
        assert!(result.is_err());
    }

    #[test]
    fn edge_properties_round_trip() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex("a").expect("add");
        let b = graph.add_vertex("b").expect("add");
        let e = graph.add_edge("e1", a, b, "rated").expect("edge");

        graph
            .set_edge_property(e, "stars", PropertyValue::Double(4.5))
            .expect("set");

        let props = graph.edge_properties(e).expect("props");
        assert_eq!(
            props,
            vec![("stars".to_string(), PropertyValue::Double(4.5))]
        );
    }

    #[test]
    fn lookup_by_hint() {
        let mut graph = MemoryGraph::new();
        graph.add_vertex("alice").expect("add");
        graph.add_vertex("bob").expect("add");

        assert!(graph.vertex_by_hint("alice").is_some());
        assert!(graph.vertex_by_hint("carol").is_none());
    }

    #[test]
    fn memory_graph_is_not_transactional() {
        let mut graph = MemoryGraph::new();
        assert!(graph.transactions().is_none());
    }
}
