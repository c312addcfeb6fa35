//! # Property-Based Tests
//!
//! proptest suites for the resolution and coercion invariants.

use engraft_core::{MemoryGraph, PropertyGraph, PropertyValue, read_graphml};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn load(xml: &str) -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    read_graphml(&mut graph, xml.as_bytes()).expect("ingest");
    graph
}

fn external_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

proptest! {
    /// Every external id maps to exactly one vertex, no matter how often it
    /// is declared.
    #[test]
    fn duplicate_node_declarations_resolve_once(
        ids in btree_set(external_id(), 1..20)
    ) {
        let mut doc = String::from("<graphml><graph>");
        for id in &ids {
            doc.push_str(&format!("<node id=\"{id}\"/>"));
        }
        // Declare the whole set a second time
        for id in &ids {
            doc.push_str(&format!("<node id=\"{id}\"/>"));
        }
        doc.push_str("</graph></graphml>");

        let graph = load(&doc);
        prop_assert_eq!(graph.vertex_count().expect("count"), ids.len());
    }

    /// A graph built from edges alone is isomorphic to one with every
    /// endpoint declared up front.
    #[test]
    fn edge_only_documents_are_order_independent(
        pairs in vec((external_id(), external_id()), 1..20)
    ) {
        let mut edges_only = String::from("<graphml><graph>");
        for (i, (source, target)) in pairs.iter().enumerate() {
            edges_only.push_str(&format!(
                "<edge id=\"e{i}\" source=\"{source}\" target=\"{target}\"/>"
            ));
        }
        edges_only.push_str("</graph></graphml>");

        let mut declared_first = String::from("<graphml><graph>");
        let endpoints: BTreeSet<&String> =
            pairs.iter().flat_map(|(s, t)| [s, t]).collect();
        for id in &endpoints {
            declared_first.push_str(&format!("<node id=\"{id}\"/>"));
        }
        for (i, (source, target)) in pairs.iter().enumerate() {
            declared_first.push_str(&format!(
                "<edge id=\"e{i}\" source=\"{source}\" target=\"{target}\"/>"
            ));
        }
        declared_first.push_str("</graph></graphml>");

        let implicit = load(&edges_only);
        let explicit = load(&declared_first);

        prop_assert_eq!(
            implicit.vertex_count().expect("count"),
            explicit.vertex_count().expect("count")
        );
        prop_assert_eq!(implicit.vertex_count().expect("count"), endpoints.len());
        prop_assert_eq!(
            implicit.edge_count().expect("count"),
            explicit.edge_count().expect("count")
        );

        // Edge n connects the same external ids in both graphs
        for (implicit_edge, explicit_edge) in implicit.edges().zip(explicit.edges()) {
            let implicit_from = implicit.vertex(implicit_edge.from).expect("fetch").expect("present");
            let explicit_from = explicit.vertex(explicit_edge.from).expect("fetch").expect("present");
            prop_assert_eq!(implicit_from.hint, explicit_from.hint);

            let implicit_to = implicit.vertex(implicit_edge.to).expect("fetch").expect("present");
            let explicit_to = explicit.vertex(explicit_edge.to).expect("fetch").expect("present");
            prop_assert_eq!(implicit_to.hint, explicit_to.hint);
        }
    }

    /// A declared-int literal comes back as the integer it denotes.
    #[test]
    fn int_literals_round_trip(value in any::<i32>()) {
        let graph = load(&format!(
            r#"<graphml>
                <key id="k" attr.name="n" attr.type="int"/>
                <graph><node id="1"><data key="k">{value}</data></node></graph>
            </graphml>"#
        ));

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        let props = graph.vertex_properties(vertex).expect("props");
        prop_assert_eq!(props, vec![("n".to_string(), PropertyValue::Int(value))]);
    }

    /// A declared-long literal comes back as the integer it denotes.
    #[test]
    fn long_literals_round_trip(value in any::<i64>()) {
        let graph = load(&format!(
            r#"<graphml>
                <key id="k" attr.name="n" attr.type="long"/>
                <graph><node id="1"><data key="k">{value}</data></node></graph>
            </graphml>"#
        ));

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        let props = graph.vertex_properties(vertex).expect("props");
        prop_assert_eq!(props, vec![("n".to_string(), PropertyValue::Long(value))]);
    }

    /// A declared-double literal parses to the value its text denotes.
    #[test]
    fn double_literals_round_trip(value in -1.0e12f64..1.0e12f64) {
        let graph = load(&format!(
            r#"<graphml>
                <key id="k" attr.name="x" attr.type="double"/>
                <graph><node id="1"><data key="k">{value}</data></node></graph>
            </graphml>"#
        ));

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        let props = graph.vertex_properties(vertex).expect("props");
        prop_assert_eq!(props, vec![("x".to_string(), PropertyValue::Double(value))]);
    }

    /// A declared-boolean literal comes back as the boolean it denotes.
    #[test]
    fn boolean_literals_round_trip(value in any::<bool>()) {
        let graph = load(&format!(
            r#"<graphml>
                <key id="k" attr.name="b" attr.type="boolean"/>
                <graph><node id="1"><data key="k">{value}</data></node></graph>
            </graphml>"#
        ));

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        let props = graph.vertex_properties(vertex).expect("props");
        prop_assert_eq!(props, vec![("b".to_string(), PropertyValue::Boolean(value))]);
    }

    /// String-typed values pass through byte for byte.
    #[test]
    fn string_values_pass_through(value in "[a-zA-Z0-9 ,.-]{0,32}") {
        let graph = load(&format!(
            r#"<graphml>
                <key id="k" attr.name="s" attr.type="string"/>
                <graph><node id="1"><data key="k">{value}</data></node></graph>
            </graphml>"#
        ));

        let vertex = graph.vertex_by_hint("1").expect("vertex").id;
        let props = graph.vertex_properties(vertex).expect("props");
        prop_assert_eq!(
            props,
            vec![("s".to_string(), PropertyValue::String(value))]
        );
    }
}
