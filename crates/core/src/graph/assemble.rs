//! Graph assembly: nodes and edges ready for a renderer.

use serde::{Deserialize, Serialize};

use crate::graph::aggregate::{
    aggregate, CompartmentAttribution, Edge, EdgeLabel, PairAttribution, RegionAttribution,
};
use crate::graph::catalog::RegionCatalog;
use crate::graph::resolver::{ContainmentResolver, OverlapPolicy};
use crate::model::Capability;

/// Fill colours and rank hints per node category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStyle {
    /// Fill for pseudo regions and negative compartments.
    pub pseudo_fill: String,
    /// Fill for file-backed regions and real compartments.
    pub region_fill: String,
    /// Fill for the second side of a library-pair graph.
    pub pair_fill: String,
    pub pseudo_rank: String,
    pub region_rank: String,
    pub font: String,
    pub font_size: String,
    pub rankdir: String,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            pseudo_fill: "lightgrey".into(),
            region_fill: "lightblue".into(),
            pair_fill: "pink".into(),
            pseudo_rank: "source".into(),
            region_rank: "max".into(),
            font: "Courier".into(),
            font_size: "10".into(),
            rankdir: "TB".into(),
        }
    }
}

/// Which aggregation produced a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Regions,
    Compartments,
    Pair,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub fill_color: String,
    pub rank: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: String,
    pub dest: String,
    pub label: String,
    pub weight: f64,
}

impl GraphEdge {
    /// Weight formatted for Graphviz `penwidth`.
    pub fn penwidth(&self) -> String {
        self.weight.to_string()
    }
}

/// Renderer-facing node and edge lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub kind: GraphKind,
    pub nodes: Vec<Node>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

fn to_graph_edges<K>(edges: Vec<Edge<K>>, id: impl Fn(&K) -> String) -> Vec<GraphEdge> {
    edges
        .into_iter()
        .map(|e| GraphEdge { src: id(&e.src), dest: id(&e.dest), label: e.label, weight: e.weight })
        .collect()
}

/// One node per logical region.
pub fn region_graph(
    catalog: &RegionCatalog,
    caps: &[Capability],
    policy: OverlapPolicy,
    label: EdgeLabel,
    style: &GraphStyle,
) -> Graph {
    let nodes = catalog
        .regions()
        .iter()
        .map(|region| {
            let label = region.id.display_label();
            let (fill, rank) = if region.id.is_pseudo() {
                (&style.pseudo_fill, &style.pseudo_rank)
            } else {
                (&style.region_fill, &style.region_rank)
            };
            Node { id: label.clone(), label, fill_color: fill.clone(), rank: rank.clone() }
        })
        .collect();

    let resolver = ContainmentResolver::new(catalog);
    let attribution = RegionAttribution::new(&resolver, policy);
    let edges = aggregate(&attribution, label, caps);

    Graph {
        kind: GraphKind::Regions,
        nodes,
        edges: to_graph_edges(edges, |id| id.display_label()),
    }
}

/// One node per compartment id.
pub fn compartment_graph(
    catalog: &RegionCatalog,
    caps: &[Capability],
    policy: OverlapPolicy,
    label: EdgeLabel,
    style: &GraphStyle,
) -> Graph {
    let nodes = catalog
        .compartments()
        .iter()
        .map(|(id, paths)| {
            let (fill, rank) = if *id < 0 {
                (&style.pseudo_fill, &style.pseudo_rank)
            } else {
                (&style.region_fill, &style.region_rank)
            };
            Node {
                id: id.to_string(),
                label: format!("{}: {}", id, paths.join(", ")),
                fill_color: fill.clone(),
                rank: rank.clone(),
            }
        })
        .collect();

    let resolver = ContainmentResolver::new(catalog);
    let attribution = CompartmentAttribution::new(&resolver, policy);
    let edges = aggregate(&attribution, label, caps);

    Graph {
        kind: GraphKind::Compartments,
        nodes,
        edges: to_graph_edges(edges, |id| id.to_string()),
    }
}

/// Capabilities flowing between two libraries selected by path pattern.
pub fn pair_graph(
    catalog: &RegionCatalog,
    caps: &[Capability],
    first: &str,
    second: &str,
    policy: OverlapPolicy,
    label: EdgeLabel,
    style: &GraphStyle,
) -> Graph {
    let nodes = vec![
        Node {
            id: first.to_string(),
            label: first.to_string(),
            fill_color: style.region_fill.clone(),
            rank: style.region_rank.clone(),
        },
        Node {
            id: second.to_string(),
            label: second.to_string(),
            fill_color: style.pair_fill.clone(),
            rank: style.region_rank.clone(),
        },
    ];

    let resolver = ContainmentResolver::new(catalog);
    let attribution = PairAttribution::new(&resolver, first, second, policy);
    let edges = aggregate(&attribution, label, caps);

    Graph { kind: GraphKind::Pair, nodes, edges: to_graph_edges(edges, |id| id.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, MemoryMapEntry};

    #[test]
    fn penwidth_uses_shortest_decimal() {
        let edge = GraphEdge { src: "a".into(), dest: "b".into(), label: "rw".into(), weight: 1.0 };
        assert_eq!(edge.penwidth(), "1");
        let edge = GraphEdge { weight: 11f64.log10(), ..edge };
        assert!(edge.penwidth().starts_with("1.0413"));
    }

    #[test]
    fn region_nodes_are_styled_by_category() {
        let entries = vec![
            MemoryMapEntry::new("Stack", Address(0x7000), Address(0x7fff)),
            MemoryMapEntry::new("/bin/app", Address(0x1000), Address(0x1fff)),
        ];
        let catalog = RegionCatalog::from_entries(&entries);
        let style = GraphStyle::default();
        let graph = region_graph(&catalog, &[], OverlapPolicy::All, EdgeLabel::Permissions, &style);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "Stack (0x7000)");
        assert_eq!(graph.nodes[0].fill_color, "lightgrey");
        assert_eq!(graph.nodes[0].rank, "source");
        assert_eq!(graph.nodes[1].id, "/bin/app");
        assert_eq!(graph.nodes[1].fill_color, "lightblue");
        assert_eq!(graph.nodes[1].rank, "max");
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn compartment_nodes_list_their_paths() {
        let entries = vec![
            MemoryMapEntry::new("Stack", Address(0x7000), Address(0x7fff)).with_compartment(Some(-1)),
            MemoryMapEntry::new("libB", Address(0x2000), Address(0x2fff)).with_compartment(Some(2)),
            MemoryMapEntry::new("libB.got", Address(0x3000), Address(0x30ff))
                .with_compartment(Some(2)),
        ];
        let catalog = RegionCatalog::from_entries(&entries);
        let style = GraphStyle::default();
        let graph =
            compartment_graph(&catalog, &[], OverlapPolicy::All, EdgeLabel::Permissions, &style);
        let labels: Vec<_> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["-1: Stack", "2: libB, libB.got"]);
        assert_eq!(graph.nodes[0].fill_color, "lightgrey");
        assert_eq!(graph.nodes[1].rank, "max");
    }
}
