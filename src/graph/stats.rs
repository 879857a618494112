use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::types::{EdgeType, KnowledgeGraph, NodeType};

/// Per-kind counts for the legend. Kinds that do not occur are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
	/// Nodes per kind.
	pub node_counts: BTreeMap<NodeType, usize>,
	/// Edges per kind.
	pub edge_counts: BTreeMap<EdgeType, usize>,
	/// All nodes.
	pub total_nodes: usize,
	/// All edges.
	pub total_edges: usize,
}

impl GraphStats {
	/// Count for one node kind, zero when absent.
	pub fn nodes_of(&self, node_type: NodeType) -> usize {
		self.node_counts.get(&node_type).copied().unwrap_or(0)
	}

	/// Count for one edge kind, zero when absent.
	pub fn edges_of(&self, edge_type: EdgeType) -> usize {
		self.edge_counts.get(&edge_type).copied().unwrap_or(0)
	}
}

/// Counts nodes and edges by kind.
pub fn compute_stats(graph: &KnowledgeGraph) -> GraphStats {
	let mut stats = GraphStats {
		total_nodes: graph.nodes.len(),
		total_edges: graph.edges.len(),
		..GraphStats::default()
	};
	for node in &graph.nodes {
		*stats.node_counts.entry(node.node_type).or_default() += 1;
	}
	for edge in &graph.edges {
		*stats.edge_counts.entry(edge.edge_type).or_default() += 1;
	}
	stats
}

/// Node kinds present in the graph, in table order.
pub fn active_node_types(graph: &KnowledgeGraph) -> BTreeSet<NodeType> {
	graph.nodes.iter().map(|n| n.node_type).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::builder::assemble;
	use crate::graph::fixtures::{bookmark, note};

	#[test]
	fn counts_by_kind() {
		let graph = assemble(
			&[bookmark("b1", "2:255", 2), bookmark("b2", "2:256", 2)],
			&[note("n1", &["2:255"], &["patience", "prayer"])],
		);
		let stats = compute_stats(&graph);

		assert_eq!(stats.total_nodes, 5);
		assert_eq!(stats.total_edges, 4);
		assert_eq!(stats.nodes_of(NodeType::Verse), 2);
		assert_eq!(stats.nodes_of(NodeType::Theme), 2);
		assert_eq!(stats.edges_of(EdgeType::Thematic), 2);
		assert_eq!(stats.edges_of(EdgeType::SameSurah), 1);
		assert!(!stats.node_counts.contains_key(&NodeType::Concept));
	}

	#[test]
	fn order_does_not_matter() {
		let mut graph = assemble(
			&[bookmark("b1", "2:255", 2)],
			&[note("n1", &["2:255", "3:1"], &["patience"])],
		);
		let before = compute_stats(&graph);
		graph.nodes.reverse();
		graph.edges.reverse();
		assert_eq!(compute_stats(&graph), before);
	}

	#[test]
	fn empty_graph() {
		let stats = compute_stats(&KnowledgeGraph::default());
		assert_eq!(stats, GraphStats::default());
		assert!(active_node_types(&KnowledgeGraph::default()).is_empty());
	}

	#[test]
	fn serializes_kind_keys() {
		let graph = assemble(&[], &[note("n1", &[], &["patience"])]);
		let value = serde_json::to_value(compute_stats(&graph)).unwrap();
		assert_eq!(value["nodeCounts"]["theme"], 1);
		assert_eq!(value["edgeCounts"]["thematic"], 1);
	}
}
