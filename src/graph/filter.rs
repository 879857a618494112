//! Subgraph selection: tag reachability and node-type visibility.

use std::collections::{HashMap, HashSet, VecDeque};

use super::types::{KnowledgeGraph, NodeType, theme_node_id};

/// Every node id connected to `start`, treating edges as undirected.
/// Always contains `start` itself.
pub fn reachable_from<'a>(graph: &'a KnowledgeGraph, start: &'a str) -> HashSet<&'a str> {
	let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
	for edge in &graph.edges {
		let (src, tgt) = (edge.source_node_id.as_str(), edge.target_node_id.as_str());
		adjacency.entry(src).or_default().push(tgt);
		adjacency.entry(tgt).or_default().push(src);
	}

	let mut reachable = HashSet::from([start]);
	let mut queue = VecDeque::from([start]);
	while let Some(current) = queue.pop_front() {
		for &next in adjacency.get(current).into_iter().flatten() {
			if reachable.insert(next) {
				queue.push_back(next);
			}
		}
	}
	reachable
}

/// The connected component around `theme:<tag>`.
///
/// This is contextual expansion, not literal tag membership: verses linked
/// to the tag's notes, bookmarks sharing a surah with those verses, hadith
/// saved on the notes and so on are all kept. A tag with no theme node
/// yields an empty graph.
pub fn filter_by_tag(graph: &KnowledgeGraph, tag: &str) -> KnowledgeGraph {
	let theme_id = theme_node_id(tag);
	let reachable = reachable_from(graph, &theme_id);
	induced_subgraph(graph, |id| reachable.contains(id))
}

/// Keeps only nodes of the visible types, and the edges between them.
pub fn retain_node_types(graph: &KnowledgeGraph, visible: &HashSet<NodeType>) -> KnowledgeGraph {
	let kept: HashSet<&str> = graph
		.nodes
		.iter()
		.filter(|n| visible.contains(&n.node_type))
		.map(|n| n.id.as_str())
		.collect();
	induced_subgraph(graph, |id| kept.contains(id))
}

fn induced_subgraph(graph: &KnowledgeGraph, keep: impl Fn(&str) -> bool) -> KnowledgeGraph {
	KnowledgeGraph {
		nodes: graph
			.nodes
			.iter()
			.filter(|n| keep(&n.id))
			.cloned()
			.collect(),
		edges: graph
			.edges
			.iter()
			.filter(|e| keep(&e.source_node_id) && keep(&e.target_node_id))
			.cloned()
			.collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::builder::assemble;
	use crate::graph::fixtures::{bookmark, note};

	fn ids(graph: &KnowledgeGraph) -> HashSet<&str> {
		graph.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn traversal_ignores_edge_direction() {
		// the theme is only ever an edge target
		let graph = assemble(
			&[bookmark("b1", "2:255", 2), bookmark("b2", "2:1", 2)],
			&[note("n1", &["2:255"], &["patience"])],
		);
		let reached = reachable_from(&graph, "theme:patience");
		assert_eq!(
			reached,
			HashSet::from(["theme:patience", "note:n1", "verse:2:255", "verse:2:1"])
		);
	}

	#[test]
	fn tag_filter_drops_other_components() {
		let graph = assemble(
			&[],
			&[
				note("n1", &["1:1"], &["patience"]),
				note("n2", &["3:3"], &["gratitude"]),
			],
		);
		let filtered = filter_by_tag(&graph, "patience");
		assert_eq!(ids(&filtered), HashSet::from(["theme:patience", "note:n1", "verse:1:1"]));
		assert!(filtered
			.edges
			.iter()
			.all(|e| e.source_node_id == "note:n1"));
		assert_eq!(filtered.edges.len(), 2);
	}

	#[test]
	fn tag_filter_never_empty_when_tag_used() {
		let graph = assemble(&[], &[note("n1", &[], &["patience"])]);
		let filtered = filter_by_tag(&graph, "patience");
		assert!(filtered.node("theme:patience").is_some());
	}

	#[test]
	fn missing_theme_yields_empty_graph() {
		let graph = assemble(&[bookmark("b1", "2:255", 2)], &[]);
		assert!(filter_by_tag(&graph, "patience").is_empty());
	}

	#[test]
	fn hidden_types_take_their_edges_along() {
		let graph = assemble(
			&[bookmark("b1", "2:255", 2)],
			&[note("n1", &["2:255"], &["patience"])],
		);
		let visible = HashSet::from([NodeType::Verse, NodeType::Note]);
		let filtered = retain_node_types(&graph, &visible);
		assert_eq!(ids(&filtered), HashSet::from(["verse:2:255", "note:n1"]));
		assert_eq!(filtered.edges.len(), 1);
		assert_eq!(filtered.edges[0].id, "edge:ref:n1:2:255");
	}
}
