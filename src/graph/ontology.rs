//! Opt-in ontology enrichment on top of a built graph.
//!
//! Three tiers, run in order so that topic lookup (tier 4) also sees the
//! hadith added by tier 2:
//!
//! - tier 2: verse -> related hadith
//! - tier 3: verse -> Quranic concepts, plus concept <-> concept co-occurrence
//! - tier 4: hadith -> hadith topics
//!
//! Tier 1 (hadith saved on notes) is part of the base graph, see
//! [`assemble`](super::builder::assemble).
//!
//! Every tier is additive: an id already in the graph is never duplicated,
//! so enriching twice changes nothing.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::json;

use super::builder::{GraphAssembly, link};
use super::ports::{ConceptRef, OntologyTables};
use super::types::{
	EdgeType, GraphNode, KnowledgeGraph, Metadata, NodeType, concept_node_id, hadith_node_id,
	topic_node_id,
};

const HADITH_VERSE_WEIGHT: f64 = 0.8;
const CONCEPT_VERSE_WEIGHT: f64 = 0.7;
const CONCEPT_RELATED_WEIGHT: f64 = 0.5;
const HADITH_TOPIC_WEIGHT: f64 = 0.6;

/// Adds ontology tiers on top of a base graph. Running it twice adds nothing.
pub struct OntologyEnricher {
	tables: OntologyTables,
}

impl OntologyEnricher {
	/// Enricher over pre-fetched lookup tables.
	pub fn new(tables: OntologyTables) -> Self {
		Self { tables }
	}

	/// Runs every tier whose table was supplied.
	pub fn enrich(&self, graph: KnowledgeGraph) -> KnowledgeGraph {
		let mut graph = graph;
		match &self.tables.verse_hadiths {
			Some(table) => graph = enrich_hadiths(graph, table),
			None => debug!("ontology: no verse->hadith table, skipping hadith tier"),
		}
		match &self.tables.verse_concepts {
			Some(table) => graph = enrich_concepts(graph, table),
			None => debug!("ontology: no verse->concept table, skipping concept tier"),
		}
		match &self.tables.hadith_topics {
			Some(table) => graph = enrich_topics(graph, table),
			None => debug!("ontology: no hadith->topic table, skipping topic tier"),
		}
		graph
	}
}

fn ontology_node(id: String, node_type: NodeType, label: &str, created_at: DateTime<Utc>) -> GraphNode {
	GraphNode {
		id,
		node_type,
		label: label.to_owned(),
		verse_key: None,
		surah_id: None,
		metadata: Metadata::from([("ontology".to_owned(), json!(true))]),
		created_at,
	}
}

/// `(verse key, node id, created_at)` for every verse node in the graph.
fn verses(graph: &GraphAssembly) -> Vec<(String, String, DateTime<Utc>)> {
	graph
		.nodes()
		.iter()
		.filter(|n| n.node_type == NodeType::Verse)
		.filter_map(|n| Some((n.verse_key.clone()?, n.id.clone(), n.created_at)))
		.collect()
}

/// Tier 2: hadith related to the graph's verses.
pub fn enrich_hadiths(graph: KnowledgeGraph, verse_hadiths: &HashMap<String, Vec<String>>) -> KnowledgeGraph {
	let mut graph = GraphAssembly::from_graph(graph);
	let mut added = 0;
	for (key, verse_id, created_at) in verses(&graph) {
		for hadith_id in verse_hadiths.get(&key).into_iter().flatten() {
			let node_id = hadith_node_id(hadith_id);
			if graph.ensure_node(node_id.clone(), |id| {
				ontology_node(id, NodeType::Hadith, hadith_id, created_at)
			}) {
				added += 1;
			}
			graph.push_edge_once(link(
				format!("edge:hadith-verse:{hadith_id}:{key}"),
				&node_id,
				&verse_id,
				EdgeType::HadithVerse,
				HADITH_VERSE_WEIGHT,
				created_at,
			));
		}
	}
	debug!("ontology: hadith tier added {added} nodes");
	graph.finish()
}

/// Tier 3: concepts attached to the graph's verses, and links between
/// concepts that share at least one of those verses.
pub fn enrich_concepts(graph: KnowledgeGraph, verse_concepts: &HashMap<String, Vec<ConceptRef>>) -> KnowledgeGraph {
	let mut graph = GraphAssembly::from_graph(graph);
	// concept id -> verse keys it was seen on, in first-seen order
	let mut concepts: Vec<(&ConceptRef, HashSet<&str>)> = Vec::new();

	let verse_list = verses(&graph);
	for (key, verse_id, created_at) in &verse_list {
		for concept in verse_concepts.get(key).into_iter().flatten() {
			let node_id = concept_node_id(&concept.id);
			graph.ensure_node(node_id.clone(), |id| {
				let mut node = ontology_node(id, NodeType::Concept, &concept.id, *created_at);
				if let Some(definition) = &concept.definition {
					node.metadata.insert("definition".to_owned(), json!(definition));
				}
				node
			});
			graph.push_edge_once(link(
				format!("edge:concept-verse:{}:{key}", concept.id),
				&node_id,
				verse_id,
				EdgeType::ConceptVerse,
				CONCEPT_VERSE_WEIGHT,
				*created_at,
			));

			match concepts.iter_mut().find(|(c, _)| c.id == concept.id) {
				Some((_, seen_on)) => {
					seen_on.insert(key.as_str());
				}
				None => concepts.push((concept, HashSet::from([key.as_str()]))),
			}
		}
	}

	let mut related = 0;
	for (i, (a, a_verses)) in concepts.iter().enumerate() {
		for (b, b_verses) in &concepts[i + 1..] {
			if a_verses.is_disjoint(b_verses) {
				continue;
			}
			let (a_id, b_id) = (concept_node_id(&a.id), concept_node_id(&b.id));
			let created_at = match (graph.node(&a_id), graph.node(&b_id)) {
				(Some(x), Some(y)) => x.created_at.max(y.created_at),
				_ => continue,
			};
			if graph.push_edge_once(link(
				format!("edge:concept-related:{}:{}", a.id, b.id),
				&a_id,
				&b_id,
				EdgeType::ConceptRelated,
				CONCEPT_RELATED_WEIGHT,
				created_at,
			)) {
				related += 1;
			}
		}
	}
	debug!(
		"ontology: concept tier saw {} concepts, {related} co-occurrence links",
		concepts.len()
	);
	graph.finish()
}

/// Tier 4: topics of every hadith in the graph, whichever tier added it.
pub fn enrich_topics(graph: KnowledgeGraph, hadith_topics: &HashMap<String, Vec<String>>) -> KnowledgeGraph {
	let mut graph = GraphAssembly::from_graph(graph);
	let hadiths: Vec<(String, String, DateTime<Utc>)> = graph
		.nodes()
		.iter()
		.filter(|n| n.node_type == NodeType::Hadith)
		.filter_map(|n| {
			let hadith_id = n.id.strip_prefix("hadith:")?;
			Some((hadith_id.to_owned(), n.id.clone(), n.created_at))
		})
		.collect();

	let mut added = 0;
	for (hadith_id, hadith_node, created_at) in hadiths {
		for topic in hadith_topics.get(&hadith_id).into_iter().flatten() {
			let node_id = topic_node_id(topic);
			if graph.ensure_node(node_id.clone(), |id| {
				ontology_node(id, NodeType::HadithTopic, topic, created_at)
			}) {
				added += 1;
			}
			graph.push_edge_once(link(
				format!("edge:hadith-topic:{hadith_id}:{topic}"),
				&hadith_node,
				&node_id,
				EdgeType::HadithTopicLink,
				HADITH_TOPIC_WEIGHT,
				created_at,
			));
		}
	}
	debug!("ontology: topic tier added {added} nodes");
	graph.finish()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::builder::assemble;
	use crate::graph::fixtures::{bookmark, hadith_resource, note};

	fn table<V: Clone>(entries: &[(&str, V)]) -> HashMap<String, V> {
		entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
	}

	fn strings(items: &[&str]) -> Vec<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	fn base() -> KnowledgeGraph {
		assemble(
			&[bookmark("b1", "2:255", 2), bookmark("b2", "2:256", 2)],
			&[],
		)
	}

	#[test]
	fn missing_tables_skip_every_tier() {
		let graph = base();
		let enriched = OntologyEnricher::new(OntologyTables::default()).enrich(graph.clone());
		assert_eq!(enriched, graph);
	}

	#[test]
	fn empty_table_runs_tier_and_adds_nothing() {
		let graph = base();
		let tables = OntologyTables::default().with_verse_hadiths(HashMap::new());
		assert_eq!(OntologyEnricher::new(tables).enrich(graph.clone()), graph);
	}

	#[test]
	fn hadith_tier_links_verses() {
		let tables = OntologyTables::default().with_verse_hadiths(table(&[
			("2:255", strings(&["SB-HD0001", "SB-HD0002"])),
			("2:256", strings(&["SB-HD0001"])),
			("9:9", strings(&["SB-HD0099"])),
		]));
		let graph = OntologyEnricher::new(tables).enrich(base());

		assert_eq!(graph.nodes_of_type(NodeType::Hadith).count(), 2);
		assert_eq!(graph.edges_of_type(EdgeType::HadithVerse).count(), 3);
		let hadith = graph.node("hadith:SB-HD0001").unwrap();
		assert_eq!(hadith.metadata.get("ontology"), Some(&json!(true)));
		let edge = graph
			.edges
			.iter()
			.find(|e| e.id == "edge:hadith-verse:SB-HD0002:2:255")
			.unwrap();
		assert_eq!(edge.source_node_id, "hadith:SB-HD0002");
		assert_eq!(edge.target_node_id, "verse:2:255");
		assert_eq!(edge.weight, 0.8);
	}

	#[test]
	fn existing_hadith_nodes_are_reused() {
		let mut n = note("n1", &["2:255"], &[]);
		n.linked_resources = vec![hadith_resource("Bukhari #1", &[("hadithId", "SB-HD0001")])];
		let graph = assemble(&[], &[n]);
		let tables = OntologyTables::default()
			.with_verse_hadiths(table(&[("2:255", strings(&["SB-HD0001"]))]));
		let graph = OntologyEnricher::new(tables).enrich(graph);

		let hadiths: Vec<_> = graph.nodes_of_type(NodeType::Hadith).collect();
		assert_eq!(hadiths.len(), 1);
		// the tier-1 node wins
		assert_eq!(hadiths[0].label, "Bukhari #1");
		assert_eq!(graph.edges_of_type(EdgeType::HadithVerse).count(), 1);
	}

	#[test]
	fn concepts_link_on_shared_verses() {
		let tables = OntologyTables::default().with_verse_concepts(table(&[
			("2:255", vec![ConceptRef::new("allah"), ConceptRef::new("throne")]),
			("2:256", vec![ConceptRef::new("allah"), ConceptRef::new("religion")]),
		]));
		let graph = OntologyEnricher::new(tables).enrich(base());

		assert_eq!(graph.nodes_of_type(NodeType::Concept).count(), 3);
		assert_eq!(graph.edges_of_type(EdgeType::ConceptVerse).count(), 4);
		let related: HashSet<&str> = graph
			.edges_of_type(EdgeType::ConceptRelated)
			.map(|e| e.id.as_str())
			.collect();
		// throne and religion never share a verse
		assert_eq!(
			related,
			HashSet::from([
				"edge:concept-related:allah:throne",
				"edge:concept-related:allah:religion",
			])
		);
	}

	#[test]
	fn topics_cover_both_hadith_tiers() {
		let mut n = note("n1", &["2:255"], &[]);
		n.linked_resources = vec![hadith_resource("Muslim #8", &[("hadithId", "SM-HD0008")])];
		let graph = assemble(&[], &[n]);
		let tables = OntologyTables::default()
			.with_verse_hadiths(table(&[("2:255", strings(&["SB-HD0001"]))]))
			.with_hadith_topics(table(&[
				("SM-HD0008", strings(&["faith"])),
				("SB-HD0001", strings(&["faith", "prayer"])),
			]));
		let graph = OntologyEnricher::new(tables).enrich(graph);

		assert_eq!(graph.nodes_of_type(NodeType::HadithTopic).count(), 2);
		assert_eq!(graph.edges_of_type(EdgeType::HadithTopicLink).count(), 3);
		assert!(graph.node("hadith-topic:faith").is_some());
	}

	#[test]
	fn enrichment_is_idempotent() {
		let tables = OntologyTables::default()
			.with_verse_hadiths(table(&[("2:255", strings(&["SB-HD0001"]))]))
			.with_verse_concepts(table(&[(
				"2:255",
				vec![ConceptRef::new("allah"), ConceptRef::new("throne")],
			)]))
			.with_hadith_topics(table(&[("SB-HD0001", strings(&["faith"]))]));
		let enricher = OntologyEnricher::new(tables);
		let once = enricher.enrich(base());
		let twice = enricher.enrich(once.clone());
		assert_eq!(once, twice);
	}
}
