use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form per-node metadata. Empty means "no metadata".
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Kind of entity a graph node stands for.
///
/// The declaration order is the row order of the per-kind lookup tables in
/// `layout::constants`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
	/// A Quran verse, bookmarked or referenced by a note.
	Verse,
	/// A user note.
	Note,
	/// A note tag.
	Theme,
	/// A hadith, linked from a note or from the ontology.
	Hadith,
	/// A Quranic concept from the ontology.
	Concept,
	/// A topic a hadith is classified under.
	HadithTopic,
	/// Reserved; bookmarks are folded into verse nodes.
	Bookmark,
	/// Reserved for whole-surah nodes.
	Surah,
}

impl NodeType {
	/// Number of node kinds.
	pub const COUNT: usize = 8;
	/// Every kind, in declaration order.
	pub const ALL: [NodeType; Self::COUNT] = [
		Self::Verse,
		Self::Note,
		Self::Theme,
		Self::Hadith,
		Self::Concept,
		Self::HadithTopic,
		Self::Bookmark,
		Self::Surah,
	];

	/// Wire name, as serialized.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Verse => "verse",
			Self::Note => "note",
			Self::Theme => "theme",
			Self::Hadith => "hadith",
			Self::Concept => "concept",
			Self::HadithTopic => "hadith-topic",
			Self::Bookmark => "bookmark",
			Self::Surah => "surah",
		}
	}
}

impl fmt::Display for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Relationship a graph edge represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
	/// Note to a verse it cites.
	References,
	/// Note to one of its tags.
	Thematic,
	/// Two bookmarked verses of one surah.
	SameSurah,
	/// Note to a hadith saved with it.
	NoteHadith,
	/// Hadith to a verse it relates to.
	HadithVerse,
	/// Concept to a verse that mentions it.
	ConceptVerse,
	/// Two concepts sharing a verse.
	ConceptRelated,
	/// Hadith to its topic.
	HadithTopicLink,
	/// Drawn by hand; never produced by the builder.
	UserLinked,
}

impl EdgeType {
	/// Number of edge kinds.
	pub const COUNT: usize = 9;
	/// Every kind, in declaration order.
	pub const ALL: [EdgeType; Self::COUNT] = [
		Self::References,
		Self::Thematic,
		Self::SameSurah,
		Self::NoteHadith,
		Self::HadithVerse,
		Self::ConceptVerse,
		Self::ConceptRelated,
		Self::HadithTopicLink,
		Self::UserLinked,
	];

	/// Wire name, as serialized.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::References => "references",
			Self::Thematic => "thematic",
			Self::SameSurah => "same-surah",
			Self::NoteHadith => "note-hadith",
			Self::HadithVerse => "hadith-verse",
			Self::ConceptVerse => "concept-verse",
			Self::ConceptRelated => "concept-related",
			Self::HadithTopicLink => "hadith-topic-link",
			Self::UserLinked => "user-linked",
		}
	}
}

impl fmt::Display for EdgeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A node of the knowledge graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	/// Content-derived id, e.g. `verse:2:255`. Doubles as the dedup key.
	pub id: String,
	/// Kind of entity.
	pub node_type: NodeType,
	/// Display text.
	pub label: String,
	/// `surah:verse` key, for verse nodes and notes that cite one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub verse_key: Option<String>,
	/// Surah the node belongs to, when known.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub surah_id: Option<u32>,
	/// Source-specific extras such as the bookmark id or note tags.
	#[serde(default, skip_serializing_if = "Metadata::is_empty")]
	pub metadata: Metadata,
	/// Timestamp of the record the node was derived from.
	pub created_at: DateTime<Utc>,
}

/// A directed relationship between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
	/// Deterministic id; duplicates are dropped on insert.
	pub id: String,
	/// Id of the source node.
	pub source_node_id: String,
	/// Id of the target node.
	pub target_node_id: String,
	/// Kind of relationship.
	pub edge_type: EdgeType,
	/// Construction intent, only used as a layout/visual hint.
	pub weight: f64,
	/// Timestamp of the newest record the edge was derived from.
	pub created_at: DateTime<Utc>,
}

/// Nodes and edges, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
	/// Nodes, unique by id.
	pub nodes: Vec<GraphNode>,
	/// Edges, unique by id.
	pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
	/// No nodes and no edges.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	/// Looks a node up by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Nodes of one kind.
	pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &GraphNode> {
		self.nodes.iter().filter(move |n| n.node_type == node_type)
	}

	/// Edges of one kind.
	pub fn edges_of_type(&self, edge_type: EdgeType) -> impl Iterator<Item = &GraphEdge> {
		self.edges.iter().filter(move |e| e.edge_type == edge_type)
	}
}

/// `verse:<key>`
pub fn verse_node_id(verse_key: &str) -> String {
	format!("verse:{verse_key}")
}

/// `note:<id>`
pub fn note_node_id(note_id: &str) -> String {
	format!("note:{note_id}")
}

/// `theme:<tag>`
pub fn theme_node_id(tag: &str) -> String {
	format!("theme:{tag}")
}

/// `hadith:<id>`
pub fn hadith_node_id(hadith_id: &str) -> String {
	format!("hadith:{hadith_id}")
}

/// `concept:<id>`
pub fn concept_node_id(concept_id: &str) -> String {
	format!("concept:{concept_id}")
}

/// `hadith-topic:<topic>`
pub fn topic_node_id(topic: &str) -> String {
	format!("hadith-topic:{topic}")
}

/// Surah number of a `surah:verse` key, e.g. `2` for `2:255`.
pub fn surah_of_verse_key(verse_key: &str) -> Option<u32> {
	verse_key.split(':').next()?.trim().parse().ok()
}

// Collaborator data

/// A bookmarked verse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
	/// Store id.
	pub id: String,
	/// `surah:verse` key.
	pub verse_key: String,
	/// Surah number.
	pub surah_id: u32,
	/// Short free-text remark, possibly empty.
	#[serde(default)]
	pub note: String,
	/// When the bookmark was made.
	pub created_at: DateTime<Utc>,
}

/// What a [`LinkedResource`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
	/// A hadith; becomes a hadith node.
	Hadith,
	/// A commentary excerpt; kept on the note only.
	Tafsir,
}

/// A hadith or tafsir excerpt saved alongside a note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedResource {
	/// Resource kind, `type` on the wire.
	#[serde(rename = "type")]
	pub kind: ResourceKind,
	/// Display text.
	pub label: String,
	/// Excerpt shown with the note.
	#[serde(default)]
	pub preview: String,
	/// Where the full text lives.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_url: Option<String>,
	/// Collection, hadith number, tafsir id and similar.
	#[serde(default)]
	pub metadata: BTreeMap<String, String>,
}

/// A user note, optionally tied to verses and tagged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
	/// Store id.
	pub id: String,
	/// Optional title; the label falls back to the content.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// Empty for standalone notes.
	#[serde(default)]
	pub verse_keys: Vec<String>,
	/// Whole surahs the note is about.
	#[serde(default)]
	pub surah_ids: Vec<u32>,
	/// Body text.
	pub content: String,
	/// Free-form tags; each becomes a theme node.
	#[serde(default)]
	pub tags: Vec<String>,
	/// Hadith and tafsir saved with the note.
	#[serde(default)]
	pub linked_resources: Vec<LinkedResource>,
	/// When the note was written.
	pub created_at: DateTime<Utc>,
	/// Last edit.
	pub updated_at: DateTime<Utc>,
}

/// Optional scope for graph generation.
///
/// At most one field is meaningful: `verse_key` wins over `tag`, which wins
/// over `surah_id`, else everything is fetched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFilter {
	/// Only this verse and the notes citing it.
	#[serde(default)]
	pub verse_key: Option<String>,
	/// Only the component around this tag's theme.
	#[serde(default)]
	pub tag: Option<String>,
	/// Only this surah's bookmarks and notes.
	#[serde(default)]
	pub surah_id: Option<u32>,
}

/// The single scope a [`GraphFilter`] resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchScope<'a> {
	/// One verse key.
	Verse(&'a str),
	/// One tag.
	Tag(&'a str),
	/// One surah.
	Surah(u32),
	/// No narrowing.
	All,
}

impl GraphFilter {
	/// No filter.
	pub fn all() -> Self {
		Self::default()
	}

	/// Scope to one verse.
	pub fn by_verse(verse_key: impl Into<String>) -> Self {
		Self {
			verse_key: Some(verse_key.into()),
			..Self::default()
		}
	}

	/// Scope to one tag.
	pub fn by_tag(tag: impl Into<String>) -> Self {
		Self {
			tag: Some(tag.into()),
			..Self::default()
		}
	}

	/// Scope to one surah.
	pub fn by_surah(surah_id: u32) -> Self {
		Self {
			surah_id: Some(surah_id),
			..Self::default()
		}
	}

	/// Resolves the precedence between the fields.
	pub fn scope(&self) -> FetchScope<'_> {
		if let Some(key) = &self.verse_key {
			FetchScope::Verse(key)
		} else if let Some(tag) = &self.tag {
			FetchScope::Tag(tag)
		} else if let Some(surah) = self.surah_id {
			FetchScope::Surah(surah)
		} else {
			FetchScope::All
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kinds_serialize_kebab_case() {
		assert_eq!(
			serde_json::to_string(&NodeType::HadithTopic).unwrap(),
			"\"hadith-topic\""
		);
		assert_eq!(
			serde_json::to_string(&EdgeType::HadithTopicLink).unwrap(),
			"\"hadith-topic-link\""
		);
		for t in NodeType::ALL {
			assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
		}
		for t in EdgeType::ALL {
			assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
		}
	}

	#[test]
	fn surah_is_parsed_from_verse_key() {
		assert_eq!(surah_of_verse_key("2:255"), Some(2));
		assert_eq!(surah_of_verse_key("114:1"), Some(114));
		assert_eq!(surah_of_verse_key("garbage"), None);
	}

	#[test]
	fn filter_scope_precedence() {
		let filter = GraphFilter {
			verse_key: Some("2:255".into()),
			tag: Some("patience".into()),
			surah_id: Some(2),
		};
		assert_eq!(filter.scope(), FetchScope::Verse("2:255"));

		let filter = GraphFilter {
			verse_key: None,
			..filter
		};
		assert_eq!(filter.scope(), FetchScope::Tag("patience"));
		assert_eq!(GraphFilter::by_surah(2).scope(), FetchScope::Surah(2));
		assert_eq!(GraphFilter::all().scope(), FetchScope::All);
	}

	#[test]
	fn note_deserializes_with_defaults() {
		let note: Note = serde_json::from_str(
			r#"{
				"id": "n1",
				"content": "reflection",
				"linkedResources": [{"type": "hadith", "label": "Bukhari #1"}],
				"createdAt": "2024-01-01T00:00:00Z",
				"updatedAt": "2024-01-01T00:00:00Z"
			}"#,
		)
		.unwrap();
		assert!(note.verse_keys.is_empty());
		assert!(note.tags.is_empty());
		assert_eq!(note.linked_resources[0].kind, ResourceKind::Hadith);
	}
}
