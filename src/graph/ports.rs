//! Collaborator ports consumed by the graph core.
//!
//! Persistence is someone else's problem: anything that can answer these
//! queries (IndexedDB, SQLite, an in-memory vector) can feed the builder.
//! The model is single-threaded, so futures are not required to be `Send`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::SourceError;
use super::types::{Bookmark, Note};

/// Read access to the user's bookmarks.
#[async_trait(?Send)]
pub trait BookmarkSource {
	/// Every bookmark.
	async fn get_all(&self) -> Result<Vec<Bookmark>, SourceError>;
	/// Bookmarks within one surah.
	async fn get_by_surah(&self, surah_id: u32) -> Result<Vec<Bookmark>, SourceError>;
	/// At most one bookmark exists per verse.
	async fn get_by_verse_key(&self, verse_key: &str) -> Result<Option<Bookmark>, SourceError>;
}

/// Read access to the user's notes.
#[async_trait(?Send)]
pub trait NoteSource {
	/// Every note.
	async fn get_all(&self) -> Result<Vec<Note>, SourceError>;
	/// Notes about a surah, whole or through any cited verse.
	async fn get_by_surah(&self, surah_id: u32) -> Result<Vec<Note>, SourceError>;
	/// Notes citing one verse.
	async fn get_by_verse_key(&self, verse_key: &str) -> Result<Vec<Note>, SourceError>;
	/// Notes carrying a tag.
	async fn get_by_tag(&self, tag: &str) -> Result<Vec<Note>, SourceError>;
}

/// A Quranic concept attached to a verse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptRef {
	/// Concept id, e.g. `sabr`.
	pub id: String,
	/// Short gloss, kept in node metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub definition: Option<String>,
}

impl ConceptRef {
	/// A concept without a definition.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			definition: None,
		}
	}
}

/// Pre-fetched ontology lookups. A `None` table disables its tier; an empty
/// table runs the tier and finds nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyTables {
	/// verse key -> hadith ids
	#[serde(default)]
	pub verse_hadiths: Option<HashMap<String, Vec<String>>>,
	/// verse key -> concepts
	#[serde(default)]
	pub verse_concepts: Option<HashMap<String, Vec<ConceptRef>>>,
	/// hadith id -> topic names
	#[serde(default)]
	pub hadith_topics: Option<HashMap<String, Vec<String>>>,
}

impl OntologyTables {
	/// Enables the hadith tier.
	pub fn with_verse_hadiths(mut self, table: HashMap<String, Vec<String>>) -> Self {
		self.verse_hadiths = Some(table);
		self
	}

	/// Enables the concept tier.
	pub fn with_verse_concepts(mut self, table: HashMap<String, Vec<ConceptRef>>) -> Self {
		self.verse_concepts = Some(table);
		self
	}

	/// Enables the topic tier.
	pub fn with_hadith_topics(mut self, table: HashMap<String, Vec<String>>) -> Self {
		self.hadith_topics = Some(table);
		self
	}
}
