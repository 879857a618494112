//! In-memory implementations of the collaborator ports.
//!
//! Backs the demo page and the tests. Queries filter a plain vector, in
//! insertion order.

use async_trait::async_trait;

use super::error::SourceError;
use super::ports::{BookmarkSource, NoteSource};
use super::types::{Bookmark, Note, surah_of_verse_key};

/// [`BookmarkSource`] over a vector.
#[derive(Clone, Debug, Default)]
pub struct MemoryBookmarkStore {
	bookmarks: Vec<Bookmark>,
}

impl MemoryBookmarkStore {
	/// Store holding `bookmarks`.
	pub fn new(bookmarks: Vec<Bookmark>) -> Self {
		Self { bookmarks }
	}
}

#[async_trait(?Send)]
impl BookmarkSource for MemoryBookmarkStore {
	async fn get_all(&self) -> Result<Vec<Bookmark>, SourceError> {
		Ok(self.bookmarks.clone())
	}

	async fn get_by_surah(&self, surah_id: u32) -> Result<Vec<Bookmark>, SourceError> {
		Ok(self
			.bookmarks
			.iter()
			.filter(|b| b.surah_id == surah_id)
			.cloned()
			.collect())
	}

	async fn get_by_verse_key(&self, verse_key: &str) -> Result<Option<Bookmark>, SourceError> {
		Ok(self.bookmarks.iter().find(|b| b.verse_key == verse_key).cloned())
	}
}

/// [`NoteSource`] over a vector.
#[derive(Clone, Debug, Default)]
pub struct MemoryNoteStore {
	notes: Vec<Note>,
}

impl MemoryNoteStore {
	/// Store holding `notes`.
	pub fn new(notes: Vec<Note>) -> Self {
		Self { notes }
	}

	/// Every distinct tag, in first-seen order.
	pub fn tags(&self) -> Vec<String> {
		let mut tags: Vec<String> = Vec::new();
		for tag in self.notes.iter().flat_map(|n| &n.tags) {
			if !tags.contains(tag) {
				tags.push(tag.clone());
			}
		}
		tags
	}
}

#[async_trait(?Send)]
impl NoteSource for MemoryNoteStore {
	async fn get_all(&self) -> Result<Vec<Note>, SourceError> {
		Ok(self.notes.clone())
	}

	/// A note belongs to a surah through a whole-surah link or through any of
	/// its verse keys.
	async fn get_by_surah(&self, surah_id: u32) -> Result<Vec<Note>, SourceError> {
		Ok(self
			.notes
			.iter()
			.filter(|n| {
				n.surah_ids.contains(&surah_id)
					|| n
						.verse_keys
						.iter()
						.any(|k| surah_of_verse_key(k) == Some(surah_id))
			})
			.cloned()
			.collect())
	}

	async fn get_by_verse_key(&self, verse_key: &str) -> Result<Vec<Note>, SourceError> {
		Ok(self
			.notes
			.iter()
			.filter(|n| n.verse_keys.iter().any(|k| k == verse_key))
			.cloned()
			.collect())
	}

	async fn get_by_tag(&self, tag: &str) -> Result<Vec<Note>, SourceError> {
		Ok(self
			.notes
			.iter()
			.filter(|n| n.tags.iter().any(|t| t == tag))
			.cloned()
			.collect())
	}
}
