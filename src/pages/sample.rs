//! Demo collaborators: a handful of bookmarks and notes plus small ontology
//! tables, so the page has something to draw without a backend.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeDelta, Utc};

use crate::graph::{
	Bookmark, ConceptRef, LinkedResource, MemoryBookmarkStore, MemoryNoteStore, Note,
	OntologyTables, ResourceKind, surah_of_verse_key,
};

/// 2024-01-01 as days since the Unix epoch.
const FIRST_DAY: i64 = 19_723;

fn day(n: i64) -> DateTime<Utc> {
	DateTime::UNIX_EPOCH + TimeDelta::days(FIRST_DAY + n)
}

fn bookmark(id: &str, verse_key: &str, note: &str, created: i64) -> Bookmark {
	Bookmark {
		id: id.to_owned(),
		verse_key: verse_key.to_owned(),
		surah_id: surah_of_verse_key(verse_key).unwrap_or_default(),
		note: note.to_owned(),
		created_at: day(created),
	}
}

fn note(
	id: &str,
	title: Option<&str>,
	content: &str,
	verse_keys: &[&str],
	tags: &[&str],
	created: i64,
) -> Note {
	Note {
		id: id.to_owned(),
		title: title.map(str::to_owned),
		verse_keys: verse_keys.iter().map(|k| k.to_string()).collect(),
		surah_ids: Vec::new(),
		content: content.to_owned(),
		tags: tags.iter().map(|t| t.to_string()).collect(),
		linked_resources: Vec::new(),
		created_at: day(created),
		updated_at: day(created),
	}
}

fn hadith(label: &str, collection: &str, number: &str, preview: &str) -> LinkedResource {
	LinkedResource {
		kind: ResourceKind::Hadith,
		label: label.to_owned(),
		preview: preview.to_owned(),
		source_url: Some(format!("https://sunnah.com/{collection}:{number}")),
		metadata: BTreeMap::from([
			("collection".to_owned(), collection.to_owned()),
			("hadithNumber".to_owned(), number.to_owned()),
		]),
	}
}

pub struct SampleData {
	pub bookmarks: MemoryBookmarkStore,
	pub notes: MemoryNoteStore,
	pub ontology: OntologyTables,
}

impl SampleData {
	pub fn new() -> Self {
		let bookmarks = MemoryBookmarkStore::new(vec![
			bookmark("bm-1", "2:153", "Seek help through patience", 0),
			bookmark("bm-2", "2:255", "Ayat al-Kursi", 1),
			bookmark("bm-3", "2:286", "", 3),
			bookmark("bm-4", "3:200", "", 4),
			bookmark("bm-5", "94:5", "With hardship comes ease", 6),
			bookmark("bm-6", "94:6", "", 6),
		]);

		let mut patience = note(
			"note-1",
			Some("Patience and prayer"),
			"Patience is paired with prayer as the means of seeking help.",
			&["2:153", "2:45"],
			&["patience", "prayer"],
			2,
		);
		patience.linked_resources.push(hadith(
			"Patience at the first stroke",
			"bukhari",
			"1283",
			"Real patience is at the first stroke of a calamity.",
		));

		let mut ease = note(
			"note-3",
			None,
			"Ease is mentioned twice after hardship, hardship only once. The definite article \
			 makes the hardship one and the ease two.",
			&["94:5", "94:6"],
			&["patience", "hope"],
			7,
		);
		ease.linked_resources.push(LinkedResource {
			kind: ResourceKind::Tafsir,
			label: "Ibn Kathir on 94:5".to_owned(),
			preview: String::new(),
			source_url: None,
			metadata: BTreeMap::new(),
		});

		let notes = MemoryNoteStore::new(vec![
			patience,
			note(
				"note-2",
				Some("Throne verse"),
				"Reflections on divine sovereignty.",
				&["2:255"],
				&["tawhid"],
				5,
			),
			ease,
			note(
				"note-4",
				Some("Reminder"),
				"Read the closing verses of al-Baqarah every night.",
				&[],
				&["prayer"],
				9,
			),
		]);

		let ontology = OntologyTables::default()
			.with_verse_hadiths(HashMap::from([
				("2:153".to_owned(), vec!["muslim-2999".to_owned()]),
				("2:255".to_owned(), vec!["muslim-810".to_owned(), "bukhari-5010".to_owned()]),
				("2:286".to_owned(), vec!["muslim-125".to_owned()]),
			]))
			.with_verse_concepts(HashMap::from([
				("2:153".to_owned(), vec![ConceptRef::new("sabr")]),
				("3:200".to_owned(), vec![ConceptRef::new("sabr"), ConceptRef::new("taqwa")]),
				("2:255".to_owned(), vec![ConceptRef::new("tawhid")]),
				("94:5".to_owned(), vec![ConceptRef::new("yusr")]),
			]))
			.with_hadith_topics(HashMap::from([
				("muslim-2999".to_owned(), vec!["Patience".to_owned(), "Gratitude".to_owned()]),
				("muslim-810".to_owned(), vec!["Virtues of the Quran".to_owned()]),
				("bukhari-5010".to_owned(), vec!["Virtues of the Quran".to_owned()]),
				("bukhari-1283".to_owned(), vec!["Patience".to_owned()]),
			]));

		Self {
			bookmarks,
			notes,
			ontology,
		}
	}
}
