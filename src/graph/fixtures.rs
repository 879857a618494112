//! Shared constructors for unit tests.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

use super::types::{Bookmark, LinkedResource, Note, ResourceKind};

/// Midnight UTC on the given day of January 2024.
pub fn at(day: u32) -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

pub fn bookmark(id: &str, verse_key: &str, surah_id: u32) -> Bookmark {
	Bookmark {
		id: id.to_owned(),
		verse_key: verse_key.to_owned(),
		surah_id,
		note: String::new(),
		created_at: at(1),
	}
}

pub fn note(id: &str, verse_keys: &[&str], tags: &[&str]) -> Note {
	Note {
		id: id.to_owned(),
		title: None,
		verse_keys: verse_keys.iter().map(|k| k.to_string()).collect(),
		surah_ids: Vec::new(),
		content: format!("note {id}"),
		tags: tags.iter().map(|t| t.to_string()).collect(),
		linked_resources: Vec::new(),
		created_at: at(1),
		updated_at: at(1),
	}
}

pub fn hadith_resource(label: &str, metadata: &[(&str, &str)]) -> LinkedResource {
	LinkedResource {
		kind: ResourceKind::Hadith,
		label: label.to_owned(),
		preview: String::new(),
		source_url: None,
		metadata: metadata
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect::<BTreeMap<_, _>>(),
	}
}
