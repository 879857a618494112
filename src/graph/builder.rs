//! Base graph construction from bookmarks and notes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::json;

use super::error::{GraphError, GraphResult};
use super::filter::filter_by_tag;
use super::ports::{BookmarkSource, NoteSource};
use super::types::{
	Bookmark, EdgeType, FetchScope, GraphEdge, GraphFilter, GraphNode, KnowledgeGraph,
	LinkedResource, Metadata, Note, NodeType, ResourceKind, hadith_node_id, note_node_id,
	surah_of_verse_key, theme_node_id, verse_node_id,
};

const NOTE_LABEL_CHARS: usize = 60;
const SAME_SURAH_WEIGHT: f64 = 0.5;

/// Node list plus id index. Nodes keep insertion order; a second insert of
/// the same id is a no-op.
#[derive(Debug, Default)]
pub(crate) struct GraphAssembly {
	nodes: Vec<GraphNode>,
	index: HashMap<String, usize>,
	edges: Vec<GraphEdge>,
	edge_ids: HashSet<String>,
}

impl GraphAssembly {
	pub(crate) fn from_graph(graph: KnowledgeGraph) -> Self {
		let index = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		let edge_ids = graph.edges.iter().map(|e| e.id.clone()).collect();
		Self {
			nodes: graph.nodes,
			index,
			edges: graph.edges,
			edge_ids,
		}
	}

	pub(crate) fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub(crate) fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// Inserts the node built by `make` unless `id` is already present.
	/// Returns whether a node was added.
	pub(crate) fn ensure_node(&mut self, id: String, make: impl FnOnce(String) -> GraphNode) -> bool {
		if self.index.contains_key(&id) {
			return false;
		}
		self.index.insert(id.clone(), self.nodes.len());
		self.nodes.push(make(id));
		true
	}

	pub(crate) fn push_edge(&mut self, edge: GraphEdge) {
		self.edge_ids.insert(edge.id.clone());
		self.edges.push(edge);
	}

	/// Like `push_edge`, but skips an edge whose id is already present.
	pub(crate) fn push_edge_once(&mut self, edge: GraphEdge) -> bool {
		if self.edge_ids.contains(&edge.id) {
			return false;
		}
		self.push_edge(edge);
		true
	}

	pub(crate) fn finish(self) -> KnowledgeGraph {
		KnowledgeGraph {
			nodes: self.nodes,
			edges: self.edges,
		}
	}
}

pub(crate) fn link(
	id: String,
	source: &str,
	target: &str,
	edge_type: EdgeType,
	weight: f64,
	created_at: DateTime<Utc>,
) -> GraphEdge {
	GraphEdge {
		id,
		source_node_id: source.to_owned(),
		target_node_id: target.to_owned(),
		edge_type,
		weight,
		created_at,
	}
}

/// Builds knowledge graphs out of the user's bookmarks and notes.
pub struct GraphBuilder {
	bookmarks: Rc<dyn BookmarkSource>,
	notes: Rc<dyn NoteSource>,
}

impl GraphBuilder {
	/// Builder over the two collaborator ports.
	pub fn new(bookmarks: Rc<dyn BookmarkSource>, notes: Rc<dyn NoteSource>) -> Self {
		Self { bookmarks, notes }
	}

	/// Fetches bookmarks and notes for the filter's scope concurrently and
	/// assembles them. A tag scope narrows the notes fetched and then keeps
	/// only the component reachable from the tag's theme node.
	pub async fn generate_graph(&self, filter: &GraphFilter) -> GraphResult<KnowledgeGraph> {
		let scope = filter.scope();
		let (bookmarks, notes) =
			futures::try_join!(self.fetch_bookmarks(scope), self.fetch_notes(scope))?;
		debug!(
			"generating graph for {scope:?}: {} bookmarks, {} notes",
			bookmarks.len(),
			notes.len()
		);

		let graph = assemble(&bookmarks, &notes);
		let graph = match scope {
			FetchScope::Tag(tag) => {
				let filtered = filter_by_tag(&graph, tag);
				debug!(
					"tag filter '{tag}' kept {}/{} nodes",
					filtered.nodes.len(),
					graph.nodes.len()
				);
				filtered
			}
			_ => graph,
		};
		debug!("graph has {} nodes, {} edges", graph.nodes.len(), graph.edges.len());
		Ok(graph)
	}

	async fn fetch_bookmarks(&self, scope: FetchScope<'_>) -> GraphResult<Vec<Bookmark>> {
		let fetched = match scope {
			FetchScope::Verse(key) => self
				.bookmarks
				.get_by_verse_key(key)
				.await
				.map(|b| b.into_iter().collect()),
			FetchScope::Surah(surah) => self.bookmarks.get_by_surah(surah).await,
			FetchScope::Tag(_) | FetchScope::All => self.bookmarks.get_all().await,
		};
		fetched.map_err(GraphError::Bookmarks)
	}

	async fn fetch_notes(&self, scope: FetchScope<'_>) -> GraphResult<Vec<Note>> {
		let fetched = match scope {
			FetchScope::Verse(key) => self.notes.get_by_verse_key(key).await,
			FetchScope::Tag(tag) => self.notes.get_by_tag(tag).await,
			FetchScope::Surah(surah) => self.notes.get_by_surah(surah).await,
			FetchScope::All => self.notes.get_all().await,
		};
		fetched.map_err(GraphError::Notes)
	}
}

/// Merges already-fetched bookmarks and notes into one graph. Pure and
/// deterministic: the same input always yields the same graph.
pub fn assemble(bookmarks: &[Bookmark], notes: &[Note]) -> KnowledgeGraph {
	let mut graph = GraphAssembly::default();

	for bm in bookmarks {
		graph.ensure_node(verse_node_id(&bm.verse_key), |id| GraphNode {
			id,
			node_type: NodeType::Verse,
			label: bm.verse_key.clone(),
			verse_key: Some(bm.verse_key.clone()),
			surah_id: Some(bm.surah_id),
			metadata: Metadata::from([
				("bookmarkId".to_owned(), json!(bm.id)),
				("note".to_owned(), json!(bm.note)),
			]),
			created_at: bm.created_at,
		});
	}

	for note in notes {
		let note_id = note_node_id(&note.id);
		graph.ensure_node(note_id.clone(), |id| note_node(id, note));

		for key in &note.verse_keys {
			let verse_id = verse_node_id(key);
			graph.ensure_node(verse_id.clone(), |id| GraphNode {
				id,
				node_type: NodeType::Verse,
				label: key.clone(),
				verse_key: Some(key.clone()),
				surah_id: surah_of_verse_key(key),
				metadata: Metadata::new(),
				created_at: note.created_at,
			});
			graph.push_edge(link(
				format!("edge:ref:{}:{key}", note.id),
				&note_id,
				&verse_id,
				EdgeType::References,
				1.0,
				note.created_at,
			));
		}
	}

	add_themes(&mut graph, notes);
	add_same_surah_links(&mut graph, bookmarks);
	add_linked_hadiths(&mut graph, notes);

	graph.finish()
}

fn note_node(id: String, note: &Note) -> GraphNode {
	let label = match note.title.as_deref().map(str::trim) {
		Some(title) if !title.is_empty() => title.to_owned(),
		_ => {
			let excerpt: String = note.content.chars().take(NOTE_LABEL_CHARS).collect();
			if excerpt.trim().is_empty() {
				"Note".to_owned()
			} else {
				excerpt
			}
		}
	};
	GraphNode {
		id,
		node_type: NodeType::Note,
		label,
		verse_key: note.verse_keys.first().cloned(),
		surah_id: note
			.verse_keys
			.first()
			.and_then(|k| surah_of_verse_key(k))
			.or_else(|| note.surah_ids.first().copied()),
		metadata: Metadata::from([("tags".to_owned(), json!(note.tags))]),
		created_at: note.created_at,
	}
}

/// One theme node per distinct tag, one thematic edge per (note, tag).
fn add_themes(graph: &mut GraphAssembly, notes: &[Note]) {
	let mut earliest: HashMap<&str, DateTime<Utc>> = HashMap::new();
	for note in notes {
		for tag in &note.tags {
			earliest
				.entry(tag.as_str())
				.and_modify(|t| *t = (*t).min(note.created_at))
				.or_insert(note.created_at);
		}
	}

	for note in notes {
		let note_id = note_node_id(&note.id);
		let mut seen = HashSet::new();
		for tag in &note.tags {
			if !seen.insert(tag.as_str()) {
				continue;
			}
			let theme_id = theme_node_id(tag);
			graph.ensure_node(theme_id.clone(), |id| GraphNode {
				id,
				node_type: NodeType::Theme,
				label: tag.clone(),
				verse_key: None,
				surah_id: None,
				metadata: Metadata::new(),
				created_at: earliest.get(tag.as_str()).copied().unwrap_or(note.created_at),
			});
			graph.push_edge(link(
				format!("edge:thematic:{note_id}:{tag}"),
				&note_id,
				&theme_id,
				EdgeType::Thematic,
				1.0,
				note.created_at,
			));
		}
	}
}

/// Links every pair of distinct bookmarked verses within a surah.
fn add_same_surah_links(graph: &mut GraphAssembly, bookmarks: &[Bookmark]) {
	let mut by_surah: BTreeMap<u32, Vec<(String, DateTime<Utc>)>> = BTreeMap::new();
	for bm in bookmarks {
		let verse_id = verse_node_id(&bm.verse_key);
		let group = by_surah.entry(bm.surah_id).or_default();
		match group.iter_mut().find(|(id, _)| *id == verse_id) {
			Some((_, at)) => *at = (*at).max(bm.created_at),
			None => group.push((verse_id, bm.created_at)),
		}
	}

	for group in by_surah.values() {
		for (i, (src, src_at)) in group.iter().enumerate() {
			for (tgt, tgt_at) in &group[i + 1..] {
				graph.push_edge(link(
					format!("edge:same-surah:{src}:{tgt}"),
					src,
					tgt,
					EdgeType::SameSurah,
					SAME_SURAH_WEIGHT,
					(*src_at).max(*tgt_at),
				));
			}
		}
	}
}

/// Hadith excerpts saved on notes. Always on, independent of the ontology
/// tiers.
fn add_linked_hadiths(graph: &mut GraphAssembly, notes: &[Note]) {
	for note in notes {
		let note_id = note_node_id(&note.id);
		let hadiths = note
			.linked_resources
			.iter()
			.enumerate()
			.filter(|(_, r)| r.kind == ResourceKind::Hadith);
		for (index, resource) in hadiths {
			let hadith_id = linked_hadith_id(&note.id, index, resource);
			let node_id = hadith_node_id(&hadith_id);
			graph.ensure_node(node_id.clone(), |id| GraphNode {
				id,
				node_type: NodeType::Hadith,
				label: resource.label.clone(),
				verse_key: None,
				surah_id: None,
				metadata: hadith_metadata(resource),
				created_at: note.created_at,
			});
			graph.push_edge(link(
				format!("edge:note-hadith:{}:{hadith_id}", note.id),
				&note_id,
				&node_id,
				EdgeType::NoteHadith,
				1.0,
				note.created_at,
			));
		}
	}
}

/// `hadithId` from the resource metadata, else `<collection>-<number>`, else
/// a note-scoped fallback.
pub(crate) fn linked_hadith_id(note_id: &str, index: usize, resource: &LinkedResource) -> String {
	let meta = &resource.metadata;
	if let Some(id) = meta.get("hadithId").filter(|id| !id.is_empty()) {
		return id.clone();
	}
	match (meta.get("collection"), meta.get("hadithNumber")) {
		(Some(collection), Some(number)) => format!("{collection}-{number}"),
		_ => format!("{note_id}-{index}"),
	}
}

fn hadith_metadata(resource: &LinkedResource) -> Metadata {
	let mut metadata = Metadata::new();
	for key in ["collection", "hadithNumber"] {
		if let Some(value) = resource.metadata.get(key) {
			metadata.insert(key.to_owned(), json!(value));
		}
	}
	if !resource.preview.is_empty() {
		metadata.insert("preview".to_owned(), json!(resource.preview));
	}
	if let Some(url) = &resource.source_url {
		metadata.insert("sourceUrl".to_owned(), json!(url));
	}
	metadata
}
