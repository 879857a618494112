//! Knowledge graph construction and enrichment.
//!
//! ```text
//! BookmarkSource ─┐
//!                 ├─► GraphBuilder ──► (filter_by_tag) ──► OntologyEnricher ──► compute_stats
//! NoteSource ─────┘
//! ```
//!
//! Everything here is free of rendering and persistence concerns; graphs are
//! rebuilt wholesale rather than mutated in place.

mod builder;
mod error;
mod filter;
mod memory;
mod ontology;
mod ports;
mod stats;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{GraphBuilder, assemble};
pub use error::{GraphError, GraphResult, SourceError};
pub use filter::{filter_by_tag, reachable_from, retain_node_types};
pub use memory::{MemoryBookmarkStore, MemoryNoteStore};
pub use ontology::{OntologyEnricher, enrich_concepts, enrich_hadiths, enrich_topics};
pub use ports::{BookmarkSource, ConceptRef, NoteSource, OntologyTables};
pub use stats::{GraphStats, active_node_types, compute_stats};
pub use types::{
	Bookmark, EdgeType, FetchScope, GraphEdge, GraphFilter, GraphNode, KnowledgeGraph,
	LinkedResource, Metadata, Note, NodeType, ResourceKind, surah_of_verse_key,
};
