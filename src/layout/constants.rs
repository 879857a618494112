//! Per-kind lookup tables. Rows follow the declaration order of
//! [`NodeType`] and [`EdgeType`]; adding a kind means adding one row.

use crate::graph::{EdgeType, NodeType};

/// How one node kind is drawn and where it sits.
pub struct NodeStyle {
	/// Fill.
	pub color: &'static str,
	/// Outline.
	pub dim_color: &'static str,
	/// Radius in graph units.
	pub radius: f64,
	/// Vertical band, 0 at the top.
	pub layer: u8,
	/// Legend text.
	pub legend: &'static str,
}

/// Number of horizontal bands the canvas is split into.
pub const LAYER_COUNT: u8 = 7;

/// Indexed by [`NodeType`] discriminant.
pub const NODE_STYLES: [NodeStyle; NodeType::COUNT] = [
	// verse
	NodeStyle { color: "#3b82f6", dim_color: "#1d4ed8", radius: 8.0, layer: 2, legend: "Verse" },
	// note
	NodeStyle { color: "#22c55e", dim_color: "#16a34a", radius: 9.0, layer: 3, legend: "Note" },
	// theme
	NodeStyle { color: "#14b8a6", dim_color: "#0d9488", radius: 10.0, layer: 6, legend: "Theme" },
	// hadith
	NodeStyle { color: "#f59e0b", dim_color: "#d97706", radius: 7.0, layer: 4, legend: "Hadith" },
	// concept
	NodeStyle { color: "#ec4899", dim_color: "#db2777", radius: 12.0, layer: 0, legend: "Concept" },
	// hadith-topic
	NodeStyle { color: "#f97316", dim_color: "#ea580c", radius: 7.0, layer: 5, legend: "Topic" },
	// bookmark, shares the verse band
	NodeStyle { color: "#ef4444", dim_color: "#dc2626", radius: 6.0, layer: 2, legend: "Bookmark" },
	// surah
	NodeStyle { color: "#a855f7", dim_color: "#9333ea", radius: 12.0, layer: 1, legend: "Surah" },
];

/// How one edge kind is drawn and how long it wants to be.
pub struct EdgeStyle {
	/// Stroke.
	pub color: &'static str,
	/// Line width in graph units.
	pub width: f64,
	/// Empty for solid lines.
	pub dash: &'static [f64],
	/// Opacity when nothing is dimmed.
	pub opacity: f64,
	/// Target link length; `None` uses the configured default.
	pub distance: Option<f64>,
}

/// Indexed by [`EdgeType`] discriminant.
pub const EDGE_STYLES: [EdgeStyle; EdgeType::COUNT] = [
	// references
	EdgeStyle { color: "#6b7280", width: 1.5, dash: &[], opacity: 0.4, distance: Some(80.0) },
	// thematic
	EdgeStyle { color: "#14b8a6", width: 2.0, dash: &[], opacity: 0.5, distance: Some(100.0) },
	// same-surah
	EdgeStyle { color: "#9ca3af", width: 1.0, dash: &[4.0, 4.0], opacity: 0.25, distance: Some(60.0) },
	// note-hadith
	EdgeStyle { color: "#22c55e", width: 1.5, dash: &[], opacity: 0.45, distance: Some(70.0) },
	// hadith-verse
	EdgeStyle { color: "#f59e0b", width: 1.5, dash: &[], opacity: 0.4, distance: Some(90.0) },
	// concept-verse
	EdgeStyle { color: "#ec4899", width: 1.5, dash: &[], opacity: 0.4, distance: Some(85.0) },
	// concept-related
	EdgeStyle { color: "#ec4899", width: 1.0, dash: &[3.0, 3.0], opacity: 0.3, distance: Some(95.0) },
	// hadith-topic-link
	EdgeStyle { color: "#f97316", width: 1.0, dash: &[], opacity: 0.35, distance: Some(75.0) },
	// user-linked
	EdgeStyle { color: "#8b5cf6", width: 1.5, dash: &[], opacity: 0.5, distance: None },
];

/// Radius of the particle drawn along an edge.
pub const PARTICLE_RADIUS: f64 = 2.0;
/// Fraction of the edge length a particle travels per frame.
pub const PARTICLE_SPEED: f64 = 0.005;

impl NodeType {
	/// Row of [`NODE_STYLES`] for this kind.
	pub fn style(self) -> &'static NodeStyle {
		&NODE_STYLES[self as usize]
	}

	/// Band this kind is pulled toward.
	pub fn layer(self) -> u8 {
		self.style().layer
	}

	/// Drawn radius.
	pub fn radius(self) -> f64 {
		self.style().radius
	}
}

impl EdgeType {
	/// Row of [`EDGE_STYLES`] for this kind.
	pub fn style(self) -> &'static EdgeStyle {
		&EDGE_STYLES[self as usize]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn layers_follow_semantic_order() {
		assert_eq!(NodeType::Concept.layer(), 0);
		assert_eq!(NodeType::Surah.layer(), 1);
		assert_eq!(NodeType::Verse.layer(), 2);
		assert_eq!(NodeType::Bookmark.layer(), NodeType::Verse.layer());
		assert_eq!(NodeType::Note.layer(), 3);
		assert_eq!(NodeType::Hadith.layer(), 4);
		assert_eq!(NodeType::HadithTopic.layer(), 5);
		assert_eq!(NodeType::Theme.layer(), 6);
		assert!(NodeType::ALL.iter().all(|t| t.layer() < LAYER_COUNT));
	}

	#[test]
	fn rows_line_up_with_kinds() {
		assert_eq!(NodeType::Theme.style().legend, "Theme");
		assert_eq!(NodeType::HadithTopic.style().legend, "Topic");
		assert_eq!(EdgeType::SameSurah.style().distance, Some(60.0));
		assert_eq!(EdgeType::Thematic.style().distance, Some(100.0));
		assert!(EdgeType::UserLinked.style().distance.is_none());
	}
}
