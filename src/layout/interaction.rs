//! Hover, lock, drag, zoom and search state for one graph view.
//!
//! ```text
//! idle ──hover──► hovering ──click──► locked ──click same / background──► idle
//! ```
//!
//! Hover is ignored while a node is locked. Timed behaviour (search debounce,
//! the reset animation) is driven by timestamps passed in by the caller, so
//! the controller never reads a clock.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::config::InteractionConfig;
use super::engine::ForceLayoutEngine;
use super::simulation::{SimulationEdge, SimulationNode};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Pan and zoom applied to the whole drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal offset in pixels.
	pub x: f64,
	/// Vertical offset in pixels.
	pub y: f64,
	/// Scale.
	pub k: f64,
}

impl ViewTransform {
	/// No pan, no zoom.
	pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, k: 1.0 };

	/// Canvas pixel to graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Graph coordinates to canvas pixel.
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

/// Node under the pointer, with the screen point used to place a tooltip.
#[derive(Clone, Debug, PartialEq)]
pub struct HoveredNode {
	/// Node id.
	pub id: String,
	/// Pointer x in canvas pixels.
	pub screen_x: f64,
	/// Pointer y in canvas pixels.
	pub screen_y: f64,
}

/// Where the hover/lock state machine stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
	/// Nothing highlighted.
	Idle,
	/// Highlight follows the pointer.
	Hovering,
	/// Highlight pinned to a clicked node.
	Locked,
}

#[derive(Clone, Debug)]
struct ResetAnimation {
	from: ViewTransform,
	started_ms: f64,
}

#[derive(Clone, Debug)]
struct PendingSearch {
	query: String,
	due_ms: f64,
}

/// Pointer and search state for one graph view.
#[derive(Default)]
pub struct InteractionController {
	config: InteractionConfig,
	neighbors: HashMap<String, HashSet<String>>,
	degree: HashMap<String, usize>,
	labels: Vec<(String, String)>,
	hovered: Option<HoveredNode>,
	locked: Option<String>,
	highlighted: HashSet<String>,
	transform: ViewTransform,
	reset: Option<ResetAnimation>,
	query: String,
	pending_search: Option<PendingSearch>,
	search_matches: Option<HashSet<String>>,
	dragging: Option<String>,
}

impl InteractionController {
	/// Idle controller with an identity transform.
	pub fn new(config: InteractionConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	/// Tuning in use.
	pub fn config(&self) -> &InteractionConfig {
		&self.config
	}

	/// Refreshes adjacency and search targets from the current layout.
	/// Hover or lock on a node that disappeared is dropped; the search is
	/// re-run against the new nodes.
	pub fn sync(&mut self, nodes: &[SimulationNode], edges: &[SimulationEdge]) {
		self.neighbors.clear();
		self.degree.clear();
		for edge in edges {
			let (s, t) = (edge.source_id(), edge.target_id());
			*self.degree.entry(s.to_owned()).or_default() += 1;
			*self.degree.entry(t.to_owned()).or_default() += 1;
			self.neighbors.entry(s.to_owned()).or_default().insert(t.to_owned());
			self.neighbors.entry(t.to_owned()).or_default().insert(s.to_owned());
		}
		self.labels = nodes
			.iter()
			.map(|n| (n.id().to_owned(), n.node.label.clone()))
			.collect();

		let known: HashSet<&str> = self.labels.iter().map(|(id, _)| id.as_str()).collect();
		if self.locked.as_deref().is_some_and(|id| !known.contains(id)) {
			self.locked = None;
		}
		if self.hovered.as_ref().is_some_and(|h| !known.contains(h.id.as_str())) {
			self.hovered = None;
		}
		if self.dragging.as_deref().is_some_and(|id| !known.contains(id)) {
			self.dragging = None;
		}
		let focus = self
			.locked
			.clone()
			.or_else(|| self.hovered.as_ref().map(|h| h.id.clone()));
		self.highlighted = match focus {
			Some(id) => self.closure(&id),
			None => HashSet::new(),
		};
		if self.search_matches.is_some() {
			self.search_matches = self.run_search(&self.query);
		}
	}

	/// The node plus its direct neighbours.
	fn closure(&self, id: &str) -> HashSet<String> {
		let mut ids: HashSet<String> = self.neighbors.get(id).cloned().unwrap_or_default();
		ids.insert(id.to_owned());
		ids
	}

	/// Current state, derived from lock and hover.
	pub fn mode(&self) -> InteractionMode {
		if self.locked.is_some() {
			InteractionMode::Locked
		} else if self.hovered.is_some() {
			InteractionMode::Hovering
		} else {
			InteractionMode::Idle
		}
	}

	/// Pointer moved onto `id`, or off every node when `None`.
	pub fn hover(&mut self, id: Option<&str>, screen_x: f64, screen_y: f64) {
		if self.locked.is_some() {
			return;
		}
		match id {
			Some(id) => {
				self.hovered = Some(HoveredNode {
					id: id.to_owned(),
					screen_x,
					screen_y,
				});
				self.highlighted = self.closure(id);
			}
			None => {
				self.hovered = None;
				self.highlighted.clear();
			}
		}
	}

	/// Locks the highlight on `id`, or unlocks when it is already locked.
	/// Returns whether the node is locked afterwards.
	pub fn click_node(&mut self, id: &str) -> bool {
		if self.locked.as_deref() == Some(id) {
			debug!("unlocked {id}");
			self.clear_focus();
			return false;
		}
		debug!("locked {id}");
		self.highlighted = self.closure(id);
		self.locked = Some(id.to_owned());
		true
	}

	/// Clears lock, hover and highlight.
	pub fn click_background(&mut self) {
		if self.locked.take().is_some() {
			debug!("lock cleared");
		}
		self.clear_focus();
	}

	fn clear_focus(&mut self) {
		self.locked = None;
		self.hovered = None;
		self.highlighted.clear();
	}

	/// Node under the pointer as of the last unlocked hover.
	pub fn hovered(&self) -> Option<&HoveredNode> {
		self.hovered.as_ref()
	}

	/// Id of the locked node.
	pub fn locked(&self) -> Option<&str> {
		self.locked.as_deref()
	}

	/// Focused node plus its direct neighbours; empty when idle.
	pub fn highlighted(&self) -> &HashSet<String> {
		&self.highlighted
	}

	/// Edges touching `id` in the current layout.
	pub fn connection_count(&self, id: &str) -> usize {
		self.degree.get(id).copied().unwrap_or(0)
	}

	// ==================================================================
	// Drag
	// ==================================================================

	/// Starts dragging `id`. Returns false when the node is not laid out.
	pub fn begin_drag(&mut self, engine: &mut ForceLayoutEngine, id: &str) -> bool {
		if !engine.drag_start(id) {
			return false;
		}
		self.dragging = Some(id.to_owned());
		true
	}

	/// Moves the dragged node under the pointer at screen `(sx, sy)`.
	pub fn drag_to(&mut self, engine: &mut ForceLayoutEngine, sx: f64, sy: f64) -> bool {
		let Some(id) = self.dragging.as_deref() else {
			return false;
		};
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		engine.drag_move(id, gx, gy)
	}

	/// Releases the dragged node, if any, and returns its id.
	pub fn end_drag(&mut self, engine: &mut ForceLayoutEngine) -> Option<String> {
		let id = self.dragging.take()?;
		engine.drag_end(&id);
		Some(id)
	}

	/// Id of the node being dragged.
	pub fn dragging(&self) -> Option<&str> {
		self.dragging.as_deref()
	}

	// ==================================================================
	// Zoom and pan
	// ==================================================================

	/// Current pan and zoom.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Scales by `factor` around screen point `(sx, sy)`, clamped to the
	/// configured zoom range. Cancels a running reset.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.reset = None;
		let t = &mut self.transform;
		let k = (t.k * factor).min(self.config.max_zoom).max(self.config.min_zoom);
		let ratio = k / t.k;
		t.x = sx - (sx - t.x) * ratio;
		t.y = sy - (sy - t.y) * ratio;
		t.k = k;
	}

	/// Shifts the view by a pixel delta. Cancels a running reset.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.reset = None;
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Starts animating the transform back to identity and clears hover
	/// and lock.
	pub fn reset_view(&mut self, now_ms: f64) {
		self.reset = Some(ResetAnimation {
			from: self.transform,
			started_ms: now_ms,
		});
		self.clear_focus();
	}

	/// Advances the reset animation. Returns true while it is running.
	pub fn advance(&mut self, now_ms: f64) -> bool {
		let Some(reset) = &self.reset else {
			return false;
		};
		let duration = self.config.reset_duration_ms;
		let t = if duration > 0.0 {
			((now_ms - reset.started_ms) / duration).clamp(0.0, 1.0)
		} else {
			1.0
		};
		if t >= 1.0 {
			self.transform = ViewTransform::IDENTITY;
			self.reset = None;
			return false;
		}
		self.transform = reset.from.lerp(&ViewTransform::IDENTITY, ease_out_cubic(t));
		true
	}

	// ==================================================================
	// Search
	// ==================================================================

	/// Queues `query`; it takes effect once the debounce has elapsed
	/// without another call.
	pub fn set_search_query(&mut self, query: &str, now_ms: f64) {
		self.pending_search = Some(PendingSearch {
			query: query.to_owned(),
			due_ms: now_ms + self.config.search_debounce_ms,
		});
	}

	/// Applies a queued query whose debounce has elapsed. Returns true when
	/// the match set was recomputed.
	pub fn poll_search(&mut self, now_ms: f64) -> bool {
		match &self.pending_search {
			Some(pending) if now_ms >= pending.due_ms => {}
			_ => return false,
		}
		let Some(pending) = self.pending_search.take() else {
			return false;
		};
		self.search_matches = self.run_search(&pending.query);
		self.query = pending.query;
		true
	}

	/// Case-insensitive substring match over label and id. A blank query
	/// means no search at all, which is different from a search with no
	/// hits.
	fn run_search(&self, query: &str) -> Option<HashSet<String>> {
		if query.trim().is_empty() {
			return None;
		}
		let needle = query.to_lowercase();
		Some(
			self.labels
				.iter()
				.filter(|(id, label)| {
					label.to_lowercase().contains(&needle) || id.to_lowercase().contains(&needle)
				})
				.map(|(id, _)| id.clone())
				.collect(),
		)
	}

	/// Ids matching the applied query; `None` when no search is active.
	pub fn search_matches(&self) -> Option<&HashSet<String>> {
		self.search_matches.as_ref()
	}

	// ==================================================================
	// Opacity
	// ==================================================================

	/// Search wins over highlight; the two never combine.
	pub fn node_opacity(&self, id: &str) -> f64 {
		let visible = match (&self.search_matches, self.highlighted.is_empty()) {
			(Some(matches), _) => matches.contains(id),
			(None, false) => self.highlighted.contains(id),
			(None, true) => true,
		};
		if visible { 1.0 } else { self.config.dim_node_opacity }
	}

	/// Same precedence as nodes; an edge is lit only when both ends are.
	pub fn edge_opacity(&self, source: &str, target: &str, base: f64) -> f64 {
		let visible = match (&self.search_matches, self.highlighted.is_empty()) {
			(Some(matches), _) => matches.contains(source) && matches.contains(target),
			(None, false) => self.highlighted.contains(source) && self.highlighted.contains(target),
			(None, true) => true,
		};
		if visible { base } else { self.config.dim_edge_opacity }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::fixtures::{bookmark, note};
	use crate::graph::{KnowledgeGraph, assemble};
	use crate::layout::LayoutConfig;

	// verse:2:255 ─ note:n1 ─ verse:3:1
	//      │           └──── theme:patience
	// verse:2:256 (same surah)
	fn graph() -> KnowledgeGraph {
		assemble(
			&[bookmark("b1", "2:255", 2), bookmark("b2", "2:256", 2)],
			&[note("n1", &["2:255", "3:1"], &["patience"])],
		)
	}

	fn setup() -> (ForceLayoutEngine, InteractionController) {
		let mut engine = ForceLayoutEngine::new(LayoutConfig::default());
		engine.update(&graph(), 800.0, 600.0);
		let mut controller = InteractionController::new(InteractionConfig::default());
		controller.sync(engine.nodes(), engine.edges());
		(engine, controller)
	}

	fn ids(items: &[&str]) -> HashSet<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn hover_highlights_direct_neighbours_only() {
		let (_, mut c) = setup();
		c.hover(Some("verse:2:255"), 10.0, 20.0);
		assert_eq!(c.mode(), InteractionMode::Hovering);
		assert_eq!(
			c.highlighted(),
			&ids(&["verse:2:255", "note:n1", "verse:2:256"])
		);
		// theme:patience is two hops away
		assert!(!c.highlighted().contains("theme:patience"));
		assert_eq!(c.hovered().map(|h| (h.screen_x, h.screen_y)), Some((10.0, 20.0)));

		c.hover(None, 0.0, 0.0);
		assert_eq!(c.mode(), InteractionMode::Idle);
		assert!(c.highlighted().is_empty());
	}

	#[test]
	fn isolated_node_highlights_itself() {
		let (_, mut c) = setup();
		c.hover(Some("ghost"), 0.0, 0.0);
		assert_eq!(c.highlighted(), &ids(&["ghost"]));
	}

	#[test]
	fn lock_suppresses_hover_until_released() {
		let (_, mut c) = setup();
		assert!(c.click_node("theme:patience"));
		assert_eq!(c.mode(), InteractionMode::Locked);

		c.hover(Some("verse:2:256"), 0.0, 0.0);
		assert_eq!(c.highlighted(), &ids(&["theme:patience", "note:n1"]));

		assert!(!c.click_node("theme:patience"));
		assert_eq!(c.mode(), InteractionMode::Idle);
		assert!(c.highlighted().is_empty());

		c.click_node("note:n1");
		c.click_background();
		assert_eq!(c.mode(), InteractionMode::Idle);
		assert!(c.locked().is_none());
	}

	#[test]
	fn clicking_another_node_moves_the_lock() {
		let (_, mut c) = setup();
		c.click_node("theme:patience");
		assert!(c.click_node("verse:3:1"));
		assert_eq!(c.locked(), Some("verse:3:1"));
		assert_eq!(c.highlighted(), &ids(&["verse:3:1", "note:n1"]));
	}

	#[test]
	fn connection_counts() {
		let (_, c) = setup();
		assert_eq!(c.connection_count("note:n1"), 3);
		assert_eq!(c.connection_count("verse:2:255"), 2);
		assert_eq!(c.connection_count("missing"), 0);
	}

	#[test]
	fn zoom_is_clamped_and_anchored() {
		let (_, mut c) = setup();
		c.zoom_at(100.0, 100.0, 2.0);
		let t = c.transform();
		assert_eq!(t.k, 2.0);
		// the anchor point stays put on screen
		let (gx, gy) = t.screen_to_graph(100.0, 100.0);
		assert!((gx - 100.0).abs() < 1e-9 && (gy - 100.0).abs() < 1e-9);

		for _ in 0..50 {
			c.zoom_at(0.0, 0.0, 1.1);
		}
		assert_eq!(c.transform().k, 5.0);
		for _ in 0..100 {
			c.zoom_at(0.0, 0.0, 0.9);
		}
		assert_eq!(c.transform().k, 0.1);
	}

	#[test]
	fn inverted_zoom_range_built_in_code_does_not_panic() {
		let config = InteractionConfig {
			min_zoom: 10.0,
			max_zoom: 5.0,
			..InteractionConfig::default()
		};
		assert!(config.validate().is_err());
		let mut c = InteractionController::new(config);
		c.zoom_at(0.0, 0.0, 1.1);
		assert!(c.transform().k.is_finite());
	}

	#[test]
	fn reset_animates_back_to_identity() {
		let (_, mut c) = setup();
		c.pan_by(200.0, -80.0);
		c.zoom_at(0.0, 0.0, 3.0);
		c.click_node("note:n1");

		c.reset_view(1000.0);
		assert_eq!(c.mode(), InteractionMode::Idle);
		assert!(c.advance(1250.0));
		let mid = c.transform();
		assert!(mid.k > 1.0 && mid.k < 3.0);
		assert!(!c.advance(1500.0));
		assert_eq!(c.transform(), ViewTransform::IDENTITY);
		assert!(!c.advance(1600.0));
	}

	#[test]
	fn user_zoom_cancels_reset() {
		let (_, mut c) = setup();
		c.zoom_at(0.0, 0.0, 2.0);
		c.reset_view(0.0);
		c.zoom_at(0.0, 0.0, 1.5);
		assert!(!c.advance(100.0));
		assert_eq!(c.transform().k, 3.0);
	}

	#[test]
	fn search_is_debounced() {
		let (_, mut c) = setup();
		c.set_search_query("PATIENCE", 0.0);
		assert!(!c.poll_search(299.0));
		assert!(c.search_matches().is_none());

		// a newer keystroke restarts the wait
		c.set_search_query("patien", 200.0);
		assert!(!c.poll_search(300.0));
		assert!(c.poll_search(500.0));
		assert_eq!(c.search_matches(), Some(&ids(&["theme:patience"])));
	}

	#[test]
	fn search_matches_ids_and_blank_clears() {
		let (_, mut c) = setup();
		c.set_search_query("verse:2:", 0.0);
		c.poll_search(300.0);
		assert_eq!(c.search_matches(), Some(&ids(&["verse:2:255", "verse:2:256"])));

		c.set_search_query("   ", 400.0);
		c.poll_search(700.0);
		assert!(c.search_matches().is_none());

		c.set_search_query("nothing here", 800.0);
		c.poll_search(1100.0);
		assert_eq!(c.search_matches().map(HashSet::len), Some(0));
		assert_eq!(c.node_opacity("note:n1"), 0.08);
	}

	#[test]
	fn search_takes_precedence_over_highlight() {
		let (_, mut c) = setup();
		assert_eq!(c.node_opacity("note:n1"), 1.0);
		assert_eq!(c.edge_opacity("note:n1", "verse:3:1", 0.4), 0.4);

		c.click_node("verse:3:1");
		assert_eq!(c.node_opacity("note:n1"), 1.0);
		assert_eq!(c.node_opacity("theme:patience"), 0.08);
		assert_eq!(c.edge_opacity("note:n1", "verse:3:1", 0.4), 0.4);
		assert_eq!(c.edge_opacity("note:n1", "theme:patience", 0.5), 0.03);

		c.set_search_query("patience", 0.0);
		c.poll_search(300.0);
		// highlighted but not matched
		assert_eq!(c.node_opacity("verse:3:1"), 0.08);
		// matched but not highlighted
		assert_eq!(c.node_opacity("theme:patience"), 1.0);
		assert_eq!(c.edge_opacity("note:n1", "theme:patience", 0.5), 0.03);
	}

	#[test]
	fn drag_goes_through_the_transform() {
		let (mut engine, mut c) = setup();
		c.zoom_at(0.0, 0.0, 2.0);
		assert!(c.begin_drag(&mut engine, "note:n1"));
		assert!(c.drag_to(&mut engine, 100.0, 60.0));
		assert_eq!(engine.node_position("note:n1"), Some((50.0, 30.0)));
		assert_eq!(c.end_drag(&mut engine).as_deref(), Some("note:n1"));
		assert!(engine.node("note:n1").is_some_and(|n| n.fx.is_none()));
		assert!(!c.drag_to(&mut engine, 0.0, 0.0));
		assert!(!c.begin_drag(&mut engine, "missing"));
	}

	#[test]
	fn sync_drops_focus_on_vanished_nodes() {
		let (mut engine, mut c) = setup();
		c.click_node("theme:patience");
		c.set_search_query("verse", 0.0);
		c.poll_search(300.0);

		let smaller = assemble(&[bookmark("b1", "2:255", 2)], &[]);
		engine.update(&smaller, 800.0, 600.0);
		c.sync(engine.nodes(), engine.edges());
		assert!(c.locked().is_none());
		assert!(c.highlighted().is_empty());
		assert_eq!(c.search_matches(), Some(&ids(&["verse:2:255"])));
	}
}
