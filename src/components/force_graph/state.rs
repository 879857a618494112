use std::collections::HashSet;

use crate::graph::{KnowledgeGraph, NodeType, retain_node_types};
use crate::layout::{
	ForceLayoutEngine, InteractionConfig, InteractionController, LayoutConfig, LayoutSnapshot,
	PARTICLE_SPEED,
};

/// Pointer travel, in pixels, past which a press stops counting as a click.
const CLICK_TOLERANCE: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub last_x: f64,
	pub last_y: f64,
}

/// A mouse press that may still turn out to be a click.
#[derive(Clone, Debug)]
pub struct Press {
	pub x: f64,
	pub y: f64,
	pub node: Option<String>,
	pub moved: bool,
}

/// What a finished press amounted to.
#[derive(Clone, Debug, PartialEq)]
pub enum Release {
	Node(String),
	Background,
	Drag,
}

pub struct ForceGraphState {
	pub engine: ForceLayoutEngine,
	pub interaction: InteractionController,
	/// Last layout handed out by the engine; what gets drawn.
	pub layout: Option<LayoutSnapshot>,
	pub pan: PanState,
	pub press: Option<Press>,
	pub width: f64,
	pub height: f64,
	pub show_labels: bool,
	pub show_particles: bool,
	/// Position of every edge particle along its edge, in `[0, 1)`.
	pub particle_phase: f64,
	graph: KnowledgeGraph,
	visible_types: HashSet<NodeType>,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			engine: ForceLayoutEngine::new(LayoutConfig::default()),
			interaction: InteractionController::new(InteractionConfig::default()),
			layout: None,
			pan: PanState::default(),
			press: None,
			width,
			height,
			show_labels: true,
			show_particles: false,
			particle_phase: 0.0,
			graph: KnowledgeGraph::default(),
			visible_types: NodeType::ALL.into_iter().collect(),
		}
	}

	pub fn set_graph(&mut self, graph: KnowledgeGraph) {
		self.graph = graph;
		self.relayout();
	}

	pub fn set_visible_types(&mut self, types: HashSet<NodeType>) {
		self.visible_types = types;
		self.relayout();
	}

	pub fn set_show_particles(&mut self, on: bool) {
		self.show_particles = on;
		if !on {
			self.particle_phase = 0.0;
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.relayout();
	}

	fn relayout(&mut self) {
		let visible = retain_node_types(&self.graph, &self.visible_types);
		self.engine.update(&visible, self.width, self.height);
		self.interaction.sync(self.engine.nodes(), self.engine.edges());
		self.layout = self.engine.snapshot();
	}

	/// One animation frame at `now_ms`.
	pub fn tick(&mut self, now_ms: f64) {
		if let Some(snapshot) = self.engine.step() {
			self.layout = Some(snapshot);
		}
		self.interaction.advance(now_ms);
		self.interaction.poll_search(now_ms);
		if self.show_particles {
			self.particle_phase = (self.particle_phase + PARTICLE_SPEED) % 1.0;
		}
	}

	pub fn node_at_screen(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.interaction.transform().screen_to_graph(sx, sy);
		self.engine.node_at(gx, gy).map(|n| n.id().to_owned())
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		let node = self.node_at_screen(x, y);
		match &node {
			Some(id) => {
				self.interaction.begin_drag(&mut self.engine, id);
			}
			None => {
				self.pan = PanState {
					active: true,
					last_x: x,
					last_y: y,
				};
			}
		}
		self.press = Some(Press {
			x,
			y,
			node,
			moved: false,
		});
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if let Some(press) = self.press.as_mut() {
			if (x - press.x).hypot(y - press.y) > CLICK_TOLERANCE {
				press.moved = true;
			}
		}
		if self.interaction.dragging().is_some() {
			self.interaction.drag_to(&mut self.engine, x, y);
		} else if self.pan.active {
			self.interaction.pan_by(x - self.pan.last_x, y - self.pan.last_y);
			self.pan.last_x = x;
			self.pan.last_y = y;
		} else {
			let hovered = self.node_at_screen(x, y);
			self.interaction.hover(hovered.as_deref(), x, y);
		}
	}

	/// Ends a press. A press that never moved is a click on whatever was
	/// under it.
	pub fn pointer_up(&mut self) -> Release {
		self.interaction.end_drag(&mut self.engine);
		self.pan.active = false;
		match self.press.take() {
			Some(Press { moved: false, node: Some(id), .. }) => {
				self.interaction.click_node(&id);
				Release::Node(id)
			}
			Some(Press { moved: false, node: None, .. }) => {
				self.interaction.click_background();
				Release::Background
			}
			_ => Release::Drag,
		}
	}

	pub fn pointer_leave(&mut self) {
		self.interaction.end_drag(&mut self.engine);
		self.pan.active = false;
		self.press = None;
		self.interaction.hover(None, 0.0, 0.0);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::assemble;
	use crate::graph::fixtures::{bookmark, note};
	use crate::layout::InteractionMode;

	fn state() -> ForceGraphState {
		let mut state = ForceGraphState::new(800.0, 600.0);
		state.set_graph(assemble(
			&[bookmark("b1", "2:255", 2)],
			&[note("n1", &["2:255"], &["patience"])],
		));
		state
	}

	#[test]
	fn hidden_types_leave_the_layout() {
		let mut s = state();
		assert_eq!(s.engine.nodes().len(), 3);
		s.set_visible_types([NodeType::Verse, NodeType::Note].into_iter().collect());
		assert_eq!(s.engine.nodes().len(), 2);
		assert_eq!(s.engine.edges().len(), 1);
	}

	#[test]
	fn still_press_is_a_click() {
		let mut s = state();
		s.engine.pin("note:n1", 100.0, 100.0);
		s.pointer_down(100.0, 100.0);
		assert_eq!(s.pointer_up(), Release::Node("note:n1".into()));
		assert_eq!(s.interaction.mode(), InteractionMode::Locked);

		s.pointer_down(-400.0, -400.0);
		assert_eq!(s.pointer_up(), Release::Background);
		assert_eq!(s.interaction.mode(), InteractionMode::Idle);
	}

	#[test]
	fn moving_press_pans() {
		let mut s = state();
		s.pointer_down(-400.0, -400.0);
		s.pointer_move(-380.0, -390.0);
		assert_eq!(s.pointer_up(), Release::Drag);
		let t = s.interaction.transform();
		assert_eq!((t.x, t.y), (20.0, 10.0));
	}

	#[test]
	fn particles_reset_when_hidden() {
		let mut s = state();
		s.set_show_particles(true);
		s.tick(16.0);
		s.tick(32.0);
		assert!(s.particle_phase > 0.0);
		s.set_show_particles(false);
		assert_eq!(s.particle_phase, 0.0);
		s.tick(48.0);
		assert_eq!(s.particle_phase, 0.0);
	}

	#[test]
	fn frames_draw_from_the_latest_snapshot() {
		let mut s = state();
		let initial = s.layout.clone().unwrap();
		assert_eq!(initial.nodes.len(), 3);
		assert!(!initial.stabilized);

		let mut frames = 0.0;
		while s.engine.is_running() {
			frames += 16.0;
			s.tick(frames);
			assert!(frames < 16.0 * 5000.0);
		}
		let settled = s.layout.clone().unwrap();
		assert!(settled.stabilized);
		assert!(settled.alpha < initial.alpha);
		// a stopped engine keeps the last snapshot on screen
		s.tick(frames + 16.0);
		assert!(s.layout.as_ref().is_some_and(|l| l.stabilized));

		s.set_graph(KnowledgeGraph::default());
		assert!(s.layout.is_none());
	}
}
