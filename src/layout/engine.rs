//! Generation bookkeeping around the force simulation.
//!
//! One [`Simulation`] lives per (node-id set, edge-id set, canvas size). A
//! change to any of those rebuilds it; the previous instance is stopped
//! before the next one is created, so two never tick at once.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::graph::KnowledgeGraph;

use super::config::LayoutConfig;
use super::simulation::{Simulation, SimulationEdge, SimulationNode, layer_band};

/// Extra hit-test slack around a node, in graph units.
const HIT_SLACK: f64 = 3.0;
/// Share of the canvas width used for initial horizontal scatter.
const SCATTER_X: f64 = 0.6;
/// Share of a layer band used for initial vertical scatter.
const SCATTER_Y: f64 = 0.5;

/// Outcome of [`ForceLayoutEngine::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutChange {
	/// No nodes or a zero-sized canvas; nothing is simulated.
	Cleared,
	/// Same nodes, edges and size as the running generation.
	Unchanged,
	/// A new generation was started.
	Rebuilt {
		/// Nodes kept their previous coordinates.
		preserved_positions: bool,
		/// Edges skipped because an endpoint is not in the node set.
		dropped_edges: usize,
	},
}

/// Immutable copy of the layout at one tick.
#[derive(Clone, Debug)]
pub struct LayoutSnapshot {
	/// Positioned nodes.
	pub nodes: Vec<SimulationNode>,
	/// Edges with both endpoints resolved.
	pub edges: Vec<SimulationEdge>,
	/// Simulation heat at this tick.
	pub alpha: f64,
	/// Alpha fell below its minimum; no further ticks follow.
	pub stabilized: bool,
}

/// Owns the simulation for one view and rebuilds it when the graph or canvas changes.
pub struct ForceLayoutEngine {
	config: LayoutConfig,
	simulation: Option<Simulation>,
	index: HashMap<String, usize>,
	node_key: Vec<String>,
	edge_key: Vec<String>,
	size: (f64, f64),
	generation: u64,
	stabilized: bool,
	rng: SmallRng,
}

impl ForceLayoutEngine {
	/// Engine with nothing to lay out yet.
	pub fn new(config: LayoutConfig) -> Self {
		let rng = SmallRng::seed_from_u64(config.seed);
		Self {
			config,
			simulation: None,
			index: HashMap::new(),
			node_key: Vec::new(),
			edge_key: Vec::new(),
			size: (0.0, 0.0),
			generation: 0,
			stabilized: false,
			rng,
		}
	}

	/// Tuning in use.
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Bumped on every rebuild.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Brings the simulation in line with `graph` on a `width` x `height`
	/// canvas.
	pub fn update(&mut self, graph: &KnowledgeGraph, width: f64, height: f64) -> LayoutChange {
		if graph.nodes.is_empty() || width <= 0.0 || height <= 0.0 {
			if self.simulation.is_some() {
				debug!("layout cleared ({} nodes, {width}x{height})", graph.nodes.len());
			}
			self.clear();
			return LayoutChange::Cleared;
		}

		let mut node_key: Vec<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
		node_key.sort();
		node_key.dedup();
		let mut edge_key: Vec<String> = graph.edges.iter().map(|e| e.id.clone()).collect();
		edge_key.sort();

		if self.simulation.is_some()
			&& node_key == self.node_key
			&& edge_key == self.edge_key
			&& (width, height) == self.size
		{
			return LayoutChange::Unchanged;
		}

		let previous: HashMap<String, (f64, f64)> = match &self.simulation {
			Some(sim) if node_key == self.node_key => sim
				.nodes()
				.iter()
				.map(|n| (n.id().to_owned(), (n.x, n.y)))
				.collect(),
			_ => HashMap::new(),
		};
		if let Some(sim) = self.simulation.as_mut() {
			sim.stop();
		}
		self.simulation = None;

		let band = layer_band(height);
		let mut seen = HashSet::new();
		let mut nodes = Vec::with_capacity(node_key.len());
		for node in &graph.nodes {
			if !seen.insert(node.id.as_str()) {
				continue;
			}
			let layer = node.node_type.layer();
			let (x, y) = match previous.get(&node.id) {
				Some(&position) => position,
				None => (
					width / 2.0 + self.rng.random_range(-0.5..0.5) * width * SCATTER_X,
					layer as f64 * band + band / 2.0 + self.rng.random_range(-0.5..0.5) * band * SCATTER_Y,
				),
			};
			nodes.push(SimulationNode {
				node: Rc::new(node.clone()),
				x,
				y,
				vx: 0.0,
				vy: 0.0,
				fx: None,
				fy: None,
				layer,
			});
		}
		let edges = graph
			.edges
			.iter()
			.map(|e| SimulationEdge::new(Rc::new(e.clone())))
			.collect();

		let (simulation, dropped_edges) =
			Simulation::new(nodes, edges, &self.config, width, height, self.rng.clone());
		if dropped_edges > 0 {
			warn!("dropped {dropped_edges} edges with missing endpoints");
		}
		self.index = simulation
			.nodes()
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id().to_owned(), i))
			.collect();
		self.simulation = Some(simulation);
		self.node_key = node_key;
		self.edge_key = edge_key;
		self.size = (width, height);
		self.generation += 1;
		self.stabilized = false;

		let preserved_positions = !previous.is_empty();
		debug!(
			"layout rebuilt: generation {}, {} nodes, preserved positions: {preserved_positions}",
			self.generation,
			self.index.len()
		);
		LayoutChange::Rebuilt {
			preserved_positions,
			dropped_edges,
		}
	}

	fn clear(&mut self) {
		if let Some(sim) = self.simulation.as_mut() {
			sim.stop();
		}
		self.simulation = None;
		self.index.clear();
		self.node_key.clear();
		self.edge_key.clear();
		self.size = (0.0, 0.0);
		self.stabilized = false;
	}

	/// Kicks the current simulation back to the reheat alpha without
	/// touching positions. Returns false when there is nothing to reheat.
	pub fn reheat(&mut self) -> bool {
		let Some(sim) = self.simulation.as_mut() else {
			return false;
		};
		sim.restart_with_alpha(self.config.reheat_alpha);
		self.stabilized = false;
		debug!("layout reheated to alpha {}", self.config.reheat_alpha);
		true
	}

	/// Advances one tick and returns the new layout, or `None` when there is
	/// no running simulation.
	pub fn step(&mut self) -> Option<LayoutSnapshot> {
		let sim = self.simulation.as_mut()?;
		if !sim.is_running() {
			return None;
		}
		if !sim.tick() {
			self.stabilized = true;
			info!("layout stabilized after {} ticks", sim.ticks());
		}
		self.snapshot()
	}

	/// Copy of the current layout without ticking.
	pub fn snapshot(&self) -> Option<LayoutSnapshot> {
		let sim = self.simulation.as_ref()?;
		Some(LayoutSnapshot {
			nodes: sim.nodes().to_vec(),
			edges: sim.edges().to_vec(),
			alpha: sim.alpha(),
			stabilized: self.stabilized,
		})
	}

	/// Live view of the current nodes, empty when cleared.
	pub fn nodes(&self) -> &[SimulationNode] {
		match &self.simulation {
			Some(sim) => sim.nodes(),
			None => &[],
		}
	}

	/// Live view of the current edges, empty when cleared.
	pub fn edges(&self) -> &[SimulationEdge] {
		match &self.simulation {
			Some(sim) => sim.edges(),
			None => &[],
		}
	}

	/// A simulation exists and is still ticking.
	pub fn is_running(&self) -> bool {
		self.simulation.as_ref().is_some_and(Simulation::is_running)
	}

	/// The current simulation reached its stop condition on its own.
	pub fn is_stabilized(&self) -> bool {
		self.stabilized
	}

	/// Halts ticking without discarding positions.
	pub fn stop(&mut self) {
		if let Some(sim) = self.simulation.as_mut() {
			sim.stop();
		}
	}

	/// Live node by id.
	pub fn node(&self, id: &str) -> Option<&SimulationNode> {
		let &i = self.index.get(id)?;
		self.nodes().get(i)
	}

	/// Current position of a node.
	pub fn node_position(&self, id: &str) -> Option<(f64, f64)> {
		self.node(id).map(|n| (n.x, n.y))
	}

	/// Top-most node under a point in graph coordinates.
	pub fn node_at(&self, x: f64, y: f64) -> Option<&SimulationNode> {
		self.nodes().iter().rev().find(|n| {
			let r = n.node.node_type.radius() + HIT_SLACK;
			let (dx, dy) = (n.x - x, n.y - y);
			dx * dx + dy * dy <= r * r
		})
	}

	fn node_mut(&mut self, id: &str) -> Option<&mut SimulationNode> {
		let &i = self.index.get(id)?;
		self.simulation.as_mut()?.nodes_mut().get_mut(i)
	}

	/// Fixes a node at `(x, y)` until [`unpin`](Self::unpin).
	pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
		let Some(node) = self.node_mut(id) else {
			return false;
		};
		node.fx = Some(x);
		node.fy = Some(y);
		node.x = x;
		node.y = y;
		true
	}

	/// Lets a pinned node move again.
	pub fn unpin(&mut self, id: &str) -> bool {
		let Some(node) = self.node_mut(id) else {
			return false;
		};
		node.fx = None;
		node.fy = None;
		true
	}

	/// A positive target keeps the simulation warm; zero lets it cool off.
	pub fn set_alpha_target(&mut self, target: f64) {
		let Some(sim) = self.simulation.as_mut() else {
			return;
		};
		sim.set_alpha_target(target);
		if target > 0.0 {
			sim.restart();
			self.stabilized = false;
		}
	}

	/// Pins the node where it stands and warms the simulation so its
	/// neighbours follow the drag.
	pub fn drag_start(&mut self, id: &str) -> bool {
		let Some((x, y)) = self.node_position(id) else {
			return false;
		};
		self.pin(id, x, y);
		self.set_alpha_target(self.config.drag_alpha_target);
		true
	}

	/// Moves the pin of a dragged node.
	pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> bool {
		self.pin(id, x, y)
	}

	/// Releases the pin so the node rejoins the simulation.
	pub fn drag_end(&mut self, id: &str) -> bool {
		self.set_alpha_target(0.0);
		self.unpin(id)
	}
}
