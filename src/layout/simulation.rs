//! Velocity-Verlet force simulation in the style of d3-force.
//!
//! The arena is mutated in place every tick. Only [`super::engine`] touches
//! it; the outside world sees cloned snapshots.

use std::collections::HashMap;
use std::rc::Rc;

use rand::Rng;
use rand::rngs::SmallRng;

use crate::graph::{GraphEdge, GraphNode};

use super::config::LayoutConfig;
use super::constants::LAYER_COUNT;

/// A graph node with live simulation state.
#[derive(Clone, Debug)]
pub struct SimulationNode {
	/// The graph node being placed.
	pub node: Rc<GraphNode>,
	/// Position in graph units.
	pub x: f64,
	/// Position in graph units.
	pub y: f64,
	/// Velocity carried into the next tick.
	pub vx: f64,
	/// Velocity carried into the next tick.
	pub vy: f64,
	/// Pinned position, set while dragging.
	pub fx: Option<f64>,
	/// Pinned position, set while dragging.
	pub fy: Option<f64>,
	/// Band the node is pulled toward.
	pub layer: u8,
}

impl SimulationNode {
	/// Id of the underlying graph node.
	pub fn id(&self) -> &str {
		&self.node.id
	}
}

/// One end of a [`SimulationEdge`]: the raw node id until the simulation
/// resolves it to an index into the node list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeEnd {
	/// Unresolved node id.
	Id(String),
	/// Index into the simulation's node list.
	Node(usize),
}

/// A graph edge between two simulated nodes.
#[derive(Clone, Debug)]
pub struct SimulationEdge {
	/// The graph edge being drawn.
	pub edge: Rc<GraphEdge>,
	/// Source end.
	pub source: EdgeEnd,
	/// Target end.
	pub target: EdgeEnd,
}

impl SimulationEdge {
	/// Unresolved edge; both ends hold ids.
	pub fn new(edge: Rc<GraphEdge>) -> Self {
		Self {
			source: EdgeEnd::Id(edge.source_node_id.clone()),
			target: EdgeEnd::Id(edge.target_node_id.clone()),
			edge,
		}
	}

	/// Id of the source node.
	pub fn source_id(&self) -> &str {
		&self.edge.source_node_id
	}

	/// Id of the target node.
	pub fn target_id(&self) -> &str {
		&self.edge.target_node_id
	}

	/// Node indices, once resolved.
	pub fn endpoints(&self) -> Option<(usize, usize)> {
		match (&self.source, &self.target) {
			(EdgeEnd::Node(s), EdgeEnd::Node(t)) => Some((*s, *t)),
			_ => None,
		}
	}
}

/// Tiny random offset that splits coincident nodes apart.
fn jiggle(rng: &mut SmallRng) -> f64 {
	(rng.random::<f64>() - 0.5) * 1e-6
}

/// Height of one layer band.
pub(crate) fn layer_band(height: f64) -> f64 {
	height / LAYER_COUNT as f64
}

#[derive(Clone, Debug)]
struct Link {
	source: usize,
	target: usize,
	distance: f64,
	strength: f64,
	bias: f64,
}

pub(crate) struct Simulation {
	nodes: Vec<SimulationNode>,
	edges: Vec<SimulationEdge>,
	links: Vec<Link>,
	radii: Vec<f64>,
	config: LayoutConfig,
	band: f64,
	center_x: f64,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	ticks: u64,
	rng: SmallRng,
}

impl Simulation {
	/// Resolves edge endpoints against `nodes` and drops edges whose
	/// endpoints are missing. Returns the simulation and the number dropped.
	pub(crate) fn new(
		nodes: Vec<SimulationNode>,
		edges: Vec<SimulationEdge>,
		config: &LayoutConfig,
		width: f64,
		height: f64,
		rng: SmallRng,
	) -> (Self, usize) {
		let index: HashMap<&str, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id(), i))
			.collect();

		let total = edges.len();
		let resolved: Vec<SimulationEdge> = edges
			.into_iter()
			.filter_map(|mut e| {
				let s = *index.get(e.source_id())?;
				let t = *index.get(e.target_id())?;
				e.source = EdgeEnd::Node(s);
				e.target = EdgeEnd::Node(t);
				Some(e)
			})
			.collect();
		let dropped = total - resolved.len();

		let mut degree = vec![0usize; nodes.len()];
		for (s, t) in resolved.iter().filter_map(SimulationEdge::endpoints) {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = resolved
			.iter()
			.filter_map(|e| {
				let (source, target) = e.endpoints()?;
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Some(Link {
					source,
					target,
					distance: e
						.edge
						.edge_type
						.style()
						.distance
						.unwrap_or(config.default_link_distance),
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				})
			})
			.collect();

		let radii = nodes
			.iter()
			.map(|n| n.node.node_type.radius() + config.collision_padding)
			.collect();

		let simulation = Self {
			nodes,
			edges: resolved,
			links,
			radii,
			config: config.clone(),
			band: layer_band(height),
			center_x: width / 2.0,
			alpha: 1.0,
			alpha_target: 0.0,
			running: true,
			ticks: 0,
			rng,
		};
		(simulation, dropped)
	}

	pub(crate) fn nodes(&self) -> &[SimulationNode] {
		&self.nodes
	}

	pub(crate) fn nodes_mut(&mut self) -> &mut [SimulationNode] {
		&mut self.nodes
	}

	pub(crate) fn edges(&self) -> &[SimulationEdge] {
		&self.edges
	}

	pub(crate) fn alpha(&self) -> f64 {
		self.alpha
	}

	pub(crate) fn ticks(&self) -> u64 {
		self.ticks
	}

	pub(crate) fn is_running(&self) -> bool {
		self.running
	}

	pub(crate) fn stop(&mut self) {
		self.running = false;
	}

	/// Sets alpha and resumes ticking.
	pub(crate) fn restart_with_alpha(&mut self, alpha: f64) {
		self.alpha = alpha;
		self.running = true;
	}

	pub(crate) fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	pub(crate) fn restart(&mut self) {
		self.running = true;
	}

	/// Advances one tick. Returns false once alpha has decayed below the
	/// stop threshold, after which the simulation no longer runs.
	pub(crate) fn tick(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_collision();
		self.apply_positioning(alpha);

		let retain = 1.0 - self.config.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= retain;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= retain;
					node.y += node.vy;
				}
			}
		}
		self.ticks += 1;

		if self.alpha < self.config.alpha_min {
			self.running = false;
		}
		self.running
	}

	fn apply_links(&mut self, alpha: f64) {
		for link in &self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = jiggle(&mut self.rng);
			}
			if y == 0.0 {
				y = jiggle(&mut self.rng);
			}
			let mut l = (x * x + y * y).sqrt();
			l = (l - link.distance) / l * alpha * link.strength;
			x *= l;
			y *= l;

			let target = &mut self.nodes[link.target];
			target.vx -= x * link.bias;
			target.vy -= y * link.bias;
			let source = &mut self.nodes[link.source];
			source.vx += x * (1.0 - link.bias);
			source.vy += y * (1.0 - link.bias);
		}
	}

	/// Exact pairwise many-body force. Graphs here are tens to hundreds of
	/// nodes, so no Barnes-Hut approximation.
	fn apply_charge(&mut self, alpha: f64) {
		let strength = self.config.charge_strength;
		let n = self.nodes.len();
		for i in 0..n {
			let (xi, yi) = (self.nodes[i].x, self.nodes[i].y);
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.nodes[j].x - xi;
				let mut y = self.nodes[j].y - yi;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = jiggle(&mut self.rng);
					l += x * x;
				}
				if y == 0.0 {
					y = jiggle(&mut self.rng);
					l += y * y;
				}
				// distanceMin of 1
				if l < 1.0 {
					l = l.sqrt();
				}
				dvx += x * strength * alpha / l;
				dvy += y * strength * alpha / l;
			}
			self.nodes[i].vx += dvx;
			self.nodes[i].vy += dvy;
		}
	}

	fn apply_collision(&mut self) {
		let n = self.nodes.len();
		for i in 0..n {
			let ri = self.radii[i];
			let ri2 = ri * ri;
			let xi = self.nodes[i].x + self.nodes[i].vx;
			let yi = self.nodes[i].y + self.nodes[i].vy;
			for j in (i + 1)..n {
				let rj = self.radii[j];
				let r = ri + rj;
				let other = &self.nodes[j];
				let mut x = xi - other.x - other.vx;
				let mut y = yi - other.y - other.vy;
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = jiggle(&mut self.rng);
					l += x * x;
				}
				if y == 0.0 {
					y = jiggle(&mut self.rng);
					l += y * y;
				}
				let dist = l.sqrt();
				let push = (r - dist) / dist;
				x *= push;
				y *= push;
				let rj2 = rj * rj;
				let share = rj2 / (ri2 + rj2);

				let node = &mut self.nodes[i];
				node.vx += x * share;
				node.vy += y * share;
				let other = &mut self.nodes[j];
				other.vx -= x * (1.0 - share);
				other.vy -= y * (1.0 - share);
			}
		}
	}

	/// Layer snap on Y, centering on X.
	fn apply_positioning(&mut self, alpha: f64) {
		let (band, center_x) = (self.band, self.center_x);
		let (layer_k, center_k) = (self.config.layer_strength, self.config.center_x_strength);
		for node in &mut self.nodes {
			let target_y = node.layer as f64 * band + band / 2.0;
			node.vy += (target_y - node.y) * layer_k * alpha;
			node.vx += (center_x - node.x) * center_k * alpha;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{EdgeType, NodeType};
	use chrono::{TimeZone, Utc};
	use rand::SeedableRng;

	fn rng(seed: u64) -> SmallRng {
		SmallRng::seed_from_u64(seed)
	}

	fn node(id: &str, node_type: NodeType, x: f64, y: f64) -> SimulationNode {
		SimulationNode {
			node: Rc::new(GraphNode {
				id: id.to_owned(),
				node_type,
				label: id.to_owned(),
				verse_key: None,
				surah_id: None,
				metadata: Default::default(),
				created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
			}),
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			layer: node_type.layer(),
		}
	}

	fn edge(id: &str, source: &str, target: &str) -> SimulationEdge {
		SimulationEdge::new(Rc::new(GraphEdge {
			id: id.to_owned(),
			source_node_id: source.to_owned(),
			target_node_id: target.to_owned(),
			edge_type: EdgeType::References,
			weight: 1.0,
			created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
		}))
	}

	fn run(sim: &mut Simulation) {
		for _ in 0..2000 {
			if !sim.tick() {
				break;
			}
		}
	}

	#[test]
	fn dangling_edges_are_dropped() {
		let nodes = vec![node("a", NodeType::Note, 10.0, 10.0), node("b", NodeType::Verse, 50.0, 50.0)];
		let edges = vec![edge("e1", "a", "b"), edge("e2", "a", "gone")];
		let (sim, dropped) = Simulation::new(nodes, edges, &LayoutConfig::default(), 700.0, 700.0, rng(1));
		assert_eq!(dropped, 1);
		assert_eq!(sim.edges().len(), 1);
		assert_eq!(sim.edges()[0].endpoints(), Some((0, 1)));
	}

	#[test]
	fn coincident_nodes_settle_to_finite_positions() {
		let nodes = (0..6)
			.map(|i| node(&format!("n{i}"), NodeType::Verse, 100.0, 100.0))
			.collect();
		let edges = vec![edge("e", "n0", "n1")];
		let (mut sim, _) = Simulation::new(nodes, edges, &LayoutConfig::default(), 700.0, 700.0, rng(3));
		run(&mut sim);
		assert!(!sim.is_running());
		for n in sim.nodes() {
			assert!(n.x.is_finite() && n.y.is_finite(), "{} at {},{}", n.id(), n.x, n.y);
		}
		// repulsion spread them out
		assert!(sim.nodes().iter().any(|n| (n.x - 100.0).abs() > 1.0));
	}

	#[test]
	fn nodes_drift_toward_their_layer() {
		let nodes = vec![
			node("c", NodeType::Concept, 200.0, 350.0),
			node("t", NodeType::Theme, 500.0, 350.0),
		];
		let (mut sim, _) = Simulation::new(nodes, vec![], &LayoutConfig::default(), 700.0, 700.0, rng(5));
		run(&mut sim);
		let (concept, theme) = (&sim.nodes()[0], &sim.nodes()[1]);
		assert!(concept.y < 350.0 && theme.y > 350.0, "concept {} theme {}", concept.y, theme.y);
	}

	#[test]
	fn pinned_node_stays_put() {
		let mut nodes = vec![node("a", NodeType::Note, 10.0, 10.0), node("b", NodeType::Verse, 20.0, 20.0)];
		nodes[0].fx = Some(123.0);
		nodes[0].fy = Some(45.0);
		let (mut sim, _) = Simulation::new(nodes, vec![edge("e", "a", "b")], &LayoutConfig::default(), 700.0, 700.0, rng(9));
		for _ in 0..10 {
			sim.tick();
		}
		assert_eq!((sim.nodes()[0].x, sim.nodes()[0].y), (123.0, 45.0));
	}

	#[test]
	fn alpha_target_keeps_it_running() {
		let nodes = vec![node("a", NodeType::Note, 10.0, 10.0)];
		let (mut sim, _) = Simulation::new(nodes, vec![], &LayoutConfig::default(), 700.0, 700.0, rng(2));
		sim.set_alpha_target(0.3);
		for _ in 0..2000 {
			sim.tick();
		}
		assert!(sim.is_running());
		assert!((sim.alpha() - 0.3).abs() < 0.01);
	}

	#[test]
	fn same_seed_splits_coincident_nodes_identically() {
		let settle = |seed| {
			let nodes = (0..4)
				.map(|i| node(&format!("n{i}"), NodeType::Note, 50.0, 50.0))
				.collect();
			let (mut sim, _) = Simulation::new(nodes, vec![], &LayoutConfig::default(), 700.0, 700.0, rng(seed));
			run(&mut sim);
			sim.nodes().iter().map(|n| (n.x, n.y)).collect::<Vec<_>>()
		};
		assert_eq!(settle(42), settle(42));
		assert_ne!(settle(42), settle(43));
	}

	#[test]
	fn jiggle_is_tiny() {
		let mut rng = rng(7);
		for _ in 0..100 {
			assert!(jiggle(&mut rng).abs() <= 0.5e-6);
		}
	}
}
