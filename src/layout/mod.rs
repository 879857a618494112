//! Layered force layout and view interaction.
//!
//! [`ForceLayoutEngine`] turns a [`KnowledgeGraph`](crate::graph::KnowledgeGraph)
//! into positioned nodes, one simulation generation at a time.
//! [`InteractionController`] owns everything the pointer and the search box
//! change: hover, lock, drag, pan/zoom and the resulting opacities.

mod config;
mod constants;
mod engine;
mod interaction;
mod simulation;

pub use config::{InteractionConfig, LayoutConfig};
pub use constants::{
	EDGE_STYLES, EdgeStyle, LAYER_COUNT, NODE_STYLES, NodeStyle, PARTICLE_RADIUS, PARTICLE_SPEED,
};
pub use engine::{ForceLayoutEngine, LayoutChange, LayoutSnapshot};
pub use interaction::{HoveredNode, InteractionController, InteractionMode, ViewTransform};
pub use simulation::{EdgeEnd, SimulationEdge, SimulationNode};
