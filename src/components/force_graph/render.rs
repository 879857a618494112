use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::layout::{LayoutSnapshot, PARTICLE_RADIUS, SimulationNode};

use super::state::ForceGraphState;

const BACKGROUND: &str = "#0f172a";
const LABEL_COLOR: &str = "#e2e8f0";
const TOOLTIP_BG: &str = "rgba(15, 23, 42, 0.92)";
/// Particles are skipped on edges fainter than this.
const PARTICLE_MIN_OPACITY: f64 = 0.1;

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	let t = state.interaction.transform();
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	if let Some(layout) = &state.layout {
		draw_edges(state, layout, ctx);
		draw_nodes(state, layout, ctx);
	}
	ctx.restore();

	if let Some(layout) = &state.layout {
		draw_tooltip(state, layout, ctx);
	}
}

fn dash_pattern(dash: &[f64]) -> js_sys::Array {
	dash.iter().map(|&d| JsValue::from_f64(d)).collect()
}

fn draw_edges(state: &ForceGraphState, layout: &LayoutSnapshot, ctx: &CanvasRenderingContext2d) {
	let nodes = &layout.nodes;
	for edge in &layout.edges {
		let Some((s, t)) = edge.endpoints() else {
			continue;
		};
		let (a, b) = (&nodes[s], &nodes[t]);
		let style = edge.edge.edge_type.style();
		let opacity = state.interaction.edge_opacity(a.id(), b.id(), style.opacity);

		ctx.set_global_alpha(opacity);
		ctx.set_stroke_style_str(style.color);
		ctx.set_line_width(style.width);
		let _ = ctx.set_line_dash(&dash_pattern(style.dash));
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();

		if state.show_particles && opacity > PARTICLE_MIN_OPACITY {
			let p = state.particle_phase;
			let (px, py) = (a.x + (b.x - a.x) * p, a.y + (b.y - a.y) * p);
			ctx.set_global_alpha(opacity.max(0.6));
			ctx.set_fill_style_str(style.color);
			ctx.begin_path();
			let _ = ctx.arc(px, py, PARTICLE_RADIUS, 0.0, 2.0 * PI);
			ctx.fill();
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_global_alpha(1.0);
}

fn is_focused(state: &ForceGraphState, node: &SimulationNode) -> bool {
	let id = node.id();
	state.interaction.locked() == Some(id)
		|| state.interaction.hovered().is_some_and(|h| h.id == id)
}

fn draw_nodes(state: &ForceGraphState, layout: &LayoutSnapshot, ctx: &CanvasRenderingContext2d) {
	let k = state.interaction.transform().k;

	for node in &layout.nodes {
		let style = node.node.node_type.style();
		let opacity = state.interaction.node_opacity(node.id());
		let (x, y, radius) = (node.x, node.y, style.radius);
		let focused = is_focused(state, node);

		ctx.set_global_alpha(opacity);
		if focused {
			let glow = radius * 2.4;
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow) {
				let _ = gradient.add_color_stop(0.0, "rgba(255, 255, 255, 0.35)");
				let _ = gradient.add_color_stop(0.6, "rgba(200, 220, 255, 0.1)");
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(style.color);
		ctx.fill();
		ctx.set_stroke_style_str(if focused { "#ffffff" } else { style.dim_color });
		ctx.set_line_width((if focused { 2.0 } else { 1.0 }) / k.max(0.5));
		ctx.stroke();

		if state.show_labels {
			ctx.set_fill_style_str(LABEL_COLOR);
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			ctx.set_text_align("center");
			let _ = ctx.fill_text(&node.node.label, x, y + radius + 11.0 / k.max(0.5));
		}
	}
	ctx.set_text_align("start");
	ctx.set_global_alpha(1.0);
}

/// Label, kind and degree of the hovered node, in screen space.
fn draw_tooltip(state: &ForceGraphState, layout: &LayoutSnapshot, ctx: &CanvasRenderingContext2d) {
	let Some(hovered) = state.interaction.hovered() else {
		return;
	};
	let Some(node) = layout.nodes.iter().find(|n| n.id() == hovered.id) else {
		return;
	};
	let connections = state.interaction.connection_count(&hovered.id);
	let lines = [
		node.node.label.clone(),
		node.node.node_type.style().legend.to_owned(),
		format!(
			"{connections} connection{}",
			if connections == 1 { "" } else { "s" }
		),
	];

	ctx.set_font("12px sans-serif");
	let width = lines
		.iter()
		.filter_map(|l| ctx.measure_text(l).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max)
		+ 16.0;
	let height = lines.len() as f64 * 16.0 + 10.0;
	let x = (hovered.screen_x + 12.0).min(state.width - width);
	let y = (hovered.screen_y + 12.0).min(state.height - height);

	ctx.set_fill_style_str(TOOLTIP_BG);
	ctx.fill_rect(x, y, width, height);
	ctx.set_fill_style_str(node.node.node_type.style().color);
	ctx.fill_rect(x, y, 3.0, height);
	ctx.set_fill_style_str(LABEL_COLOR);
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x + 8.0, y + 18.0 + i as f64 * 16.0);
	}
}
