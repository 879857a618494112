use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use crate::graph::{KnowledgeGraph, NodeType};

use super::render;
use super::state::ForceGraphState;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;

fn now_ms() -> f64 {
	js_sys::Date::now()
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Pointer position relative to the canvas.
fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Runs `f` against the state once it exists.
fn with_state(state: &SharedState, f: impl FnOnce(&mut ForceGraphState)) {
	if let Some(ref mut s) = *state.borrow_mut() {
		f(s);
	}
}

/// Canvas view of a knowledge graph.
///
/// The animation loop starts once per mounted canvas. Prop changes are
/// pushed into the running state: a new `graph` or `visible_types` re-runs
/// the layout, a change of `active_tag` only reheats it, and bumping
/// `reset` animates the view back to identity.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] graph: Signal<KnowledgeGraph>,
	#[prop(into)] visible_types: Signal<HashSet<NodeType>>,
	#[prop(into)] search: Signal<String>,
	#[prop(into)] active_tag: Signal<Option<String>>,
	#[prop(into)] show_labels: Signal<bool>,
	#[prop(into)] show_particles: Signal<bool>,
	#[prop(into)] reset: Signal<u32>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| {
					parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("canvas has no 2d context");
				return;
			}
		};

		let mut initial = ForceGraphState::new(w, h);
		initial.show_labels = show_labels.get_untracked();
		initial.set_show_particles(show_particles.get_untracked());
		initial.set_visible_types(visible_types.get_untracked());
		initial.set_graph(graph.get_untracked());
		initial.interaction.set_search_query(&search.get_untracked(), now_ms());
		*state_init.borrow_mut() = Some(initial);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				with_state(&state_resize, |s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(now_ms());
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_graph = state.clone();
	Effect::new(move |_| {
		let g = graph.get();
		with_state(&state_graph, |s| s.set_graph(g));
	});

	let state_types = state.clone();
	Effect::new(move |_| {
		let types = visible_types.get();
		with_state(&state_types, |s| s.set_visible_types(types));
	});

	let state_search = state.clone();
	Effect::new(move |_| {
		let query = search.get();
		with_state(&state_search, |s| s.interaction.set_search_query(&query, now_ms()));
	});

	let state_tag = state.clone();
	Effect::new(move |prev: Option<Option<String>>| {
		let tag = active_tag.get();
		if prev.is_some_and(|p| p != tag) {
			with_state(&state_tag, |s| {
				s.engine.reheat();
			});
		}
		tag
	});

	let state_toggles = state.clone();
	Effect::new(move |_| {
		let (labels, particles) = (show_labels.get(), show_particles.get());
		with_state(&state_toggles, |s| {
			s.show_labels = labels;
			s.set_show_particles(particles);
		});
	});

	let state_reset = state.clone();
	Effect::new(move |prev: Option<u32>| {
		let count = reset.get();
		if prev.is_some_and(|p| p != count) {
			with_state(&state_reset, |s| s.interaction.reset_view(now_ms()));
		}
		count
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		with_state(&state_md, |s| s.pointer_down(x, y));
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		with_state(&state_mm, |s| s.pointer_move(x, y));
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		with_state(&state_mu, |s| {
			s.pointer_up();
		});
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_state(&state_ml, ForceGraphState::pointer_leave);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		with_state(&state_wh, |s| s.interaction.zoom_at(x, y, factor));
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
