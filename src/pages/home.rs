use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};

use crate::components::force_graph::ForceGraphCanvas;
use crate::graph::{
	BookmarkSource, GraphBuilder, GraphError, GraphFilter, KnowledgeGraph, NodeType, NoteSource,
	OntologyEnricher, OntologyTables, active_node_types, compute_stats,
};

use super::sample::SampleData;

/// Numbers graph requests so that only the newest one may publish.
#[derive(Clone, Default)]
struct LatestRequest(Rc<Cell<u64>>);

impl LatestRequest {
	fn issue(&self) -> u64 {
		let ticket = self.0.get() + 1;
		self.0.set(ticket);
		ticket
	}

	fn is_current(&self, ticket: u64) -> bool {
		self.0.get() == ticket
	}
}

/// Knowledge graph explorer over the sample collaborators
#[component]
pub fn Home() -> impl IntoView {
	let SampleData {
		bookmarks,
		notes,
		ontology,
	} = SampleData::new();
	let tags = notes.tags();
	let bookmarks: Rc<dyn BookmarkSource> = Rc::new(bookmarks);
	let notes: Rc<dyn NoteSource> = Rc::new(notes);
	let builder = Rc::new(GraphBuilder::new(bookmarks, notes));

	let (active_tag, set_active_tag) = signal(None::<String>);
	let (with_hadiths, set_with_hadiths) = signal(false);
	let (with_concepts, set_with_concepts) = signal(false);
	let (with_topics, set_with_topics) = signal(false);
	let (graph, set_graph) = signal(KnowledgeGraph::default());
	let (load_error, set_load_error) = signal(None::<Arc<GraphError>>);

	let (visible_types, set_visible_types) = signal(NodeType::ALL.into_iter().collect::<HashSet<_>>());
	let (search, set_search) = signal(String::new());
	let (show_labels, set_show_labels) = signal(true);
	let (show_particles, set_show_particles) = signal(false);
	let (reset, set_reset) = signal(0u32);

	let latest = LatestRequest::default();
	Effect::new(move |_| {
		let filter = match active_tag.get() {
			Some(tag) => GraphFilter::by_tag(tag),
			None => GraphFilter::all(),
		};
		let (hadiths, concepts, topics) = (with_hadiths.get(), with_concepts.get(), with_topics.get());
		let tables = OntologyTables {
			verse_hadiths: ontology.verse_hadiths.clone().filter(|_| hadiths),
			verse_concepts: ontology.verse_concepts.clone().filter(|_| concepts),
			hadith_topics: ontology.hadith_topics.clone().filter(|_| topics),
		};
		let builder = builder.clone();
		let latest = latest.clone();
		let ticket = latest.issue();
		spawn_local(async move {
			let result = builder.generate_graph(&filter).await;
			if !latest.is_current(ticket) {
				debug!("dropping graph for superseded request {ticket}");
				return;
			}
			match result {
				Ok(base) => {
					set_graph.set(OntologyEnricher::new(tables).enrich(base));
					set_load_error.set(None);
				}
				Err(e) => {
					error!("graph generation failed: {e}");
					set_load_error.set(Some(Arc::new(e)));
				}
			}
		});
	});

	let stats = Memo::new(move |_| compute_stats(&graph.get()));
	let present = Memo::new(move |_| active_node_types(&graph.get()));

	let toggle_type = move |node_type: NodeType| {
		set_visible_types.update(|types| {
			if !types.remove(&node_type) {
				types.insert(node_type);
			}
		});
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{move || match load_error.get() {
				Some(e) => Err(e),
				None => Ok(()),
			}}

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					graph=graph
					visible_types=visible_types
					search=search
					active_tag=active_tag
					show_labels=show_labels
					show_particles=show_particles
					reset=reset
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Knowledge Graph"</h1>
					<p class="subtitle">
						"Hover to highlight neighbours, click to lock. Drag nodes, scroll to zoom, drag the background to pan."
					</p>

					<div class="graph-controls">
						<select on:change=move |ev| {
							let tag = event_target_value(&ev);
							set_active_tag.set((!tag.is_empty()).then_some(tag));
						}>
							<option value="">"All tags"</option>
							{tags
								.into_iter()
								.map(|tag| view! { <option value=tag.clone()>{tag.clone()}</option> })
								.collect_view()}
						</select>

						<label>
							<input
								type="checkbox"
								prop:checked=with_hadiths
								on:change=move |ev| set_with_hadiths.set(event_target_checked(&ev))
							/>
							"Related hadith"
						</label>
						<label>
							<input
								type="checkbox"
								prop:checked=with_concepts
								on:change=move |ev| set_with_concepts.set(event_target_checked(&ev))
							/>
							"Quranic concepts"
						</label>
						<label>
							<input
								type="checkbox"
								prop:checked=with_topics
								on:change=move |ev| set_with_topics.set(event_target_checked(&ev))
							/>
							"Hadith topics"
						</label>

						<input
							type="search"
							placeholder="Search nodes..."
							on:input=move |ev| set_search.set(event_target_value(&ev))
						/>

						<label>
							<input
								type="checkbox"
								prop:checked=show_labels
								on:change=move |ev| set_show_labels.set(event_target_checked(&ev))
							/>
							"Labels"
						</label>
						<label>
							<input
								type="checkbox"
								prop:checked=show_particles
								on:change=move |ev| set_show_particles.set(event_target_checked(&ev))
							/>
							"Particles"
						</label>
						<button on:click=move |_| set_reset.update(|n| *n += 1)>"Reset view"</button>
					</div>

					<ul class="graph-legend">
						{move || {
							present
								.get()
								.into_iter()
								.map(|node_type| {
									let style = node_type.style();
									let hidden = move || !visible_types.get().contains(&node_type);
									view! {
										<li class:hidden=hidden on:click=move |_| toggle_type(node_type)>
											<span
												class="swatch"
												style=format!("background: {}", style.color)
											></span>
											{style.legend}
											" "
											{move || stats.get().nodes_of(node_type)}
										</li>
									}
								})
								.collect_view()
						}}
					</ul>
					<p class="graph-totals">
						{move || {
							let s = stats.get();
							format!("{} nodes, {} edges", s.total_nodes, s.total_edges)
						}}
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn superseded_request_may_not_publish() {
		let latest = LatestRequest::default();
		let first = latest.issue();
		let second = latest.issue();
		// the newer request lands first, then the older one arrives late
		assert!(latest.is_current(second));
		assert!(!latest.is_current(first));

		let third = latest.clone().issue();
		assert!(!latest.is_current(second));
		assert!(latest.is_current(third));
	}
}
