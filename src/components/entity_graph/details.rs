use leptos::prelude::*;

use super::selection::{EdgeDetails, NodeDetails, SelectionDetails};
use super::style::{glyph, node_color};
use super::types::EntityType;

/// Side panel describing the selected node or edge. Closing it clears the
/// signal; the canvas mirrors that back into its selection state.
#[component]
pub fn DetailPanel(details: RwSignal<Option<SelectionDetails>>) -> impl IntoView {
	view! {
		{move || {
			details
				.get()
				.map(|selected| {
					let body = match selected {
						SelectionDetails::Node(node) => node_view(node).into_any(),
						SelectionDetails::Edge(edge) => edge_view(edge).into_any(),
					};
					view! {
						<aside class="entity-graph-details">
							<button
								class="entity-graph-details-close"
								title="Close"
								on:click=move |_| details.set(None)
							>
								"×"
							</button>
							{body}
						</aside>
					}
				})
		}}
	}
}

fn glyph_badge(kind: EntityType, class: &'static str) -> impl IntoView {
	view! {
		<div class=class style:background-color=node_color(kind)>
			{glyph(kind)}
		</div>
	}
}

fn node_view(node: NodeDetails) -> impl IntoView {
	let relations = node
		.relations
		.into_iter()
		.map(|rel| {
			view! {
				<li class="entity-graph-relation">
					<span class="entity-graph-relation-arrow">
						{if rel.outgoing { "→" } else { "←" }}
					</span>
					<span>
						<strong>{rel.relation}</strong>
						" "
						{rel.other}
					</span>
				</li>
			}
		})
		.collect_view();

	view! {
		<div class="entity-graph-node-details">
			{glyph_badge(node.kind, "entity-graph-glyph-large")}
			<h4>{node.id}</h4>
			<span class="entity-graph-badge">{node.kind.as_str()}</span>
			<section>
				<h5>"Metadata"</h5>
				<p>{node.details}</p>
			</section>
			<section>
				<h5>"Connected Relations"</h5>
				<ul>{relations}</ul>
			</section>
		</div>
	}
}

fn edge_view(edge: EdgeDetails) -> impl IntoView {
	view! {
		<div class="entity-graph-edge-details">
			<div class="entity-graph-endpoints">
				{glyph_badge(edge.source.kind, "entity-graph-glyph")}
				<span>"→"</span>
				{glyph_badge(edge.target.kind, "entity-graph-glyph")}
			</div>
			<h4>{edge.relation}</h4>
			<div class="entity-graph-endpoint-names">
				<strong>{edge.source.id}</strong>
				<span>"to"</span>
				<strong>{edge.target.id}</strong>
			</div>
			<section class="entity-graph-evidence">
				<h5>"Evidence"</h5>
				<p>
					<em>"“"{edge.evidence}"”"</em>
				</p>
			</section>
		</div>
	}
}
