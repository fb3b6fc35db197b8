use leptos::prelude::*;

use crate::components::entity_graph::EntityGraphCanvas;
use crate::report::GraphReport;

const SAMPLE_REPORT: &str = include_str!("../../assets/sample_report.json");

/// Report view showing the entity knowledge graph of the bundled sample.
#[component]
pub fn Home() -> impl IntoView {
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

			<div class="report-graph">
				<div class="graph-overlay">
					<h1>"Entity Knowledge Graph"</h1>
					<p class="subtitle">"Interactive Forensics"</p>
				</div>
				{move || {
					GraphReport::from_json(SAMPLE_REPORT)
						.map(|report| {
							let GraphReport { entities, entity_relationships } = report;
							view! {
								<EntityGraphCanvas
									entities=Signal::derive(move || entities.clone())
									relationships=Signal::derive(move || entity_relationships.clone())
								/>
							}
						})
				}}
			</div>
		</ErrorBoundary>
	}
}
