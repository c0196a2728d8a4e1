use leptos::prelude::*;

use crate::components::graph_view::GraphView;

/// Print page: the main map next to one thematic minimap per metric, all
/// exported together.
#[component]
pub fn ExportPage() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Export unavailable"</h1>
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
			<div class="export-graph">
				<GraphView minimaps=true />
			</div>
		</ErrorBoundary>
	}
}
