use leptos::prelude::*;

use crate::components::graph_view::GraphView;

/// Main map page.
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"The map could not be drawn"</h1>

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

			<div class="fullscreen-graph">
				<GraphView />
				<div class="graph-overlay">
					<h1>"Graph Atlas"</h1>
					<p class="subtitle">
						"Hover a node for its name, click to highlight its neighbors, double-click to open its homepage."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
