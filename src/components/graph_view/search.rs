//! Label search over the displayed nodes.

use crate::visual::DisplayGraph;

/// Duration of the camera move onto a found node, in ms.
pub const FOCUS_DURATION: f64 = 500.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suggestion {
	pub index: usize,
	pub label: String,
}

/// Labeled nodes, sorted by label, for the suggestions list.
pub fn suggestions(graph: &DisplayGraph) -> Vec<Suggestion> {
	let mut out: Vec<Suggestion> = graph
		.nodes()
		.iter()
		.enumerate()
		.filter(|(_, n)| !n.hidden && !n.label.is_empty())
		.map(|(index, n)| Suggestion {
			index,
			label: n.label.clone(),
		})
		.collect();
	out.sort_by(|a, b| a.label.cmp(&b.label).then(a.index.cmp(&b.index)));
	out
}

/// Outcome of typing into the search box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchResult {
	/// Empty query: clear the selection.
	Cleared,
	/// Exactly one label equals the query: select it.
	Selected(usize),
	/// No single exact match; the suggestions narrow down to these.
	Candidates(Vec<usize>),
}

pub fn search(graph: &DisplayGraph, query: &str) -> SearchResult {
	let query = query.trim();
	if query.is_empty() {
		return SearchResult::Cleared;
	}
	let needle = query.to_lowercase();
	let matches: Vec<Suggestion> = suggestions(graph)
		.into_iter()
		.filter(|s| s.label.to_lowercase().contains(&needle))
		.collect();
	let mut exact = matches.iter().filter(|s| s.label == query);
	if let (Some(only), None) = (exact.next(), exact.next()) {
		return SearchResult::Selected(only.index);
	}
	SearchResult::Candidates(matches.into_iter().map(|s| s.index).collect())
}

/// The search input, its suggestion list and the selection they drive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchBox {
	query: String,
	selected: Option<usize>,
	shown: Vec<String>,
}

impl SearchBox {
	pub fn new(graph: &DisplayGraph) -> Self {
		Self {
			shown: all_labels(graph),
			..Self::default()
		}
	}

	pub fn query(&self) -> &str {
		&self.query
	}

	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	/// Labels offered under the input.
	pub fn shown(&self) -> &[String] {
		&self.shown
	}

	/// Typed text. Anything but a single exact match drops the selection.
	pub fn input(&mut self, graph: &DisplayGraph, query: &str) -> SearchResult {
		self.query = query.to_string();
		let result = search(graph, query);
		match &result {
			SearchResult::Cleared => {
				self.selected = None;
				self.shown = all_labels(graph);
			}
			SearchResult::Selected(index) => {
				self.selected = Some(*index);
				self.shown.clear();
			}
			SearchResult::Candidates(found) => {
				self.selected = None;
				self.shown = found
					.iter()
					.filter_map(|&i| graph.node(i))
					.map(|n| n.label.clone())
					.collect();
			}
		}
		result
	}

	/// A click on a node writes its label; a click on the stage clears the query.
	pub fn click(&mut self, graph: &DisplayGraph, node: Option<usize>) {
		match node.and_then(|i| graph.node(i).map(|n| (i, n))) {
			Some((index, n)) => {
				self.query = n.label.clone();
				self.selected = Some(index);
			}
			None => {
				self.input(graph, "");
			}
		}
	}

	/// Leaving the input without a selection resets the query. Returns
	/// whether anything changed.
	pub fn blur(&mut self, graph: &DisplayGraph) -> bool {
		if self.selected.is_some() || self.query.is_empty() {
			return false;
		}
		self.input(graph, "");
		true
	}
}

fn all_labels(graph: &DisplayGraph) -> Vec<String> {
	suggestions(graph).into_iter().map(|s| s.label).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SiteConfig;
	use crate::graph::community::LocalMoving;
	use crate::graph::{Graph, NodeRecord, PreparedGraph};
	use crate::visual::{ViewState, VisualMapper};
	use std::rc::Rc;

	fn display(labels: &[&str]) -> DisplayGraph {
		let mut g = Graph::new(false);
		for (i, label) in labels.iter().enumerate() {
			let mut n = NodeRecord::new(i.to_string());
			n.label = label.to_string();
			n.position = Some((i as f64, 0.0));
			g.add_node(n);
		}
		let prepared = PreparedGraph {
			max_values: g.max_values(),
			annotated: g.clone(),
			positioned: g,
		};
		let config = Rc::new(SiteConfig::default());
		let view = ViewState::from(&config.view);
		VisualMapper::new(prepared, config, Box::new(LocalMoving::default())).apply(&view)
	}

	#[test]
	fn suggestions_are_sorted_and_skip_empty() {
		let g = display(&["serde", "", "anyhow", "tokio"]);
		let labels: Vec<_> = suggestions(&g).into_iter().map(|s| s.label).collect();
		assert_eq!(labels, vec!["anyhow", "serde", "tokio"]);
	}

	#[test]
	fn exact_label_selects_even_among_longer_matches() {
		let g = display(&["serde", "serde_json", "tokio"]);
		assert_eq!(search(&g, "tokio"), SearchResult::Selected(2));
		assert_eq!(search(&g, "serde"), SearchResult::Selected(0));
		assert_eq!(search(&g, "serd"), SearchResult::Candidates(vec![0, 1]));
		assert_eq!(search(&g, "SERDE_"), SearchResult::Candidates(vec![1]));
		assert_eq!(search(&g, "  "), SearchResult::Cleared);
		assert_eq!(search(&g, "rayon"), SearchResult::Candidates(vec![]));
	}

	#[test]
	fn duplicate_labels_do_not_select() {
		let g = display(&["serde", "serde"]);
		assert_eq!(search(&g, "serde"), SearchResult::Candidates(vec![0, 1]));
	}

	#[test]
	fn candidates_narrow_the_suggestions() {
		let g = display(&["serde", "serde_json", "tokio"]);
		let mut sb = SearchBox::new(&g);
		assert_eq!(sb.shown(), ["serde", "serde_json", "tokio"]);
		sb.input(&g, "ser");
		assert_eq!(sb.shown(), ["serde", "serde_json"]);
		sb.input(&g, "serde");
		assert_eq!(sb.selected(), Some(0));
		assert!(sb.shown().is_empty());
		sb.input(&g, "");
		assert_eq!(sb.shown().len(), 3);
	}

	#[test]
	fn miss_drops_the_selection() {
		let g = display(&["serde", "tokio"]);
		let mut sb = SearchBox::new(&g);
		sb.input(&g, "tokio");
		assert_eq!(sb.selected(), Some(1));
		sb.input(&g, "tok");
		assert_eq!(sb.selected(), None);
	}

	#[test]
	fn clicks_write_the_label_and_stage_clears() {
		let g = display(&["serde", "tokio"]);
		let mut sb = SearchBox::new(&g);
		sb.click(&g, Some(1));
		assert_eq!((sb.query(), sb.selected()), ("tokio", Some(1)));
		sb.click(&g, None);
		assert_eq!((sb.query(), sb.selected()), ("", None));
		assert_eq!(sb.shown().len(), 2);
	}

	#[test]
	fn blur_resets_only_without_selection() {
		let g = display(&["serde", "tokio"]);
		let mut sb = SearchBox::new(&g);
		sb.input(&g, "tokio");
		assert!(!sb.blur(&g));
		assert_eq!(sb.query(), "tokio");
		sb.input(&g, "to");
		assert!(sb.blur(&g));
		assert_eq!(sb.query(), "");
		assert!(!sb.blur(&g));
	}
}
