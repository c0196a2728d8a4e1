//! Node and edge metrics.
//!
//! Attributes already present in the input are left alone unless the
//! provider computes the same name.

use petgraph::algo::page_rank;

use super::types::{Graph, STRENGTH};

/// Attaches named numeric attributes to nodes and edges in place.
pub trait MetricProvider {
	fn assign(&self, graph: &mut Graph);
}

/// Degree family, PageRank and simmelian strength.
#[derive(Clone, Debug)]
pub struct StandardMetrics {
	pub damping: f64,
	pub pagerank_iterations: usize,
}

impl Default for StandardMetrics {
	fn default() -> Self {
		Self {
			damping: 0.85,
			pagerank_iterations: 50,
		}
	}
}

impl MetricProvider for StandardMetrics {
	fn assign(&self, graph: &mut Graph) {
		let n = graph.node_count();
		if n == 0 {
			return;
		}
		let endpoints = graph.endpoints();
		let mut indegree = vec![0.0; n];
		let mut outdegree = vec![0.0; n];
		for &(s, t) in &endpoints {
			outdegree[s] += 1.0;
			indegree[t] += 1.0;
		}
		let norm = if n > 1 { (n - 1) as f64 } else { 1.0 };
		let ranks = page_rank(&graph.to_petgraph(), self.damping, self.pagerank_iterations);

		for (i, node) in graph.nodes_mut().iter_mut().enumerate() {
			let degree = indegree[i] + outdegree[i];
			let m = &mut node.metrics;
			m.insert("indegree".into(), indegree[i]);
			m.insert("outdegree".into(), outdegree[i]);
			m.insert("degree".into(), degree);
			m.insert("inDegreeCentrality".into(), indegree[i] / norm);
			m.insert("outDegreeCentrality".into(), outdegree[i] / norm);
			m.insert("degreeCentrality".into(), degree / norm);
			m.insert("pagerank".into(), ranks[i]);
		}

		let neighbors = graph.neighbor_sets();
		for (edge, (s, t)) in graph.edges_mut().iter_mut().zip(endpoints) {
			edge.metrics
				.insert(STRENGTH.into(), shared_neighbors(&neighbors[s], &neighbors[t]) as f64);
		}
	}
}

/// Count of common elements of two sorted lists.
fn shared_neighbors(a: &[usize], b: &[usize]) -> usize {
	let (mut i, mut j, mut count) = (0, 0, 0);
	while i < a.len() && j < b.len() {
		match a[i].cmp(&b[j]) {
			std::cmp::Ordering::Less => i += 1,
			std::cmp::Ordering::Greater => j += 1,
			std::cmp::Ordering::Equal => {
				count += 1;
				i += 1;
				j += 1;
			}
		}
	}
	count
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::types::{EdgeRecord, NodeRecord};

	fn triangle_with_tail() -> Graph {
		let mut g = Graph::new(true);
		for id in ["a", "b", "c", "d"] {
			g.add_node(NodeRecord::new(id));
		}
		for (s, t) in [("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")] {
			g.add_edge(EdgeRecord::new(s, t));
		}
		g
	}

	#[test]
	fn degrees() {
		let mut g = triangle_with_tail();
		StandardMetrics::default().assign(&mut g);
		let c = g.node("c").unwrap();
		assert_eq!(c.metric("indegree"), Some(1.0));
		assert_eq!(c.metric("outdegree"), Some(2.0));
		assert_eq!(c.metric("degree"), Some(3.0));
		assert_eq!(c.metric("degreeCentrality"), Some(1.0));
	}

	#[test]
	fn strength_counts_shared_neighbors() {
		let mut g = triangle_with_tail();
		StandardMetrics::default().assign(&mut g);
		let strengths: Vec<f64> = g.edges().iter().map(|e| e.strength()).collect();
		assert_eq!(strengths, vec![1.0, 1.0, 1.0, 0.0]);
	}

	#[test]
	fn pagerank_is_a_distribution() {
		let mut g = triangle_with_tail();
		StandardMetrics::default().assign(&mut g);
		let total: f64 = g.nodes().iter().filter_map(|n| n.metric("pagerank")).sum();
		assert!((total - 1.0).abs() < 1e-6, "sum = {}", total);
	}

	#[test]
	fn input_metrics_survive() {
		let mut g = triangle_with_tail();
		g.nodes_mut()[0].metrics.insert("betweennessCentrality".into(), 0.25);
		StandardMetrics::default().assign(&mut g);
		assert_eq!(g.node("a").unwrap().metric("betweennessCentrality"), Some(0.25));
	}
}
