//! Community detection.

use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;

use super::seeded_rng;
use super::types::Graph;

/// Node id to community id.
pub type Communities = HashMap<String, usize>;

pub trait CommunityDetector {
	fn detect(&self, graph: &Graph, weight_attribute: &str, resolution: f64, seed: &str)
	-> Communities;
}

/// Modularity local moving: every node repeatedly joins the neighboring
/// community with the best modularity gain until a pass moves nothing.
///
/// Community ids are renumbered by first appearance in node order, so the
/// result only depends on the graph, the resolution and the seed.
#[derive(Clone, Debug)]
pub struct LocalMoving {
	pub max_passes: usize,
}

impl Default for LocalMoving {
	fn default() -> Self {
		Self { max_passes: 32 }
	}
}

impl CommunityDetector for LocalMoving {
	fn detect(
		&self,
		graph: &Graph,
		weight_attribute: &str,
		resolution: f64,
		seed: &str,
	) -> Communities {
		let n = graph.node_count();
		// Neighbor weights are summed in index order.
		let mut adjacency: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
		for ((s, t), edge) in graph.endpoints().into_iter().zip(graph.edges()) {
			if s == t {
				continue;
			}
			let w = edge.metric(weight_attribute).unwrap_or(edge.weight);
			if !(w > 0.0) {
				continue;
			}
			*adjacency[s].entry(t).or_default() += w;
			*adjacency[t].entry(s).or_default() += w;
		}
		let strength: Vec<f64> = adjacency.iter().map(|a| a.values().sum()).collect();
		let two_m: f64 = strength.iter().sum();

		let mut community: Vec<usize> = (0..n).collect();
		let mut totals = strength.clone();

		if two_m > 0.0 {
			let mut rng = seeded_rng(seed);
			let mut order: Vec<usize> = (0..n).collect();
			for _ in 0..self.max_passes {
				order.shuffle(&mut rng);
				let mut moved = false;
				for &i in &order {
					let current = community[i];
					let k_i = strength[i];
					totals[current] -= k_i;

					let mut links: BTreeMap<usize, f64> = BTreeMap::new();
					for (&j, &w) in &adjacency[i] {
						*links.entry(community[j]).or_default() += w;
					}
					let gain = |c: usize, k_in: f64| k_in - resolution * totals[c] * k_i / two_m;

					let mut best = current;
					let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
					for (c, k_in) in links {
						let g = gain(c, k_in);
						if g > best_gain {
							best = c;
							best_gain = g;
						}
					}

					totals[best] += k_i;
					if best != current {
						community[i] = best;
						moved = true;
					}
				}
				if !moved {
					break;
				}
			}
		}

		let mut renumber: HashMap<usize, usize> = HashMap::new();
		graph
			.nodes()
			.iter()
			.zip(community)
			.map(|(node, c)| {
				let next = renumber.len();
				(node.id.clone(), *renumber.entry(c).or_insert(next))
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::types::{EdgeRecord, NodeRecord, STRENGTH};

	/// Two 4-cliques joined by one weak edge.
	fn two_cliques() -> Graph {
		let mut g = Graph::new(false);
		for i in 0..8 {
			g.add_node(NodeRecord::new(i.to_string()));
		}
		for block in [0, 4] {
			for a in block..block + 4 {
				for b in a + 1..block + 4 {
					g.add_edge(
						EdgeRecord::new(a.to_string(), b.to_string()).with_metric(STRENGTH, 5.0),
					);
				}
			}
		}
		g.add_edge(EdgeRecord::new("3", "4").with_metric(STRENGTH, 1.0));
		g
	}

	#[test]
	fn separates_cliques() {
		let c = LocalMoving::default().detect(&two_cliques(), STRENGTH, 1.0, "seed");
		assert_eq!(c["0"], c["1"]);
		assert_eq!(c["0"], c["3"]);
		assert_eq!(c["4"], c["7"]);
		assert_ne!(c["0"], c["4"]);
		assert_eq!(c["0"], 0, "ids follow node order");
	}

	#[test]
	fn same_seed_same_partition() {
		let g = two_cliques();
		let a = LocalMoving::default().detect(&g, STRENGTH, 1.075, "0.5333956272631921");
		let b = LocalMoving::default().detect(&g, STRENGTH, 1.075, "0.5333956272631921");
		assert_eq!(a, b);
	}

	#[test]
	fn fractional_weights_are_reproducible() {
		let mut g = Graph::new(false);
		for i in 0..12 {
			g.add_node(NodeRecord::new(i.to_string()));
		}
		for a in 0..12u32 {
			for b in a + 1..12 {
				if (a * 7 + b * 3) % 4 != 0 {
					let mut e = EdgeRecord::new(a.to_string(), b.to_string());
					e.weight = 0.1 + f64::from((a * 13 + b * 29) % 17) / 7.0;
					g.add_edge(e);
				}
			}
		}
		let first = LocalMoving::default().detect(&g, "absent", 1.075, "seed");
		for _ in 0..20 {
			assert_eq!(LocalMoving::default().detect(&g, "absent", 1.075, "seed"), first);
		}
	}

	#[test]
	fn isolated_nodes_keep_their_own_community() {
		let mut g = Graph::new(false);
		g.add_node(NodeRecord::new("x"));
		g.add_node(NodeRecord::new("y"));
		let c = LocalMoving::default().detect(&g, STRENGTH, 1.0, "s");
		assert_eq!(c["x"], 0);
		assert_eq!(c["y"], 1);
	}
}
