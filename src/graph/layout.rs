//! Force-directed layout on top of the `force_graph` simulation.

use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;
use rand::Rng;

use super::seeded_rng;
use super::types::{Graph, STRENGTH};
use crate::config::LayoutConfig;

const STEP: f32 = 0.016;
const MAX_SPRING_COPIES: f64 = 4.0;

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutSettings {
	pub iterations: usize,
	pub edge_weight_influence: f64,
	pub gravity: f64,
	pub scaling_ratio: f64,
	pub adjust_sizes: bool,
}

impl From<&LayoutConfig> for LayoutSettings {
	fn from(c: &LayoutConfig) -> Self {
		Self {
			iterations: c.iterations,
			edge_weight_influence: c.edge_weight_influence,
			gravity: c.gravity,
			scaling_ratio: c.scaling_ratio,
			adjust_sizes: c.adjust_sizes,
		}
	}
}

/// Writes `position` on every node.
pub trait LayoutProvider {
	fn assign(&self, graph: &mut Graph, settings: &LayoutSettings, seed: &str);
}

/// `force_graph` simulation.
///
/// `force_graph` has a single spring constant, so edge weights act through
/// spring multiplicity: an edge gets `(w / w_min)^influence` parallel springs,
/// capped at four. Gravity pulls every node toward the origin after each
/// step.
#[derive(Clone, Debug, Default)]
pub struct ForceLayout {
	/// Node metric used as simulation mass when `adjust_sizes` is set.
	pub size_metric: String,
}

impl ForceLayout {
	pub fn new(size_metric: impl Into<String>) -> Self {
		Self {
			size_metric: size_metric.into(),
		}
	}
}

impl LayoutProvider for ForceLayout {
	fn assign(&self, graph: &mut Graph, settings: &LayoutSettings, seed: &str) {
		let n = graph.node_count();
		if n == 0 {
			return;
		}
		let mut rng = seeded_rng(seed);
		let spread = 100.0 * (n as f64).sqrt();

		let mut sim: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
			force_charge: (150.0 * settings.scaling_ratio) as f32,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});

		let mut handles = Vec::with_capacity(n);
		for (i, node) in graph.nodes().iter().enumerate() {
			let (x, y) = node.position.unwrap_or_else(|| {
				let angle = (i as f64) * 2.0 * PI / n as f64;
				let r = spread * (0.5 + 0.5 * rng.r#gen::<f64>());
				(r * angle.cos(), r * angle.sin())
			});
			let mass = if settings.adjust_sizes {
				10.0 * node.metric(&self.size_metric).unwrap_or(1.0).max(1.0).sqrt()
			} else {
				10.0
			};
			handles.push(sim.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: mass as f32,
				is_anchor: false,
				user_data: i,
			}));
		}

		let weights: Vec<f64> = graph
			.edges()
			.iter()
			.map(|e| e.metric(STRENGTH).unwrap_or(e.weight))
			.collect();
		let w_min = weights
			.iter()
			.copied()
			.filter(|w| *w > 0.0)
			.fold(f64::INFINITY, f64::min);
		for ((s, t), w) in graph.endpoints().into_iter().zip(weights) {
			if s == t {
				continue;
			}
			let copies = if w_min.is_finite() && w > 0.0 {
				(w / w_min)
					.powf(settings.edge_weight_influence)
					.round()
					.clamp(1.0, MAX_SPRING_COPIES) as usize
			} else {
				1
			};
			for _ in 0..copies {
				sim.add_edge(handles[s], handles[t], EdgeData::default());
			}
		}

		let pull = (settings.gravity * STEP as f64) as f32 * 0.01;
		for _ in 0..settings.iterations {
			sim.update(STEP);
			if pull > 0.0 {
				sim.visit_nodes_mut(|node| {
					node.data.x -= node.data.x * pull;
					node.data.y -= node.data.y * pull;
				});
			}
		}

		let mut positions = vec![(0.0, 0.0); n];
		sim.visit_nodes(|node| {
			positions[node.data.user_data] = (node.x() as f64, node.y() as f64);
		});
		for (node, p) in graph.nodes_mut().iter_mut().zip(positions) {
			node.position = Some(p);
		}
		debug!("layout: {} nodes, {} iterations", n, settings.iterations);
	}
}
