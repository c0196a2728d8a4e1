use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;

/// Edge metric used as strength for filtering, layout, and clustering.
pub const STRENGTH: &str = "simmelianStrength";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeRecord {
	pub id: String,
	pub label: String,
	pub homepage: Option<String>,
	/// Numeric attributes, computed or read from the input.
	pub metrics: BTreeMap<String, f64>,
	/// String attributes without a dedicated field.
	pub extra: BTreeMap<String, String>,
	pub position: Option<(f64, f64)>,
}

impl NodeRecord {
	pub fn new(id: impl Into<String>) -> Self {
		let id = id.into();
		Self {
			label: id.clone(),
			id,
			..Self::default()
		}
	}

	pub fn metric(&self, name: &str) -> Option<f64> {
		self.metrics.get(name).copied()
	}

	pub fn with_metric(mut self, name: &str, value: f64) -> Self {
		self.metrics.insert(name.to_string(), value);
		self
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeRecord {
	pub source: String,
	pub target: String,
	pub weight: f64,
	pub metrics: BTreeMap<String, f64>,
}

impl EdgeRecord {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			weight: 1.0,
			metrics: BTreeMap::new(),
		}
	}

	pub fn metric(&self, name: &str) -> Option<f64> {
		self.metrics.get(name).copied()
	}

	/// Simmelian strength, zero until the metric provider ran.
	pub fn strength(&self) -> f64 {
		self.metric(STRENGTH).unwrap_or(0.0)
	}

	pub fn with_metric(mut self, name: &str, value: f64) -> Self {
		self.metrics.insert(name.to_string(), value);
		self
	}
}

/// Attribute graph with stable insertion order.
///
/// Edges always refer to nodes present in the graph; `add_edge` drops edges
/// with unknown endpoints.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	pub directed: bool,
	nodes: Vec<NodeRecord>,
	edges: Vec<EdgeRecord>,
	index: HashMap<String, usize>,
}

impl Graph {
	pub fn new(directed: bool) -> Self {
		Self {
			directed,
			..Self::default()
		}
	}

	/// Insert a node, merging into an existing record with the same id.
	pub fn add_node(&mut self, node: NodeRecord) {
		match self.index.get(&node.id) {
			Some(&i) => self.nodes[i] = node,
			None => {
				self.index.insert(node.id.clone(), self.nodes.len());
				self.nodes.push(node);
			}
		}
	}

	pub fn add_edge(&mut self, edge: EdgeRecord) -> bool {
		if !self.index.contains_key(&edge.source) || !self.index.contains_key(&edge.target) {
			return false;
		}
		self.edges.push(edge);
		true
	}

	pub fn nodes(&self) -> &[NodeRecord] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [NodeRecord] {
		&mut self.nodes
	}

	pub fn edges(&self) -> &[EdgeRecord] {
		&self.edges
	}

	pub fn edges_mut(&mut self) -> &mut [EdgeRecord] {
		&mut self.edges
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn node(&self, id: &str) -> Option<&NodeRecord> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	/// Endpoint indices of every edge, in edge order.
	pub fn endpoints(&self) -> Vec<(usize, usize)> {
		self.edges
			.iter()
			.map(|e| (self.index[&e.source], self.index[&e.target]))
			.collect()
	}

	/// Directed petgraph view; node indices follow `nodes()` order and edge
	/// weights are the edge `weight`.
	pub fn to_petgraph(&self) -> DiGraph<(), f64> {
		let mut g = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
		for _ in &self.nodes {
			g.add_node(());
		}
		for ((s, t), e) in self.endpoints().into_iter().zip(&self.edges) {
			g.add_edge(NodeIndex::new(s), NodeIndex::new(t), e.weight);
		}
		g
	}

	/// Undirected neighbor lists, self loops dropped, duplicates merged.
	pub fn neighbor_sets(&self) -> Vec<Vec<usize>> {
		let mut sets = vec![Vec::new(); self.nodes.len()];
		for (s, t) in self.endpoints() {
			if s == t {
				continue;
			}
			sets[s].push(t);
			sets[t].push(s);
		}
		for set in &mut sets {
			set.sort_unstable();
			set.dedup();
		}
		sets
	}

	/// Keep only edges whose strength is strictly greater than `threshold`.
	pub fn retain_edges_above(&mut self, threshold: f64) -> usize {
		let before = self.edges.len();
		self.edges.retain(|e| e.strength() > threshold);
		before - self.edges.len()
	}

	/// Drop every node outside the largest weakly connected component.
	///
	/// Ties go to the component containing the earliest inserted node.
	pub fn crop_to_largest_component(&mut self) -> usize {
		if self.nodes.is_empty() {
			return 0;
		}
		let mut uf = UnionFind::<usize>::new(self.nodes.len());
		for (s, t) in self.endpoints() {
			uf.union(s, t);
		}
		let labels = uf.into_labeling();
		let mut sizes: HashMap<usize, usize> = HashMap::new();
		for &l in &labels {
			*sizes.entry(l).or_default() += 1;
		}
		let mut best = labels[0];
		for &l in &labels {
			if sizes[&l] > sizes[&best] {
				best = l;
			}
		}

		let before = self.nodes.len();
		let nodes = std::mem::take(&mut self.nodes);
		self.index.clear();
		for (node, label) in nodes.into_iter().zip(labels) {
			if label == best {
				self.add_node(node);
			}
		}
		let index = &self.index;
		self.edges
			.retain(|e| index.contains_key(&e.source) && index.contains_key(&e.target));
		before - self.nodes.len()
	}

	/// Highest value of each numeric node attribute.
	///
	/// Starts from zero so an all-negative metric reports 0.
	pub fn max_values(&self) -> MaxValues {
		let mut max = BTreeMap::new();
		for node in &self.nodes {
			for (name, &value) in &node.metrics {
				if value.is_nan() {
					continue;
				}
				let entry = max.entry(name.clone()).or_insert(0.0_f64);
				*entry = entry.max(value);
			}
		}
		MaxValues(max)
	}
}

/// Maximum observed value per metric for one graph snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaxValues(BTreeMap<String, f64>);

impl MaxValues {
	pub fn get(&self, metric: &str) -> Option<f64> {
		self.0.get(metric).copied()
	}
}
