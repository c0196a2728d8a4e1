//! Metric → visual attribute mapping.
//!
//! Every function here is pure. A control change derives a new [`ViewState`]
//! and [`VisualMapper::apply`] turns it into a fresh [`DisplayGraph`]
//! snapshot; nothing is patched in place.

use std::rc::Rc;

use super::palette::Palette;
use crate::config::{HaloMode, MappingConfig, SiteConfig, ViewConfig};
use crate::graph::community::CommunityDetector;
use crate::graph::{Graph, MaxValues, PreparedGraph};

/// Exponent of the perceptual scaling in [`normalize`].
pub const NORMALIZE_EXPONENT: f64 = 6.0 / 5.0;

/// Halo intensity of the selected node and its neighbors.
pub const FOCUS_HALO_INTENSITY: f64 = 0.15;
/// Fill and radius of nodes away from the selection.
pub const DIMMED_COLOR: &str = "#f6f6f6";
pub const DIMMED_SIZE: f64 = 4.0;

/// Values of the interactive controls.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
	pub halo_size: f64,
	pub halo_intensity: f64,
	pub angle_degrees: f64,
	pub seed: String,
	pub color_seed: String,
}

impl From<&ViewConfig> for ViewState {
	fn from(c: &ViewConfig) -> Self {
		Self {
			halo_size: c.halo_size,
			halo_intensity: c.halo_intensity,
			angle_degrees: c.angle_degrees,
			seed: c.seed.clone(),
			color_seed: c.color_seed.clone(),
		}
	}
}

impl ViewState {
	pub fn angle_radians(&self) -> f64 {
		self.angle_degrees.to_radians()
	}
}

/// `sqrt(metric)`, or `min_size` when the metric is missing, not finite,
/// negative, or its root falls below `min_size`.
pub fn map_node_size(metric: Option<f64>, min_size: f64) -> f64 {
	match metric {
		Some(v) if v.is_finite() && v > 0.0 => v.sqrt().max(min_size),
		_ => min_size,
	}
}

/// `(scale * radius)^exponent`; concave for `0 < exponent < 1`.
pub fn map_label_size(radius: f64, scale: f64, exponent: f64) -> f64 {
	let size = (scale * radius).powf(exponent);
	if size.is_finite() { size } else { 0.0 }
}

/// Halo radius for the current halo control value.
pub fn map_halo_size(metric: Option<f64>, radius: f64, halo_size: f64, mode: HaloMode) -> f64 {
	let base = match mode {
		HaloMode::SqrtMetric => match metric {
			Some(v) if v.is_finite() && v > 0.0 => v.sqrt(),
			_ => 0.0,
		},
		HaloMode::Radius => radius,
	};
	let halo = halo_size * base;
	if halo.is_finite() { halo.max(0.0) } else { 0.0 }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeColors {
	pub fill: String,
	pub border: String,
	pub halo: String,
}

/// Community colors: palette entry, its darker border, and a brighter,
/// translucent halo.
pub fn map_color(community: usize, palette: &Palette, halo_alpha: f64) -> NodeColors {
	let fill = palette.color(community);
	NodeColors {
		fill: fill.to_hex(),
		border: fill.darken(1.0).to_hex(),
		halo: fill.brighten(1.0).to_rgba(halo_alpha),
	}
}

/// `(value / max)^(6/5)` clamped to [0, 1]; 0 for unusable inputs.
pub fn normalize(value: Option<f64>, metric: &str, max_values: &MaxValues) -> f64 {
	let (Some(v), Some(max)) = (value, max_values.get(metric)) else {
		return 0.0;
	};
	if !(v.is_finite() && max.is_finite() && max > 0.0 && v > 0.0) {
		return 0.0;
	}
	(v / max).powf(NORMALIZE_EXPONENT).clamp(0.0, 1.0)
}

/// Screen-independent display attributes of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDisplay {
	pub id: String,
	pub label: String,
	pub homepage: Option<String>,
	pub x: f64,
	pub y: f64,
	pub size: f64,
	pub color: String,
	pub border_color: String,
	pub border_size: f64,
	pub halo_size: f64,
	pub halo_color: String,
	pub halo_intensity: f64,
	pub label_size: f64,
	pub label_color: Option<String>,
	pub label_offset_x: f64,
	pub label_offset_y: f64,
	pub hidden: bool,
	pub highlighted: bool,
}

impl NodeDisplay {
	/// Multiply every size-valued attribute by `ratio`.
	pub fn scaled(&self, ratio: f64) -> Self {
		Self {
			size: self.size * ratio,
			border_size: self.border_size * ratio,
			halo_size: self.halo_size * ratio,
			label_size: self.label_size * ratio,
			label_offset_x: self.label_offset_x * ratio,
			label_offset_y: self.label_offset_y * ratio,
			..self.clone()
		}
	}

	pub fn with_focus(&self, focus: Focus) -> Self {
		match focus {
			Focus::None => self.clone(),
			Focus::Selected => Self {
				highlighted: true,
				halo_intensity: FOCUS_HALO_INTENSITY,
				..self.clone()
			},
			Focus::Neighbor => Self {
				halo_intensity: FOCUS_HALO_INTENSITY,
				..self.clone()
			},
			Focus::Dimmed => Self {
				color: DIMMED_COLOR.into(),
				size: DIMMED_SIZE,
				halo_intensity: 0.0,
				..self.clone()
			},
		}
	}
}

/// Role of a node relative to the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
	None,
	Selected,
	Neighbor,
	Dimmed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDisplay {
	pub source: usize,
	pub target: usize,
	pub size: f64,
	pub color: String,
	pub curveness: f64,
	pub hidden: bool,
}

impl EdgeDisplay {
	pub fn scaled(&self, ratio: f64) -> Self {
		Self {
			size: self.size * ratio,
			..self.clone()
		}
	}
}

/// Immutable display snapshot shared by the live and export renderers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayGraph {
	nodes: Vec<NodeDisplay>,
	edges: Vec<EdgeDisplay>,
	neighbors: Rc<Vec<Vec<usize>>>,
}

impl DisplayGraph {
	pub fn nodes(&self) -> &[NodeDisplay] {
		&self.nodes
	}

	pub fn edges(&self) -> &[EdgeDisplay] {
		&self.edges
	}

	pub fn node(&self, index: usize) -> Option<&NodeDisplay> {
		self.nodes.get(index)
	}

	pub fn neighbors(&self, index: usize) -> &[usize] {
		self.neighbors.get(index).map_or(&[], Vec::as_slice)
	}

	/// Focus role of `index` when `selected` is the selected node.
	pub fn focus(&self, index: usize, selected: Option<usize>) -> Focus {
		match selected {
			None => Focus::None,
			Some(s) if s == index => Focus::Selected,
			Some(s) if self.neighbors(s).contains(&index) => Focus::Neighbor,
			Some(_) => Focus::Dimmed,
		}
	}

	/// Edges not touching the selection are hidden while one is active.
	pub fn edge_visible(&self, edge: &EdgeDisplay, selected: Option<usize>) -> bool {
		!edge.hidden
			&& selected.is_none_or(|s| edge.source == s || edge.target == s)
	}

	/// Bounding box of node positions as `(min_x, min_y, max_x, max_y)`.
	pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
		let mut it = self.nodes.iter();
		let first = it.next()?;
		Some(it.fold((first.x, first.y, first.x, first.y), |(a, b, c, d), n| {
			(a.min(n.x), b.min(n.y), c.max(n.x), d.max(n.y))
		}))
	}
}

/// Metric, community and configuration inputs of the mapping, plus the
/// current coloring so a halo change does not rerun community detection.
pub struct VisualMapper {
	positioned: Rc<Graph>,
	annotated: Rc<Graph>,
	max_values: MaxValues,
	mapping: MappingConfig,
	config: Rc<SiteConfig>,
	detector: Box<dyn CommunityDetector>,
	coloring: Option<Coloring>,
	neighbors: Rc<Vec<Vec<usize>>>,
}

struct Coloring {
	seed: String,
	color_seed: String,
	communities: Vec<usize>,
	palette: Palette,
}

impl VisualMapper {
	pub fn new(
		prepared: PreparedGraph,
		config: Rc<SiteConfig>,
		detector: Box<dyn CommunityDetector>,
	) -> Self {
		let neighbors = Rc::new(prepared.positioned.neighbor_sets());
		Self {
			positioned: Rc::new(prepared.positioned),
			annotated: Rc::new(prepared.annotated),
			max_values: prepared.max_values,
			mapping: config.mapping.clone(),
			config,
			detector,
			coloring: None,
			neighbors,
		}
	}

	fn size_metric(&self, node: &crate::graph::NodeRecord) -> Option<f64> {
		node.metric(&self.mapping.size_metric)
			.or_else(|| node.metric(&self.mapping.fallback_size_metric))
	}

	fn recolor(&mut self, view: &ViewState) {
		let fresh = self
			.coloring
			.as_ref()
			.is_some_and(|c| c.seed == view.seed && c.color_seed == view.color_seed);
		if fresh {
			return;
		}
		let c = &self.config.community;
		let by_id = self
			.detector
			.detect(&self.annotated, &c.weight_attribute, c.resolution, &view.seed);
		let communities = self
			.positioned
			.nodes()
			.iter()
			.map(|n| by_id.get(&n.id).copied().unwrap_or(0))
			.collect();
		let count = by_id.values().max().map_or(0, |m| m + 1);
		log::info!("communities: {} found for seed {:?}", count, view.seed);
		self.coloring = Some(Coloring {
			seed: view.seed.clone(),
			color_seed: view.color_seed.clone(),
			communities,
			palette: Palette::generate(self.config.palette.communities, &view.color_seed),
		});
	}

	/// Build the main display snapshot for `view`.
	pub fn apply(&mut self, view: &ViewState) -> DisplayGraph {
		self.recolor(view);
		let Some(coloring) = self.coloring.as_ref() else {
			return DisplayGraph::default();
		};
		let m = &self.mapping;
		let nodes = self
			.positioned
			.nodes()
			.iter()
			.zip(&coloring.communities)
			.map(|(node, &community)| {
				let metric = self.size_metric(node);
				let size = map_node_size(metric, m.min_size);
				let colors = map_color(community, &coloring.palette, m.halo_alpha);
				let offset = self.config.label_offset(&node.id);
				let (x, y) = node.position.unwrap_or_default();
				NodeDisplay {
					id: node.id.clone(),
					label: node.label.clone(),
					homepage: node.homepage.clone(),
					x,
					y,
					size,
					color: colors.fill,
					border_color: colors.border,
					border_size: m.border_size,
					halo_size: map_halo_size(metric, size, view.halo_size, m.halo_mode),
					halo_color: colors.halo,
					halo_intensity: view.halo_intensity,
					label_size: map_label_size(size, m.label_scale, m.label_exponent),
					label_color: None,
					label_offset_x: offset.x,
					label_offset_y: offset.y,
					hidden: false,
					highlighted: false,
				}
			})
			.collect();
		DisplayGraph {
			nodes,
			edges: self.edges(&self.config.graph.edge_color, self.config.graph.edge_size),
			neighbors: self.neighbors.clone(),
		}
	}

	/// Single-metric snapshot: gray nodes sized and haloed by `metric`.
	pub fn thematic(&self, metric: &str) -> DisplayGraph {
		let m = &self.mapping;
		let nodes = self
			.positioned
			.nodes()
			.iter()
			.map(|node| {
				let value = node.metric(metric);
				let n = normalize(value, metric, &self.max_values);
				let raw = match (value, self.max_values.get(metric)) {
					(Some(v), Some(max)) if v > 0.0 && max > 0.0 => {
						(v / (4.0 * max)).powf(NORMALIZE_EXPONENT)
					}
					_ => 0.0,
				};
				let (x, y) = node.position.unwrap_or_default();
				NodeDisplay {
					id: node.id.clone(),
					label: node.label.clone(),
					homepage: node.homepage.clone(),
					x,
					y,
					size: (10.0 * n).max(m.min_size),
					color: "#999".into(),
					border_color: "#666".into(),
					border_size: m.border_size / 3.0,
					halo_size: (10.0 * n).max(1.5) * 5.0,
					halo_color: "#999".into(),
					halo_intensity: 0.2 + raw,
					label_size: (35.0 * (10.0 * n).max(0.1)).powf(m.label_exponent),
					label_color: None,
					label_offset_x: 0.0,
					label_offset_y: 0.0,
					hidden: false,
					highlighted: false,
				}
			})
			.collect();
		DisplayGraph {
			nodes,
			edges: self.edges("#FFF", 0.01),
			neighbors: self.neighbors.clone(),
		}
	}

	fn edges(&self, color: &str, size: f64) -> Vec<EdgeDisplay> {
		self.positioned
			.endpoints()
			.into_iter()
			.map(|(source, target)| EdgeDisplay {
				source,
				target,
				size,
				color: color.to_string(),
				curveness: self.config.graph.edge_curveness,
				hidden: false,
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::community::{Communities, LocalMoving};
	use crate::visual::color::Rgb;
	use crate::graph::NodeRecord;
	use crate::graph::types::EdgeRecord;

	const MIN: f64 = 0.5;

	#[test]
	fn node_size_is_sqrt_with_minimum() {
		for v in [0.25, 1.0, 2.0, 4.0, 100.0, 12345.0] {
			assert_eq!(map_node_size(Some(v), MIN), f64::sqrt(v));
		}
		assert_eq!(map_node_size(Some(0.0), MIN), MIN);
		assert_eq!(map_node_size(Some(1e-12), MIN), MIN);
		assert_eq!(map_node_size(Some(-4.0), MIN), MIN);
		assert_eq!(map_node_size(Some(f64::NAN), MIN), MIN);
		assert_eq!(map_node_size(Some(f64::INFINITY), MIN), MIN);
		assert_eq!(map_node_size(None, MIN), MIN);
	}

	#[test]
	fn label_size_grows_sublinearly() {
		let small = map_label_size(1.0, 80.0, 0.4);
		let big = map_label_size(4.0, 80.0, 0.4);
		assert!(big > small);
		assert!(big / small < 4.0);
		assert_eq!(map_label_size(f64::NAN, 80.0, 0.4), 0.0);
	}

	#[test]
	fn halo_modes() {
		assert_eq!(map_halo_size(Some(9.0), 3.0, 14.0, HaloMode::SqrtMetric), 42.0);
		assert_eq!(map_halo_size(None, 0.5, 14.0, HaloMode::SqrtMetric), 0.0);
		assert_eq!(map_halo_size(Some(9.0), 3.0, 2.0, HaloMode::Radius), 6.0);
	}

	#[test]
	fn colors_wrap_and_are_idempotent() {
		let palette = Palette::generate(9, "colors");
		for c in 0..30 {
			assert_eq!(map_color(c, &palette, 0.9), map_color(c + 9, &palette, 0.9));
			assert_eq!(map_color(c, &palette, 0.9), map_color(c, &palette, 0.9));
		}
		let colors = map_color(2, &palette, 0.9);
		assert_eq!(Rgb::parse_hex(&colors.fill), Some(palette.color(2)));
		assert!(colors.halo.starts_with("rgba(") && colors.halo.ends_with(",0.9)"));
	}

	#[test]
	fn normalize_is_bounded() {
		let mut g = Graph::new(false);
		g.add_node(NodeRecord::new("a").with_metric("pagerank", 0.5));
		g.add_node(NodeRecord::new("b").with_metric("pagerank", 1.0));
		let max = g.max_values();
		assert_eq!(normalize(Some(1.0), "pagerank", &max), 1.0);
		assert!((normalize(Some(0.5), "pagerank", &max) - 0.5_f64.powf(1.2)).abs() < 1e-12);
		assert_eq!(normalize(Some(2.0), "pagerank", &max), 1.0);
		assert_eq!(normalize(Some(f64::NAN), "pagerank", &max), 0.0);
		assert_eq!(normalize(Some(1.0), "missing", &max), 0.0);
	}

	struct Fixed;

	impl CommunityDetector for Fixed {
		fn detect(&self, graph: &Graph, _: &str, _: f64, _: &str) -> Communities {
			graph
				.nodes()
				.iter()
				.enumerate()
				.map(|(i, n)| (n.id.clone(), i))
				.collect()
		}
	}

	fn mapper(detector: Box<dyn CommunityDetector>) -> VisualMapper {
		let mut g = Graph::new(true);
		for (id, indegree, x) in [("A", 4.0, 0.0), ("B", 1.0, 1.0), ("C", 0.0, 2.0)] {
			let mut node = NodeRecord::new(id).with_metric("indegree", indegree);
			node.position = Some((x, -x));
			g.add_node(node);
		}
		g.add_edge(EdgeRecord::new("A", "B"));
		g.add_edge(EdgeRecord::new("B", "C"));
		let config = SiteConfig {
			mapping: MappingConfig {
				size_metric: "indegree".into(),
				..MappingConfig::default()
			},
			..SiteConfig::builtin()
		};
		let prepared = PreparedGraph {
			max_values: g.max_values(),
			annotated: g.clone(),
			positioned: g,
		};
		VisualMapper::new(prepared, Rc::new(config), detector)
	}

	fn view() -> ViewState {
		ViewState::from(&ViewConfig::default())
	}

	#[test]
	fn indegree_scenario_radii() {
		let display = mapper(Box::new(Fixed)).apply(&view());
		let sizes: Vec<f64> = display.nodes().iter().map(|n| n.size).collect();
		assert_eq!(sizes, vec![2.0, 1.0, MIN]);
		assert!(display.nodes().iter().all(|n| !n.halo_size.is_nan() && !n.label_size.is_nan()));
	}

	#[test]
	fn halo_change_only_touches_halo_size() {
		let mut mapper = mapper(Box::new(LocalMoving::default()));
		let before = mapper.apply(&view());
		let after = mapper.apply(&ViewState {
			halo_size: 3.0,
			..view()
		});
		for (b, a) in before.nodes().iter().zip(after.nodes()) {
			let metric = mapper.positioned.node(&a.id).and_then(|n| n.metric("indegree"));
			assert_eq!(a.halo_size, map_halo_size(metric, a.size, 3.0, HaloMode::SqrtMetric));
			assert_eq!(
				NodeDisplay {
					halo_size: b.halo_size,
					..a.clone()
				},
				*b
			);
		}
		assert_eq!(before.edges(), after.edges());
	}

	#[test]
	fn same_seeds_same_snapshot() {
		let a = mapper(Box::new(LocalMoving::default())).apply(&view());
		let b = mapper(Box::new(LocalMoving::default())).apply(&view());
		assert_eq!(a, b);
	}

	#[test]
	fn label_offsets_come_from_configuration() {
		let mut m = mapper(Box::new(Fixed));
		let mut config = SiteConfig::builtin();
		config.label_offsets.insert("B".into(), crate::config::LabelOffset { x: 4.0, y: -1.0 });
		m.config = Rc::new(config);
		let display = m.apply(&view());
		let b = &display.nodes()[1];
		assert_eq!((b.label_offset_x, b.label_offset_y), (4.0, -1.0));
		assert_eq!(display.nodes()[0].label_offset_x, 0.0);
	}

	#[test]
	fn scaling_multiplies_sizes_only() {
		let display = mapper(Box::new(Fixed)).apply(&view());
		let node = &display.nodes()[0];
		let scaled = node.scaled(6.0);
		assert_eq!(scaled.size, node.size * 6.0);
		assert_eq!(scaled.label_size, node.label_size * 6.0);
		assert_eq!(scaled.border_size, node.border_size * 6.0);
		assert_eq!(scaled.halo_size, node.halo_size * 6.0);
		assert_eq!((scaled.x, scaled.y), (node.x, node.y));
		assert_eq!(scaled.color, node.color);
		assert_eq!(display.edges()[0].scaled(6.0).size, 3.0);
	}

	#[test]
	fn selection_focus_roles() {
		let display = mapper(Box::new(Fixed)).apply(&view());
		assert_eq!(display.focus(0, None), Focus::None);
		assert_eq!(display.focus(0, Some(0)), Focus::Selected);
		assert_eq!(display.focus(1, Some(0)), Focus::Neighbor);
		assert_eq!(display.focus(2, Some(0)), Focus::Dimmed);
		let dimmed = display.nodes()[2].with_focus(Focus::Dimmed);
		assert_eq!((dimmed.color.as_str(), dimmed.size, dimmed.halo_intensity), (DIMMED_COLOR, DIMMED_SIZE, 0.0));
		let (ab, bc) = (&display.edges()[0], &display.edges()[1]);
		assert!(display.edge_visible(ab, Some(0)));
		assert!(!display.edge_visible(bc, Some(0)));
		assert!(display.edge_visible(bc, None));
	}

	#[test]
	fn thematic_view_uses_single_metric() {
		let m = mapper(Box::new(Fixed));
		let display = m.thematic("indegree");
		let a = &display.nodes()[0];
		assert_eq!(a.size, 10.0);
		assert_eq!(a.halo_size, 50.0);
		assert!((a.halo_intensity - (0.2 + 0.25_f64.powf(1.2))).abs() < 1e-12);
		let c = &display.nodes()[2];
		assert_eq!(c.size, MIN);
		assert_eq!(c.halo_size, 7.5);
		assert_eq!(c.halo_intensity, 0.2);
		assert!(display.edges().iter().all(|e| e.color == "#FFF" && e.size == 0.01));
	}
}
