//! Screen-space projection of a display snapshot, and label selection.

use std::collections::HashMap;

use super::camera::{CameraState, Frame};
use super::label::{LabelData, LabelStyle};
use crate::config::RenderConfig;
use crate::visual::{DisplayGraph, NodeDisplay};

/// Renderer configuration. Export renderers use [`RenderSettings::scaled`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
	/// Magnification applied to every size-valued attribute.
	pub ratio: f64,
	pub label: LabelStyle,
	/// Labels allowed per grid cell.
	pub label_density: f64,
	pub label_grid_cell_size: f64,
	/// Nodes drawn smaller than this get no label.
	pub label_rendered_size_threshold: f64,
	pub stage_padding: f64,
	pub min_camera_ratio: f64,
	pub max_camera_ratio: f64,
}

impl From<&RenderConfig> for RenderSettings {
	fn from(c: &RenderConfig) -> Self {
		Self {
			ratio: 1.0,
			label: LabelStyle {
				font: c.label_font.clone(),
				weight: c.label_weight.clone(),
				color: c.label_color.clone(),
				size: c.label_size,
			},
			label_density: c.label_density,
			label_grid_cell_size: c.label_grid_cell_size,
			label_rendered_size_threshold: c.label_rendered_size_threshold,
			stage_padding: c.stage_padding,
			min_camera_ratio: c.min_camera_ratio,
			max_camera_ratio: c.max_camera_ratio,
		}
	}
}

impl RenderSettings {
	/// Settings for the thematic minimaps: the main ones with the minimap
	/// label style, threshold and padding.
	pub fn minimap(c: &RenderConfig) -> Self {
		let m = &c.minimap;
		let base = Self::from(c);
		Self {
			label: LabelStyle {
				font: m.label_font.clone(),
				color: m.label_color.clone(),
				..base.label.clone()
			},
			label_rendered_size_threshold: m.label_rendered_size_threshold,
			stage_padding: m.stage_padding,
			..base
		}
	}

	/// The same settings at `ratio` times the linear resolution.
	pub fn scaled(&self, ratio: f64) -> Self {
		Self {
			ratio: self.ratio * ratio,
			label: LabelStyle {
				size: self.label.size * ratio,
				..self.label.clone()
			},
			label_grid_cell_size: self.label_grid_cell_size * ratio,
			label_rendered_size_threshold: self.label_rendered_size_threshold * ratio,
			stage_padding: self.stage_padding * ratio,
			..self.clone()
		}
	}

	fn max_labels_per_cell(&self) -> usize {
		self.label_density.round().max(1.0) as usize
	}
}

/// A node as drawn this frame: position in viewport pixels, sizes already
/// scaled by ratio and zoom, selection styling applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenNode {
	pub index: usize,
	pub x: f64,
	pub y: f64,
	pub node: NodeDisplay,
}

impl ScreenNode {
	pub fn label_data(&self) -> LabelData<'_> {
		LabelData {
			x: self.x,
			y: self.y,
			size: self.node.size,
			label: &self.node.label,
			label_size: Some(self.node.label_size),
			label_color: self.node.label_color.as_deref(),
			offset_x: self.node.label_offset_x,
			offset_y: self.node.label_offset_y,
		}
	}

	pub fn contains(&self, x: f64, y: f64) -> bool {
		let r = self.node.size.max(4.0);
		(self.x - x).powi(2) + (self.y - y).powi(2) <= r * r
	}
}

/// Quadratic curve of one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenEdge {
	pub from: (f64, f64),
	pub control: (f64, f64),
	pub to: (f64, f64),
	pub width: f64,
	pub color: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<ScreenNode>,
	pub edges: Vec<ScreenEdge>,
}

impl Scene {
	pub fn project(
		graph: &DisplayGraph,
		camera: &CameraState,
		frame: &Frame,
		settings: &RenderSettings,
		selected: Option<usize>,
	) -> Self {
		let zoom = Frame::size_scale(camera);
		let nodes: Vec<ScreenNode> = graph
			.nodes()
			.iter()
			.enumerate()
			.filter(|(_, n)| !n.hidden)
			.map(|(index, n)| {
				let mut node = n.with_focus(graph.focus(index, selected)).scaled(settings.ratio);
				node.size *= zoom;
				node.halo_size *= zoom;
				node.border_size *= zoom;
				let (x, y) = frame.graph_to_viewport(camera, n.x, n.y);
				ScreenNode { index, x, y, node }
			})
			.collect();

		let position: HashMap<usize, (f64, f64)> =
			nodes.iter().map(|n| (n.index, (n.x, n.y))).collect();
		let edges = graph
			.edges()
			.iter()
			.filter(|e| graph.edge_visible(e, selected))
			.filter_map(|e| {
				let (from, to) = (*position.get(&e.source)?, *position.get(&e.target)?);
				let e = e.scaled(settings.ratio);
				Some(ScreenEdge {
					from,
					control: control_point(from, to, e.curveness),
					to,
					width: e.size,
					color: e.color,
				})
			})
			.collect();
		Self { nodes, edges }
	}

	/// Topmost node under a viewport point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		self.nodes.iter().rev().find(|n| n.contains(x, y)).map(|n| n.index)
	}

	pub fn screen_node(&self, index: usize) -> Option<&ScreenNode> {
		self.nodes.iter().find(|n| n.index == index)
	}

	/// Indices of the nodes whose label is drawn this frame.
	///
	/// The viewport is cut into square cells; each cell keeps its largest
	/// nodes, up to the label density. `forced` nodes always get a label.
	pub fn labels(&self, settings: &RenderSettings, width: f64, height: f64, forced: &[usize]) -> Vec<usize> {
		let cell = settings.label_grid_cell_size.max(1.0);
		let mut cells: HashMap<(i64, i64), Vec<&ScreenNode>> = HashMap::new();
		for n in &self.nodes {
			let on_screen = n.x >= -cell && n.y >= -cell && n.x <= width + cell && n.y <= height + cell;
			if n.node.label.is_empty()
				|| !on_screen
				|| n.node.size < settings.label_rendered_size_threshold
			{
				continue;
			}
			let key = ((n.x / cell).floor() as i64, (n.y / cell).floor() as i64);
			cells.entry(key).or_default().push(n);
		}

		let per_cell = settings.max_labels_per_cell();
		let mut out: Vec<usize> = Vec::new();
		for mut members in cells.into_values() {
			members.sort_by(|a, b| {
				b.node
					.size
					.total_cmp(&a.node.size)
					.then(a.index.cmp(&b.index))
			});
			out.extend(members.iter().take(per_cell).map(|n| n.index));
		}
		for &f in forced {
			if !out.contains(&f) && self.screen_node(f).is_some_and(|n| !n.node.label.is_empty()) {
				out.push(f);
			}
		}
		// Labels draw in node order.
		out.sort_unstable();
		out
	}
}

/// Control point of a quadratic edge curve bending to the left of the
/// source → target direction.
pub fn control_point(from: (f64, f64), to: (f64, f64), curveness: f64) -> (f64, f64) {
	let (mx, my) = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
	let (dx, dy) = (to.0 - from.0, to.1 - from.1);
	(mx - dy * curveness, my + dx * curveness)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{MappingConfig, SiteConfig};
	use crate::graph::community::LocalMoving;
	use crate::graph::types::EdgeRecord;
	use crate::graph::{Graph, NodeRecord, PreparedGraph};
	use crate::visual::{ViewState, VisualMapper};
	use std::rc::Rc;

	fn display(points: &[(&str, f64, f64, f64)]) -> DisplayGraph {
		let mut g = Graph::new(false);
		for &(id, x, y, degree) in points {
			let mut n = NodeRecord::new(id).with_metric("degree", degree);
			n.position = Some((x, y));
			g.add_node(n);
		}
		for w in points.windows(2) {
			g.add_edge(EdgeRecord::new(w[0].0, w[1].0));
		}
		let config = SiteConfig {
			mapping: MappingConfig {
				size_metric: "degree".into(),
				..MappingConfig::default()
			},
			..SiteConfig::default()
		};
		let view = ViewState::from(&config.view);
		let prepared = PreparedGraph {
			max_values: g.max_values(),
			annotated: g.clone(),
			positioned: g,
		};
		VisualMapper::new(prepared, Rc::new(config), Box::new(LocalMoving::default())).apply(&view)
	}

	fn settings() -> RenderSettings {
		RenderSettings::from(&RenderConfig::default())
	}

	fn frame(g: &DisplayGraph) -> Frame {
		Frame::new(800.0, 600.0, 50.0, g.extent())
	}

	#[test]
	fn scaled_settings_multiply_pixel_values() {
		let s = settings().scaled(6.0);
		assert_eq!(s.ratio, 6.0);
		assert_eq!(s.label_grid_cell_size, 190.0 * 6.0);
		assert_eq!(s.stage_padding, 300.0);
		assert_eq!(s.label.size, 14.0 * 6.0);
		assert_eq!(s.label_density, 1.5);
	}

	#[test]
	fn minimap_settings_override_label_style_and_scale_for_export() {
		let m = RenderSettings::minimap(&RenderConfig::default());
		assert_eq!(m.label.font, "\"DejaVu Sans Mono\", monospace");
		assert_eq!(m.label.color, "#333");
		assert_eq!(m.label.weight, "bold");
		assert_eq!(m.label_grid_cell_size, 190.0);
		assert_eq!(m.stage_padding, 30.0);
		let exported = m.scaled(6.0);
		assert_eq!(exported.label_rendered_size_threshold, 3.5 * 6.0);
		assert_eq!(exported.label.color, "#333");
	}

	#[test]
	fn projection_scales_sizes_by_ratio() {
		let g = display(&[("a", 0.0, 0.0, 4.0), ("b", 10.0, 0.0, 1.0)]);
		let camera = CameraState::default();
		let once = Scene::project(&g, &camera, &frame(&g), &settings(), None);
		let twice_frame = Frame::new(1600.0, 1200.0, 100.0, g.extent());
		let twice = Scene::project(&g, &camera, &twice_frame, &settings().scaled(2.0), None);
		for (a, b) in once.nodes.iter().zip(&twice.nodes) {
			assert!((b.x - 2.0 * a.x).abs() < 1e-9 && (b.y - 2.0 * a.y).abs() < 1e-9);
			assert_eq!(b.node.size, 2.0 * a.node.size);
			assert_eq!(b.node.label_size, 2.0 * a.node.label_size);
		}
		assert_eq!(twice.edges[0].width, 2.0 * once.edges[0].width);
	}

	#[test]
	fn selection_hides_unrelated_edges() {
		let g = display(&[("a", 0.0, 0.0, 4.0), ("b", 10.0, 0.0, 1.0), ("c", 20.0, 5.0, 1.0)]);
		let scene = Scene::project(&g, &CameraState::default(), &frame(&g), &settings(), Some(0));
		assert_eq!(scene.edges.len(), 1);
		assert!(scene.nodes[0].node.highlighted);
		assert_eq!(scene.nodes[2].node.color, crate::visual::mapper::DIMMED_COLOR);
	}

	#[test]
	fn hit_testing_prefers_topmost() {
		let g = display(&[("a", 0.0, 0.0, 4.0), ("b", 0.0, 0.0, 9.0), ("c", 20.0, 0.0, 1.0)]);
		let scene = Scene::project(&g, &CameraState::default(), &frame(&g), &settings(), None);
		let (x, y) = (scene.nodes[0].x, scene.nodes[0].y);
		assert_eq!(scene.node_at(x, y), Some(1));
		assert_eq!(scene.node_at(x, y - 200.0), None);
	}

	#[test]
	fn label_grid_keeps_largest_per_cell() {
		// a, b and c share a cell; d is far away.
		let g = display(&[
			("a", 0.0, 0.0, 1.0),
			("b", 0.01, 0.0, 16.0),
			("c", 0.02, 0.0, 9.0),
			("d", 100.0, 100.0, 1.0),
		]);
		let scene = Scene::project(&g, &CameraState::default(), &frame(&g), &settings(), None);
		let labels = scene.labels(&settings(), 800.0, 600.0, &[]);
		assert_eq!(labels, vec![1, 2, 3]);
		let forced = scene.labels(&settings(), 800.0, 600.0, &[0]);
		assert_eq!(forced, vec![0, 1, 2, 3]);
	}

	#[test]
	fn size_threshold_suppresses_small_labels() {
		let g = display(&[("a", 0.0, 0.0, 1.0), ("b", 100.0, 100.0, 16.0)]);
		let scene = Scene::project(&g, &CameraState::default(), &frame(&g), &settings(), None);
		let s = RenderSettings {
			label_rendered_size_threshold: 2.0,
			..settings()
		};
		assert_eq!(scene.labels(&s, 800.0, 600.0, &[]), vec![1]);
	}

	#[test]
	fn curve_bends_perpendicular() {
		assert_eq!(control_point((0.0, 0.0), (10.0, 0.0), 0.3), (5.0, 3.0));
		assert_eq!(control_point((0.0, 0.0), (10.0, 0.0), 0.0), (5.0, 0.0));
	}
}
