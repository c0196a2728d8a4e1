//! Site configuration.
//!
//! Loaded from `./data/config.json` next to the graph document. Every section
//! is optional and falls back to the values the published map was tuned with.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{AtlasError, Result};

/// Where the configuration document is fetched from.
pub const CONFIG_URL: &str = "./data/config.json";

/// Top-level configuration record.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
	/// Initial control values.
	pub view: ViewConfig,
	/// Metric to visual attribute parameters.
	pub mapping: MappingConfig,
	/// Community palette parameters.
	pub palette: PaletteConfig,
	/// Community detection parameters.
	pub community: CommunityConfig,
	/// Input graph and filtering.
	pub graph: GraphConfig,
	/// Force layout settings.
	pub layout: LayoutConfig,
	/// Renderer settings.
	pub render: RenderConfig,
	/// PNG export settings.
	pub export: ExportConfig,
	/// Manual per-node label corrections, in pixels.
	pub label_offsets: BTreeMap<String, LabelOffset>,
}

impl SiteConfig {
	/// Decode a configuration document.
	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text).map_err(|e| AtlasError::Config {
			message: e.to_string(),
		})
	}

	/// Built-in configuration, including the label offset table of the
	/// published map.
	pub fn builtin() -> Self {
		let label_offsets = [
			("16787", 0.0, 6.0),
			("18237", 0.0, 15_000_000.0),
			("33", 0.0, -2.0),
			("119", 0.0, 1.0),
			("53", 0.0, 2.0),
		]
		.into_iter()
		.map(|(id, x, y)| (id.to_string(), LabelOffset { x, y }))
		.collect();
		Self {
			label_offsets,
			..Self::default()
		}
	}

	/// Offset for `node`, zero when the table has no entry.
	pub fn label_offset(&self, node: &str) -> LabelOffset {
		self.label_offsets.get(node).copied().unwrap_or_default()
	}
}

/// A label correction. Missing axes read as zero.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LabelOffset {
	pub x: f64,
	pub y: f64,
}

/// Initial values of the interactive controls.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
	/// Halo radius multiplier.
	pub halo_size: f64,
	/// Halo opacity, 0 to 1.
	pub halo_intensity: f64,
	/// Base camera rotation; zoom reset returns to it.
	pub angle_degrees: f64,
	/// Community detection seed.
	pub seed: String,
	/// Palette seed.
	pub color_seed: String,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			halo_size: 14.0,
			halo_intensity: 0.1,
			angle_degrees: 132.0,
			seed: "0.5333956272631921".into(),
			color_seed: "0.9404079128839915".into(),
		}
	}
}

/// How the halo radius follows the node.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HaloMode {
	/// `halo_size * sqrt(metric)`
	#[default]
	SqrtMetric,
	/// `halo_size * radius`
	Radius,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MappingConfig {
	/// Node metric driving size and halo.
	pub size_metric: String,
	/// Used when a node lacks `size_metric`.
	pub fallback_size_metric: String,
	/// Radius floor for zero, negative or missing metrics.
	pub min_size: f64,
	/// `k` in `label_size = (k * radius)^p`.
	pub label_scale: f64,
	/// `p` in `label_size = (k * radius)^p`, below 1.
	pub label_exponent: f64,
	/// Alpha of the brightened halo color.
	pub halo_alpha: f64,
	pub halo_mode: HaloMode,
	pub border_size: f64,
}

impl Default for MappingConfig {
	fn default() -> Self {
		Self {
			size_metric: "nansi-degree".into(),
			fallback_size_metric: "degree".into(),
			min_size: 0.5,
			label_scale: 80.0,
			label_exponent: 0.4,
			halo_alpha: 0.9,
			halo_mode: HaloMode::SqrtMetric,
			border_size: 1.5,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaletteConfig {
	/// Number of palette entries, fixed for the session.
	pub communities: usize,
}

impl Default for PaletteConfig {
	fn default() -> Self {
		Self { communities: 9 }
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommunityConfig {
	pub resolution: f64,
	pub weight_attribute: String,
}

impl Default for CommunityConfig {
	fn default() -> Self {
		Self {
			resolution: 1.075,
			weight_attribute: "simmelianStrength".into(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
	pub data_url: String,
	/// Edges are kept only when their strength is strictly above this.
	pub edge_threshold: f64,
	pub edge_size: f64,
	pub edge_color: String,
	pub edge_curveness: f64,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			data_url: "./data/graph.gexf".into(),
			edge_threshold: 3.0,
			edge_size: 0.5,
			edge_color: "#999".into(),
			edge_curveness: 0.3,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
	pub iterations: usize,
	pub edge_weight_influence: f64,
	pub gravity: f64,
	pub scaling_ratio: f64,
	pub adjust_sizes: bool,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			iterations: 1000,
			edge_weight_influence: 1.25,
			gravity: 0.5,
			scaling_ratio: 1.0,
			adjust_sizes: false,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
	pub label_font: String,
	pub label_weight: String,
	pub label_color: String,
	pub label_size: f64,
	pub label_density: f64,
	pub label_grid_cell_size: f64,
	pub label_rendered_size_threshold: f64,
	pub stage_padding: f64,
	pub min_camera_ratio: f64,
	pub max_camera_ratio: f64,
	/// Overrides for the thematic minimaps of the export page.
	pub minimap: MinimapConfig,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			label_font: "SourceCodePro".into(),
			label_weight: "bold".into(),
			label_color: "#000".into(),
			label_size: 14.0,
			label_density: 1.5,
			label_grid_cell_size: 190.0,
			label_rendered_size_threshold: 0.0,
			stage_padding: 50.0,
			min_camera_ratio: 0.1,
			max_camera_ratio: 10.0,
			minimap: MinimapConfig::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MinimapConfig {
	pub label_font: String,
	pub label_color: String,
	pub label_rendered_size_threshold: f64,
	pub stage_padding: f64,
	/// Initial camera ratio.
	pub camera_ratio: f64,
}

impl Default for MinimapConfig {
	fn default() -> Self {
		Self {
			label_font: "\"DejaVu Sans Mono\", monospace".into(),
			label_color: "#333".into(),
			label_rendered_size_threshold: 3.5,
			stage_padding: 30.0,
			camera_ratio: 1.0 / 1.3,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
	/// Linear magnification of exported images.
	pub ratio: f64,
	/// One minimap per metric, in display order.
	pub minimap_metrics: Vec<String>,
}

impl Default for ExportConfig {
	fn default() -> Self {
		Self {
			ratio: 6.0,
			minimap_metrics: vec![
				"indegree".into(),
				"betweennessCentrality".into(),
				"outdegree".into(),
				"pagerank".into(),
			],
		}
	}
}
