//! Graph model, GEXF input, and the analytic collaborators (metrics,
//! communities, layout).

pub mod community;
pub mod gexf;
pub mod layout;
pub mod metrics;
pub mod types;

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

pub use types::{Graph, MaxValues, NodeRecord};

use crate::config::SiteConfig;
use layout::{LayoutProvider, LayoutSettings};
use metrics::MetricProvider;

/// Deterministic RNG for a user-visible seed string.
pub fn seeded_rng(seed: &str) -> StdRng {
	let hash = Sha256::digest(seed.as_bytes());
	let mut bytes = [0u8; 32];
	bytes.copy_from_slice(&hash);
	StdRng::from_seed(bytes)
}

/// Output of the analytic stage.
#[derive(Clone, Debug)]
pub struct PreparedGraph {
	/// Every input node and edge with metrics attached. Communities are
	/// detected on this graph.
	pub annotated: Graph,
	/// Filtered, cropped and positioned graph that gets drawn.
	pub positioned: Graph,
	/// Maxima over `annotated`.
	pub max_values: MaxValues,
}

/// Metrics → edge filter → largest component → layout.
pub fn prepare(
	mut raw: Graph,
	config: &SiteConfig,
	metrics: &dyn MetricProvider,
	layout: &dyn LayoutProvider,
) -> PreparedGraph {
	info!("graph: {} nodes, {} edges loaded", raw.node_count(), raw.edge_count());
	metrics.assign(&mut raw);
	let max_values = raw.max_values();

	let mut positioned = raw.clone();
	let dropped = positioned.retain_edges_above(config.graph.edge_threshold);
	info!(
		"graph: {} edges at or below strength {} dropped",
		dropped, config.graph.edge_threshold
	);
	let cropped = positioned.crop_to_largest_component();
	info!(
		"graph: {} nodes outside the largest component dropped, {} remain",
		cropped,
		positioned.node_count()
	);

	layout.assign(
		&mut positioned,
		&LayoutSettings::from(&config.layout),
		&config.view.seed,
	);

	PreparedGraph {
		annotated: raw,
		positioned,
		max_values,
	}
}
