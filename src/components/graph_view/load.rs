//! Fetching the site configuration and graph document.

use std::rc::Rc;

use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::config::{CONFIG_URL, SiteConfig};
use crate::error::{AtlasError, Result};
use crate::graph::community::LocalMoving;
use crate::graph::layout::ForceLayout;
use crate::graph::metrics::StandardMetrics;
use crate::graph::{gexf, prepare};
use crate::visual::VisualMapper;

async fn fetch_text(url: &str) -> Result<String> {
	let fetch_error = |message: String| AtlasError::Fetch {
		url: url.to_string(),
		message,
	};
	let window = web_sys::window().ok_or_else(|| AtlasError::dom("no window"))?;
	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(|e| fetch_error(format!("{e:?}")))?
		.dyn_into()
		.map_err(|_| fetch_error("not a response".into()))?;
	if !response.ok() {
		return Err(fetch_error(format!("HTTP {}", response.status())));
	}
	let body = response.text().map_err(|e| fetch_error(format!("{e:?}")))?;
	JsFuture::from(body)
		.await
		.map_err(|e| fetch_error(format!("{e:?}")))?
		.as_string()
		.ok_or_else(|| fetch_error("body is not text".into()))
}

/// The site configuration, or the built-in one when it is missing or bad.
pub async fn load_config() -> SiteConfig {
	match fetch_text(CONFIG_URL).await.and_then(|text| SiteConfig::from_json(&text)) {
		Ok(config) => {
			info!("config: loaded {}", CONFIG_URL);
			config
		}
		Err(e) => {
			warn!("config: {e}; using built-in defaults");
			SiteConfig::builtin()
		}
	}
}

/// Fetch, analyze and lay out the graph, ready for display.
pub async fn load() -> Result<(VisualMapper, Rc<SiteConfig>)> {
	let config = Rc::new(load_config().await);
	let text = fetch_text(&config.graph.data_url).await?;
	let raw = gexf::parse(&text)?;
	let prepared = prepare(
		raw,
		&config,
		&StandardMetrics::default(),
		&ForceLayout::new(config.mapping.size_metric.clone()),
	);
	let mapper = VisualMapper::new(prepared, config.clone(), Box::new(LocalMoving::default()));
	Ok((mapper, config))
}
