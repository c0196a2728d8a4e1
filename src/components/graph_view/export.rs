//! High-resolution PNG export through an off-screen renderer.

use std::cell::Cell;
use std::rc::Rc;

use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Blob, CanvasRenderingContext2d, Document, HtmlAnchorElement, HtmlCanvasElement, HtmlElement, Url};

use super::camera::CameraState;
use super::render::Renderer;
use super::scene::RenderSettings;
use crate::error::{AtlasError, Result};
use crate::visual::DisplayGraph;

/// Layers composited into an exported image, bottom to top.
pub const EXPORTED_LAYERS: usize = 3;
const EXPORT_DELAY_MS: i32 = 10;
/// Object URLs outlive the download click by this long.
const REVOKE_DELAY_MS: i32 = 40_000;

/// Which image of a batch is being written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportTarget {
	/// The single image of the home page.
	Single,
	Main,
	Minimap(String),
}

impl ExportTarget {
	pub fn file_name(&self) -> String {
		match self {
			Self::Single => "graph.png".into(),
			Self::Main => "main-graph.png".into(),
			Self::Minimap(metric) => format!("mini-graph-{metric}.png"),
		}
	}
}

/// Everything export needs from the live renderer, captured when the
/// export is requested.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportPlan {
	pub camera: CameraState,
	pub width: f64,
	pub height: f64,
	pub pixel_ratio: f64,
	pub ratio: f64,
	pub settings: RenderSettings,
}

impl ExportPlan {
	pub fn capture(live: &Renderer, ratio: f64) -> Self {
		let (width, height) = live.dimensions();
		Self {
			camera: live.camera().state(),
			width,
			height,
			pixel_ratio: live.pixel_ratio(),
			ratio,
			settings: live.settings().clone(),
		}
	}

	/// CSS size of the off-screen container.
	pub fn container_size(&self) -> (f64, f64) {
		(self.width * self.ratio, self.height * self.ratio)
	}

	/// Pixel size of the exported image.
	pub fn raster_size(&self) -> (u32, u32) {
		let (w, h) = self.container_size();
		(
			(w * self.pixel_ratio).round() as u32,
			(h * self.pixel_ratio).round() as u32,
		)
	}

	/// Off-screen camera: default position and zoom, live angle.
	pub fn camera(&self) -> CameraState {
		CameraState {
			angle: self.camera.angle,
			..CameraState::default()
		}
	}
}

pub struct ExportJob {
	pub graph: Rc<DisplayGraph>,
	pub target: ExportTarget,
	/// Captured from the renderer showing `graph`.
	pub plan: ExportPlan,
}

/// Jobs for one request: the single image when there are no minimaps,
/// otherwise the main view followed by each `(metric, graph, plan)`.
pub fn batch_jobs(
	main: (Rc<DisplayGraph>, ExportPlan),
	minimaps: Vec<(String, Rc<DisplayGraph>, ExportPlan)>,
) -> Vec<ExportJob> {
	let (graph, plan) = main;
	let target = if minimaps.is_empty() {
		ExportTarget::Single
	} else {
		ExportTarget::Main
	};
	let mut jobs = vec![ExportJob { graph, target, plan }];
	jobs.extend(minimaps.into_iter().map(|(metric, graph, plan)| ExportJob {
		graph,
		target: ExportTarget::Minimap(metric),
		plan,
	}));
	jobs
}

fn document() -> Result<Document> {
	web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| AtlasError::dom("no document"))
}

fn export_error(file_name: &str, message: impl std::fmt::Display) -> AtlasError {
	AtlasError::Export {
		file_name: file_name.to_string(),
		message: message.to_string(),
	}
}

fn offscreen_container(document: &Document, plan: &ExportPlan) -> Result<HtmlElement> {
	let div: HtmlElement = document
		.create_element("div")
		.map_err(|e| AtlasError::js("create export container", e))?
		.dyn_into()
		.map_err(|_| AtlasError::dom("export container is not an element"))?;
	let (w, h) = plan.container_size();
	let style = div.style();
	for (property, value) in [
		("position", "absolute".to_string()),
		("right", "101%".to_string()),
		("bottom", "101%".to_string()),
		("width", format!("{w}px")),
		("height", format!("{h}px")),
	] {
		style
			.set_property(property, &value)
			.map_err(|e| AtlasError::js("style export container", e))?;
	}
	document
		.body()
		.ok_or_else(|| AtlasError::dom("no body"))?
		.append_child(&div)
		.map_err(|e| AtlasError::js("attach export container", e))?;
	Ok(div)
}

fn composite(renderer: &Renderer, plan: &ExportPlan, document: &Document, file_name: &str) -> Result<HtmlCanvasElement> {
	let (w, h) = plan.raster_size();
	let canvas: HtmlCanvasElement = document
		.create_element("canvas")
		.map_err(|e| AtlasError::js("create export canvas", e))?
		.dyn_into()
		.map_err(|_| export_error(file_name, "not a canvas"))?;
	canvas.set_width(w);
	canvas.set_height(h);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(|e| AtlasError::js("get export context", e))?
		.ok_or_else(|| export_error(file_name, "2d context unavailable"))?
		.dyn_into()
		.map_err(|_| export_error(file_name, "context is not 2d"))?;
	ctx.set_fill_style_str("#FFFFFF");
	ctx.fill_rect(0.0, 0.0, f64::from(w), f64::from(h));
	for layer in renderer.canvases().take(EXPORTED_LAYERS) {
		ctx.draw_image_with_html_canvas_element(layer, 0.0, 0.0)
			.map_err(|e| AtlasError::js("composite layer", e))?;
	}
	Ok(canvas)
}

fn download(canvas: &HtmlCanvasElement, file_name: &str) -> Result<()> {
	let name = file_name.to_string();
	let callback = Closure::once_into_js(move |blob: Option<Blob>| {
		let Some(blob) = blob else {
			warn!("export: {name} could not be serialized, skipped");
			return;
		};
		if let Err(e) = save_blob(&blob, &name) {
			warn!("export: {e}");
			return;
		}
		info!("export: {name} written");
	});
	canvas
		.to_blob(callback.unchecked_ref())
		.map_err(|e| AtlasError::js("serialize export canvas", e))
}

fn save_blob(blob: &Blob, file_name: &str) -> Result<()> {
	let url = Url::create_object_url_with_blob(blob).map_err(|e| AtlasError::js("object url", e))?;
	let anchor: HtmlAnchorElement = document()?
		.create_element("a")
		.map_err(|e| AtlasError::js("create anchor", e))?
		.dyn_into()
		.map_err(|_| export_error(file_name, "not an anchor"))?;
	anchor.set_href(&url);
	anchor.set_download(file_name);
	let _ = anchor.style().set_property("display", "none");
	document()?
		.body()
		.ok_or_else(|| AtlasError::dom("no body"))?
		.append_child(&anchor)
		.map_err(|e| AtlasError::js("attach anchor", e))?;
	anchor.click();
	anchor.remove();
	let revoke = Closure::once_into_js(move || {
		let _ = Url::revoke_object_url(&url);
	});
	web_sys::window()
		.ok_or_else(|| AtlasError::dom("no window"))?
		.set_timeout_with_callback_and_timeout_and_arguments_0(revoke.unchecked_ref(), REVOKE_DELAY_MS)
		.map_err(|e| AtlasError::js("schedule url release", e))?;
	Ok(())
}

/// Render `job` off-screen at its plan's ratio and download it as PNG.
/// The off-screen renderer and its container are always released.
pub fn render_png(job: &ExportJob) -> Result<()> {
	let plan = &job.plan;
	let file_name = job.target.file_name();
	let document = document()?;
	let container = offscreen_container(&document, plan)?;
	let result = Renderer::new(&container, job.graph.clone(), plan.settings.scaled(plan.ratio))
		.and_then(|mut renderer| {
			renderer.camera_mut().set_state(plan.camera());
			renderer.refresh();
			let canvas = composite(&renderer, plan, &document, &file_name);
			renderer.kill();
			canvas
		})
		.and_then(|canvas| download(&canvas, &file_name));
	container.remove();
	result
}

/// Set while an export batch is in flight.
#[derive(Clone, Debug, Default)]
pub struct BusyFlag(Rc<Cell<bool>>);

impl BusyFlag {
	/// Take the flag; false when it is already held.
	pub fn try_begin(&self) -> bool {
		!self.0.replace(true)
	}

	pub fn end(&self) {
		self.0.set(false);
	}

	pub fn is_busy(&self) -> bool {
		self.0.get()
	}
}

/// Run `jobs` after a short delay so the page can repaint first.
/// Returns false without exporting when a batch is already running.
pub fn export_batch(busy: &BusyFlag, jobs: Vec<ExportJob>) -> bool {
	if !busy.try_begin() {
		warn!("export: already running, request ignored");
		return false;
	}
	let flag = busy.clone();
	let run = Closure::once_into_js(move || {
		for job in &jobs {
			if let Err(e) = render_png(job) {
				warn!("export: {e}");
			}
		}
		flag.end();
	});
	let scheduled = web_sys::window().map(|w| {
		w.set_timeout_with_callback_and_timeout_and_arguments_0(run.unchecked_ref(), EXPORT_DELAY_MS)
	});
	if !matches!(scheduled, Some(Ok(_))) {
		warn!("export: could not schedule");
		busy.end();
		return false;
	}
	true
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::RenderConfig;

	fn sized(width: f64, height: f64) -> ExportPlan {
		ExportPlan {
			width,
			height,
			..plan(6.0, 1.0)
		}
	}

	fn plan(ratio: f64, pixel_ratio: f64) -> ExportPlan {
		ExportPlan {
			camera: CameraState {
				x: 0.2,
				y: 0.7,
				ratio: 0.3,
				angle: 1.2,
			},
			width: 800.0,
			height: 600.0,
			pixel_ratio,
			ratio,
			settings: RenderSettings::from(&RenderConfig::default()),
		}
	}

	#[test]
	fn ratio_one_matches_viewport_at_device_resolution() {
		let p = plan(1.0, 2.0);
		assert_eq!(p.container_size(), (800.0, 600.0));
		assert_eq!(p.raster_size(), (1600, 1200));
	}

	#[test]
	fn export_ratio_multiplies_both_dimensions() {
		let p = plan(6.0, 1.5);
		assert_eq!(p.container_size(), (4800.0, 3600.0));
		assert_eq!(p.raster_size(), (7200, 5400));
	}

	#[test]
	fn only_the_angle_is_copied() {
		let camera = plan(6.0, 1.0).camera();
		assert_eq!(
			camera,
			CameraState {
				angle: 1.2,
				..CameraState::default()
			}
		);
	}

	#[test]
	fn file_names() {
		assert_eq!(ExportTarget::Single.file_name(), "graph.png");
		assert_eq!(ExportTarget::Main.file_name(), "main-graph.png");
		assert_eq!(
			ExportTarget::Minimap("pagerank".into()).file_name(),
			"mini-graph-pagerank.png"
		);
	}

	#[test]
	fn lone_view_is_the_single_image() {
		let graph = Rc::new(DisplayGraph::default());
		let jobs = batch_jobs((graph, sized(800.0, 600.0)), Vec::new());
		assert_eq!(jobs.len(), 1);
		assert_eq!(jobs[0].target, ExportTarget::Single);
	}

	#[test]
	fn minimap_jobs_keep_their_own_dimensions() {
		let graph = Rc::new(DisplayGraph::default());
		let minimaps = Vec::from(["indegree", "pagerank"].map(|m| (m.to_string(), graph.clone(), sized(240.0, 240.0))));
		let jobs = batch_jobs((graph.clone(), sized(800.0, 600.0)), minimaps);
		let targets: Vec<_> = jobs.iter().map(|j| j.target.file_name()).collect();
		assert_eq!(targets, ["main-graph.png", "mini-graph-indegree.png", "mini-graph-pagerank.png"]);
		assert_eq!(jobs[0].plan.container_size(), (4800.0, 3600.0));
		for job in &jobs[1..] {
			assert_eq!(job.plan.container_size(), (1440.0, 1440.0));
			assert_eq!(job.plan.raster_size(), (1440, 1440));
		}
	}

	#[test]
	fn busy_flag_rejects_overlap() {
		let flag = BusyFlag::default();
		assert!(flag.try_begin());
		assert!(flag.clone().is_busy());
		assert!(!flag.try_begin());
		flag.end();
		assert!(!flag.is_busy());
		assert!(flag.try_begin());
	}
}
