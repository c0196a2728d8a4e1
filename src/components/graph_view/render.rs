//! Layered canvas renderer over a [`DisplayGraph`] snapshot.

use std::f64::consts::PI;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement};

use super::camera::{Camera, Frame};
use super::label::{draw_hover, draw_label};
use super::scene::{RenderSettings, Scene, ScreenEdge, ScreenNode};
use crate::error::{AtlasError, Result};
use crate::visual::DisplayGraph;

/// Canvas layers, bottom to top. Export composites them in this order.
pub const LAYERS: [&str; 4] = ["edges", "nodes", "labels", "hovers"];

struct Layer {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

pub struct Renderer {
	container: HtmlElement,
	layers: Vec<Layer>,
	graph: Rc<DisplayGraph>,
	settings: RenderSettings,
	camera: Camera,
	width: f64,
	height: f64,
	pixel_ratio: f64,
	selected: Option<usize>,
	hovered: Option<usize>,
	scene: Scene,
}

fn document() -> Result<Document> {
	web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| AtlasError::dom("no document"))
}

fn create_layer(document: &Document, container: &HtmlElement, name: &str) -> Result<Layer> {
	let canvas: HtmlCanvasElement = document
		.create_element("canvas")
		.map_err(|e| AtlasError::js("create canvas", e))?
		.dyn_into()
		.map_err(|_| AtlasError::dom("created element is not a canvas"))?;
	canvas.set_class_name(&format!("graph-layer graph-{name}"));
	let style = canvas.style();
	for (property, value) in [("position", "absolute"), ("top", "0"), ("left", "0")] {
		style
			.set_property(property, value)
			.map_err(|e| AtlasError::js("style canvas", e))?;
	}
	container
		.append_child(&canvas)
		.map_err(|e| AtlasError::js("attach canvas", e))?;
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(|e| AtlasError::js("get 2d context", e))?
		.ok_or_else(|| AtlasError::dom("2d context unavailable"))?
		.dyn_into()
		.map_err(|_| AtlasError::dom("context is not 2d"))?;
	Ok(Layer { canvas, ctx })
}

impl Renderer {
	/// Attach one canvas per layer to `container`, sized to its client box.
	pub fn new(container: &HtmlElement, graph: Rc<DisplayGraph>, settings: RenderSettings) -> Result<Self> {
		let document = document()?;
		let layers = LAYERS
			.iter()
			.map(|name| create_layer(&document, container, name))
			.collect::<Result<Vec<_>>>()?;
		let pixel_ratio = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
		let camera = Camera::new(settings.min_camera_ratio, settings.max_camera_ratio);
		let mut renderer = Self {
			container: container.clone(),
			layers,
			graph,
			settings,
			camera,
			width: 0.0,
			height: 0.0,
			pixel_ratio,
			selected: None,
			hovered: None,
			scene: Scene::default(),
		};
		renderer.resize();
		Ok(renderer)
	}

	/// Match the canvases to the container's current size.
	pub fn resize(&mut self) {
		self.width = f64::from(self.container.client_width());
		self.height = f64::from(self.container.client_height());
		for layer in &self.layers {
			layer.canvas.set_width((self.width * self.pixel_ratio).round() as u32);
			layer.canvas.set_height((self.height * self.pixel_ratio).round() as u32);
			let style = layer.canvas.style();
			let _ = style.set_property("width", &format!("{}px", self.width));
			let _ = style.set_property("height", &format!("{}px", self.height));
		}
	}

	pub fn dimensions(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn pixel_ratio(&self) -> f64 {
		self.pixel_ratio
	}

	/// Swap in a new snapshot. Takes effect on the next refresh.
	pub fn set_graph(&mut self, graph: Rc<DisplayGraph>) {
		self.graph = graph;
	}

	pub fn settings(&self) -> &RenderSettings {
		&self.settings
	}

	pub fn camera(&self) -> &Camera {
		&self.camera
	}

	pub fn camera_mut(&mut self) -> &mut Camera {
		&mut self.camera
	}

	pub fn set_selected(&mut self, selected: Option<usize>) {
		self.selected = selected;
	}

	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	/// Returns whether the hovered node changed.
	pub fn set_hovered(&mut self, hovered: Option<usize>) -> bool {
		let changed = self.hovered != hovered;
		self.hovered = hovered;
		changed
	}

	pub fn frame(&self) -> Frame {
		Frame::new(self.width, self.height, self.settings.stage_padding, self.graph.extent())
	}

	/// Node under a viewport point, as of the last refresh.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		self.scene.node_at(x, y)
	}

	/// Layer canvases in compositing order.
	pub fn canvases(&self) -> impl Iterator<Item = &HtmlCanvasElement> {
		self.layers.iter().map(|l| &l.canvas)
	}

	fn begin(&self, layer: &Layer) {
		let ctx = &layer.ctx;
		let _ = ctx.set_transform(self.pixel_ratio, 0.0, 0.0, self.pixel_ratio, 0.0, 0.0);
		ctx.clear_rect(0.0, 0.0, self.width, self.height);
	}

	/// Reproject and redraw every layer.
	pub fn refresh(&mut self) {
		self.scene = Scene::project(
			&self.graph,
			&self.camera.state(),
			&self.frame(),
			&self.settings,
			self.selected,
		);
		let [edges, nodes, labels, _] = self.layers.as_slice() else {
			return;
		};

		self.begin(edges);
		for edge in &self.scene.edges {
			draw_edge(&edges.ctx, edge);
		}

		self.begin(nodes);
		for node in &self.scene.nodes {
			draw_halo(&nodes.ctx, node);
		}
		for node in &self.scene.nodes {
			draw_node(&nodes.ctx, node);
		}

		self.begin(labels);
		let forced: Vec<usize> = self.selected.into_iter().chain(self.hovered).collect();
		for index in self.scene.labels(&self.settings, self.width, self.height, &forced) {
			if let Some(node) = self.scene.screen_node(index) {
				draw_label(&labels.ctx, &node.label_data(), &self.settings.label);
			}
		}

		self.render_hover();
	}

	/// Redraw only the hover layer: the hovered node and any highlighted one.
	pub fn render_hover(&self) {
		let Some(hovers) = self.layers.get(3) else {
			return;
		};
		self.begin(hovers);
		let targets = self
			.scene
			.nodes
			.iter()
			.filter(|n| n.node.highlighted || Some(n.index) == self.hovered);
		for node in targets {
			draw_hover(&hovers.ctx, &node.label_data(), &self.settings.label);
		}
	}

	/// Detach every canvas from the container.
	pub fn kill(&mut self) {
		for layer in self.layers.drain(..) {
			layer.canvas.remove();
		}
	}
}

fn draw_edge(ctx: &CanvasRenderingContext2d, edge: &ScreenEdge) {
	ctx.set_stroke_style_str(&edge.color);
	ctx.set_line_width(edge.width);
	ctx.begin_path();
	ctx.move_to(edge.from.0, edge.from.1);
	ctx.quadratic_curve_to(edge.control.0, edge.control.1, edge.to.0, edge.to.1);
	ctx.stroke();
}

fn draw_halo(ctx: &CanvasRenderingContext2d, n: &ScreenNode) {
	let (radius, intensity) = (n.node.halo_size, n.node.halo_intensity.clamp(0.0, 1.0));
	if radius <= 0.0 || intensity <= 0.0 {
		return;
	}
	let Ok(gradient) = ctx.create_radial_gradient(n.x, n.y, 0.0, n.x, n.y, radius) else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, &n.node.halo_color);
	let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
	ctx.set_global_alpha(intensity);
	ctx.begin_path();
	let _ = ctx.arc(n.x, n.y, radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
	ctx.set_global_alpha(1.0);
}

fn draw_node(ctx: &CanvasRenderingContext2d, n: &ScreenNode) {
	let size = n.node.size;
	let inner = (size - n.node.border_size).max(0.0);
	if inner < size {
		ctx.begin_path();
		let _ = ctx.arc(n.x, n.y, size, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&n.node.border_color);
		ctx.fill();
	}
	ctx.begin_path();
	let _ = ctx.arc(n.x, n.y, inner, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&n.node.color);
	ctx.fill();
}
