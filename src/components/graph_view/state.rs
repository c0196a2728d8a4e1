use std::rc::Rc;

use log::{debug, info};
use web_sys::HtmlElement;

use super::camera::CameraState;
use super::controls::{Action, CameraCommand, ViewChange};
use super::export::{BusyFlag, ExportPlan, batch_jobs, export_batch};
use super::render::Renderer;
use super::scene::RenderSettings;
use super::search::{FOCUS_DURATION, SearchBox, SearchResult};
use crate::config::SiteConfig;
use crate::error::Result;
use crate::visual::{DisplayGraph, ViewState, VisualMapper};

pub const ZOOM_DURATION: f64 = 600.0;
pub const RESET_DURATION: f64 = 300.0;
/// Pointer travel, in px, beyond which a press is a drag and not a click.
pub const CLICK_TOLERANCE: f64 = 3.0;
const WHEEL_FACTOR: f64 = 1.1;

/// Press / move / release tracking for pan and click.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pointer {
	pressed: Option<Press>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Press {
	origin: (f64, f64),
	last: (f64, f64),
	dragging: bool,
}

impl Pointer {
	pub fn press(&mut self, x: f64, y: f64) {
		self.pressed = Some(Press {
			origin: (x, y),
			last: (x, y),
			dragging: false,
		});
	}

	/// Pan delta since the previous move while pressed.
	pub fn drag(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
		let press = self.pressed.as_mut()?;
		let travel = (x - press.origin.0).hypot(y - press.origin.1);
		press.dragging |= travel > CLICK_TOLERANCE;
		let delta = (x - press.last.0, y - press.last.1);
		press.last = (x, y);
		press.dragging.then_some(delta)
	}

	/// True when the press ends as a click.
	pub fn release(&mut self) -> bool {
		self.pressed.take().is_some_and(|p| !p.dragging)
	}

	pub fn cancel(&mut self) {
		self.pressed = None;
	}

	pub fn is_pressed(&self) -> bool {
		self.pressed.is_some()
	}
}

struct Minimap {
	metric: String,
	graph: Rc<DisplayGraph>,
	renderer: Renderer,
}

/// Everything behind one mounted viewer.
pub struct AtlasState {
	config: Rc<SiteConfig>,
	mapper: VisualMapper,
	view: ViewState,
	display: Rc<DisplayGraph>,
	renderer: Renderer,
	minimaps: Vec<Minimap>,
	search: SearchBox,
	busy: BusyFlag,
	pointer: Pointer,
	dirty: bool,
}

impl AtlasState {
	pub fn new(container: &HtmlElement, mut mapper: VisualMapper, config: Rc<SiteConfig>) -> Result<Self> {
		let view = ViewState::from(&config.view);
		let display = Rc::new(mapper.apply(&view));
		let mut renderer = Renderer::new(container, display.clone(), RenderSettings::from(&config.render))?;
		reset_camera(&mut renderer, &view);
		info!("viewer: {} nodes, {} edges displayed", display.nodes().len(), display.edges().len());
		let search = SearchBox::new(&display);
		Ok(Self {
			config,
			mapper,
			view,
			display,
			renderer,
			minimaps: Vec::new(),
			search,
			busy: BusyFlag::default(),
			pointer: Pointer::default(),
			dirty: true,
		})
	}

	/// One thematic view per `(metric, container)`.
	pub fn attach_minimaps(&mut self, containers: &[(String, HtmlElement)]) -> Result<()> {
		let settings = RenderSettings::minimap(&self.config.render);
		for (metric, container) in containers {
			let graph = Rc::new(self.mapper.thematic(metric));
			let mut renderer = Renderer::new(container, graph.clone(), settings.clone())?;
			renderer
				.camera_mut()
				.set_state(minimap_camera(&self.view, self.config.render.minimap.camera_ratio));
			self.minimaps.push(Minimap {
				metric: metric.clone(),
				graph,
				renderer,
			});
		}
		self.dirty = true;
		Ok(())
	}

	pub fn view(&self) -> &ViewState {
		&self.view
	}

	pub fn search_box(&self) -> &SearchBox {
		&self.search
	}

	pub fn is_exporting(&self) -> bool {
		self.busy.is_busy()
	}

	fn set_view(&mut self, view: ViewState) {
		let change = ViewChange::between(&self.view, &view);
		self.view = view;
		if change.angle {
			let angle = self.view.angle_radians();
			self.renderer.camera_mut().set_angle(angle);
			for m in &mut self.minimaps {
				m.renderer.camera_mut().set_angle(angle);
			}
		}
		if change.remap {
			self.display = Rc::new(self.mapper.apply(&self.view));
			self.renderer.set_graph(self.display.clone());
		}
		self.dirty = true;
	}

	/// Apply a control action. Search results come back to the caller.
	pub fn handle(&mut self, action: Action, now: f64) -> Option<SearchResult> {
		debug!("viewer: {:?}", action);
		match action {
			Action::View(view) => self.set_view(view),
			Action::Camera(command) => self.camera_command(command, now),
			Action::Search(query) => {
				let result = self.search.input(&self.display, &query);
				match result {
					SearchResult::Selected(index) => self.focus_node(index, now),
					_ => self.select(None),
				}
				return Some(result);
			}
			Action::Export => {
				self.export();
			}
			// Fullscreen is a document concern and stays with the component.
			Action::Fullscreen(_) => {}
		}
		None
	}

	fn camera_command(&mut self, command: CameraCommand, now: f64) {
		let camera = self.renderer.camera_mut();
		match command {
			CameraCommand::ZoomIn => camera.animated_zoom(ZOOM_DURATION, now),
			CameraCommand::ZoomOut => camera.animated_unzoom(ZOOM_DURATION, now),
			CameraCommand::Reset => camera.animate(home_camera(&self.view), RESET_DURATION, now),
		}
	}

	fn select(&mut self, index: Option<usize>) {
		self.renderer.set_selected(index);
		self.dirty = true;
	}

	/// Move the camera onto `index` and select it.
	fn focus_node(&mut self, index: usize, now: f64) {
		let Some(node) = self.display.node(index) else {
			return;
		};
		let (x, y) = self.renderer.frame().normalize(node.x, node.y);
		let target = CameraState {
			x,
			y,
			..self.renderer.camera().target()
		};
		self.renderer.camera_mut().animate(target, FOCUS_DURATION, now);
		self.select(Some(index));
	}

	pub fn press(&mut self, x: f64, y: f64) {
		self.pointer.press(x, y);
	}

	/// Pan while pressed, hover otherwise. Returns whether a node is hovered.
	pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
		if self.pointer.is_pressed() {
			if let Some((dx, dy)) = self.pointer.drag(x, y) {
				let frame = self.renderer.frame();
				self.renderer.camera_mut().pan_by(&frame, dx, dy);
				self.dirty = true;
			}
			return self.renderer.hovered().is_some();
		}
		let hovered = self.renderer.node_at(x, y);
		if self.renderer.set_hovered(hovered) {
			self.dirty = true;
		}
		hovered.is_some()
	}

	/// End a press. A click selects the node under it, or clears the
	/// selection and the search on the stage. Returns whether it was a click.
	pub fn release(&mut self, x: f64, y: f64) -> bool {
		if !self.pointer.release() {
			return false;
		}
		let node = self.renderer.node_at(x, y);
		if let Some(n) = node.and_then(|i| self.display.node(i)) {
			debug!("viewer: selected {}", n.id);
		}
		self.search.click(&self.display, node);
		self.select(node);
		true
	}

	/// The search input lost focus. Returns whether its query was reset.
	pub fn blur_search(&mut self) -> bool {
		self.search.blur(&self.display)
	}

	pub fn leave(&mut self) {
		self.pointer.cancel();
		if self.renderer.set_hovered(None) {
			self.dirty = true;
		}
	}

	/// Homepage of the node under a viewport point.
	pub fn homepage_at(&self, x: f64, y: f64) -> Option<String> {
		let index = self.renderer.node_at(x, y)?;
		self.display.node(index)?.homepage.clone()
	}

	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { WHEEL_FACTOR } else { 1.0 / WHEEL_FACTOR };
		let frame = self.renderer.frame();
		self.renderer.camera_mut().zoom_at(&frame, x, y, factor);
		self.dirty = true;
	}

	pub fn resize(&mut self) {
		self.renderer.resize();
		for m in &mut self.minimaps {
			m.renderer.resize();
		}
		self.dirty = true;
	}

	/// Animation frame: advance the camera and redraw what changed.
	pub fn tick(&mut self, now: f64) {
		let moved = self.renderer.camera_mut().tick(now);
		if moved || self.dirty {
			self.renderer.refresh();
		}
		if self.dirty {
			for m in &mut self.minimaps {
				m.renderer.refresh();
			}
		}
		self.dirty = false;
	}

	/// Export the main view alone, or the main view and every minimap. Each
	/// image is sized after the renderer it comes from.
	pub fn export(&self) -> bool {
		let ratio = self.config.export.ratio;
		let main = (self.display.clone(), ExportPlan::capture(&self.renderer, ratio));
		let minimaps = self
			.minimaps
			.iter()
			.map(|m| (m.metric.clone(), m.graph.clone(), ExportPlan::capture(&m.renderer, ratio)))
			.collect();
		let jobs = batch_jobs(main, minimaps);
		info!("export: {} images at ratio {}", jobs.len(), ratio);
		export_batch(&self.busy, jobs)
	}

	/// Release every canvas.
	pub fn kill(&mut self) {
		self.renderer.kill();
		for m in &mut self.minimaps {
			m.renderer.kill();
		}
	}
}

fn home_camera(view: &ViewState) -> CameraState {
	CameraState {
		angle: view.angle_radians(),
		..CameraState::default()
	}
}

fn reset_camera(renderer: &mut Renderer, view: &ViewState) {
	renderer.camera_mut().set_state(home_camera(view));
}

/// Minimaps start zoomed out from the home camera.
fn minimap_camera(view: &ViewState, ratio: f64) -> CameraState {
	CameraState {
		ratio,
		..home_camera(view)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_press_is_a_click() {
		let mut p = Pointer::default();
		p.press(10.0, 10.0);
		assert_eq!(p.drag(11.0, 12.0), None);
		assert!(p.release());
		assert!(!p.is_pressed());
	}

	#[test]
	fn long_travel_pans_and_suppresses_click() {
		let mut p = Pointer::default();
		p.press(10.0, 10.0);
		assert_eq!(p.drag(20.0, 10.0), Some((10.0, 0.0)));
		assert_eq!(p.drag(25.0, 12.0), Some((5.0, 2.0)));
		assert!(!p.release());
	}

	#[test]
	fn moves_without_press_do_nothing() {
		let mut p = Pointer::default();
		assert_eq!(p.drag(5.0, 5.0), None);
		assert!(!p.release());
	}

	fn view(angle_degrees: f64) -> ViewState {
		ViewState {
			angle_degrees,
			halo_size: 14.0,
			halo_intensity: 0.1,
			seed: "s".into(),
			color_seed: "c".into(),
		}
	}

	#[test]
	fn minimap_camera_keeps_the_base_angle_at_its_own_ratio() {
		let camera = minimap_camera(&view(180.0), 1.0 / 1.3);
		assert_eq!((camera.x, camera.y), (0.5, 0.5));
		assert!((camera.ratio - 1.0 / 1.3).abs() < 1e-12);
		assert!((camera.angle - std::f64::consts::PI).abs() < 1e-12);
	}

	#[test]
	fn reset_keeps_the_base_angle() {
		let camera = home_camera(&view(90.0));
		assert_eq!((camera.x, camera.y, camera.ratio), (0.5, 0.5, 1.0));
		assert!((camera.angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
	}
}
