use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, FocusEvent, HtmlElement, HtmlInputElement, MouseEvent, WheelEvent, Window};

use super::controls::{Action, ControlId, dispatch};
use super::load::load;
use super::state::AtlasState;
use crate::error::{AtlasError, Result};
use crate::visual::ViewState;

type Shared = Rc<RefCell<Option<AtlasState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;
type FrameId = Rc<Cell<Option<i32>>>;

fn now() -> f64 {
	js_sys::Date::now()
}

fn local_point(stage: &HtmlElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = stage.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Control id and current value of the element an event came from.
fn control_target(ev: &Event) -> Option<(ControlId, String)> {
	let target: Element = ev.target()?.dyn_into().ok()?;
	let id = ControlId::from_dom_id(&target.id())?;
	let value = target
		.dyn_ref::<HtmlInputElement>()
		.map(HtmlInputElement::value)
		.unwrap_or_default();
	Some((id, value))
}

fn set_fullscreen(on: bool) -> Result<()> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| AtlasError::dom("no document"))?;
	if on {
		document
			.document_element()
			.ok_or_else(|| AtlasError::dom("no root element"))?
			.request_fullscreen()
			.map_err(|e| AtlasError::js("request fullscreen", e))
	} else {
		document.exit_fullscreen();
		Ok(())
	}
}

fn child(document: &Document, parent: &HtmlElement, tag: &str, class: &str) -> Result<HtmlElement> {
	let el: HtmlElement = document
		.create_element(tag)
		.map_err(|e| AtlasError::js("create minimap", e))?
		.dyn_into()
		.map_err(|_| AtlasError::dom("minimap is not an element"))?;
	el.set_class_name(class);
	parent
		.append_child(&el)
		.map_err(|e| AtlasError::js("attach minimap", e))?;
	Ok(el)
}

/// One captioned cell per metric. Returns the stage of each cell.
fn minimap_containers(panel: &HtmlElement, metrics: &[String]) -> Result<Vec<(String, HtmlElement)>> {
	let document = panel
		.owner_document()
		.ok_or_else(|| AtlasError::dom("minimap panel is detached"))?;
	metrics
		.iter()
		.map(|metric| {
			let cell = child(&document, panel, "div", "atlas-minimap")?;
			let _ = cell.set_attribute("data-metric", metric);
			child(&document, &cell, "span", "atlas-minimap-caption")?.set_text_content(Some(metric));
			let stage = child(&document, &cell, "div", "atlas-minimap-stage")?;
			Ok((metric.clone(), stage))
		})
		.collect()
}

fn sync_search(s: &AtlasState, text: RwSignal<String>, labels: RwSignal<Vec<String>>) {
	let search = s.search_box();
	if text.with_untracked(|t| t != search.query()) {
		text.set(search.query().to_string());
	}
	if labels.with_untracked(|l| l.as_slice() != search.shown()) {
		labels.set(search.shown().to_vec());
	}
}

struct Started {
	view: ViewState,
	labels: Vec<String>,
}

async fn start(stage: &HtmlElement, panel: Option<&HtmlElement>, state: &Shared) -> Result<Started> {
	let (mapper, config) = load().await?;
	let mut atlas = AtlasState::new(stage, mapper, config.clone())?;
	if let Some(panel) = panel {
		let containers = minimap_containers(panel, &config.export.minimap_metrics)?;
		atlas.attach_minimaps(&containers)?;
	}
	let started = Started {
		view: atlas.view().clone(),
		labels: atlas.search_box().shown().to_vec(),
	};
	*state.borrow_mut() = Some(atlas);
	Ok(started)
}

fn request_frame(animate: &FrameCallback, frame: &FrameId) {
	if let (Some(cb), Some(window)) = (&*animate.borrow(), web_sys::window()) {
		frame.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
	}
}

fn run_loop(state: Shared, animate: FrameCallback, frame: FrameId, exporting: RwSignal<bool>) {
	let (animate_inner, frame_inner) = (animate.clone(), frame.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		if let Some(ref mut s) = *state.borrow_mut() {
			s.tick(now());
			let busy = s.is_exporting();
			if exporting.get_untracked() != busy {
				exporting.set(busy);
			}
		}
		request_frame(&animate_inner, &frame_inner);
	}));
	request_frame(&animate, &frame);
}

fn watch_resize(state: Shared, resize_cb: FrameCallback) {
	let Some(window): Option<Window> = web_sys::window() else {
		return;
	};
	*resize_cb.borrow_mut() = Some(Closure::new(move || {
		if let Some(ref mut s) = *state.borrow_mut() {
			s.resize();
		}
	}));
	if let Some(ref cb) = *resize_cb.borrow() {
		let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
	}
}

/// Stop the frame loop, unhook the resize listener and release every canvas.
fn teardown(state: &Shared, animate: &FrameCallback, frame: &FrameId, resize_cb: &FrameCallback) {
	if let Some(window) = web_sys::window() {
		if let Some(id) = frame.take() {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(ref cb) = *resize_cb.borrow() {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
	animate.borrow_mut().take();
	resize_cb.borrow_mut().take();
	if let Some(mut s) = state.borrow_mut().take() {
		s.kill();
		debug!("viewer: released");
	}
}

/// Interactive graph viewer with its control panel.
#[component]
pub fn GraphView(
	/// Draw one thematic minimap per configured metric; export then writes
	/// the main view and every minimap.
	#[prop(default = false)]
	minimaps: bool,
) -> impl IntoView {
	let stage_ref = NodeRef::<leptos::html::Div>::new();
	let minimap_ref = NodeRef::<leptos::html::Div>::new();
	let state: Shared = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let frame: FrameId = Rc::new(Cell::new(None));
	let mounted = Rc::new(Cell::new(true));

	let loading = RwSignal::new(true);
	let load_error = RwSignal::new(None::<AtlasError>);
	let hovering = RwSignal::new(false);
	let exporting = RwSignal::new(false);
	let fullscreen = RwSignal::new(false);
	let search_text = RwSignal::new(String::new());
	let labels = RwSignal::new(Vec::<String>::new());
	let view_state = RwSignal::new(None::<ViewState>);

	let handles = SendWrapper::new((state.clone(), animate.clone(), frame.clone(), resize_cb.clone(), mounted.clone()));
	on_cleanup(move || {
		let (state, animate, frame, resize_cb, mounted) = handles.take();
		mounted.set(false);
		teardown(&state, &animate, &frame, &resize_cb);
	});

	let (state_init, animate_init, resize_init) = (state.clone(), animate.clone(), resize_cb.clone());
	let (frame_init, mounted_init) = (frame.clone(), mounted.clone());
	Effect::new(move |_| {
		let Some(stage) = stage_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let stage: HtmlElement = stage.into();
		let panel: Option<HtmlElement> = if minimaps {
			minimap_ref.get_untracked().map(Into::into)
		} else {
			None
		};
		let (state, animate, resize_cb) = (state_init.clone(), animate_init.clone(), resize_init.clone());
		let (frame, mounted) = (frame_init.clone(), mounted_init.clone());
		wasm_bindgen_futures::spawn_local(async move {
			let result = start(&stage, panel.as_ref(), &state).await;
			if !mounted.get() {
				teardown(&state, &animate, &frame, &resize_cb);
				return;
			}
			loading.set(false);
			match result {
				Ok(started) => {
					labels.set(started.labels);
					view_state.set(Some(started.view));
					run_loop(state.clone(), animate, frame, exporting);
					watch_resize(state, resize_cb);
				}
				Err(e) => {
					error!("viewer: {e}");
					load_error.set(Some(e));
				}
			}
		});
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(stage) = stage_ref.get() else {
			return;
		};
		let (x, y) = local_point(&stage, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(stage) = stage_ref.get() else {
			return;
		};
		let (x, y) = local_point(&stage, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			let over_node = s.pointer_move(x, y);
			if hovering.get_untracked() != over_node {
				hovering.set(over_node);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(stage) = stage_ref.get() else {
			return;
		};
		let (x, y) = local_point(&stage, &ev);
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if s.release(x, y) {
				sync_search(s, search_text, labels);
			}
		}
	};

	let state_bl = state.clone();
	let on_search_blur = move |_: FocusEvent| {
		if let Some(ref mut s) = *state_bl.borrow_mut() {
			if s.blur_search() {
				sync_search(s, search_text, labels);
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.leave();
		}
		hovering.set(false);
	};

	let state_dc = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(stage) = stage_ref.get() else {
			return;
		};
		let (x, y) = local_point(&stage, &ev);
		let homepage = state_dc.borrow().as_ref().and_then(|s| s.homepage_at(x, y));
		if let (Some(url), Some(window)) = (homepage, web_sys::window()) {
			if window.open_with_url_and_target(&url, "_blank").is_err() {
				warn!("viewer: could not open {url}");
			}
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(stage) = stage_ref.get() else {
			return;
		};
		let (x, y) = local_point(&stage, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	// Every control in the panel goes through this one handler.
	let state_ctl = state.clone();
	let on_control = Rc::new(move |ev: &Event| {
		let Some((id, value)) = control_target(ev) else {
			return;
		};
		if id.is_button() != (ev.type_() == "click") {
			return;
		}
		let mut guard = state_ctl.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		let Some(action) = dispatch(id, &value, s.view(), js_sys::Math::random) else {
			return;
		};
		match action {
			Action::Fullscreen(on) => match set_fullscreen(on) {
				Ok(()) => fullscreen.set(on),
				Err(e) => warn!("viewer: {e}"),
			},
			Action::Search(query) => {
				if let Some(result) = s.handle(Action::Search(query), now()) {
					debug!("search: {:?}", result);
				}
				sync_search(s, search_text, labels);
			}
			action => {
				s.handle(action, now());
			}
		}
		view_state.set(Some(s.view().clone()));
		exporting.set(s.is_exporting());
	});
	let (control_input, control_click) = (on_control.clone(), on_control);

	let field = move |read: fn(&ViewState) -> String| {
		move || view_state.with(|v| v.as_ref().map(read).unwrap_or_default())
	};

	view! {
		<div class="atlas" class:atlas-fullscreen=move || fullscreen.get()>
			<div
				node_ref=stage_ref
				class="atlas-stage"
				style:cursor=move || if hovering.get() { "pointer" } else { "default" }
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:wheel=on_wheel
			></div>
			<Show when=move || loading.get()>
				<p class="atlas-loading">"Loading graph…"</p>
			</Show>
			{move || load_error.get().map_or(Ok(()), Err)}

			<div
				class="atlas-controls"
				on:input=move |ev| control_input(&ev)
				on:click=move |ev| control_click(&ev)
			>
				<input
					id=ControlId::Search.dom_id()
					type="search"
					list="atlas-nodes"
					placeholder="Search a node"
					prop:value=move || search_text.get()
					on:blur=on_search_blur
				/>
				<datalist id="atlas-nodes">
					{move || {
						labels.get().into_iter().map(|label| view! { <option value=label /> }).collect_view()
					}}
				</datalist>

				<div class="atlas-camera">
					<button id=ControlId::ZoomIn.dom_id() title="Zoom in">"+"</button>
					<button id=ControlId::ZoomOut.dom_id() title="Zoom out">"-"</button>
					<button id=ControlId::ZoomReset.dom_id() title="Reset zoom">"reset"</button>
					<Show
						when=move || !fullscreen.get()
						fallback=|| view! { <button id=ControlId::Regscreen.dom_id()>"exit fullscreen"</button> }
					>
						<button id=ControlId::Fullscreen.dom_id()>"fullscreen"</button>
					</Show>
				</div>

				<label>
					"angle"
					<input id=ControlId::Angle.dom_id() type="number" step="1" prop:value=field(|v| v.angle_degrees.to_string()) />
				</label>
				<label>
					"halo size"
					<input id=ControlId::HaloSize.dom_id() type="number" step="1" min="0" prop:value=field(|v| v.halo_size.to_string()) />
				</label>
				<label>
					"halo intensity"
					<input id=ControlId::HaloIntensity.dom_id() type="number" step="0.01" min="0" prop:value=field(|v| v.halo_intensity.to_string()) />
				</label>
				<label>
					"seed"
					<input id=ControlId::Seed.dom_id() type="text" prop:value=field(|v| v.seed.clone()) />
					<button id=ControlId::RandomSeed.dom_id()>"random"</button>
				</label>
				<label>
					"color seed"
					<input id=ControlId::ColorSeed.dom_id() type="text" prop:value=field(|v| v.color_seed.clone()) />
					<button id=ControlId::RandomColorSeed.dom_id()>"random"</button>
				</label>

				<button id=ControlId::Export.dom_id() prop:disabled=move || exporting.get()>
					{move || if exporting.get() { "exporting…" } else { "export PNG" }}
				</button>
			</div>

			<div node_ref=minimap_ref class="atlas-minimaps"></div>
		</div>
	}
}
