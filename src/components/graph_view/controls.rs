//! Control table and the single dispatch function behind every control.

use std::str::FromStr;

use crate::visual::ViewState;

/// Every interactive control of the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlId {
	Search,
	ZoomIn,
	ZoomOut,
	ZoomReset,
	Fullscreen,
	Regscreen,
	Angle,
	HaloSize,
	HaloIntensity,
	Seed,
	ColorSeed,
	RandomSeed,
	RandomColorSeed,
	Export,
}

impl ControlId {
	pub const ALL: [ControlId; 14] = [
		Self::Search,
		Self::ZoomIn,
		Self::ZoomOut,
		Self::ZoomReset,
		Self::Fullscreen,
		Self::Regscreen,
		Self::Angle,
		Self::HaloSize,
		Self::HaloIntensity,
		Self::Seed,
		Self::ColorSeed,
		Self::RandomSeed,
		Self::RandomColorSeed,
		Self::Export,
	];

	pub fn dom_id(self) -> &'static str {
		match self {
			Self::Search => "search-input",
			Self::ZoomIn => "zoom-in",
			Self::ZoomOut => "zoom-out",
			Self::ZoomReset => "zoom-reset",
			Self::Fullscreen => "view-fullscreen",
			Self::Regscreen => "view-regscreen",
			Self::Angle => "angle",
			Self::HaloSize => "halo-size",
			Self::HaloIntensity => "halo-intensity",
			Self::Seed => "seed",
			Self::ColorSeed => "color-seed",
			Self::RandomSeed => "random-seed",
			Self::RandomColorSeed => "random-color-seed",
			Self::Export => "export-png",
		}
	}

	pub fn from_dom_id(id: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|c| c.dom_id() == id)
	}

	/// Buttons fire on click, everything else on input.
	pub fn is_button(self) -> bool {
		matches!(
			self,
			Self::ZoomIn
				| Self::ZoomOut
				| Self::ZoomReset
				| Self::Fullscreen
				| Self::Regscreen
				| Self::RandomSeed
				| Self::RandomColorSeed
				| Self::Export
		)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraCommand {
	ZoomIn,
	ZoomOut,
	Reset,
}

/// What a control event asks the viewer to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
	/// Replace the view state.
	View(ViewState),
	Camera(CameraCommand),
	Fullscreen(bool),
	Search(String),
	Export,
}

fn parse<T: FromStr>(id: ControlId, value: &str) -> Option<T> {
	let parsed = value.trim().parse().ok();
	if parsed.is_none() {
		log::debug!("controls: ignoring {:?} value {:?}", id, value);
	}
	parsed
}

/// Map a control event onto an [`Action`]. `random` supplies fresh seeds.
/// Unparseable values yield `None`.
pub fn dispatch(id: ControlId, value: &str, view: &ViewState, random: impl FnOnce() -> f64) -> Option<Action> {
	let next = |f: &dyn Fn(&mut ViewState)| {
		let mut v = view.clone();
		f(&mut v);
		Some(Action::View(v))
	};
	match id {
		ControlId::Search => Some(Action::Search(value.to_string())),
		ControlId::ZoomIn => Some(Action::Camera(CameraCommand::ZoomIn)),
		ControlId::ZoomOut => Some(Action::Camera(CameraCommand::ZoomOut)),
		ControlId::ZoomReset => Some(Action::Camera(CameraCommand::Reset)),
		ControlId::Fullscreen => Some(Action::Fullscreen(true)),
		ControlId::Regscreen => Some(Action::Fullscreen(false)),
		ControlId::Export => Some(Action::Export),
		ControlId::Angle => {
			let degrees: f64 = parse(id, value)?;
			next(&|v| v.angle_degrees = degrees)
		}
		ControlId::HaloSize => {
			let size: f64 = parse(id, value)?;
			next(&|v| v.halo_size = size.max(0.0))
		}
		ControlId::HaloIntensity => {
			let intensity: f64 = parse(id, value)?;
			next(&|v| v.halo_intensity = intensity.max(0.0))
		}
		ControlId::Seed => next(&|v| v.seed = value.to_string()),
		ControlId::ColorSeed => next(&|v| v.color_seed = value.to_string()),
		ControlId::RandomSeed => {
			let seed = random().to_string();
			next(&|v| v.seed = seed.clone())
		}
		ControlId::RandomColorSeed => {
			let seed = random().to_string();
			next(&|v| v.color_seed = seed.clone())
		}
	}
}

/// How a view change reaches the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewChange {
	/// Only the camera rotates.
	pub angle: bool,
	/// The display snapshot must be rebuilt.
	pub remap: bool,
}

impl ViewChange {
	pub fn between(old: &ViewState, new: &ViewState) -> Self {
		Self {
			angle: old.angle_degrees != new.angle_degrees,
			remap: old.halo_size != new.halo_size
				|| old.halo_intensity != new.halo_intensity
				|| old.seed != new.seed
				|| old.color_seed != new.color_seed,
		}
	}
}
