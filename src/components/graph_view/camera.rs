//! Camera state, animation, and the graph → viewport transform.

/// Camera over the normalized frame, where the whole graph spans [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
	pub x: f64,
	pub y: f64,
	pub ratio: f64,
	/// Radians.
	pub angle: f64,
}

impl Default for CameraState {
	fn default() -> Self {
		Self {
			x: 0.5,
			y: 0.5,
			ratio: 1.0,
			angle: 0.0,
		}
	}
}

fn ease_in_out_quad(t: f64) -> f64 {
	if t < 0.5 {
		2.0 * t * t
	} else {
		-1.0 + (4.0 - 2.0 * t) * t
	}
}

#[derive(Clone, Copy, Debug)]
struct Animation {
	from: CameraState,
	to: CameraState,
	start: f64,
	duration: f64,
}

/// Factor applied by the zoom buttons.
pub const ZOOM_FACTOR: f64 = 1.5;

#[derive(Clone, Debug)]
pub struct Camera {
	state: CameraState,
	animation: Option<Animation>,
	min_ratio: f64,
	max_ratio: f64,
}

impl Camera {
	pub fn new(min_ratio: f64, max_ratio: f64) -> Self {
		Self {
			state: CameraState::default(),
			animation: None,
			min_ratio,
			max_ratio,
		}
	}

	pub fn state(&self) -> CameraState {
		self.state
	}

	pub fn set_state(&mut self, state: CameraState) {
		self.animation = None;
		self.state = self.clamped(state);
	}

	pub fn set_angle(&mut self, angle: f64) {
		self.state.angle = angle;
		if let Some(anim) = self.animation.as_mut() {
			anim.to.angle = angle;
		}
	}

	fn clamped(&self, mut state: CameraState) -> CameraState {
		state.ratio = state.ratio.clamp(self.min_ratio, self.max_ratio);
		state
	}

	/// Start an animation toward `target`; `now` and `duration` in ms.
	pub fn animate(&mut self, target: CameraState, duration: f64, now: f64) {
		let to = self.clamped(target);
		if duration <= 0.0 {
			self.set_state(to);
			return;
		}
		self.animation = Some(Animation {
			from: self.state,
			to,
			start: now,
			duration,
		});
	}

	pub fn animated_zoom(&mut self, duration: f64, now: f64) {
		let target = self.target();
		self.animate(
			CameraState {
				ratio: target.ratio / ZOOM_FACTOR,
				..target
			},
			duration,
			now,
		);
	}

	pub fn animated_unzoom(&mut self, duration: f64, now: f64) {
		let target = self.target();
		self.animate(
			CameraState {
				ratio: target.ratio * ZOOM_FACTOR,
				..target
			},
			duration,
			now,
		);
	}

	/// Where the camera is headed.
	pub fn target(&self) -> CameraState {
		self.animation.map_or(self.state, |a| a.to)
	}

	pub fn is_animated(&self) -> bool {
		self.animation.is_some()
	}

	/// Advance the running animation; returns whether the state changed.
	pub fn tick(&mut self, now: f64) -> bool {
		let Some(anim) = self.animation else {
			return false;
		};
		let t = ((now - anim.start) / anim.duration).clamp(0.0, 1.0);
		let k = ease_in_out_quad(t);
		let lerp = |a: f64, b: f64| a + (b - a) * k;
		self.state = CameraState {
			x: lerp(anim.from.x, anim.to.x),
			y: lerp(anim.from.y, anim.to.y),
			ratio: lerp(anim.from.ratio, anim.to.ratio),
			angle: lerp(anim.from.angle, anim.to.angle),
		};
		if t >= 1.0 {
			self.state = anim.to;
			self.animation = None;
		}
		true
	}

	/// Zoom around a viewport point, used by the mouse wheel.
	pub fn zoom_at(&mut self, frame: &Frame, px: f64, py: f64, factor: f64) {
		let before = frame.viewport_to_normalized(&self.state, px, py);
		let ratio = (self.state.ratio * factor).clamp(self.min_ratio, self.max_ratio);
		let mut next = CameraState {
			ratio,
			..self.state
		};
		let after = frame.viewport_to_normalized(&next, px, py);
		next.x += before.0 - after.0;
		next.y += before.1 - after.1;
		self.set_state(next);
	}

	/// Pan by a viewport delta.
	pub fn pan_by(&mut self, frame: &Frame, dx: f64, dy: f64) {
		let origin = frame.viewport_to_normalized(&self.state, 0.0, 0.0);
		let moved = frame.viewport_to_normalized(&self.state, dx, dy);
		let state = CameraState {
			x: self.state.x - (moved.0 - origin.0),
			y: self.state.y - (moved.1 - origin.1),
			..self.state
		};
		self.set_state(state);
	}
}

/// Graph extent fitted into a viewport with stage padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
	pub width: f64,
	pub height: f64,
	pub padding: f64,
	center: (f64, f64),
	span: f64,
}

impl Frame {
	pub fn new(width: f64, height: f64, padding: f64, extent: Option<(f64, f64, f64, f64)>) -> Self {
		let (min_x, min_y, max_x, max_y) = extent.unwrap_or((0.0, 0.0, 1.0, 1.0));
		let span = (max_x - min_x).max(max_y - min_y);
		Self {
			width,
			height,
			padding,
			center: ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
			span: if span > 0.0 { span } else { 1.0 },
		}
	}

	/// Graph coordinates into the normalized [0, 1] frame.
	pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
		(
			0.5 + (x - self.center.0) / self.span,
			0.5 + (y - self.center.1) / self.span,
		)
	}

	fn scale(&self, camera: &CameraState) -> f64 {
		(self.width.min(self.height) - 2.0 * self.padding).max(1.0) / camera.ratio
	}

	pub fn normalized_to_viewport(&self, camera: &CameraState, nx: f64, ny: f64) -> (f64, f64) {
		let (dx, dy) = (nx - camera.x, ny - camera.y);
		let (sin, cos) = camera.angle.sin_cos();
		let (rx, ry) = (dx * cos + dy * sin, -dx * sin + dy * cos);
		let scale = self.scale(camera);
		// Graph y grows upward, viewport y downward.
		(self.width / 2.0 + rx * scale, self.height / 2.0 - ry * scale)
	}

	pub fn viewport_to_normalized(&self, camera: &CameraState, px: f64, py: f64) -> (f64, f64) {
		let scale = self.scale(camera);
		let (rx, ry) = ((px - self.width / 2.0) / scale, -(py - self.height / 2.0) / scale);
		let (sin, cos) = camera.angle.sin_cos();
		(
			camera.x + rx * cos - ry * sin,
			camera.y + rx * sin + ry * cos,
		)
	}

	pub fn graph_to_viewport(&self, camera: &CameraState, x: f64, y: f64) -> (f64, f64) {
		let (nx, ny) = self.normalize(x, y);
		self.normalized_to_viewport(camera, nx, ny)
	}

	/// On-screen scale of node sizes at the camera's zoom.
	pub fn size_scale(camera: &CameraState) -> f64 {
		1.0 / camera.ratio.sqrt()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: (f64, f64), b: (f64, f64)) -> bool {
		(a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
	}

	#[test]
	fn default_camera_centers_the_graph() {
		let frame = Frame::new(800.0, 600.0, 50.0, Some((-10.0, -5.0, 10.0, 5.0)));
		let camera = CameraState::default();
		assert!(close(frame.graph_to_viewport(&camera, 0.0, 0.0), (400.0, 300.0)));
		// span 20 fits 500 px: x = 10 is 250 px right of center.
		assert!(close(frame.graph_to_viewport(&camera, 10.0, 0.0), (650.0, 300.0)));
		assert!(close(frame.graph_to_viewport(&camera, 0.0, 5.0), (400.0, 175.0)));
	}

	#[test]
	fn inverse_transform_round_trips() {
		let frame = Frame::new(640.0, 480.0, 20.0, Some((0.0, 0.0, 3.0, 7.0)));
		let camera = CameraState {
			x: 0.3,
			y: 0.6,
			ratio: 0.7,
			angle: 132f64.to_radians(),
		};
		let (px, py) = frame.normalized_to_viewport(&camera, 0.42, 0.17);
		assert!(close(frame.viewport_to_normalized(&camera, px, py), (0.42, 0.17)));
	}

	#[test]
	fn animation_reaches_target() {
		let mut camera = Camera::new(0.1, 10.0);
		camera.animated_zoom(600.0, 1000.0);
		assert!(camera.is_animated());
		assert!(camera.tick(1300.0));
		assert!(camera.state().ratio < 1.0 && camera.state().ratio > 1.0 / ZOOM_FACTOR);
		camera.tick(1600.0);
		assert!(!camera.is_animated());
		assert!((camera.state().ratio - 1.0 / ZOOM_FACTOR).abs() < 1e-12);
		assert!(!camera.tick(1700.0));
	}

	#[test]
	fn ratio_is_clamped() {
		let mut camera = Camera::new(0.1, 10.0);
		camera.set_state(CameraState {
			ratio: 50.0,
			..CameraState::default()
		});
		assert_eq!(camera.state().ratio, 10.0);
	}

	#[test]
	fn zoom_at_keeps_the_point_fixed() {
		let frame = Frame::new(800.0, 600.0, 50.0, None);
		let mut camera = Camera::new(0.1, 10.0);
		let before = frame.viewport_to_normalized(&camera.state(), 100.0, 120.0);
		camera.zoom_at(&frame, 100.0, 120.0, 0.5);
		let after = frame.viewport_to_normalized(&camera.state(), 100.0, 120.0);
		assert!(close(before, after));
	}
}
