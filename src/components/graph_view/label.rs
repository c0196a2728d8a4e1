//! Per-node label and hover drawing.
//!
//! Both routines run once per visible node per frame, against a
//! [`LabelSurface`]. Coordinates are viewport pixels.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

/// Gap between the node glyph and its label.
pub const LABEL_PADDING: f64 = 3.0;
/// Inner margin of the hover callout.
pub const HOVER_PADDING: f64 = 2.0;
const HOVER_SHADOW_BLUR: f64 = 8.0;
const HOVER_SHADOW_COLOR: &str = "#000";
const HOVER_FILL: &str = "#FFF";

/// The 2D canvas operations the label renderer needs.
pub trait LabelSurface {
	fn set_fill_style(&self, color: &str);
	fn set_font(&self, font: &str);
	fn fill_text(&self, text: &str, x: f64, y: f64);
	fn measure_text(&self, text: &str) -> f64;
	fn set_shadow(&self, blur: f64, color: &str);
	fn begin_path(&self);
	fn move_to(&self, x: f64, y: f64);
	fn line_to(&self, x: f64, y: f64);
	fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
	fn close_path(&self);
	fn fill(&self);
}

impl LabelSurface for CanvasRenderingContext2d {
	fn set_fill_style(&self, color: &str) {
		self.set_fill_style_str(color);
	}

	fn set_font(&self, font: &str) {
		CanvasRenderingContext2d::set_font(self, font);
	}

	fn fill_text(&self, text: &str, x: f64, y: f64) {
		let _ = CanvasRenderingContext2d::fill_text(self, text, x, y);
	}

	fn measure_text(&self, text: &str) -> f64 {
		CanvasRenderingContext2d::measure_text(self, text)
			.map(|m| m.width())
			.unwrap_or(0.0)
	}

	fn set_shadow(&self, blur: f64, color: &str) {
		self.set_shadow_offset_x(0.0);
		self.set_shadow_offset_y(0.0);
		self.set_shadow_blur(blur);
		self.set_shadow_color(color);
	}

	fn begin_path(&self) {
		CanvasRenderingContext2d::begin_path(self);
	}

	fn move_to(&self, x: f64, y: f64) {
		CanvasRenderingContext2d::move_to(self, x, y);
	}

	fn line_to(&self, x: f64, y: f64) {
		CanvasRenderingContext2d::line_to(self, x, y);
	}

	fn arc(&self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
		let _ = self.arc_with_anticlockwise(x, y, radius.max(0.0), start, end, anticlockwise);
	}

	fn close_path(&self) {
		CanvasRenderingContext2d::close_path(self);
	}

	fn fill(&self) {
		CanvasRenderingContext2d::fill(self);
	}
}

/// Global label defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
	pub font: String,
	pub weight: String,
	pub color: String,
	pub size: f64,
}

/// Screen-space data of one node, as handed to the label callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelData<'a> {
	pub x: f64,
	pub y: f64,
	pub size: f64,
	pub label: &'a str,
	pub label_size: Option<f64>,
	pub label_color: Option<&'a str>,
	pub offset_x: f64,
	pub offset_y: f64,
}

impl LabelData<'_> {
	fn font_size(&self, style: &LabelStyle) -> f64 {
		self.label_size.filter(|s| *s > 0.0).unwrap_or(style.size)
	}
}

pub fn font(style: &LabelStyle, size: f64) -> String {
	format!("{} {}px {}", style.weight, size, style.font)
}

/// Baseline origin of the label text.
pub fn label_position(data: &LabelData<'_>, style: &LabelStyle) -> (f64, f64) {
	let size = data.font_size(style);
	(
		data.x + data.offset_x + data.size + LABEL_PADDING,
		data.y + data.offset_y + size / 3.0,
	)
}

pub fn draw_label(ctx: &impl LabelSurface, data: &LabelData<'_>, style: &LabelStyle) {
	if data.label.is_empty() {
		return;
	}
	let size = data.font_size(style);
	ctx.set_fill_style(data.label_color.unwrap_or(&style.color));
	ctx.set_font(&font(style, size));
	let (x, y) = label_position(data, style);
	ctx.fill_text(data.label, x, y);
}

/// Outline of the hover backdrop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Callout {
	/// Unlabeled node: a disc slightly larger than the glyph.
	Disc { x: f64, y: f64, radius: f64 },
	/// Labeled node: a lozenge wrapping the glyph on the left and the text on
	/// the right.
	Pill {
		x: f64,
		y: f64,
		/// Radius of the left arc around the glyph.
		radius: f64,
		/// Half opening angle of the left arc.
		angle: f64,
		height: f64,
		/// x of the center of the right half circle.
		right: f64,
	},
}

impl Callout {
	pub fn compute(data: &LabelData<'_>, style: &LabelStyle, text_width: f64) -> Self {
		if data.label.is_empty() {
			return Self::Disc {
				x: data.x,
				y: data.y,
				radius: data.size + HOVER_PADDING,
			};
		}
		let font_size = data.font_size(style);
		let height = (font_size + 2.0 * HOVER_PADDING).round();
		let radius = data.size.max(font_size / 2.0) + HOVER_PADDING;
		let angle = (height / 2.0 / radius).clamp(-1.0, 1.0).asin();
		let box_width = (text_width + 5.0).round();
		Self::Pill {
			x: data.x,
			y: data.y,
			radius,
			angle,
			height,
			right: data.x + radius + box_width,
		}
	}

	pub fn trace(&self, ctx: &impl LabelSurface) {
		ctx.begin_path();
		match *self {
			Self::Disc { x, y, radius } => ctx.arc(x, y, radius, 0.0, 2.0 * PI, false),
			Self::Pill {
				x,
				y,
				radius,
				angle,
				height,
				right,
			} => {
				let half = height / 2.0;
				let dx = (radius * radius - half * half).abs().sqrt();
				ctx.move_to(x + dx, y + half);
				ctx.line_to(right, y + half);
				ctx.arc(right, y, half, PI / 2.0, -PI / 2.0, true);
				ctx.line_to(x + dx, y - half);
				ctx.arc(x, y, radius, -angle, angle, true);
			}
		}
		ctx.close_path();
	}
}

pub fn draw_hover(ctx: &impl LabelSurface, data: &LabelData<'_>, style: &LabelStyle) {
	let size = data.font_size(style);
	ctx.set_font(&font(style, size));
	let text_width = if data.label.is_empty() {
		0.0
	} else {
		ctx.measure_text(data.label)
	};

	ctx.set_fill_style(HOVER_FILL);
	ctx.set_shadow(HOVER_SHADOW_BLUR, HOVER_SHADOW_COLOR);
	Callout::compute(data, style, text_width).trace(ctx);
	ctx.fill();
	ctx.set_shadow(0.0, "transparent");

	draw_label(ctx, data, style);
}

#[cfg(test)]
pub(crate) mod recorder {
	use std::cell::RefCell;

	use super::LabelSurface;

	/// Records surface calls as strings.
	#[derive(Default)]
	pub struct Recorder {
		pub calls: RefCell<Vec<String>>,
		pub char_width: f64,
	}

	impl Recorder {
		pub fn with_char_width(char_width: f64) -> Self {
			Self {
				calls: RefCell::default(),
				char_width,
			}
		}

		fn push(&self, call: String) {
			self.calls.borrow_mut().push(call);
		}

		pub fn calls(&self) -> Vec<String> {
			self.calls.borrow().clone()
		}
	}

	impl LabelSurface for Recorder {
		fn set_fill_style(&self, color: &str) {
			self.push(format!("fill_style {}", color));
		}
		fn set_font(&self, font: &str) {
			self.push(format!("font {}", font));
		}
		fn fill_text(&self, text: &str, x: f64, y: f64) {
			self.push(format!("fill_text {} {} {}", text, x, y));
		}
		fn measure_text(&self, text: &str) -> f64 {
			text.chars().count() as f64 * self.char_width
		}
		fn set_shadow(&self, blur: f64, color: &str) {
			self.push(format!("shadow {} {}", blur, color));
		}
		fn begin_path(&self) {
			self.push("begin_path".into());
		}
		fn move_to(&self, x: f64, y: f64) {
			self.push(format!("move_to {} {}", x, y));
		}
		fn line_to(&self, x: f64, y: f64) {
			self.push(format!("line_to {} {}", x, y));
		}
		fn arc(&self, x: f64, y: f64, r: f64, start: f64, end: f64, anticlockwise: bool) {
			self.push(format!("arc {} {} {} {:.4} {:.4} {}", x, y, r, start, end, anticlockwise));
		}
		fn close_path(&self) {
			self.push("close_path".into());
		}
		fn fill(&self) {
			self.push("fill".into());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::recorder::Recorder;
	use super::*;

	fn style() -> LabelStyle {
		LabelStyle {
			font: "SourceCodePro".into(),
			weight: "bold".into(),
			color: "#000".into(),
			size: 14.0,
		}
	}

	fn data(label: &str) -> LabelData<'_> {
		LabelData {
			x: 100.0,
			y: 50.0,
			size: 4.0,
			label,
			label_size: Some(12.0),
			label_color: None,
			offset_x: 0.0,
			offset_y: 0.0,
		}
	}

	#[test]
	fn empty_label_draws_nothing() {
		let ctx = Recorder::default();
		draw_label(&ctx, &data(""), &style());
		assert!(ctx.calls().is_empty());
	}

	#[test]
	fn label_sits_right_of_the_glyph() {
		let ctx = Recorder::default();
		draw_label(&ctx, &data("rust"), &style());
		assert_eq!(
			ctx.calls(),
			vec![
				"fill_style #000".to_string(),
				"font bold 12px SourceCodePro".to_string(),
				"fill_text rust 107 54".to_string(),
			]
		);
	}

	#[test]
	fn offsets_and_defaults_apply() {
		let ctx = Recorder::default();
		let d = LabelData {
			label_size: None,
			label_color: Some("#333"),
			offset_x: 2.0,
			offset_y: -6.0,
			..data("x")
		};
		draw_label(&ctx, &d, &style());
		let calls = ctx.calls();
		assert_eq!(calls[0], "fill_style #333");
		assert_eq!(calls[1], "font bold 14px SourceCodePro");
		let (x, y) = label_position(&d, &style());
		assert_eq!(x, 109.0);
		assert!((y - (44.0 + 14.0 / 3.0)).abs() < 1e-12);
	}

	#[test]
	fn unlabeled_hover_is_a_disc() {
		let callout = Callout::compute(&data(""), &style(), 0.0);
		assert_eq!(
			callout,
			Callout::Disc {
				x: 100.0,
				y: 50.0,
				radius: 6.0
			}
		);
	}

	#[test]
	fn pill_geometry_wraps_the_glyph() {
		// font 12: height 16, arc radius max(4, 6) + 2 = 8.
		let Callout::Pill {
			radius,
			angle,
			height,
			right,
			..
		} = Callout::compute(&data("rust"), &style(), 30.0)
		else {
			panic!("expected a pill");
		};
		assert_eq!(height, 16.0);
		assert_eq!(radius, 8.0);
		assert!((angle - PI / 2.0).abs() < 1e-12);
		assert_eq!(right, 100.0 + 8.0 + 35.0);
	}

	#[test]
	fn large_glyph_widens_the_left_arc() {
		let d = LabelData {
			size: 20.0,
			..data("rust")
		};
		let Callout::Pill { radius, angle, .. } = Callout::compute(&d, &style(), 30.0) else {
			panic!("expected a pill");
		};
		assert_eq!(radius, 22.0);
		assert!((angle - (8.0_f64 / 22.0).asin()).abs() < 1e-12);
	}

	#[test]
	fn hover_traces_pill_then_draws_label() {
		let ctx = Recorder::with_char_width(7.5);
		draw_hover(&ctx, &data("rust"), &style());
		let calls = ctx.calls();
		let fill = calls.iter().position(|c| c == "fill").unwrap();
		let text = calls.iter().position(|c| c.starts_with("fill_text")).unwrap();
		assert!(fill < text);
		assert!(calls.contains(&"shadow 8 #000".to_string()));
		assert!(calls.contains(&"arc 143 50 8 1.5708 -1.5708 true".to_string()));
		assert_eq!(calls.last().unwrap(), "fill_text rust 107 54");
	}
}
