//! sRGB / CIE Lab color arithmetic.
//!
//! Darken and brighten step the Lab lightness by 18 per unit, the same scale
//! the published map used, so regenerated palettes keep their look.

use std::fmt;

const KN: f64 = 18.0;
const XN: f64 = 0.950_470;
const YN: f64 = 1.0;
const ZN: f64 = 1.088_830;
const T0: f64 = 4.0 / 29.0;
const T1: f64 = 6.0 / 29.0;
const T2: f64 = 3.0 * T1 * T1;
const T3: f64 = T1 * T1 * T1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lab {
	pub l: f64,
	pub a: f64,
	pub b: f64,
}

impl Rgb {
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parse `#rgb` or `#rrggbb`.
	pub fn parse_hex(s: &str) -> Option<Self> {
		let hex = s.strip_prefix('#')?;
		let digit = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
		match hex.len() {
			3 => {
				let (r, g, b) = (digit(0, 1)?, digit(1, 1)?, digit(2, 1)?);
				Some(Self::new(r * 17, g * 17, b * 17))
			}
			6 => Some(Self::new(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
			_ => None,
		}
	}

	pub fn to_hex(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}

	/// `rgba(r,g,b,alpha)`
	pub fn to_rgba(self, alpha: f64) -> String {
		format!("rgba({},{},{},{})", self.r, self.g, self.b, alpha)
	}

	pub fn to_lab(self) -> Lab {
		let lin = |c: u8| {
			let c = c as f64 / 255.0;
			if c <= 0.04045 {
				c / 12.92
			} else {
				((c + 0.055) / 1.055).powf(2.4)
			}
		};
		let (r, g, b) = (lin(self.r), lin(self.g), lin(self.b));
		let f = |t: f64| if t > T3 { t.cbrt() } else { t / T2 + T0 };
		let x = f((0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / XN);
		let y = f((0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b) / YN);
		let z = f((0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b) / ZN);
		Lab {
			l: 116.0 * y - 16.0,
			a: 500.0 * (x - y),
			b: 200.0 * (y - z),
		}
	}

	pub fn darken(self, amount: f64) -> Self {
		let mut lab = self.to_lab();
		lab.l -= KN * amount;
		lab.to_rgb_clamped()
	}

	pub fn brighten(self, amount: f64) -> Self {
		self.darken(-amount)
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl Lab {
	/// Linear sRGB channels in 0..=255, unclamped.
	fn to_rgb_channels(self) -> [f64; 3] {
		let y = (self.l + 16.0) / 116.0;
		let x = y + self.a / 500.0;
		let z = y - self.b / 200.0;
		let f = |t: f64| if t > T1 { t * t * t } else { T2 * (t - T0) };
		let (x, y, z) = (XN * f(x), YN * f(y), ZN * f(z));
		let gamma = |c: f64| {
			255.0
				* if c <= 0.003_04 {
					12.92 * c
				} else {
					1.055 * c.powf(1.0 / 2.4) - 0.055
				}
		};
		[
			gamma(3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z),
			gamma(-0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z),
			gamma(0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z),
		]
	}

	/// Whether the color lies inside the sRGB gamut.
	pub fn in_gamut(self) -> bool {
		self.to_rgb_channels()
			.iter()
			.all(|c| c.is_finite() && (-0.5..=255.5).contains(c))
	}

	pub fn to_rgb_clamped(self) -> Rgb {
		let [r, g, b] = self.to_rgb_channels().map(|c| {
			if c.is_nan() {
				0
			} else {
				c.round().clamp(0.0, 255.0) as u8
			}
		});
		Rgb::new(r, g, b)
	}

	pub fn distance(self, other: Lab) -> f64 {
		((self.l - other.l).powi(2) + (self.a - other.a).powi(2) + (self.b - other.b).powi(2)).sqrt()
	}

	/// Cylindrical (lightness, chroma, hue in degrees).
	pub fn to_lch(self) -> (f64, f64, f64) {
		let c = self.a.hypot(self.b);
		let h = self.b.atan2(self.a).to_degrees().rem_euclid(360.0);
		(self.l, c, h)
	}
}
