//! Seeded community palette.
//!
//! Colors are sampled inside a "sensible" cylindrical Lab range, then spread
//! apart by a few rounds of pairwise repulsion. Everything is driven by the
//! seed, so the same seed always yields the same palette.

use rand::Rng;

use super::color::{Lab, Rgb};
use crate::graph::seeded_rng;

const HUE: (f64, f64) = (0.0, 360.0);
const CHROMA: (f64, f64) = (25.0, 75.0);
const LIGHTNESS: (f64, f64) = (35.0, 80.0);
const REPULSION_ROUNDS: usize = 40;
const MAX_SAMPLES: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
	colors: Vec<Rgb>,
}

fn acceptable(lab: Lab) -> bool {
	let (l, c, h) = lab.to_lch();
	lab.in_gamut()
		&& (LIGHTNESS.0..=LIGHTNESS.1).contains(&l)
		&& (CHROMA.0..=CHROMA.1).contains(&c)
		&& (HUE.0..=HUE.1).contains(&h)
}

impl Palette {
	/// `count` distinct colors for `seed`. `count` is clamped to at least 1.
	pub fn generate(count: usize, seed: &str) -> Self {
		let count = count.max(1);
		let mut rng = seeded_rng(seed);
		let mut labs: Vec<Lab> = Vec::with_capacity(count);
		let mut samples = 0;
		while labs.len() < count {
			samples += 1;
			let lab = Lab {
				l: rng.gen_range(0.0..100.0),
				a: rng.gen_range(-100.0..100.0),
				b: rng.gen_range(-100.0..100.0),
			};
			if acceptable(lab) {
				labs.push(lab);
			} else if samples > MAX_SAMPLES {
				// Sampling budget exhausted: fall back to grays.
				labs.push(Lab {
					l: LIGHTNESS.0 + (LIGHTNESS.1 - LIGHTNESS.0) * labs.len() as f64 / count as f64,
					a: 0.0,
					b: 0.0,
				});
			}
		}

		for round in 0..REPULSION_ROUNDS {
			let step = 8.0 / (1.0 + round as f64);
			let snapshot = labs.clone();
			for (i, lab) in labs.iter_mut().enumerate() {
				let (mut fl, mut fa, mut fb) = (0.0, 0.0, 0.0);
				for (j, other) in snapshot.iter().enumerate() {
					if i == j {
						continue;
					}
					let d = lab.distance(*other).max(1e-3);
					let push = 1.0 / (d * d);
					fl += (lab.l - other.l) / d * push;
					fa += (lab.a - other.a) / d * push;
					fb += (lab.b - other.b) / d * push;
				}
				let norm = (fl * fl + fa * fa + fb * fb).sqrt();
				if norm == 0.0 {
					continue;
				}
				let moved = Lab {
					l: lab.l + step * fl / norm,
					a: lab.a + step * fa / norm,
					b: lab.b + step * fb / norm,
				};
				if acceptable(moved) {
					*lab = moved;
				}
			}
		}

		Self {
			colors: labs.into_iter().map(Lab::to_rgb_clamped).collect(),
		}
	}

	/// Color of `community`; ids beyond the palette wrap around.
	pub fn color(&self, community: usize) -> Rgb {
		self.colors[community % self.colors.len()]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deterministic_per_seed() {
		let a = Palette::generate(9, "0.9404079128839915");
		let b = Palette::generate(9, "0.9404079128839915");
		let c = Palette::generate(9, "logiciels libres");
		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(a.colors.len(), 9);
	}

	#[test]
	fn colors_are_distinct() {
		let p = Palette::generate(9, "seed");
		for (i, a) in p.colors.iter().enumerate() {
			for b in &p.colors[i + 1..] {
				assert!(a.to_lab().distance(b.to_lab()) > 5.0, "{} ~ {}", a, b);
			}
		}
	}

	#[test]
	fn community_ids_wrap() {
		let p = Palette::generate(9, "seed");
		for c in 0..20 {
			assert_eq!(p.color(c), p.color(c + 9));
		}
	}
}
