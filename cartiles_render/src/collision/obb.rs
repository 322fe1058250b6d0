//! Oriented bounding boxes.
//!
//! The two box axes are stored scaled by the inverse squared edge length, so
//! a corner projected onto an axis lies on the edge exactly when its dot
//! product falls into `[origin, origin + 1]`. A bounding circle gives a cheap
//! rejection before the separating-axis test runs.

use cartiles_core::{Quad2, Vec2};

/// An oriented bounding box in the plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb2 {
	/// Corners, bottom-left first.
	corners: [Vec2; 4],
	/// The two edges leaving `corners[0]`, scaled by 1/edge-length².
	axes: [Vec2; 2],
	/// `corners[0] · axes[i]`.
	origins: [f64; 2],
	center: Vec2,
	radius: f64,
}

impl Obb2 {
	pub fn new(quad: &Quad2) -> Obb2 {
		let corners = [quad.bottom_left, quad.bottom_right, quad.top_right, quad.top_left];
		let mut axes = [corners[1] - corners[0], corners[3] - corners[0]];
		let mut origins = [0.0; 2];
		for a in 0..2 {
			axes[a] = axes[a] / axes[a].squared_length();
			origins[a] = corners[0].dot(axes[a]);
		}

		// Bounding circle over the longer diagonal.
		let diagonal_a = corners[0].distance_to(corners[2]);
		let diagonal_b = corners[1].distance_to(corners[3]);
		let (center, radius) = if diagonal_a > diagonal_b {
			(corners[0].midpoint(corners[2]), diagonal_a * 0.5)
		} else {
			(corners[1].midpoint(corners[3]), diagonal_b * 0.5)
		};

		Obb2 {
			corners,
			axes,
			origins,
			center,
			radius,
		}
	}

	pub fn center(&self) -> Vec2 {
		self.center
	}

	pub fn radius(&self) -> f64 {
		self.radius
	}

	pub fn corners(&self) -> &[Vec2; 4] {
		&self.corners
	}

	/// True when the other box has an extent intersecting `[0, 1]` on both of
	/// this box's axes.
	fn overlaps_one_way(&self, other: &Obb2) -> bool {
		for a in 0..2 {
			let mut t_min = other.corners[0].dot(self.axes[a]);
			let mut t_max = t_min;
			for corner in &other.corners[1..] {
				let t = corner.dot(self.axes[a]);
				if t < t_min {
					t_min = t;
				} else if t > t_max {
					t_max = t;
				}
			}
			if t_min > 1.0 + self.origins[a] || t_max < self.origins[a] {
				return false;
			}
		}
		true
	}

	fn circles_overlap(&self, other: &Obb2) -> bool {
		let radii = self.radius + other.radius;
		let dx = self.center.x - other.center.x;
		let dy = self.center.y - other.center.y;
		dx * dx + dy * dy < radii * radii
	}

	/// True when the intersection of the boxes is non-empty.
	pub fn overlaps(&self, other: &Obb2) -> bool {
		self.circles_overlap(other) && self.overlaps_one_way(other) && other.overlaps_one_way(self)
	}

	pub fn contains_point(&self, point: Vec2) -> bool {
		(0..2).all(|a| {
			let t = point.dot(self.axes[a]);
			t >= self.origins[a] && t <= 1.0 + self.origins[a]
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::f64::consts::FRAC_PI_4;

	fn obb(x: f64, y: f64, w: f64, h: f64, angle: f64) -> Obb2 {
		Obb2::new(&Quad2::from_rect_rotated(Vec2::new(x, y), w, h, angle))
	}

	#[rstest]
	#[case(obb(0.0, 0.0, 10.0, 10.0, 0.0), obb(5.0, 5.0, 10.0, 10.0, 0.0), true)]
	#[case(obb(0.0, 0.0, 10.0, 10.0, 0.0), obb(11.0, 0.0, 10.0, 10.0, 0.0), false)]
	#[case(obb(0.0, 0.0, 10.0, 10.0, 0.0), obb(10.5, 10.5, 10.0, 10.0, FRAC_PI_4), true)]
	#[case(obb(0.0, 0.0, 4.0, 4.0, FRAC_PI_4), obb(6.0, 6.0, 4.0, 4.0, FRAC_PI_4), false)]
	fn overlap_cases(#[case] a: Obb2, #[case] b: Obb2, #[case] expected: bool) {
		assert_eq!(a.overlaps(&b), expected);
	}

	#[test]
	fn overlap_is_symmetric() {
		let pairs = [
			(obb(0.0, 0.0, 8.0, 3.0, 0.3), obb(4.0, 1.0, 8.0, 3.0, 1.2)),
			(obb(0.0, 0.0, 8.0, 3.0, 0.3), obb(40.0, 40.0, 8.0, 3.0, 1.2)),
			(obb(-5.0, -5.0, 10.0, 10.0, 0.0), obb(0.0, 0.0, 1.0, 1.0, 0.7)),
		];
		for (a, b) in pairs {
			assert_eq!(a.overlaps(&b), b.overlaps(&a));
		}
	}

	#[test]
	fn overlap_is_reflexive() {
		let a = obb(3.0, 4.0, 7.0, 2.0, 0.5);
		assert!(a.overlaps(&a));
	}

	#[test]
	fn point_containment() {
		let a = obb(0.0, 0.0, 10.0, 4.0, 0.0);
		assert!(a.contains_point(Vec2::new(5.0, 2.0)));
		assert!(!a.contains_point(Vec2::new(5.0, 5.0)));
	}

	#[test]
	fn bounding_circle_covers_corners() {
		let a = obb(2.0, 3.0, 12.0, 5.0, 0.9);
		for corner in a.corners() {
			assert!(a.center().distance_to(*corner) <= a.radius() + 1e-9);
		}
	}
}
