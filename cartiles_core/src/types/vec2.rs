use std::fmt::{self, Debug};
use std::ops::{Add, Div, Mul, Sub};

/// A 2D vector in world or screen space.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
	pub x: f64,
	pub y: f64,
}

impl Vec2 {
	pub const fn new(x: f64, y: f64) -> Vec2 {
		Vec2 { x, y }
	}

	pub fn dot(&self, other: Vec2) -> f64 {
		self.x * other.x + self.y * other.y
	}

	pub fn squared_length(&self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	pub fn length(&self) -> f64 {
		self.squared_length().sqrt()
	}

	pub fn distance_to(&self, other: Vec2) -> f64 {
		(other - *self).length()
	}

	pub fn midpoint(&self, other: Vec2) -> Vec2 {
		Vec2::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
	}

	/// Rotates the vector by `angle_rad` around `origin`.
	pub fn rotated_around(&self, origin: Vec2, angle_rad: f64) -> Vec2 {
		let (sin, cos) = angle_rad.sin_cos();
		let dx = self.x - origin.x;
		let dy = self.y - origin.y;
		Vec2::new(origin.x + dx * cos - dy * sin, origin.y + dx * sin + dy * cos)
	}
}

impl Add for Vec2 {
	type Output = Vec2;
	fn add(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Vec2 {
	type Output = Vec2;
	fn sub(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Vec2 {
	type Output = Vec2;
	fn mul(self, rhs: f64) -> Vec2 {
		Vec2::new(self.x * rhs, self.y * rhs)
	}
}

impl Div<f64> for Vec2 {
	type Output = Vec2;
	fn div(self, rhs: f64) -> Vec2 {
		Vec2::new(self.x / rhs, self.y / rhs)
	}
}

impl Debug for Vec2 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("Vec2({}, {})", self.x, self.y))
	}
}

/// A quadrilateral given by its four corners, wound bottom-left first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad2 {
	pub bottom_left: Vec2,
	pub bottom_right: Vec2,
	pub top_right: Vec2,
	pub top_left: Vec2,
}

impl Quad2 {
	pub const fn new(bottom_left: Vec2, bottom_right: Vec2, top_right: Vec2, top_left: Vec2) -> Quad2 {
		Quad2 {
			bottom_left,
			bottom_right,
			top_right,
			top_left,
		}
	}

	/// Builds an axis-aligned quad from origin and extent, then rotates it by
	/// `angle_rad` around its center.
	pub fn from_rect_rotated(origin: Vec2, width: f64, height: f64, angle_rad: f64) -> Quad2 {
		let quad = Quad2::new(
			Vec2::new(origin.x, origin.y + height),
			Vec2::new(origin.x + width, origin.y + height),
			Vec2::new(origin.x + width, origin.y),
			origin,
		);
		if angle_rad == 0.0 {
			return quad;
		}
		let center = Vec2::new(origin.x + width * 0.5, origin.y + height * 0.5);
		Quad2::new(
			quad.bottom_left.rotated_around(center, angle_rad),
			quad.bottom_right.rotated_around(center, angle_rad),
			quad.top_right.rotated_around(center, angle_rad),
			quad.top_left.rotated_around(center, angle_rad),
		)
	}

	pub fn center(&self) -> Vec2 {
		self.bottom_left.midpoint(self.top_right)
	}
}
