//! The per-frame collision grid.
//!
//! Callers project world-space rectangles and circles through the frame's
//! view-projection matrix into viewport pixels; the grid buckets them into
//! cells of `min(width, height) / 20` pixels and answers overlap queries
//! against everything inserted earlier in the frame. The grid is written once
//! per frame and rebuilt for the next one, so placement is deterministic in
//! insertion order.

use cartiles_core::Vec2;

/// Number of cells along the smaller viewport dimension.
const NUM_CELLS_MIN_DIM: f64 = 20.0;

/// Outcome of an insertion attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CollisionResult {
	/// Inserted; nothing already in the grid overlaps.
	Placed,
	/// Overlaps existing content (or nothing would be visible); not inserted.
	Collides,
}

/// A world-space rectangle aligned with the grid angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionRect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl CollisionRect {
	pub fn new(x: f64, y: f64, width: f64, height: f64) -> CollisionRect {
		CollisionRect { x, y, width, height }
	}
}

/// A world-space circle; assumed to stay a circle under projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionCircle {
	pub origin: Vec2,
	pub radius: f64,
}

impl CollisionCircle {
	pub fn new(origin: Vec2, radius: f64) -> CollisionCircle {
		CollisionCircle { origin, radius }
	}
}

#[derive(Clone, Copy, Debug)]
struct ProjectedRect {
	x: i32,
	y: i32,
	width: i32,
	height: i32,
}

#[derive(Clone, Copy, Debug)]
struct ProjectedCircle {
	x: i32,
	y: i32,
	radius: i32,
}

#[derive(Clone, Copy, Debug)]
struct IndexRange {
	x_min: i32,
	x_max: i32,
	y_min: i32,
	y_max: i32,
}

impl IndexRange {
	fn empty() -> IndexRange {
		IndexRange {
			x_min: i32::MAX,
			x_max: i32::MIN,
			y_min: i32::MAX,
			y_max: i32::MIN,
		}
	}

	fn add_x(&mut self, index: i32, max_x: i32) {
		if index < self.x_min {
			self.x_min = index.max(0);
		}
		if index > self.x_max {
			self.x_max = index.min(max_x);
		}
	}

	fn add_y(&mut self, index: i32, max_y: i32) {
		if index < self.y_min {
			self.y_min = index.max(0);
		}
		if index > self.y_max {
			self.y_max = index.min(max_y);
		}
	}

	fn is_valid(&self, max_x: i32, max_y: i32) -> bool {
		self.x_min <= max_x && self.x_max >= 0 && self.y_min <= max_y && self.y_max >= 0
	}
}

/// Grid-accelerated overlap test for projected rectangles and circles.
pub struct CollisionGrid {
	vp_matrix: [f32; 16],
	sin_neg_angle: f64,
	cos_neg_angle: f64,
	cell_size: f64,
	num_cells_x: i32,
	num_cells_y: i32,
	half_width: f64,
	half_height: f64,
	rects: Vec<Vec<ProjectedRect>>,
	circles: Vec<Vec<ProjectedCircle>>,
}

impl CollisionGrid {
	/// Builds an empty grid for one frame.
	///
	/// `grid_angle_degrees` rotates rectangle extents before projection, so
	/// that rects stay axis-aligned in the rotated view.
	pub fn new(vp_matrix: [f32; 16], width: f64, height: f64, grid_angle_degrees: f64) -> CollisionGrid {
		let angle_rad = -grid_angle_degrees.to_radians();
		let cell_size = width.min(height) / NUM_CELLS_MIN_DIM;
		let num_cells_x = (width / cell_size).ceil() as i32;
		let num_cells_y = (height / cell_size).ceil() as i32;
		let cells = (num_cells_x * num_cells_y) as usize;
		CollisionGrid {
			vp_matrix,
			sin_neg_angle: angle_rad.sin(),
			cos_neg_angle: angle_rad.cos(),
			cell_size,
			num_cells_x,
			num_cells_y,
			half_width: width / 2.0,
			half_height: height / 2.0,
			rects: vec![Vec::new(); cells],
			circles: vec![Vec::new(); cells],
		}
	}

	/// An orthographic view-projection matrix mapping `[0, width] × [0,
	/// height]` onto clip space, column-major.
	pub fn ortho_matrix(width: f64, height: f64) -> [f32; 16] {
		let mut m = [0.0f32; 16];
		m[0] = (2.0 / width) as f32;
		m[5] = (2.0 / height) as f32;
		m[10] = 1.0;
		m[12] = -1.0;
		m[13] = -1.0;
		m[15] = 1.0;
		m
	}

	/// Projects, tests and inserts one rectangle. A rectangle entirely
	/// outside the viewport is treated as placed without insertion;
	/// off-screen content cannot collide.
	pub fn try_insert_rect(&mut self, rect: &CollisionRect) -> CollisionResult {
		let projected = self.project_rect(rect);
		let Some(range) = self.index_range_for_rect(&projected) else {
			return CollisionResult::Placed;
		};

		for cell in self.cells_of(&range) {
			for other in &self.rects[cell] {
				if rects_collide(&projected, other) {
					return CollisionResult::Collides;
				}
			}
			for other in &self.circles[cell] {
				if rect_circle_collide(&projected, other) {
					return CollisionResult::Collides;
				}
			}
		}

		for cell in self.cells_of(&range) {
			self.rects[cell].push(projected);
		}
		CollisionResult::Placed
	}

	/// Projects, tests and inserts a bundle of circles; all or none are
	/// inserted. An empty bundle places trivially. A bundle whose circles all
	/// project outside the grid reports `Collides`: callers use the result as
	/// "do not render", and nothing of the bundle would be visible. (The rect
	/// path answers the same situation with `Placed`.)
	pub fn try_insert_circles(&mut self, circles: &[CollisionCircle]) -> CollisionResult {
		if circles.is_empty() {
			return CollisionResult::Placed;
		}

		let mut projected_circles = Vec::with_capacity(circles.len());
		for circle in circles {
			let projected = self.project_circle(circle);
			if let Some(range) = self.index_range_for_circle(&projected) {
				projected_circles.push((projected, range));
			}
		}

		if projected_circles.is_empty() {
			return CollisionResult::Collides;
		}

		for (projected, range) in &projected_circles {
			for cell in self.cells_of(range) {
				for other in &self.rects[cell] {
					if rect_circle_collide(other, projected) {
						return CollisionResult::Collides;
					}
				}
				for other in &self.circles[cell] {
					if circles_collide(projected, other) {
						return CollisionResult::Collides;
					}
				}
			}
		}

		for (projected, range) in &projected_circles {
			for cell in self.cells_of(range) {
				self.circles[cell].push(*projected);
			}
		}
		CollisionResult::Placed
	}

	fn cells_of(&self, range: &IndexRange) -> Vec<usize> {
		let mut cells = Vec::with_capacity(
			((range.x_max - range.x_min + 1) * (range.y_max - range.y_min + 1)).max(0) as usize,
		);
		for y in range.y_min..=range.y_max {
			for x in range.x_min..=range.x_max {
				cells.push((y * self.num_cells_x + x) as usize);
			}
		}
		cells
	}

	fn project_rect(&self, rect: &CollisionRect) -> ProjectedRect {
		let origin = multiply(&self.vp_matrix, [rect.x as f32, rect.y as f32, 0.0, 1.0]);
		let width = multiply(
			&self.vp_matrix,
			[
				(rect.width * self.cos_neg_angle) as f32,
				(rect.width * self.sin_neg_angle) as f32,
				0.0,
				0.0,
			],
		);
		let height = multiply(
			&self.vp_matrix,
			[
				(-rect.height * self.sin_neg_angle) as f32,
				(rect.height * self.cos_neg_angle) as f32,
				0.0,
				0.0,
			],
		);
		ProjectedRect {
			x: ((f64::from(origin[0] / origin[3])) * self.half_width + self.half_width).round() as i32,
			y: ((f64::from(origin[1] / origin[3])) * self.half_height + self.half_height).round() as i32,
			// Extents stay axis-aligned in the rotated projected space.
			width: (f64::from(width[0] + height[0]) * self.half_width).round() as i32,
			height: (f64::from(width[1] + height[1]) * self.half_height).round() as i32,
		}
	}

	fn project_circle(&self, circle: &CollisionCircle) -> ProjectedCircle {
		let origin = multiply(
			&self.vp_matrix,
			[circle.origin.x as f32, circle.origin.y as f32, 0.0, 1.0],
		);
		let radius = multiply(&self.vp_matrix, [circle.radius as f32, circle.radius as f32, 0.0, 0.0]);
		let rx = f64::from(radius[0]) * self.half_width;
		let ry = f64::from(radius[1]) * self.half_height;
		ProjectedCircle {
			x: ((f64::from(origin[0] / origin[3])) * self.half_width + self.half_width).round() as i32,
			y: ((f64::from(origin[1] / origin[3])) * self.half_height + self.half_height).round() as i32,
			radius: (rx * rx + ry * ry).sqrt().round() as i32,
		}
	}

	fn index_range_for_rect(&self, rect: &ProjectedRect) -> Option<IndexRange> {
		let mut range = IndexRange::empty();
		let max_x = self.num_cells_x - 1;
		let max_y = self.num_cells_y - 1;
		range.add_x((f64::from(rect.x) / self.cell_size).round() as i32, max_x);
		range.add_x((f64::from(rect.x + rect.width) / self.cell_size).round() as i32, max_x);
		range.add_y((f64::from(rect.y) / self.cell_size).round() as i32, max_y);
		range.add_y((f64::from(rect.y + rect.height) / self.cell_size).round() as i32, max_y);
		range.is_valid(max_x, max_y).then_some(range)
	}

	fn index_range_for_circle(&self, circle: &ProjectedCircle) -> Option<IndexRange> {
		let mut range = IndexRange::empty();
		let max_x = self.num_cells_x - 1;
		let max_y = self.num_cells_y - 1;
		// May cover an unnecessary corner cell; harmless for a rejection test.
		range.add_x((f64::from(circle.x - circle.radius) / self.cell_size).round() as i32, max_x);
		range.add_x((f64::from(circle.x + circle.radius) / self.cell_size).round() as i32, max_x);
		range.add_y((f64::from(circle.y - circle.radius) / self.cell_size).round() as i32, max_y);
		range.add_y((f64::from(circle.y + circle.radius) / self.cell_size).round() as i32, max_y);
		range.is_valid(max_x, max_y).then_some(range)
	}
}

/// Column-major 4×4 matrix times column vector.
fn multiply(matrix: &[f32; 16], vector: [f32; 4]) -> [f32; 4] {
	let mut result = [0.0f32; 4];
	for (row, entry) in result.iter_mut().enumerate() {
		*entry = matrix[row] * vector[0]
			+ matrix[row + 4] * vector[1]
			+ matrix[row + 8] * vector[2]
			+ matrix[row + 12] * vector[3];
	}
	result
}

/// Axis-aligned separation test; signed extents are normalised first.
fn rects_collide(a: &ProjectedRect, b: &ProjectedRect) -> bool {
	a.x.min(a.x + a.width) < b.x.max(b.x + b.width)
		&& a.x.max(a.x + a.width) > b.x.min(b.x + b.width)
		&& a.y.min(a.y + a.height) < b.y.max(b.y + b.height)
		&& a.y.max(a.y + a.height) > b.y.min(b.y + b.height)
}

fn rect_circle_collide(rect: &ProjectedRect, circle: &ProjectedCircle) -> bool {
	let min_x = rect.x.min(rect.x + rect.width);
	let min_y = rect.y.min(rect.y + rect.height);
	let closest_x = min_x.max((min_x + rect.width.abs()).min(circle.x));
	let closest_y = min_y.max((min_y + rect.height.abs()).min(circle.y));
	let dx = closest_x - circle.x;
	let dy = closest_y - circle.y;
	dx * dx + dy * dy < circle.radius * circle.radius
}

fn circles_collide(a: &ProjectedCircle, b: &ProjectedCircle) -> bool {
	let dx = a.x - b.x;
	let dy = a.y - b.y;
	let radii = a.radius + b.radius;
	dx * dx + dy * dy < radii * radii
}
