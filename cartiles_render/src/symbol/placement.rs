//! Placement of symbols along lines and on points.

use cartiles_core::Vec2;
use itertools::Itertools;

/// One chosen symbol position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
	pub position: Vec2,
	/// Direction of the line at the position, radians.
	pub angle: f64,
}

/// Positions along a polyline spaced by `spacing` (tile units, already
/// density-corrected). A line too short for one spacing interval yields a
/// single placement near its midpoint.
pub fn line_placements(points: &[Vec2], spacing: f64) -> Vec<Placement> {
	if points.len() < 2 {
		return Vec::new();
	}
	let total = polyline_length(points);
	if spacing <= 0.0 {
		return midpoint_placement(points).into_iter().collect();
	}

	let mut placements = Vec::new();
	let mut distance = spacing;
	while distance < total {
		if let Some(placement) = point_at_distance(points, distance) {
			placements.push(placement);
		}
		distance += spacing;
	}

	if placements.is_empty() {
		return midpoint_placement(points).into_iter().collect();
	}
	placements
}

/// The single placement at the middle of the polyline.
pub fn midpoint_placement(points: &[Vec2]) -> Option<Placement> {
	point_at_distance(points, polyline_length(points) * 0.5)
}

/// Area centroid of a ring, falling back to the vertex average for
/// degenerate input.
pub fn centroid(points: &[Vec2]) -> Vec2 {
	if points.is_empty() {
		return Vec2::default();
	}
	let mut doubled_area = 0.0;
	let mut accumulated = Vec2::default();
	for i in 0..points.len() {
		let a = points[i];
		let b = points[(i + 1) % points.len()];
		let cross = a.x * b.y - b.x * a.y;
		doubled_area += cross;
		accumulated = accumulated + (a + b) * cross;
	}
	if doubled_area.abs() < 1e-12 {
		let mut sum = Vec2::default();
		for point in points {
			sum = sum + *point;
		}
		return sum / points.len() as f64;
	}
	accumulated / (3.0 * doubled_area)
}

fn polyline_length(points: &[Vec2]) -> f64 {
	points.iter().tuple_windows().map(|(a, b)| a.distance_to(*b)).sum()
}

fn point_at_distance(points: &[Vec2], target: f64) -> Option<Placement> {
	if points.len() < 2 {
		return None;
	}
	let mut walked = 0.0;
	for pair in points.windows(2) {
		let segment = pair[1] - pair[0];
		let length = segment.length();
		if walked + length >= target && length > 0.0 {
			let t = (target - walked) / length;
			return Some(Placement {
				position: pair[0] + segment * t,
				angle: segment.y.atan2(segment.x),
			});
		}
		walked += length;
	}
	// Past the end; clamp to the last vertex.
	let last_segment = points[points.len() - 1] - points[points.len() - 2];
	Some(Placement {
		position: points[points.len() - 1],
		angle: last_segment.y.atan2(last_segment.x),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;

	#[test]
	fn placements_are_evenly_spaced() {
		let line = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
		let placements = line_placements(&line, 30.0);
		assert_eq!(placements.len(), 3);
		assert_abs_diff_eq!(placements[0].position.x, 30.0, epsilon = 1e-9);
		assert_abs_diff_eq!(placements[1].position.x, 60.0, epsilon = 1e-9);
		assert_abs_diff_eq!(placements[2].position.x, 90.0, epsilon = 1e-9);
		assert_abs_diff_eq!(placements[0].angle, 0.0, epsilon = 1e-9);
	}

	#[test]
	fn short_lines_get_a_midpoint_placement() {
		let line = [Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0)];
		let placements = line_placements(&line, 50.0);
		assert_eq!(placements.len(), 1);
		assert_abs_diff_eq!(placements[0].position.x, 10.0, epsilon = 1e-9);
	}

	#[test]
	fn placement_follows_segment_direction() {
		let line = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 50.0)];
		let placement = midpoint_placement(&line).unwrap();
		assert_abs_diff_eq!(placement.position.y, 25.0, epsilon = 1e-9);
		assert_abs_diff_eq!(placement.angle, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
	}

	#[test]
	fn placement_crosses_vertices() {
		let line = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
		let placement = point_at_distance(&line, 15.0).unwrap();
		assert_abs_diff_eq!(placement.position.x, 10.0, epsilon = 1e-9);
		assert_abs_diff_eq!(placement.position.y, 5.0, epsilon = 1e-9);
	}

	#[test]
	fn centroid_of_a_square() {
		let square = [
			Vec2::new(0.0, 0.0),
			Vec2::new(10.0, 0.0),
			Vec2::new(10.0, 10.0),
			Vec2::new(0.0, 10.0),
		];
		let center = centroid(&square);
		assert_abs_diff_eq!(center.x, 5.0, epsilon = 1e-9);
		assert_abs_diff_eq!(center.y, 5.0, epsilon = 1e-9);
	}

	#[test]
	fn degenerate_rings_average_their_vertices() {
		let collinear = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(8.0, 0.0)];
		assert_eq!(centroid(&collinear), Vec2::new(4.0, 0.0));
		assert_eq!(centroid(&[]), Vec2::default());
	}
}
