//! Per-identifier timing statistics, off the critical path.
//!
//! Samples land in a bucketed histogram and feed Welford-style running mean
//! and variance. All operations are thread-safe, and logging can be disabled
//! at runtime without tearing the logger down.

use std::collections::HashMap;
use std::sync::Mutex;

pub const DEFAULT_NUM_BUCKETS: usize = 100;
pub const DEFAULT_BUCKET_SIZE_MS: f64 = 5.0;

/// Snapshot of the statistics recorded for one identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct PerfStatistics {
	pub id: String,
	pub buckets: Vec<u64>,
	pub bucket_size_ms: f64,
	pub num_samples: u64,
	pub average: f64,
	pub variance: f64,
	pub std_deviation: f64,
}

struct PerfEntry {
	buckets: Vec<u64>,
	num_samples: u64,
	average: f64,
	aggregated_squares: f64,
}

struct PerfState {
	entries: HashMap<String, PerfEntry>,
	enabled: bool,
}

/// Histogram-plus-running-statistics logger for named time samples.
pub struct PerformanceLogger {
	num_buckets: usize,
	bucket_size_ms: f64,
	state: Mutex<PerfState>,
}

impl Default for PerformanceLogger {
	fn default() -> PerformanceLogger {
		PerformanceLogger::new(DEFAULT_NUM_BUCKETS, DEFAULT_BUCKET_SIZE_MS)
	}
}

impl PerformanceLogger {
	pub fn new(num_buckets: usize, bucket_size_ms: f64) -> PerformanceLogger {
		PerformanceLogger {
			num_buckets,
			bucket_size_ms,
			state: Mutex::new(PerfState {
				entries: HashMap::new(),
				enabled: true,
			}),
		}
	}

	/// Records one time sample for `id`. A no-op while logging is disabled.
	pub fn add_time_log(&self, id: &str, delta_ms: f64) {
		let mut state = self.state.lock().unwrap();
		if !state.enabled {
			return;
		}
		let num_buckets = self.num_buckets;
		let bucket_size_ms = self.bucket_size_ms;
		let entry = state.entries.entry(id.to_owned()).or_insert_with(|| PerfEntry {
			buckets: vec![0; num_buckets],
			num_samples: 0,
			average: 0.0,
			aggregated_squares: 0.0,
		});

		let bucket_index = ((delta_ms / bucket_size_ms).floor() as usize).min(num_buckets - 1);
		entry.buckets[bucket_index] += 1;

		// Welford update: average and the aggregated squared distance move
		// together, variance derives from the aggregate.
		let previous_average = entry.average;
		entry.num_samples += 1;
		entry.average += (delta_ms - previous_average) / entry.num_samples as f64;
		entry.aggregated_squares += (delta_ms - previous_average) * (delta_ms - entry.average);
	}

	/// The statistics for `id`, if any samples were recorded.
	pub fn statistics(&self, id: &str) -> Option<PerfStatistics> {
		let state = self.state.lock().unwrap();
		state.entries.get(id).map(|entry| self.snapshot(id, entry))
	}

	/// Statistics for every identifier, in unspecified order.
	pub fn all_statistics(&self) -> Vec<PerfStatistics> {
		let state = self.state.lock().unwrap();
		state.entries.iter().map(|(id, entry)| self.snapshot(id, entry)).collect()
	}

	pub fn reset(&self) {
		self.state.lock().unwrap().entries.clear();
	}

	pub fn set_enabled(&self, enabled: bool) {
		self.state.lock().unwrap().enabled = enabled;
	}

	fn snapshot(&self, id: &str, entry: &PerfEntry) -> PerfStatistics {
		let variance = if entry.num_samples > 1 {
			entry.aggregated_squares / (entry.num_samples - 1) as f64
		} else {
			0.0
		};
		PerfStatistics {
			id: id.to_owned(),
			buckets: entry.buckets.clone(),
			bucket_size_ms: self.bucket_size_ms,
			num_samples: entry.num_samples,
			average: entry.average,
			variance,
			std_deviation: variance.sqrt(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;

	#[test]
	fn histogram_buckets() {
		let logger = PerformanceLogger::new(4, 5.0);
		logger.add_time_log("tess", 1.0);
		logger.add_time_log("tess", 6.0);
		logger.add_time_log("tess", 100.0);
		let stats = logger.statistics("tess").unwrap();
		assert_eq!(stats.buckets, vec![1, 1, 0, 1]);
		assert_eq!(stats.num_samples, 3);
	}

	#[test]
	fn welford_matches_naive() {
		let samples = [4.0, 8.0, 6.0, 2.0, 10.0];
		let logger = PerformanceLogger::default();
		for sample in samples {
			logger.add_time_log("x", sample);
		}
		let stats = logger.statistics("x").unwrap();
		let mean: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
		let variance: f64 =
			samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / (samples.len() - 1) as f64;
		assert_abs_diff_eq!(stats.average, mean, epsilon = 1e-12);
		assert_abs_diff_eq!(stats.variance, variance, epsilon = 1e-12);
	}

	#[test]
	fn disabled_logger_drops_samples() {
		let logger = PerformanceLogger::default();
		logger.set_enabled(false);
		logger.add_time_log("x", 1.0);
		assert!(logger.statistics("x").is_none());
		logger.set_enabled(true);
		logger.add_time_log("x", 1.0);
		assert_eq!(logger.statistics("x").unwrap().num_samples, 1);
	}

	#[test]
	fn reset_clears_everything() {
		let logger = PerformanceLogger::default();
		logger.add_time_log("a", 1.0);
		logger.add_time_log("b", 1.0);
		assert_eq!(logger.all_statistics().len(), 2);
		logger.reset();
		assert!(logger.all_statistics().is_empty());
	}
}
