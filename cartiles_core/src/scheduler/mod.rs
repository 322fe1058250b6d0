//! Hybrid task scheduler: a worker pool for CPU tasks, a deferred lane for
//! delayed tasks and a separate graphics queue drained under a per-frame
//! budget so the GPU thread never starves the frame.
//!
//! Tasks are synchronous; suspension points exist only between tasks.
//! Cancellation is cooperative: removing a task id drops it from the queues,
//! tasks already running complete.

mod task;

pub use task::{ExecutionEnvironment, TaskConfig, TaskPriority};

use log::trace;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use task::Task;

/// Upper bound of graphics tasks run per [`Scheduler::run_graphics_tasks`].
const MAX_NUM_GRAPHICS_TASKS: usize = 12;
/// Time budget of one graphics drain.
const MAX_TIME_GRAPHICS_TASKS: Duration = Duration::from_millis(6);

struct WorkQueue {
	queue: VecDeque<Task>,
	terminated: bool,
}

struct DelayedQueue {
	tasks: Vec<(Task, Instant)>,
	terminated: bool,
}

struct Shared {
	work: Mutex<WorkQueue>,
	work_cv: Condvar,
	graphics: Mutex<VecDeque<Task>>,
	delayed: Mutex<DelayedQueue>,
	delayed_cv: Condvar,
}

/// The engine's task scheduler.
pub struct Scheduler {
	shared: Arc<Shared>,
	workers: Vec<JoinHandle<()>>,
	delayed_worker: Option<JoinHandle<()>>,
}

impl Default for Scheduler {
	fn default() -> Scheduler {
		Scheduler::new()
	}
}

impl Scheduler {
	/// Creates a scheduler with `max(1, floor(0.75 × hardware threads))`
	/// workers.
	pub fn new() -> Scheduler {
		let threads = ((num_cpus::get() as f64 * 0.75).floor() as usize).max(1);
		Scheduler::with_thread_count(threads)
	}

	pub fn with_thread_count(threads: usize) -> Scheduler {
		let shared = Arc::new(Shared {
			work: Mutex::new(WorkQueue {
				queue: VecDeque::new(),
				terminated: false,
			}),
			work_cv: Condvar::new(),
			graphics: Mutex::new(VecDeque::new()),
			delayed: Mutex::new(DelayedQueue {
				tasks: Vec::new(),
				terminated: false,
			}),
			delayed_cv: Condvar::new(),
		});

		let workers = (0..threads.max(1))
			.map(|index| {
				let shared = Arc::clone(&shared);
				std::thread::Builder::new()
					.name(format!("cartiles_worker_{index}"))
					.spawn(move || worker_loop(&shared))
					.expect("failed to spawn worker thread")
			})
			.collect();

		let delayed_worker = {
			let shared = Arc::clone(&shared);
			std::thread::Builder::new()
				.name("cartiles_delayed_tasks".to_owned())
				.spawn(move || delayed_loop(&shared))
				.expect("failed to spawn delayed-task thread")
		};

		Scheduler {
			shared,
			workers,
			delayed_worker: Some(delayed_worker),
		}
	}

	/// Enqueues a task. Delayed tasks wait on the deferred lane first;
	/// graphics tasks wait for the next [`Scheduler::run_graphics_tasks`].
	pub fn add_task(&self, config: TaskConfig, job: impl FnOnce() + Send + 'static) {
		trace!("scheduling task {:?} on {:?}", config.id, config.execution_environment);
		let task = Task {
			config,
			job: Box::new(job),
		};
		if task.config.delay_ms > 0 {
			let due = Instant::now() + Duration::from_millis(task.config.delay_ms);
			self.shared.delayed.lock().unwrap().tasks.push((task, due));
			self.shared.delayed_cv.notify_one();
		} else {
			self.shared.enqueue_ignoring_delay(task);
		}
	}

	/// Drops all queued (not running) tasks with the given id.
	pub fn remove_task(&self, id: &str) {
		self.shared.work.lock().unwrap().queue.retain(|task| task.config.id != id);
		self.shared.graphics.lock().unwrap().retain(|task| task.config.id != id);
		self.shared.delayed.lock().unwrap().tasks.retain(|(task, _)| task.config.id != id);
	}

	/// Drops every queued task.
	pub fn clear(&self) {
		self.shared.work.lock().unwrap().queue.clear();
		self.shared.graphics.lock().unwrap().clear();
		self.shared.delayed.lock().unwrap().tasks.clear();
	}

	/// Runs queued graphics tasks until the queue is empty, 12 tasks ran, or
	/// 6 ms elapsed, whichever comes first. Returns the number of tasks run.
	pub fn run_graphics_tasks(&self) -> usize {
		let start = Instant::now();
		let mut ran = 0;
		while ran < MAX_NUM_GRAPHICS_TASKS {
			let task = {
				let mut queue = self.shared.graphics.lock().unwrap();
				match queue.pop_front() {
					Some(task) => task,
					None => break,
				}
			};
			(task.job)();
			ran += 1;
			if start.elapsed() >= MAX_TIME_GRAPHICS_TASKS {
				break;
			}
		}
		ran
	}

	/// Number of tasks currently waiting on any lane.
	pub fn pending_tasks(&self) -> usize {
		self.shared.work.lock().unwrap().queue.len()
			+ self.shared.graphics.lock().unwrap().len()
			+ self.shared.delayed.lock().unwrap().tasks.len()
	}
}

impl Shared {
	fn enqueue_ignoring_delay(&self, task: Task) {
		if task.config.execution_environment == ExecutionEnvironment::Graphics {
			self.graphics.lock().unwrap().push_back(task);
		} else {
			self.work.lock().unwrap().queue.push_back(task);
			self.work_cv.notify_one();
		}
	}
}

fn worker_loop(shared: &Shared) {
	loop {
		let task = {
			let mut state = shared.work.lock().unwrap();
			loop {
				if state.terminated {
					return;
				}
				if let Some(task) = state.queue.pop_front() {
					break task;
				}
				state = shared.work_cv.wait(state).unwrap();
			}
		};
		(task.job)();
	}
}

fn delayed_loop(shared: &Shared) {
	let mut state = shared.delayed.lock().unwrap();
	loop {
		if state.terminated {
			return;
		}

		let now = Instant::now();
		let mut due = Vec::new();
		let mut next_wakeup: Option<Instant> = None;
		let mut index = 0;
		while index < state.tasks.len() {
			if state.tasks[index].1 <= now {
				due.push(state.tasks.swap_remove(index).0);
			} else {
				next_wakeup = Some(match next_wakeup {
					Some(wakeup) => wakeup.min(state.tasks[index].1),
					None => state.tasks[index].1,
				});
				index += 1;
			}
		}

		if !due.is_empty() {
			drop(state);
			for task in due {
				shared.enqueue_ignoring_delay(task);
			}
			state = shared.delayed.lock().unwrap();
			continue;
		}

		state = match next_wakeup {
			Some(wakeup) => {
				let timeout = wakeup.saturating_duration_since(Instant::now());
				shared.delayed_cv.wait_timeout(state, timeout).unwrap().0
			}
			None => shared.delayed_cv.wait(state).unwrap(),
		};
	}
}

impl Drop for Scheduler {
	fn drop(&mut self) {
		self.shared.work.lock().unwrap().terminated = true;
		self.shared.delayed.lock().unwrap().terminated = true;
		self.shared.work_cv.notify_all();
		self.shared.delayed_cv.notify_all();
		for worker in self.workers.drain(..) {
			let _ = worker.join();
		}
		if let Some(delayed_worker) = self.delayed_worker.take() {
			let _ = delayed_worker.join();
		}
	}
}
