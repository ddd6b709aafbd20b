//! # Frame Scheduler Module
//!
//! Cooperative, single-threaded per-frame task runner.
//!
//! A [`FrameTask`] is a resumable routine that does a slice of work each frame
//! and reports whether it wants to be resumed again. The host loop calls
//! [`FrameScheduler::tick`] once per frame with the elapsed frame time.
//!
//! ## Lifecycle
//!
//! 1. [`FrameScheduler::start`] runs the task's first step immediately, using
//!    the delta time of the current frame.
//! 2. Each [`FrameScheduler::tick`] resumes every pending task exactly once.
//! 3. A task that returns [`TaskStatus::Complete`] is dropped.
//!
//! There is no cancellation path; tasks run until they complete.
//!
//! ## Usage
//!
//! ```
//! use tilt_input::controller::scheduler::{FrameScheduler, FrameTask, TaskStatus};
//!
//! struct Countdown(u32);
//!
//! impl FrameTask for Countdown {
//!     fn resume(&mut self, _delta_time: f32) -> TaskStatus {
//!         if self.0 == 0 {
//!             return TaskStatus::Complete;
//!         }
//!         self.0 -= 1;
//!         TaskStatus::Pending
//!     }
//! }
//!
//! let mut scheduler = FrameScheduler::new();
//! scheduler.start(Box::new(Countdown(1)));
//! assert_eq!(scheduler.active_tasks(), 1);
//!
//! scheduler.tick(0.016);
//! assert_eq!(scheduler.active_tasks(), 0);
//! ```

use tracing::debug;

/// Result of resuming a [`FrameTask`] for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task suspended and wants to run again next frame.
    Pending,
    /// The task finished.
    Complete,
}

/// A routine that runs one step per frame.
pub trait FrameTask {
    /// Runs one step of the task.
    ///
    /// # Arguments
    ///
    /// * `delta_time` - Time elapsed since the previous frame, in seconds
    fn resume(&mut self, delta_time: f32) -> TaskStatus;

    /// Human-readable name used in log messages.
    fn name(&self) -> &str {
        "frame task"
    }
}

/// Runs [`FrameTask`]s cooperatively, one step per frame.
///
/// # Thread Safety
///
/// `FrameScheduler` is not thread-safe. Use from the frame loop only.
#[derive(Default)]
pub struct FrameScheduler {
    tasks: Vec<Box<dyn FrameTask>>,
    delta_time: f32,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("active_tasks", &self.tasks.len())
            .field("delta_time", &self.delta_time)
            .finish()
    }
}

impl FrameScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a task, running its first step right away.
    ///
    /// The task is kept for later frames only if that first step left it
    /// pending.
    pub fn start(&mut self, mut task: Box<dyn FrameTask>) {
        debug!("Starting {}", task.name());
        match task.resume(self.delta_time) {
            TaskStatus::Pending => self.tasks.push(task),
            TaskStatus::Complete => debug!("{} completed on its first step", task.name()),
        }
    }

    /// Advances every pending task by one frame.
    ///
    /// # Arguments
    ///
    /// * `delta_time` - Time elapsed since the previous frame, in seconds
    pub fn tick(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
        self.tasks.retain_mut(|task| match task.resume(delta_time) {
            TaskStatus::Pending => true,
            TaskStatus::Complete => {
                debug!("{} completed", task.name());
                false
            }
        });
    }

    /// Number of tasks still waiting to be resumed.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Delta time of the most recent frame.
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }
}
