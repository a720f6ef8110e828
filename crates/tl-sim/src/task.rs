//! Task creation on top of OS threads.
//!
//! A task has a name, a stack budget and a priority. Threads are scheduled by
//! the OS, so the priority is carried for logging and inspection only.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Stack budget for tasks that do not ask for one (bytes).
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

/// Advisory priority used when none is configured.
pub const DEFAULT_PRIORITY: u8 = 1;

/// How to create a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSpec {
    pub name: String,
    pub priority: u8,
    pub stack_size: usize,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }
}

impl Default for TaskSpec {
    fn default() -> Self {
        Self {
            name: "task".to_string(),
            priority: DEFAULT_PRIORITY,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Handle to a running task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: String,
    priority: u8,
    join: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to return. A panic inside the task becomes an error.
    pub fn join(self) -> SimResult<T> {
        self.join
            .join()
            .map_err(|_| SimError::TaskPanicked { task: self.name })
    }
}

/// Start `entry` as a new task.
pub fn spawn<T, F>(spec: TaskSpec, entry: F) -> SimResult<TaskHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    if spec.stack_size == 0 {
        return Err(SimError::InvalidArg {
            what: "task stack size must be positive",
        });
    }
    debug!(
        task = %spec.name,
        priority = spec.priority,
        stack_size = spec.stack_size,
        "spawning task"
    );
    let join = thread::Builder::new()
        .name(spec.name.clone())
        .stack_size(spec.stack_size)
        .spawn(entry)
        .map_err(|source| SimError::Spawn {
            task: spec.name.clone(),
            source,
        })?;
    Ok(TaskHandle {
        name: spec.name,
        priority: spec.priority,
        join,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_task_runs_under_its_name() {
        let handle = spawn(TaskSpec::new("worker").with_priority(3), || {
            thread::current().name().map(str::to_owned)
        })
        .unwrap();
        assert_eq!(handle.name(), "worker");
        assert_eq!(handle.priority(), 3);
        assert_eq!(handle.join().unwrap().as_deref(), Some("worker"));
    }

    #[test]
    fn zero_stack_rejected() {
        let result = spawn(TaskSpec::new("t").with_stack_size(0), || ());
        assert!(matches!(result, Err(SimError::InvalidArg { .. })));
    }

    #[test]
    fn panic_surfaces_as_error() {
        let handle = spawn(TaskSpec::new("doomed"), || -> u8 { panic!("boom") }).unwrap();
        match handle.join() {
            Err(SimError::TaskPanicked { task }) => assert_eq!(task, "doomed"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
