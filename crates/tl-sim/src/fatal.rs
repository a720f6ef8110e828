//! Terminal failure handling.
//!
//! Allocation failure, stack exhaustion and broken assertions are not recovered.
//! [`halt`] reports the condition and aborts the process so nothing continues in
//! an inconsistent state.
//!
//! The standard library already aborts on allocation failure and on stack
//! overflow of its own threads. [`FatalCondition::AllocationFailed`] and
//! [`FatalCondition::StackOverflow`] exist for hosts that detect these themselves
//! (custom allocators, pooled stacks) and want the same report and halt.

use std::fmt;
use std::panic;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalCondition {
    AllocationFailed,
    StackOverflow { task: String },
    AssertionFailed {
        file: String,
        line: u32,
        message: Option<String>,
    },
}

impl fmt::Display for FatalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalCondition::AllocationFailed => write!(f, "Malloc failed!"),
            FatalCondition::StackOverflow { task } => {
                write!(f, "Stack overflow in task: {task}")
            }
            FatalCondition::AssertionFailed {
                file,
                line,
                message,
            } => {
                write!(f, "ASSERT FAILED in {file} at line {line}")?;
                if let Some(message) = message {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
        }
    }
}

/// Report `condition` and stop the process.
pub fn halt(condition: &FatalCondition) -> ! {
    error!("{condition}");
    eprintln!("{condition}");
    std::process::abort()
}

/// Turn every panic into a reported [`FatalCondition::AssertionFailed`] halt.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let (file, line) = match info.location() {
            Some(loc) => (loc.file().to_string(), loc.line()),
            None => ("<unknown>".to_string(), 0),
        };
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned());
        halt(&FatalCondition::AssertionFailed {
            file,
            line,
            message,
        });
    }));
}
