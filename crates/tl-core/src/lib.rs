//! tl-core: stable foundation for thermoloop.
//!
//! Contains:
//! - numeric (Real + tolerances + finite/range guards)
//! - error (shared error types)

pub mod error;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
