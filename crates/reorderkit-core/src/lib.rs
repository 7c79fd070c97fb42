#![forbid(unsafe_code)]

//! Core: geometry, easing, and animation primitives shared by the
//! reorder controller and the drag protocol.

pub mod animation;
pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, warn};
