//! Pipeline module - the batch generation control loop.

mod study;

pub use study::*;
