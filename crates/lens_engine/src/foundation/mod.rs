//! Foundation module - Core utilities and types
//!
//! - Math type aliases over nalgebra
//! - Frame timing
//! - Logging setup

pub mod math;
pub mod time;
pub mod logging;
