//! Core engine configuration
//!
//! Init records shared by the renderer and its windows live here so they can be loaded from
//! files without pulling in any backend.

pub mod config;

pub use config::{RendererConfig, WindowConfig};
