//! Rendering: windows, the multi-window renderer and GPU resources
//!
//! ```text
//! MultiWindowRenderer
//!   ├── ContextWindow "left"   ── Surface ── GraphicsDevice
//!   ├── ContextWindow "centre" ── Surface ── GraphicsDevice
//!   └── ContextWindow "right"  ── Surface ── GraphicsDevice
//! ```
//!
//! Each [`render`](renderer::MultiWindowRenderer) pass visits the windows in insertion
//! order and flushes every one that is still open. A window flush binds its context, clears
//! it, runs the window's render callback, presents and drains events.

pub mod api;
pub mod backend;
pub mod camera;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod window;

#[cfg(test)]
mod tests;
