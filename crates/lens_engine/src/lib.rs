//! # Lens Engine
//!
//! A small windowing layer that drives any number of on-screen windows, each with its own
//! OpenGL context, from a single cooperative render loop.
//!
//! ## Features
//!
//! - **Multi-Window Loop**: One renderer flushes every open window in insertion order
//! - **Frame Timing**: Per-window delta time, frame counter and FPS
//! - **GL Resources**: Shader programs with typed uniforms, RGBA textures
//! - **Euler Camera**: Yaw/pitch fly camera with a derived view matrix
//! - **Swappable Backends**: GLFW + glow for real windows, a headless backend for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lens_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     lens_engine::foundation::logging::init();
//!     let platform = GlfwPlatform::init()?;
//!
//!     let mut renderer = MultiWindowRenderer::with_config(platform.clone(), RendererConfig::default())?;
//!     let mut window = ContextWindow::with_config(platform.clone(), WindowConfig::default())?;
//!     window.set_render_fn(Some(RenderFn::new(|window: &mut dyn Window| {
//!         if window.frame_count() > 600 {
//!             window.close();
//!         }
//!     })));
//!     renderer.append_window(Box::new(window))?;
//!
//!     renderer.render()?;
//!     renderer.release();
//!     platform.terminate();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod core;
pub mod error;
pub mod foundation;
pub mod render;

pub use error::{EngineError, EngineResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        EngineError, EngineResult,
        config::Config,
        core::config::{RendererConfig, WindowConfig},
        foundation::math::{Vec2, Vec3, Vec4, Mat2, Mat3, Mat4, Mat2x3, Mat3x4},
        render::{
            api::{Camera, Renderer, RenderFn, Shader, SharedShader, SharedTexture, Texture, Window},
            backend::{glfw_backend::GlfwPlatform, headless::HeadlessPlatform, GraphicsDevice, Platform},
            camera::{CameraMovement, EulerCamera},
            renderer::MultiWindowRenderer,
            shader::{ProgramShader, UniformValue},
            texture::ImageTexture,
            window::ContextWindow,
        },
    };
}
