//! Capability traits
//!
//! The renderer and its windows are written against these traits only, never against a
//! concrete backend type. [`ContextWindow`](crate::render::window::ContextWindow) and
//! [`MultiWindowRenderer`](crate::render::renderer::MultiWindowRenderer) are the shipped
//! implementations; tests and applications can provide their own.
//!
//! # Ownership
//! - A renderer owns its windows (`Box<dyn Window>`); releasing or dropping it destroys them.
//! - A window owns its graphics context exclusively.
//! - Shaders and textures are shared by reference ([`SharedShader`], [`SharedTexture`]).
//!   Attaching one to a window adds a holder; the GL object is deleted by an explicit
//!   `release` or when the last holder drops it.

mod render_fn;
mod resources;

use std::rc::Rc;

pub use render_fn::RenderFn;
pub use resources::{Camera, CameraMovement, Shader, SharedShader, SharedTexture, Texture};

use crate::core::config::{RendererConfig, WindowConfig};
use crate::error::EngineResult;
use crate::render::backend::GraphicsDevice;

/// A renderer drives the shared frame loop of an ordered set of windows
pub trait Renderer {
    /// Initialize the renderer and push its context hints to the platform
    ///
    /// Fails with `AlreadyInitialized` on a second call.
    fn init(&mut self, config: RendererConfig) -> EngineResult<()>;

    /// Whether [`Renderer::init`] succeeded and [`Renderer::release`] was not called since
    fn is_initialized(&self) -> bool;

    /// Renderer name
    fn name(&self) -> &str;

    /// Rename the renderer
    fn set_name(&mut self, name: &str);

    /// View distance
    fn view_distance(&self) -> u32;

    /// Change the view distance
    fn set_view_distance(&mut self, distance: u32);

    /// Append an initialized window; it is visited after every window appended before it
    fn append_window(&mut self, window: Box<dyn Window>) -> EngineResult<()>;

    /// The window at `index`, in insertion order
    fn window(&self, index: usize) -> EngineResult<&dyn Window>;

    /// Mutable access to the window at `index`
    fn window_mut(&mut self, index: usize) -> EngineResult<&mut dyn Window>;

    /// Number of windows held, closed ones included
    fn window_count(&self) -> usize;

    /// Flush every open window, round-robin, until all of them report closed
    ///
    /// Fails with `NotInitialized` when no window was appended.
    fn render(&mut self) -> EngineResult<()>;

    /// Destroy every window and drop them from the renderer
    fn release(&mut self);
}

/// A window owns one graphics context and renders one frame per [`Window::flush`]
pub trait Window {
    /// Create the surface and its context
    ///
    /// Fails with `AlreadyInitialized` on a second call.
    fn init(&mut self, config: WindowConfig) -> EngineResult<()>;

    /// Whether the window holds a live context
    fn is_initialized(&self) -> bool;

    /// Window name
    fn name(&self) -> &str;

    /// Rename the window
    fn set_name(&mut self, name: &str);

    /// Title bar text
    fn title(&self) -> &str;

    /// Change the title bar text
    fn set_title(&mut self, title: &str);

    /// Client area size in pixels
    fn size(&self) -> (u32, u32);

    /// Resize the client area; both dimensions must be non-zero
    fn set_size(&mut self, width: u32, height: u32) -> EngineResult<()>;

    /// Top-left screen position, `None` when the backend placed the window
    fn position(&self) -> Option<(i32, i32)>;

    /// Move the window's top-left corner
    fn set_position(&mut self, x: i32, y: i32);

    /// Whether the window is shown
    fn visible(&self) -> bool;

    /// Show or hide the window; hidden windows keep rendering when flushed
    ///
    /// A closed window stays hidden.
    fn set_visible(&mut self, visible: bool);

    /// Whether the user may resize the window
    fn resizable(&self) -> bool;

    /// Allow or forbid user resizing
    fn set_resizable(&mut self, resizable: bool);

    /// RGBA clear color
    fn clear_color(&self) -> [f32; 4];

    /// Change the clear color used by the next flush
    fn set_clear_color(&mut self, rgba: [f32; 4]);

    /// Frames per second from the last frame interval
    ///
    /// `None` until two frames were flushed, or when the interval was zero.
    fn fps(&self) -> Option<f64>;

    /// Mean frames per second since the first flush
    fn average_fps(&self) -> Option<f64>;

    /// Seconds between the two most recent frames
    fn delta_time(&self) -> f64;

    /// Seconds between the first and the most recent frame
    fn elapsed_time(&self) -> f64;

    /// Number of flushed frames
    fn frame_count(&self) -> u64;

    /// Bind this window's context to the calling thread
    fn make_context_current(&mut self);

    /// Current render callback
    fn render_fn(&self) -> Option<RenderFn>;

    /// Replace the render callback; `None` falls back to the no-op default on the next flush
    fn set_render_fn(&mut self, render_fn: Option<RenderFn>);

    /// Render one frame: timing, clear, callback, present, event poll
    fn flush(&mut self) -> EngineResult<()>;

    /// Request closing; a closed window never reopens
    fn close(&mut self);

    /// Whether the window was closed, by [`Window::close`] or by the user
    fn is_closed(&self) -> bool;

    /// Tear down the context; calling it again is a no-op
    fn destroy(&mut self);

    /// GL primitives of this window's context, used to create shaders and textures
    fn device(&self) -> Option<Rc<dyn GraphicsDevice>>;

    /// Attach a shader for use by the render callback
    fn attach_shader(&mut self, shader: SharedShader);

    /// The attached shader at `index`
    fn shader(&self, index: usize) -> EngineResult<SharedShader>;

    /// Number of attached shaders
    fn shader_count(&self) -> usize;

    /// Attach a texture for use by the render callback
    fn attach_texture(&mut self, texture: SharedTexture);

    /// The attached texture at `index`
    fn texture(&self, index: usize) -> EngineResult<SharedTexture>;

    /// Number of attached textures
    fn texture_count(&self) -> usize;
}
