//! Graphics backend abstraction
//!
//! The engine never talks to a windowing library or GL loader directly. It goes through
//! three traits:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ ContextWindow / Renderer     │
//! └──────────────┬───────────────┘
//!                │ Uses
//!      ┌─────────▼─────────┐
//!      │ Platform          │ ← process-wide: hints, displays, clock, surface creation
//!      └─────────┬─────────┘
//!                │ Creates
//!      ┌─────────▼─────────┐
//!      │ Surface           │ ← one per window: context, swap, events, window attributes
//!      └─────────┬─────────┘
//!                │ Owns
//!      ┌─────────▼─────────┐
//!      │ GraphicsDevice    │ ← GL primitives for that context: clear, programs, textures
//!      └───────────────────┘
//! ```
//!
//! Implementations:
//! - [`glfw_backend`]: GLFW windows with an OpenGL context loaded through `glow`
//! - [`headless`]: in-process double with a simulated clock, used by the test-suite
//!
//! # Threading
//! Nothing here is `Send`. A context belongs to the thread that created it, and the whole
//! renderer lives on that thread.

pub mod glfw_backend;
pub mod headless;

use std::fmt;
use std::rc::Rc;

use crate::error::EngineResult;
use crate::render::shader::UniformValue;

/// OpenGL context creation hints applied to every surface created afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextHints {
    /// Context major version
    pub version_major: u32,
    /// Context minor version
    pub version_minor: u32,
    /// Request a core profile context
    pub core_profile: bool,
    /// Request a forward-compatible context
    pub forward_compatible: bool,
    /// Surfaces are user-resizable
    pub resizable: bool,
    /// Surfaces start visible
    pub visible: bool,
}

impl Default for ContextHints {
    fn default() -> Self {
        Self {
            version_major: 3,
            version_minor: 3,
            core_profile: true,
            forward_compatible: true,
            resizable: true,
            visible: true,
        }
    }
}

/// Video mode of a physical display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// How a surface is placed on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePlacement {
    /// Windowed at the given top-left position
    At(i32, i32),
    /// Windowed wherever the backend puts new windows
    BackendDefault,
    /// Fullscreen on the primary display, at the origin
    Fullscreen,
}

/// Everything a platform needs to create one surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRequest {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Title bar text
    pub title: String,
    /// Screen placement
    pub placement: SurfacePlacement,
}

/// Process-wide backend state
///
/// Created once by the application and terminated explicitly; it is never initialised
/// implicitly, so tests can create and tear down platforms deterministically.
pub trait Platform {
    /// Context hints for surfaces created from now on
    fn set_context_hints(&self, hints: &ContextHints);

    /// Restore the backend's default context hints
    fn reset_context_hints(&self);

    /// Video mode of the primary display, if one can be found
    fn primary_display(&self) -> Option<DisplayMode>;

    /// Create a surface with its own graphics context
    fn create_surface(&self, request: &SurfaceRequest) -> EngineResult<Box<dyn Surface>>;

    /// Seconds since the platform was initialised
    fn time(&self) -> f64;

    /// Tear down process-wide state; later surface creation fails
    fn terminate(&self);

    /// Whether [`Platform::terminate`] was called
    fn is_terminated(&self) -> bool;
}

/// One on-screen surface and its graphics context
///
/// Dropping a surface destroys the context.
pub trait Surface {
    /// Bind this surface's context to the calling thread
    fn make_current(&mut self);

    /// One-time loading of GL entry points; the context must be current
    fn initialize_device(&mut self) -> Result<(), String>;

    /// GL primitives for this context, available after [`Surface::initialize_device`]
    fn device(&self) -> Option<Rc<dyn GraphicsDevice>>;

    /// Present the back buffer
    fn swap_buffers(&mut self);

    /// Process and drain pending window/input events
    fn poll_events(&mut self);

    /// Set the title bar text
    fn set_title(&mut self, title: &str);

    /// Resize the client area
    fn set_size(&mut self, width: u32, height: u32);

    /// Move the top-left corner
    fn set_position(&mut self, x: i32, y: i32);

    /// Show or hide the surface
    fn set_visible(&mut self, visible: bool);

    /// Whether the surface is shown
    fn is_visible(&self) -> bool;

    /// Allow or forbid user resizing
    fn set_resizable(&mut self, resizable: bool);

    /// Whether the user may resize the surface
    fn is_resizable(&self) -> bool;

    /// Whether a close was requested, by this code or by the user
    fn should_close(&self) -> bool;

    /// Request or cancel closing
    fn set_should_close(&mut self, should_close: bool);
}

/// Shader pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
    /// Geometry stage
    Geometry,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
        })
    }
}

/// Resolved uniform location inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// A uniform declared by a linked program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    /// Name without any array suffix
    pub name: String,
    /// GLSL type, e.g. `vec4` or `sampler2D`
    pub type_name: String,
}

/// GL primitives of one context
///
/// Object ids are the raw, non-zero GL names; `0` is never a valid id. Every call assumes
/// the owning surface's context is current, except the `delete_*` calls: those may come
/// from a `Drop` at any time and are ignored once the context is gone.
pub trait GraphicsDevice {
    /// Set the clear color and clear color + depth buffers
    fn clear(&self, rgba: [f32; 4]);

    /// Compile one stage; the error carries the compiler log
    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<u32, String>;

    /// Delete a compiled stage
    fn delete_stage(&self, stage: u32);

    /// Link compiled stages into a program; the error carries the linker log
    fn link_program(&self, stages: &[u32]) -> Result<u32, String>;

    /// Make a program current
    fn use_program(&self, program: u32);

    /// Delete a linked program
    fn delete_program(&self, program: u32);

    /// Uniforms the linked program declares; types the backend cannot name are left out
    fn active_uniforms(&self, program: u32) -> Vec<ActiveUniform>;

    /// Look up a uniform by name
    fn uniform_location(&self, program: u32, name: &str) -> Option<UniformLocation>;

    /// Upload a uniform value to the current program
    fn set_uniform(&self, location: UniformLocation, value: &UniformValue);

    /// Create an RGBA8 texture with linear filtering and clamp-to-edge wrapping
    fn create_texture(&self, width: u32, height: u32, rgba: &[u8]) -> Result<u32, String>;

    /// Bind a texture to a texture unit
    fn bind_texture(&self, unit: u32, texture: u32);

    /// Delete a texture
    fn delete_texture(&self, texture: u32);
}
