//! # Renderer and Window Configuration
//!
//! Init records for [`MultiWindowRenderer`](crate::render::renderer::MultiWindowRenderer)
//! and [`ContextWindow`](crate::render::window::ContextWindow).
//!
//! ## Defaults
//!
//! Unset or zero fields fall back to documented defaults, both when a struct is built with
//! `Default` and when a partially filled file is loaded through [`Config`]:
//!
//! | Field | Default |
//! |---|---|
//! | renderer name | `"Renderer"` |
//! | view distance | `128` |
//! | context version | `4.1` core profile |
//! | window size | `720 x 480` |
//! | window title | `"Window"` |
//! | render callback | no-op |

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::render::api::RenderFn;
use crate::render::backend::ContextHints;

/// Default renderer name
pub const DEFAULT_RENDERER_NAME: &str = "Renderer";
/// Default view distance
pub const DEFAULT_VIEW_DISTANCE: u32 = 128;
/// Default OpenGL context major version
pub const DEFAULT_VERSION_MAJOR: u32 = 4;
/// Default OpenGL context minor version
pub const DEFAULT_VERSION_MINOR: u32 = 1;
/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: u32 = 720;
/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: u32 = 480;
/// Default window title
pub const DEFAULT_WINDOW_TITLE: &str = "Window";

/// # Renderer Configuration
///
/// Context hints set here apply to every window created after the renderer is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Renderer name, used in log output
    pub name: String,
    /// View distance exposed to applications
    pub view_distance: u32,
    /// Requested OpenGL context major version
    pub version_major: u32,
    /// Requested OpenGL context minor version
    pub version_minor: u32,
    /// Whether new windows are user-resizable
    pub resizable: bool,
    /// Whether new windows start visible
    pub visible: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_RENDERER_NAME.to_string(),
            view_distance: DEFAULT_VIEW_DISTANCE,
            version_major: DEFAULT_VERSION_MAJOR,
            version_minor: DEFAULT_VERSION_MINOR,
            resizable: true,
            visible: true,
        }
    }
}

impl RendererConfig {
    /// Create a renderer configuration with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the requested context version
    pub fn with_context_version(mut self, major: u32, minor: u32) -> Self {
        self.version_major = major;
        self.version_minor = minor;
        self
    }

    /// Set the view distance
    pub fn with_view_distance(mut self, distance: u32) -> Self {
        self.view_distance = distance;
        self
    }

    /// Set whether new windows are resizable
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Set whether new windows start visible
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Replace empty or zero fields with their defaults
    pub fn resolved(mut self) -> Self {
        if self.name.is_empty() {
            self.name = DEFAULT_RENDERER_NAME.to_string();
        }
        if self.view_distance == 0 {
            self.view_distance = DEFAULT_VIEW_DISTANCE;
        }
        if self.version_major == 0 {
            self.version_major = DEFAULT_VERSION_MAJOR;
        }
        if self.version_minor == 0 {
            self.version_minor = DEFAULT_VERSION_MINOR;
        }
        self
    }

    /// Context hints derived from this configuration
    pub fn context_hints(&self) -> ContextHints {
        ContextHints {
            version_major: self.version_major,
            version_minor: self.version_minor,
            core_profile: true,
            forward_compatible: true,
            resizable: self.resizable,
            visible: self.visible,
        }
    }
}

impl Config for RendererConfig {}

/// # Window Configuration
///
/// A position of `0` on either axis means "centre on the primary display" when one can be
/// found. The render callback cannot be stored in a file and is skipped by serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window name, used in log output
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Screen x position of the top-left corner
    pub pos_x: i32,
    /// Screen y position of the top-left corner
    pub pos_y: i32,
    /// Title bar text
    pub title: String,
    /// Per-frame render callback
    #[serde(skip)]
    pub render_fn: Option<RenderFn>,
    /// Cover the primary display instead of opening a window
    pub fullscreen: bool,
    /// RGBA clear color
    pub background_color: [f32; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            pos_x: 0,
            pos_y: 0,
            title: DEFAULT_WINDOW_TITLE.to_string(),
            render_fn: None,
            fullscreen: false,
            background_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl WindowConfig {
    /// Create a window configuration with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the window name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the window size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the window position
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.pos_x = x;
        self.pos_y = y;
        self
    }

    /// Set the clear color
    pub fn with_background_color(mut self, rgba: [f32; 4]) -> Self {
        self.background_color = rgba;
        self
    }

    /// Set the render callback
    pub fn with_render_fn(mut self, render_fn: RenderFn) -> Self {
        self.render_fn = Some(render_fn);
        self
    }

    /// Request fullscreen mode
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Replace empty or zero fields with their defaults
    pub fn resolved(mut self) -> Self {
        if self.width == 0 {
            self.width = DEFAULT_WINDOW_WIDTH;
        }
        if self.height == 0 {
            self.height = DEFAULT_WINDOW_HEIGHT;
        }
        if self.title.is_empty() {
            self.title = DEFAULT_WINDOW_TITLE.to_string();
        }
        if self.render_fn.is_none() {
            self.render_fn = Some(RenderFn::default());
        }
        self
    }
}

impl Config for WindowConfig {}
