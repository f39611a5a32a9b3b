//! Demo configuration
//!
//! ```toml
//! [renderer]
//! name = "Demo"
//!
//! [[windows]]
//! title = "Left"
//! width = 480
//! background_color = [0.8, 0.2, 0.2, 1.0]
//! close_after_secs = 10.0
//! ```
//!
//! Every field is optional. Without a file, three windows side by side are opened.

use serde::{Deserialize, Serialize};

use lens_engine::config::Config;
use lens_engine::core::config::{RendererConfig, WindowConfig};

/// One demo window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppWindow {
    /// Window parameters
    #[serde(flatten)]
    pub window: WindowConfig,
    /// Close the window after this many seconds; `0` keeps it open until the user closes it
    pub close_after_secs: f64,
    /// Speed of the background pulse in radians per second
    pub pulse_speed: f32,
}

impl Default for AppWindow {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            close_after_secs: 0.0,
            pulse_speed: 1.0,
        }
    }
}

impl AppWindow {
    fn side_by_side(title: &str, x: i32, rgba: [f32; 4], pulse_speed: f32) -> Self {
        Self {
            window: WindowConfig::new(title)
                .with_name(title.to_lowercase())
                .with_size(480, 360)
                .with_position(x, 120)
                .with_background_color(rgba),
            close_after_secs: 0.0,
            pulse_speed,
        }
    }
}

/// Whole demo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Renderer parameters
    pub renderer: RendererConfig,
    /// Windows, opened in order
    pub windows: Vec<AppWindow>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::new("Multiwindow Demo"),
            windows: vec![
                AppWindow::side_by_side("Left", 40, [0.8, 0.2, 0.2, 1.0], 1.0),
                AppWindow::side_by_side("Centre", 560, [0.2, 0.8, 0.2, 1.0], 2.0),
                AppWindow::side_by_side("Right", 1080, [0.2, 0.2, 0.8, 1.0], 3.0),
            ],
        }
    }
}

impl Config for AppConfig {}
