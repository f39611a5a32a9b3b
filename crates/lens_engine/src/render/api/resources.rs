//! Shader, texture and camera capabilities

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::error::EngineResult;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::shader::UniformValue;

/// Shader shared between windows or callbacks
///
/// Any holder may reload or release it. The GL program is deleted when the last handle
/// drops.
pub type SharedShader = Rc<RefCell<dyn Shader>>;

/// Texture shared between windows or callbacks
pub type SharedTexture = Rc<RefCell<dyn Texture>>;

/// A linked shader program
pub trait Shader {
    /// Compile and link from source files
    ///
    /// The vertex and fragment paths are required. The geometry stage is optional: a `None`,
    /// empty or missing geometry file is skipped.
    fn load(&mut self, vertex: &Path, fragment: &Path, geometry: Option<&Path>) -> EngineResult<()>;

    /// Compile and link from source strings
    fn load_memory(&mut self, vertex: &str, fragment: &str, geometry: Option<&str>) -> EngineResult<()>;

    /// Set a uniform by name
    ///
    /// On a program that is not linked yet (id 0) this succeeds without touching the backend.
    fn set(&self, name: &str, value: UniformValue) -> EngineResult<()>;

    /// Make this program current
    fn bind(&self);

    /// Program id, `0` while unlinked
    fn id(&self) -> u32;

    /// Delete the program; a second call is a no-op
    fn release(&mut self);
}

/// An RGBA texture
pub trait Texture {
    /// Decode an image file and upload it
    fn load(&mut self, path: &Path) -> EngineResult<()>;

    /// Upload tightly packed RGBA8 pixels
    fn load_memory(&mut self, width: u32, height: u32, rgba: &[u8]) -> EngineResult<()>;

    /// Texture id, `0` while unloaded
    fn id(&self) -> u32;

    /// Source file name, empty when loaded from memory
    fn file_name(&self) -> &str;

    /// Override the recorded file name
    fn set_file_name(&mut self, name: &str);

    /// Size of the last upload in pixels
    fn size(&self) -> (u32, u32);

    /// Bind to a texture unit
    fn bind(&self, unit: u32);

    /// Delete the texture; a second call is a no-op
    fn release(&mut self);
}

/// Camera movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    /// Along the front vector
    Forward,
    /// Against the front vector
    Backward,
    /// Strafe against the right vector
    Left,
    /// Strafe along the right vector
    Right,
    /// Along the up vector
    Up,
    /// Against the up vector
    Down,
}

/// A camera that produces a view matrix
pub trait Camera {
    /// Reset every field to its default
    fn init(&mut self);

    /// Process-unique camera id
    fn id(&self) -> u32;

    /// Camera name
    fn name(&self) -> &str;

    /// Rename the camera
    fn set_name(&mut self, name: &str);

    /// World-to-view transform
    fn view_matrix(&self) -> Mat4;

    /// Position in world space
    fn position(&self) -> Vec3;

    /// Move the camera
    fn set_position(&mut self, position: Vec3);

    /// Viewing direction
    fn front(&self) -> Vec3;

    /// Up vector used by the view matrix and strafing
    fn up(&self) -> Vec3;

    /// Replace the up vector
    fn set_up(&mut self, up: Vec3);

    /// Right vector
    fn right(&self) -> Vec3;

    /// Yaw in degrees
    fn yaw(&self) -> f32;

    /// Set yaw in degrees and recompute the basis
    fn set_yaw(&mut self, yaw: f32);

    /// Pitch in degrees
    fn pitch(&self) -> f32;

    /// Set pitch in degrees and recompute the basis
    fn set_pitch(&mut self, pitch: f32);

    /// Zoom (field of view in degrees)
    fn zoom(&self) -> f32;

    /// Set zoom
    fn set_zoom(&mut self, zoom: f32);

    /// Set movement speed in units per second
    fn set_speed(&mut self, speed: f32);

    /// Set mouse sensitivity in degrees per offset unit
    fn set_sensitivity(&mut self, sensitivity: f32);

    /// Move by `speed * dt * speed_multiplier` in `direction`
    fn process_movement(&mut self, dt: f32, direction: CameraMovement, speed_multiplier: f32);

    /// Turn by mouse offsets, optionally clamping pitch short of straight up/down
    fn process_mouse_move(&mut self, dx: f32, dy: f32, clamp_pitch: bool);

    /// Zoom by a scroll offset
    fn process_scroll(&mut self, dy: f32);
}
