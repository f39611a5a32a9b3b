//! # Euler Fly Camera
//!
//! A camera oriented by yaw and pitch angles in degrees, with the view matrix derived from
//! its position and front vector.
//!
//! ## Orientation
//!
//! ```text
//!            +Y (world up)
//!             │   front = (cos yaw · cos pitch,
//!             │            sin pitch,
//!             │            sin yaw · cos pitch)
//!             └──── +X  ← yaw = 0, pitch = 0
//!            ╱
//!          +Z
//! ```
//!
//! Right-handed, Y up. At yaw 0 and pitch 0 the camera looks down +X. Setting yaw or pitch,
//! directly or through mouse movement, recomputes the front and right vectors; the up vector
//! only changes through [`Camera::set_up`].

use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::math::{utils, Mat4, Point3, Vec3};
use crate::render::api::Camera;

pub use crate::render::api::CameraMovement;

/// Default position
pub const DEFAULT_POSITION: [f32; 3] = [0.0, 0.0, 0.0];
/// Default front vector
pub const DEFAULT_FRONT: [f32; 3] = [1.0, 0.0, 0.0];
/// Default up and world-up vector
pub const DEFAULT_UP: [f32; 3] = [0.0, 1.0, 0.0];
/// Default movement speed in units per second
pub const DEFAULT_SPEED: f32 = 1.0;
/// Default mouse sensitivity in degrees per offset unit
pub const DEFAULT_SENSITIVITY: f32 = 0.04;
/// Default zoom (field of view in degrees)
pub const DEFAULT_ZOOM: f32 = 65.0;
/// Pitch limit applied when mouse movement asks for clamping
pub const PITCH_LIMIT: f32 = 89.9;

static NEXT_CAMERA_ID: AtomicU32 = AtomicU32::new(1);

/// Yaw/pitch camera
#[derive(Debug, Clone)]
pub struct EulerCamera {
    id: u32,
    name: String,
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    speed: f32,
    sensitivity: f32,
    zoom: f32,
}

impl EulerCamera {
    /// Create a camera with default orientation and a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        let mut camera = Self {
            id: NEXT_CAMERA_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            position: Vec3::zeros(),
            front: Vec3::zeros(),
            up: Vec3::zeros(),
            right: Vec3::zeros(),
            world_up: Vec3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            speed: 0.0,
            sensitivity: 0.0,
            zoom: 0.0,
        };
        camera.init();
        camera
    }

    /// Movement speed in units per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Mouse sensitivity
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    fn update_vectors(&mut self) {
        let yaw = utils::deg_to_rad(self.yaw);
        let pitch = utils::deg_to_rad(self.pitch);
        let direction = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());

        self.front = utils::normalize_or(direction, self.front);
        self.right = utils::normalize_or(self.front.cross(&self.world_up), self.right);
    }
}

impl Default for EulerCamera {
    fn default() -> Self {
        Self::new("Camera")
    }
}

impl Camera for EulerCamera {
    fn init(&mut self) {
        self.position = Vec3::from(DEFAULT_POSITION);
        self.front = Vec3::from(DEFAULT_FRONT);
        self.up = Vec3::from(DEFAULT_UP);
        self.world_up = Vec3::from(DEFAULT_UP);
        self.right = self.front.cross(&self.world_up);
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.speed = DEFAULT_SPEED;
        self.sensitivity = DEFAULT_SENSITIVITY;
        self.zoom = DEFAULT_ZOOM;
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn view_matrix(&self) -> Mat4 {
        let eye = Point3::from(self.position);
        let target = Point3::from(self.position + self.front);
        Mat4::look_at_rh(&eye, &target, &self.up)
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn front(&self) -> Vec3 {
        self.front
    }

    fn up(&self) -> Vec3 {
        self.up
    }

    fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    fn right(&self) -> Vec3 {
        self.right
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
        self.update_vectors();
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
        self.update_vectors();
    }

    fn zoom(&self) -> f32 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    fn process_movement(&mut self, dt: f32, direction: CameraMovement, speed_multiplier: f32) {
        let velocity = self.speed * dt * speed_multiplier;
        let strafe = utils::normalize_or(self.front.cross(&self.up), Vec3::zeros());
        let offset = match direction {
            CameraMovement::Forward => self.front * velocity,
            CameraMovement::Backward => -self.front * velocity,
            CameraMovement::Right => strafe * velocity,
            CameraMovement::Left => -strafe * velocity,
            CameraMovement::Up => self.up * velocity,
            CameraMovement::Down => -self.up * velocity,
        };
        self.position += offset;
    }

    fn process_mouse_move(&mut self, dx: f32, dy: f32, clamp_pitch: bool) {
        self.yaw += dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        if clamp_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.update_vectors();
    }

    fn process_scroll(&mut self, dy: f32) {
        self.zoom -= dy;
    }
}
