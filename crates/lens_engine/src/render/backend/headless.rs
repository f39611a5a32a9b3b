//! In-process backend without a display server
//!
//! [`HeadlessPlatform`] behaves like a windowing library with one simulated primary display
//! and a simulated clock. Every presented frame advances the clock by a configurable frame
//! interval, which makes frame timing deterministic. Each surface gets a [`HeadlessDevice`]
//! that records the GL calls made against it.
//!
//! The device does a small amount of real validation so error paths can be exercised:
//! - a stage fails to compile when its source is empty or contains `#error`
//! - a program fails to link without a vertex and a fragment stage, or when a stage has no
//!   `main`
//! - uniform locations exist for every `uniform <type> <name>;` declaration in the sources
//! - texture uploads must be exactly `width * height * 4` bytes
//!
//! Dropping a surface loses its context: every object of the device is gone, later deletes
//! are ignored and later object creation fails.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::{
    ActiveUniform, ContextHints, DisplayMode, GraphicsDevice, Platform, ShaderStage, Surface, SurfacePlacement,
    SurfaceRequest, UniformLocation,
};
use crate::error::{EngineError, EngineResult};
use crate::render::shader::UniformValue;

/// Default simulated primary display
pub const DEFAULT_DISPLAY: DisplayMode = DisplayMode {
    width: 1920,
    height: 1080,
};

/// Default simulated time between two presented frames (60 Hz)
pub const DEFAULT_FRAME_INTERVAL: f64 = 1.0 / 60.0;

/// A GL call recorded by [`HeadlessDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// `clear` with the given color
    Clear([f32; 4]),
    /// A stage was compiled
    CompileStage(ShaderStage),
    /// A stage was deleted
    DeleteStage(u32),
    /// A program was linked from the given stages
    LinkProgram(Vec<u32>),
    /// A program was made current
    UseProgram(u32),
    /// A program was deleted
    DeleteProgram(u32),
    /// A uniform was looked up
    UniformLocation(u32, String),
    /// A uniform was uploaded
    SetUniform(UniformLocation, UniformValue),
    /// A texture was created with the given size
    CreateTexture(u32, u32),
    /// A texture was bound to a unit
    BindTexture(u32, u32),
    /// A texture was deleted
    DeleteTexture(u32),
}

struct CompiledStage {
    stage: ShaderStage,
    source: String,
}

/// Recording [`GraphicsDevice`] for one headless context
#[derive(Default)]
pub struct HeadlessDevice {
    next_id: Cell<u32>,
    calls: RefCell<Vec<DeviceCall>>,
    stages: RefCell<HashMap<u32, CompiledStage>>,
    programs: RefCell<HashMap<u32, Vec<ActiveUniform>>>,
    textures: RefCell<HashMap<u32, (u32, u32)>>,
    lost: Cell<bool>,
}

impl HeadlessDevice {
    /// Create a device with an empty call log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the call log
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.borrow().clone()
    }

    /// Drain the call log
    pub fn take_calls(&self) -> Vec<DeviceCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Colors passed to `clear`, oldest first
    pub fn clear_colors(&self) -> Vec<[f32; 4]> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                DeviceCall::Clear(rgba) => Some(*rgba),
                _ => None,
            })
            .collect()
    }

    /// Compiled stages not deleted yet
    pub fn live_stage_count(&self) -> usize {
        self.stages.borrow().len()
    }

    /// Linked programs not deleted yet
    pub fn live_program_count(&self) -> usize {
        self.programs.borrow().len()
    }

    /// Size of a live texture
    pub fn texture_size(&self, texture: u32) -> Option<(u32, u32)> {
        self.textures.borrow().get(&texture).copied()
    }

    /// Whether the owning surface was dropped
    pub fn is_context_lost(&self) -> bool {
        self.lost.get()
    }

    fn lose_context(&self) {
        self.lost.set(true);
        self.stages.borrow_mut().clear();
        self.programs.borrow_mut().clear();
        self.textures.borrow_mut().clear();
    }

    fn check_context(&self) -> Result<(), String> {
        if self.lost.get() {
            Err("ERROR: context lost".to_string())
        } else {
            Ok(())
        }
    }

    fn record(&self, call: DeviceCall) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = ActiveUniform> + '_ {
    source.lines().filter_map(|line| {
        let declaration = line.trim().strip_prefix("uniform ")?.split(';').next()?;
        let mut words = declaration.split_whitespace().rev();
        let name = words.next()?;
        let type_name = words.next()?;
        Some(ActiveUniform {
            name: name.split('[').next().unwrap_or(name).to_string(),
            type_name: type_name.to_string(),
        })
    })
}

impl GraphicsDevice for HeadlessDevice {
    fn clear(&self, rgba: [f32; 4]) {
        self.record(DeviceCall::Clear(rgba));
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        self.record(DeviceCall::CompileStage(stage));
        self.check_context()?;
        if source.trim().is_empty() {
            return Err(format!("ERROR: 0:0: empty {stage} shader source"));
        }
        if let Some((line, text)) = source
            .lines()
            .enumerate()
            .find(|(_, text)| text.trim_start().starts_with("#error"))
        {
            return Err(format!("ERROR: 0:{}: '{}'", line + 1, text.trim()));
        }

        let id = self.allocate();
        self.stages.borrow_mut().insert(
            id,
            CompiledStage {
                stage,
                source: source.to_string(),
            },
        );
        Ok(id)
    }

    fn delete_stage(&self, stage: u32) {
        if self.lost.get() {
            return;
        }
        self.record(DeviceCall::DeleteStage(stage));
        self.stages.borrow_mut().remove(&stage);
    }

    fn link_program(&self, stages: &[u32]) -> Result<u32, String> {
        self.record(DeviceCall::LinkProgram(stages.to_vec()));
        self.check_context()?;
        let compiled = self.stages.borrow();

        let mut kinds = Vec::with_capacity(stages.len());
        let mut uniforms = Vec::new();
        for id in stages {
            let stage = compiled
                .get(id)
                .ok_or_else(|| format!("ERROR: {id} is not a compiled shader"))?;
            if !stage.source.contains("main") {
                return Err(format!("ERROR: {} shader is missing main()", stage.stage));
            }
            kinds.push(stage.stage);
            uniforms.extend(declared_uniforms(&stage.source));
        }
        if !kinds.contains(&ShaderStage::Vertex) || !kinds.contains(&ShaderStage::Fragment) {
            return Err("ERROR: program needs a vertex and a fragment shader".to_string());
        }
        drop(compiled);

        uniforms.dedup();
        let id = self.allocate();
        self.programs.borrow_mut().insert(id, uniforms);
        Ok(id)
    }

    fn use_program(&self, program: u32) {
        self.record(DeviceCall::UseProgram(program));
    }

    fn delete_program(&self, program: u32) {
        if self.lost.get() {
            return;
        }
        self.record(DeviceCall::DeleteProgram(program));
        self.programs.borrow_mut().remove(&program);
    }

    fn active_uniforms(&self, program: u32) -> Vec<ActiveUniform> {
        self.programs.borrow().get(&program).cloned().unwrap_or_default()
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<UniformLocation> {
        self.record(DeviceCall::UniformLocation(program, name.to_string()));
        let programs = self.programs.borrow();
        let index = programs.get(&program)?.iter().position(|u| u.name == name)?;
        u32::try_from(index).ok().map(UniformLocation)
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        self.record(DeviceCall::SetUniform(location, *value));
    }

    fn create_texture(&self, width: u32, height: u32, rgba: &[u8]) -> Result<u32, String> {
        self.record(DeviceCall::CreateTexture(width, height));
        self.check_context()?;
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(format!(
                "pixel buffer holds {} bytes, {width}x{height} RGBA needs {expected}",
                rgba.len()
            ));
        }
        let id = self.allocate();
        self.textures.borrow_mut().insert(id, (width, height));
        Ok(id)
    }

    fn bind_texture(&self, unit: u32, texture: u32) {
        self.record(DeviceCall::BindTexture(unit, texture));
    }

    fn delete_texture(&self, texture: u32) {
        if self.lost.get() {
            return;
        }
        self.record(DeviceCall::DeleteTexture(texture));
        self.textures.borrow_mut().remove(&texture);
    }
}

/// Observable state of one headless surface
#[derive(Debug, Clone)]
struct SurfaceState {
    title: String,
    size: (u32, u32),
    position: Option<(i32, i32)>,
    fullscreen: bool,
    visible: bool,
    resizable: bool,
    should_close: bool,
    hints: ContextHints,
    swap_count: u64,
    poll_count: u64,
    destroyed: bool,
}

struct Shared {
    clock: Cell<f64>,
    frame_interval: Cell<f64>,
    current: Cell<Option<usize>>,
}

/// Simulated windowing platform
pub struct HeadlessPlatform {
    shared: Rc<Shared>,
    display: Cell<Option<DisplayMode>>,
    hints: Cell<ContextHints>,
    surfaces: RefCell<Vec<Rc<RefCell<SurfaceState>>>>,
    devices: RefCell<Vec<Option<Rc<HeadlessDevice>>>>,
    refuse_surfaces: Cell<bool>,
    refuse_devices: Cell<bool>,
    terminated: Cell<bool>,
}

impl HeadlessPlatform {
    /// Platform with a 1920x1080 primary display and a 60 Hz frame interval
    pub fn new() -> Rc<Self> {
        Self::with_display(Some(DEFAULT_DISPLAY))
    }

    /// Platform with the given primary display, or none at all
    pub fn with_display(display: Option<DisplayMode>) -> Rc<Self> {
        log::debug!("Headless platform created, display {:?}", display);
        Rc::new(Self {
            shared: Rc::new(Shared {
                clock: Cell::new(0.0),
                frame_interval: Cell::new(DEFAULT_FRAME_INTERVAL),
                current: Cell::new(None),
            }),
            display: Cell::new(display),
            hints: Cell::new(ContextHints::default()),
            surfaces: RefCell::new(Vec::new()),
            devices: RefCell::new(Vec::new()),
            refuse_surfaces: Cell::new(false),
            refuse_devices: Cell::new(false),
            terminated: Cell::new(false),
        })
    }

    /// Seconds the clock advances on every presented frame
    pub fn set_frame_interval(&self, seconds: f64) {
        self.shared.frame_interval.set(seconds);
    }

    /// Advance the clock without presenting
    pub fn advance(&self, seconds: f64) {
        self.shared.clock.set(self.shared.clock.get() + seconds);
    }

    /// Make later surface creation fail
    pub fn refuse_surfaces(&self, refuse: bool) {
        self.refuse_surfaces.set(refuse);
    }

    /// Make later device initialization fail
    pub fn refuse_devices(&self, refuse: bool) {
        self.refuse_devices.set(refuse);
    }

    /// Context hints currently in effect
    pub fn context_hints(&self) -> ContextHints {
        self.hints.get()
    }

    /// Number of surfaces created so far, destroyed ones included
    pub fn surface_count(&self) -> usize {
        self.surfaces.borrow().len()
    }

    /// Index of the surface whose context is current
    pub fn current_surface(&self) -> Option<usize> {
        self.shared.current.get()
    }

    /// Inspect the surface created `index`-th
    pub fn surface(&self, index: usize) -> Option<SurfaceView> {
        let state = self.surfaces.borrow().get(index).cloned()?;
        let device = self.devices.borrow().get(index).cloned().flatten();
        Some(SurfaceView { state, device })
    }
}

impl Platform for HeadlessPlatform {
    fn set_context_hints(&self, hints: &ContextHints) {
        self.hints.set(*hints);
    }

    fn reset_context_hints(&self) {
        self.hints.set(ContextHints::default());
    }

    fn primary_display(&self) -> Option<DisplayMode> {
        self.display.get()
    }

    fn create_surface(&self, request: &SurfaceRequest) -> EngineResult<Box<dyn Surface>> {
        if self.terminated.get() {
            return Err(EngineError::BackendInit("platform is terminated".to_string()));
        }
        if self.refuse_surfaces.get() {
            return Err(EngineError::BackendInit(format!(
                "failed to create surface {:?}",
                request.title
            )));
        }

        let (position, fullscreen) = match request.placement {
            SurfacePlacement::At(x, y) => (Some((x, y)), false),
            SurfacePlacement::BackendDefault => (None, false),
            SurfacePlacement::Fullscreen => {
                if self.display.get().is_none() {
                    return Err(EngineError::BackendInit(
                        "fullscreen requested without a display".to_string(),
                    ));
                }
                (Some((0, 0)), true)
            }
        };
        let hints = self.hints.get();
        let state = Rc::new(RefCell::new(SurfaceState {
            title: request.title.clone(),
            size: (request.width, request.height),
            position,
            fullscreen,
            visible: hints.visible,
            resizable: hints.resizable,
            should_close: false,
            hints,
            swap_count: 0,
            poll_count: 0,
            destroyed: false,
        }));

        let index = {
            let mut surfaces = self.surfaces.borrow_mut();
            surfaces.push(Rc::clone(&state));
            surfaces.len() - 1
        };
        let device = (!self.refuse_devices.get()).then(|| Rc::new(HeadlessDevice::new()));
        self.devices.borrow_mut().push(device.clone());
        log::trace!("Headless surface {} created: {:?}", index, request);

        Ok(Box::new(HeadlessSurface {
            index,
            shared: Rc::clone(&self.shared),
            state,
            pending_device: device,
            device: None,
        }))
    }

    fn time(&self) -> f64 {
        self.shared.clock.get()
    }

    fn terminate(&self) {
        self.terminated.set(true);
        self.shared.current.set(None);
    }

    fn is_terminated(&self) -> bool {
        self.terminated.get()
    }
}

/// Read access to a headless surface from tests
pub struct SurfaceView {
    state: Rc<RefCell<SurfaceState>>,
    device: Option<Rc<HeadlessDevice>>,
}

impl SurfaceView {
    /// Title bar text
    pub fn title(&self) -> String {
        self.state.borrow().title.clone()
    }

    /// Client area size
    pub fn size(&self) -> (u32, u32) {
        self.state.borrow().size
    }

    /// Top-left position, `None` when the backend chose it
    pub fn position(&self) -> Option<(i32, i32)> {
        self.state.borrow().position
    }

    /// Whether the surface covers the display
    pub fn is_fullscreen(&self) -> bool {
        self.state.borrow().fullscreen
    }

    /// Whether the surface is shown
    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    /// Whether the surface is user-resizable
    pub fn is_resizable(&self) -> bool {
        self.state.borrow().resizable
    }

    /// Whether a close was requested
    pub fn should_close(&self) -> bool {
        self.state.borrow().should_close
    }

    /// Context hints the surface was created with
    pub fn hints(&self) -> ContextHints {
        self.state.borrow().hints
    }

    /// Number of presented frames
    pub fn swap_count(&self) -> u64 {
        self.state.borrow().swap_count
    }

    /// Number of event polls
    pub fn poll_count(&self) -> u64 {
        self.state.borrow().poll_count
    }

    /// Whether the surface was dropped
    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// The surface's device, if device creation was allowed
    pub fn device(&self) -> Option<Rc<HeadlessDevice>> {
        self.device.clone()
    }

    /// Simulate the user clicking the close button
    pub fn request_close(&self) {
        self.state.borrow_mut().should_close = true;
    }
}

struct HeadlessSurface {
    index: usize,
    shared: Rc<Shared>,
    state: Rc<RefCell<SurfaceState>>,
    pending_device: Option<Rc<HeadlessDevice>>,
    device: Option<Rc<HeadlessDevice>>,
}

impl Surface for HeadlessSurface {
    fn make_current(&mut self) {
        self.shared.current.set(Some(self.index));
    }

    fn initialize_device(&mut self) -> Result<(), String> {
        if self.device.is_some() {
            return Ok(());
        }
        if self.shared.current.get() != Some(self.index) {
            return Err("context is not current".to_string());
        }
        let device = self
            .pending_device
            .take()
            .ok_or_else(|| "failed to load GL entry points".to_string())?;
        self.device = Some(device);
        Ok(())
    }

    fn device(&self) -> Option<Rc<dyn GraphicsDevice>> {
        self.device
            .clone()
            .map(|device| device as Rc<dyn GraphicsDevice>)
    }

    fn swap_buffers(&mut self) {
        self.state.borrow_mut().swap_count += 1;
        let clock = &self.shared.clock;
        clock.set(clock.get() + self.shared.frame_interval.get());
    }

    fn poll_events(&mut self) {
        self.state.borrow_mut().poll_count += 1;
    }

    fn set_title(&mut self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().size = (width, height);
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.state.borrow_mut().position = Some((x, y));
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.state.borrow_mut().resizable = resizable;
    }

    fn is_resizable(&self) -> bool {
        self.state.borrow().resizable
    }

    fn should_close(&self) -> bool {
        self.state.borrow().should_close
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.state.borrow_mut().should_close = should_close;
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        self.state.borrow_mut().destroyed = true;
        if let Some(device) = &self.device {
            device.lose_context();
        }
        if self.shared.current.get() == Some(self.index) {
            self.shared.current.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(placement: SurfacePlacement) -> SurfaceRequest {
        SurfaceRequest {
            width: 320,
            height: 240,
            title: "view".to_string(),
            placement,
        }
    }

    #[test]
    fn test_swap_advances_clock() {
        let platform = HeadlessPlatform::new();
        platform.set_frame_interval(0.5);
        let mut surface = platform.create_surface(&request(SurfacePlacement::At(10, 20))).unwrap();

        surface.swap_buffers();
        surface.swap_buffers();
        assert!((platform.time() - 1.0).abs() < f64::EPSILON);
        assert_eq!(platform.surface(0).unwrap().swap_count(), 2);
        assert_eq!(platform.surface(0).unwrap().position(), Some((10, 20)));
    }

    #[test]
    fn test_device_requires_current_context() {
        let platform = HeadlessPlatform::new();
        let mut surface = platform.create_surface(&request(SurfacePlacement::BackendDefault)).unwrap();

        assert!(surface.initialize_device().is_err());
        surface.make_current();
        assert!(surface.initialize_device().is_ok());
        assert!(surface.device().is_some());
    }

    #[test]
    fn test_surfaces_take_hints_in_effect() {
        let platform = HeadlessPlatform::new();
        platform.set_context_hints(&ContextHints {
            version_major: 4,
            version_minor: 1,
            visible: false,
            ..ContextHints::default()
        });
        let _first = platform.create_surface(&request(SurfacePlacement::BackendDefault)).unwrap();
        platform.reset_context_hints();
        let _second = platform.create_surface(&request(SurfacePlacement::BackendDefault)).unwrap();

        let first = platform.surface(0).unwrap();
        assert_eq!(first.hints().version_major, 4);
        assert!(!first.is_visible());
        assert_eq!(platform.surface(1).unwrap().hints(), ContextHints::default());
    }

    #[test]
    fn test_drop_marks_destroyed_and_clears_current() {
        let platform = HeadlessPlatform::new();
        let mut surface = platform.create_surface(&request(SurfacePlacement::BackendDefault)).unwrap();
        surface.make_current();
        assert_eq!(platform.current_surface(), Some(0));

        drop(surface);
        assert!(platform.surface(0).unwrap().is_destroyed());
        assert_eq!(platform.current_surface(), None);
    }

    #[test]
    fn test_dropped_surface_loses_its_objects() {
        let platform = HeadlessPlatform::new();
        let mut surface = platform.create_surface(&request(SurfacePlacement::BackendDefault)).unwrap();
        surface.make_current();
        surface.initialize_device().unwrap();
        let device = platform.surface(0).unwrap().device().unwrap();
        let texture = device.create_texture(1, 1, &[0; 4]).unwrap();

        drop(surface);
        assert!(device.is_context_lost());
        assert_eq!(device.texture_size(texture), None);
        device.take_calls();
        device.delete_texture(texture);
        assert!(device.calls().is_empty());
        assert!(device.create_texture(1, 1, &[0; 4]).is_err());
    }

    #[test]
    fn test_advance_moves_clock_without_presenting() {
        let platform = HeadlessPlatform::new();
        platform.advance(2.5);
        assert!((platform.time() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminated_platform_refuses_surfaces() {
        let platform = HeadlessPlatform::new();
        platform.terminate();
        assert!(platform.is_terminated());
        assert!(matches!(
            platform.create_surface(&request(SurfacePlacement::BackendDefault)),
            Err(EngineError::BackendInit(_))
        ));
    }

    #[test]
    fn test_uniform_declarations_are_parsed() {
        let source = "uniform mat4 u_view;\n  uniform vec3 u_lights[4];\nin vec3 pos;\n";
        let declared: Vec<(String, String)> = declared_uniforms(source)
            .map(|u| (u.name, u.type_name))
            .collect();
        assert_eq!(
            declared,
            vec![
                ("u_view".to_string(), "mat4".to_string()),
                ("u_lights".to_string(), "vec3".to_string()),
            ]
        );
    }

    #[test]
    fn test_texture_upload_checks_length() {
        let device = HeadlessDevice::new();
        assert!(device.create_texture(2, 2, &[0; 15]).is_err());
        let id = device.create_texture(2, 2, &[0; 16]).unwrap();
        assert_eq!(device.texture_size(id), Some((2, 2)));
        device.delete_texture(id);
        assert_eq!(device.texture_size(id), None);
    }
}
