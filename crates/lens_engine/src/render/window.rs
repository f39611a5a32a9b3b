//! # Context Window
//!
//! [`ContextWindow`] is the shipped [`Window`] implementation: one platform surface, its
//! graphics context, a render callback and per-window frame timing.
//!
//! ## Lifecycle
//!
//! ```text
//!  new ──init──► open ──close / user close──► closed ──destroy──► destroyed
//!                 │  ▲                                               ▲
//!                 └──┘ flush (any number of times)                   │
//!                 └──────────────────────destroy─────────────────────┘
//! ```
//!
//! While open, a window is *rendering* when visible. Flushing works the same whether it is
//! rendering or not: the frame is timed, cleared, drawn, presented and its events drained.
//!
//! ## After destroy
//! The surface is gone. [`Window::is_closed`] is `true`, [`Window::flush`] fails with
//! `NotInitialized`, getters return the last known values and setters only update them.

use std::rc::Rc;

use crate::core::config::WindowConfig;
use crate::error::{EngineError, EngineResult};
use crate::foundation::time::FrameTimer;
use crate::render::api::{RenderFn, SharedShader, SharedTexture, Window};
use crate::render::backend::{DisplayMode, GraphicsDevice, Platform, Surface, SurfacePlacement, SurfaceRequest};

/// A window with its own graphics context
pub struct ContextWindow {
    platform: Rc<dyn Platform>,
    surface: Option<Box<dyn Surface>>,
    name: String,
    title: String,
    size: (u32, u32),
    position: Option<(i32, i32)>,
    visible: bool,
    resizable: bool,
    clear_color: [f32; 4],
    timer: FrameTimer,
    render_fn: Option<RenderFn>,
    shaders: Vec<SharedShader>,
    textures: Vec<SharedTexture>,
    rendering: bool,
    closed: bool,
    destroyed: bool,
}

/// Top-left coordinate that centres `size` on a display of `extent`
fn centered(extent: u32, size: u32) -> i32 {
    let offset = i64::from(extent / 2) - i64::from(size / 2);
    i32::try_from(offset).unwrap_or(0)
}

fn placement_for(config: &WindowConfig, display: Option<DisplayMode>) -> (u32, u32, SurfacePlacement) {
    match display {
        Some(mode) if config.fullscreen => (mode.width, mode.height, SurfacePlacement::Fullscreen),
        Some(mode) => {
            let x = if config.pos_x == 0 {
                centered(mode.width, config.width)
            } else {
                config.pos_x
            };
            let y = if config.pos_y == 0 {
                centered(mode.height, config.height)
            } else {
                config.pos_y
            };
            (config.width, config.height, SurfacePlacement::At(x, y))
        }
        None => {
            log::warn!("No primary display found, using backend window placement");
            if config.fullscreen {
                log::error!("Fullscreen unavailable without a display, opening {:?} windowed", config.title);
            }
            (config.width, config.height, SurfacePlacement::BackendDefault)
        }
    }
}

impl ContextWindow {
    /// Create an uninitialized window on `platform`
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self {
            platform,
            surface: None,
            name: String::new(),
            title: String::new(),
            size: (0, 0),
            position: None,
            visible: false,
            resizable: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            timer: FrameTimer::new(),
            render_fn: None,
            shaders: Vec::new(),
            textures: Vec::new(),
            rendering: false,
            closed: false,
            destroyed: false,
        }
    }

    /// Create and initialize a window in one step
    pub fn with_config(platform: Rc<dyn Platform>, config: WindowConfig) -> EngineResult<Self> {
        let mut window = Self::new(platform);
        window.init(config)?;
        Ok(window)
    }

    /// Whether the window is open and visible
    pub fn is_rendering(&self) -> bool {
        self.rendering && !self.is_closed()
    }

    /// Frame timing state
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.title
        } else {
            &self.name
        }
    }
}

impl Window for ContextWindow {
    fn init(&mut self, config: WindowConfig) -> EngineResult<()> {
        if self.surface.is_some() {
            return Err(EngineError::AlreadyInitialized("window"));
        }
        if self.destroyed {
            return Err(EngineError::InvalidReceiver("destroyed window"));
        }

        let config = config.resolved();
        let (width, height, placement) = placement_for(&config, self.platform.primary_display());
        let request = SurfaceRequest {
            width,
            height,
            title: config.title.clone(),
            placement,
        };

        let mut surface = self.platform.create_surface(&request)?;
        surface.make_current();
        surface
            .initialize_device()
            .map_err(|e| EngineError::BackendInit(format!("window {:?}: {e}", config.title)))?;

        self.visible = surface.is_visible();
        self.resizable = surface.is_resizable();
        self.surface = Some(surface);
        self.name = config.name;
        self.title = config.title;
        self.size = (width, height);
        self.position = match placement {
            SurfacePlacement::At(x, y) => Some((x, y)),
            SurfacePlacement::Fullscreen => Some((0, 0)),
            SurfacePlacement::BackendDefault => None,
        };
        self.clear_color = config.background_color;
        self.render_fn = config.render_fn;
        self.rendering = true;
        self.closed = false;

        log::info!("Window {:?} created ({}x{}, {:?})", self.label(), width, height, placement);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        if let Some(surface) = self.surface.as_mut() {
            surface.set_title(title);
        }
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_size(&mut self, width: u32, height: u32) -> EngineResult<()> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidParameter(format!(
                "window size must be non-zero, got {width}x{height}"
            )));
        }
        self.size = (width, height);
        if let Some(surface) = self.surface.as_mut() {
            surface.set_size(width, height);
        }
        Ok(())
    }

    fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.position = Some((x, y));
        if let Some(surface) = self.surface.as_mut() {
            surface.set_position(x, y);
        }
    }

    fn visible(&self) -> bool {
        self.surface.as_ref().map_or(self.visible, |surface| surface.is_visible())
    }

    fn set_visible(&mut self, visible: bool) {
        if visible && self.is_closed() {
            log::debug!("Ignoring show request for closed window {:?}", self.label());
            return;
        }
        self.visible = visible;
        self.rendering = visible;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_visible(visible);
        }
    }

    fn resizable(&self) -> bool {
        self.surface.as_ref().map_or(self.resizable, |surface| surface.is_resizable())
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.resizable = resizable;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_resizable(resizable);
        }
    }

    fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = rgba;
    }

    fn fps(&self) -> Option<f64> {
        self.timer.fps()
    }

    fn average_fps(&self) -> Option<f64> {
        self.timer.average_fps()
    }

    fn delta_time(&self) -> f64 {
        self.timer.delta_time()
    }

    fn elapsed_time(&self) -> f64 {
        self.timer.elapsed()
    }

    fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    fn make_context_current(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.make_current();
        }
    }

    fn render_fn(&self) -> Option<RenderFn> {
        self.render_fn.clone()
    }

    fn set_render_fn(&mut self, render_fn: Option<RenderFn>) {
        self.render_fn = render_fn;
    }

    fn flush(&mut self) -> EngineResult<()> {
        let Some(surface) = self.surface.as_mut() else {
            return Err(EngineError::NotInitialized(format!("window {:?}", self.title)));
        };

        self.timer.tick(self.platform.time());
        surface.make_current();
        if let Some(device) = surface.device() {
            device.clear(self.clear_color);
        }

        if self.render_fn.is_none() {
            log::warn!("Window {:?} has no render function, using the default", self.title);
            self.render_fn = Some(RenderFn::default());
        }
        let render_fn = self.render_fn.clone().unwrap_or_default();
        render_fn.call(self);

        // the callback may have destroyed the window
        if let Some(surface) = self.surface.as_mut() {
            surface.swap_buffers();
            surface.poll_events();
        }
        log::trace!("Window {:?} flushed frame {}", self.title, self.timer.frame_count());
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.rendering = false;
        self.visible = false;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_should_close(true);
            surface.set_visible(false);
        }
        log::debug!("Window {:?} closed after {} frames", self.label(), self.timer.frame_count());
    }

    fn is_closed(&self) -> bool {
        self.closed || self.surface.as_ref().map_or(true, |surface| surface.should_close())
    }

    fn destroy(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.visible = surface.is_visible();
            drop(surface);
            self.destroyed = true;
            self.closed = true;
            self.rendering = false;
            log::info!("Window {:?} destroyed", self.label());
        }
    }

    fn device(&self) -> Option<Rc<dyn GraphicsDevice>> {
        self.surface.as_ref().and_then(|surface| surface.device())
    }

    fn attach_shader(&mut self, shader: SharedShader) {
        self.shaders.push(shader);
    }

    fn shader(&self, index: usize) -> EngineResult<SharedShader> {
        self.shaders.get(index).cloned().ok_or(EngineError::IndexOutOfRange {
            what: "shaders",
            index,
            len: self.shaders.len(),
        })
    }

    fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    fn attach_texture(&mut self, texture: SharedTexture) {
        self.textures.push(texture);
    }

    fn texture(&self, index: usize) -> EngineResult<SharedTexture> {
        self.textures.get(index).cloned().ok_or(EngineError::IndexOutOfRange {
            what: "textures",
            index,
            len: self.textures.len(),
        })
    }

    fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use approx::assert_relative_eq;

    use super::*;
    use crate::render::backend::headless::HeadlessPlatform;
    use crate::render::shader::ProgramShader;
    use crate::render::texture::ImageTexture;

    const VERTEX: &str = "#version 410 core\n\
        layout (location = 0) in vec3 a_pos;\n\
        void main() { gl_Position = vec4(a_pos, 1.0); }\n";
    const FRAGMENT: &str = "#version 410 core\n\
        out vec4 frag_color;\n\
        uniform vec4 u_color;\n\
        void main() { frag_color = u_color; }\n";

    fn open(platform: &Rc<HeadlessPlatform>, config: WindowConfig) -> ContextWindow {
        ContextWindow::with_config(platform.clone(), config).unwrap()
    }

    #[test]
    fn test_defaults_and_centering() {
        let platform = HeadlessPlatform::new();
        let window = open(&platform, WindowConfig::default());

        assert_eq!(window.title(), "Window");
        assert_eq!(window.size(), (720, 480));
        assert!(window.is_initialized());
        assert!(!window.is_closed());
        let view = platform.surface(0).unwrap();
        assert_eq!(view.position(), Some((960 - 360, 540 - 240)));
        assert_eq!(window.position(), view.position());
        assert_eq!(platform.current_surface(), Some(0));
    }

    #[test]
    fn test_explicit_position_is_kept() {
        let platform = HeadlessPlatform::new();
        let _window = open(&platform, WindowConfig::new("Placed").with_position(40, 0));
        assert_eq!(platform.surface(0).unwrap().position(), Some((40, 300)));
    }

    #[test]
    fn test_fullscreen_takes_display_size() {
        let platform = HeadlessPlatform::new();
        let window = open(&platform, WindowConfig::new("Full").with_fullscreen(true));

        assert_eq!(window.size(), (1920, 1080));
        assert!(platform.surface(0).unwrap().is_fullscreen());
    }

    #[test]
    fn test_without_display_backend_places_window() {
        let platform = HeadlessPlatform::with_display(None);
        let window = open(&platform, WindowConfig::new("Blind").with_fullscreen(true));

        let view = platform.surface(0).unwrap();
        assert_eq!(view.position(), None);
        assert_eq!(window.position(), None);
        assert!(!view.is_fullscreen());
        assert_eq!(window.size(), (720, 480));
    }

    #[test]
    fn test_second_init_fails() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());
        assert!(matches!(
            window.init(WindowConfig::default()),
            Err(EngineError::AlreadyInitialized(_))
        ));
        assert_eq!(platform.surface_count(), 1);
    }

    #[test]
    fn test_backend_failures_surface_as_errors() {
        let platform = HeadlessPlatform::new();
        platform.refuse_surfaces(true);
        assert!(matches!(
            ContextWindow::with_config(platform.clone(), WindowConfig::default()),
            Err(EngineError::BackendInit(_))
        ));

        platform.refuse_surfaces(false);
        platform.refuse_devices(true);
        assert!(matches!(
            ContextWindow::with_config(platform.clone(), WindowConfig::default()),
            Err(EngineError::BackendInit(_))
        ));
    }

    #[test]
    fn test_frame_count_increments_even_when_hidden() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        window.flush().unwrap();
        window.set_visible(false);
        assert!(!window.is_rendering());
        window.flush().unwrap();
        window.flush().unwrap();

        assert_eq!(window.frame_count(), 3);
        let view = platform.surface(0).unwrap();
        assert_eq!(view.swap_count(), 3);
        assert_eq!(view.poll_count(), 3);
        assert!(!view.is_visible());
    }

    #[test]
    fn test_fps_only_after_two_frames() {
        let platform = HeadlessPlatform::new();
        platform.set_frame_interval(0.25);
        let mut window = open(&platform, WindowConfig::default());

        assert_eq!(window.fps(), None);
        window.flush().unwrap();
        assert_eq!(window.fps(), None);
        window.flush().unwrap();

        let fps = window.fps().unwrap();
        assert!(fps.is_finite());
        assert_relative_eq!(fps, 4.0, epsilon = 1e-9);
        assert_relative_eq!(window.delta_time(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_frozen_clock_reports_no_fps() {
        let platform = HeadlessPlatform::new();
        platform.set_frame_interval(0.0);
        let mut window = open(&platform, WindowConfig::default());
        window.flush().unwrap();
        window.flush().unwrap();
        assert_eq!(window.fps(), None);
    }

    #[test]
    fn test_close_is_idempotent() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        window.close();
        window.close();
        assert!(window.is_closed());
        let view = platform.surface(0).unwrap();
        assert!(view.should_close());
        assert!(!view.is_visible());
    }

    #[test]
    fn test_closed_window_stays_hidden() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        window.close();
        window.set_visible(true);
        assert!(!window.visible());
        assert!(!window.is_rendering());
        assert!(!platform.surface(0).unwrap().is_visible());
    }

    #[test]
    fn test_user_close_button_closes_window() {
        let platform = HeadlessPlatform::new();
        let window = open(&platform, WindowConfig::default());
        platform.surface(0).unwrap().request_close();
        assert!(window.is_closed());
    }

    #[test]
    fn test_set_size_before_flush() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        window.set_size(1280, 720).unwrap();
        assert_eq!(window.size(), (1280, 720));
        assert_eq!(platform.surface(0).unwrap().size(), (1280, 720));
        assert!(matches!(window.set_size(0, 720), Err(EngineError::InvalidParameter(_))));
        assert_eq!(window.size(), (1280, 720));
    }

    #[test]
    fn test_set_position_moves_surface() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        window.set_position(15, -20);
        assert_eq!(window.position(), Some((15, -20)));
        assert_eq!(platform.surface(0).unwrap().position(), Some((15, -20)));

        window.destroy();
        window.set_position(1, 2);
        assert_eq!(window.position(), Some((1, 2)));
    }

    #[test]
    fn test_stall_shows_in_next_delta() {
        let platform = HeadlessPlatform::new();
        platform.set_frame_interval(0.01);
        let mut window = open(&platform, WindowConfig::default());

        window.flush().unwrap();
        platform.advance(0.5);
        window.flush().unwrap();
        assert_relative_eq!(window.delta_time(), 0.51, epsilon = 1e-9);
        assert_relative_eq!(window.fps().unwrap(), 1.0 / 0.51, epsilon = 1e-9);
    }

    #[test]
    fn test_clear_color_reaches_device() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        window.set_clear_color([0.1, 0.2, 0.3, 1.0]);
        assert_eq!(window.clear_color(), [0.1, 0.2, 0.3, 1.0]);
        window.flush().unwrap();

        let device = platform.surface(0).unwrap().device().unwrap();
        assert_eq!(device.clear_colors(), vec![[0.1, 0.2, 0.3, 1.0]]);
    }

    #[test]
    fn test_title_and_resizable_follow_surface() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        window.set_title("Renamed");
        window.set_resizable(false);
        let view = platform.surface(0).unwrap();
        assert_eq!(view.title(), "Renamed");
        assert!(!view.is_resizable());
        assert!(!window.resizable());
    }

    #[test]
    fn test_render_fn_receives_the_window() {
        let platform = HeadlessPlatform::new();
        let seen = Rc::new(Cell::new(0_u64));
        let counter = Rc::clone(&seen);
        let mut window = open(
            &platform,
            WindowConfig::default().with_render_fn(RenderFn::new(move |window: &mut dyn Window| {
                counter.set(window.frame_count());
                if window.frame_count() == 3 {
                    window.close();
                }
            })),
        );

        let installed = window.render_fn().unwrap();
        while !window.is_closed() {
            window.flush().unwrap();
        }
        assert!(window.render_fn().unwrap().ptr_eq(&installed));
        assert_eq!(seen.get(), 3);
        assert_eq!(window.frame_count(), 3);
    }

    #[test]
    fn test_callback_can_replace_itself() {
        let platform = HeadlessPlatform::new();
        let hits = Rc::new(Cell::new(0));
        let inner_hits = Rc::clone(&hits);
        let mut window = open(&platform, WindowConfig::default());
        window.set_render_fn(Some(RenderFn::new(move |window: &mut dyn Window| {
            let hits = Rc::clone(&inner_hits);
            window.set_render_fn(Some(RenderFn::new(move |_: &mut dyn Window| {
                hits.set(hits.get() + 1);
            })));
        })));

        let first = window.render_fn().unwrap();
        window.flush().unwrap();
        assert!(!window.render_fn().unwrap().ptr_eq(&first));
        window.flush().unwrap();
        window.flush().unwrap();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_missing_render_fn_falls_back() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());
        window.set_render_fn(None);

        window.flush().unwrap();
        assert!(window.render_fn().is_some());
        assert_eq!(platform.surface(0).unwrap().swap_count(), 1);
    }

    #[test]
    fn test_destroy_keeps_cached_state() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::new("Cached").with_size(300, 200));

        window.destroy();
        window.destroy();
        assert!(platform.surface(0).unwrap().is_destroyed());
        assert!(!window.is_initialized());
        assert!(window.is_closed());
        assert_eq!(window.title(), "Cached");
        assert_eq!(window.size(), (300, 200));
        assert!(matches!(window.flush(), Err(EngineError::NotInitialized(_))));

        window.set_title("Still cached");
        assert_eq!(window.title(), "Still cached");
        assert!(matches!(
            window.init(WindowConfig::default()),
            Err(EngineError::InvalidReceiver(_))
        ));
    }

    #[test]
    fn test_uninitialized_window_reports_closed() {
        let platform = HeadlessPlatform::new();
        let mut window = ContextWindow::new(platform);
        assert!(window.is_closed());
        assert!(window.device().is_none());
        window.destroy();
        window.close();
        assert!(matches!(window.flush(), Err(EngineError::NotInitialized(_))));
    }

    #[test]
    fn test_attached_resources() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());

        let shader = ProgramShader::for_window(&window).unwrap();
        let texture = ImageTexture::for_window(&window).unwrap();
        window.attach_shader(shader.into_shared());
        window.attach_texture(texture.into_shared());

        assert_eq!(window.shader_count(), 1);
        assert_eq!(window.texture_count(), 1);
        assert_eq!(window.shader(0).unwrap().borrow().id(), 0);
        assert!(matches!(
            window.texture(1),
            Err(EngineError::IndexOutOfRange { what: "textures", index: 1, len: 1 })
        ));
    }
    #[test]
    fn test_attached_shader_can_be_reloaded_and_released() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());
        let device = platform.surface(0).unwrap().device().unwrap();
        window.attach_shader(ProgramShader::for_window(&window).unwrap().into_shared());

        let shader = window.shader(0).unwrap();
        shader.borrow_mut().load_memory(VERTEX, FRAGMENT, None).unwrap();
        let first = shader.borrow().id();
        assert_ne!(first, 0);
        shader.borrow_mut().load_memory(VERTEX, FRAGMENT, None).unwrap();
        assert_ne!(shader.borrow().id(), first);
        assert_eq!(device.live_program_count(), 1);

        window.shader(0).unwrap().borrow_mut().release();
        assert_eq!(window.shader(0).unwrap().borrow().id(), 0);
        assert_eq!(device.live_program_count(), 0);
    }

    #[test]
    fn test_dropping_window_frees_attached_resources() {
        let platform = HeadlessPlatform::new();
        let mut window = open(&platform, WindowConfig::default());
        let device = platform.surface(0).unwrap().device().unwrap();
        let shader = ProgramShader::for_window(&window).unwrap().into_shared();
        shader.borrow_mut().load_memory(VERTEX, FRAGMENT, None).unwrap();
        window.attach_shader(Rc::clone(&shader));
        drop(shader);
        assert_eq!(device.live_program_count(), 1);

        drop(window);
        assert!(device.is_context_lost());
        assert_eq!(device.live_program_count(), 0);
    }
}
