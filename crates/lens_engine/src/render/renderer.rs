//! Multi-window renderer
//!
//! One cooperative loop drives every window. Each sweep visits the windows in the order
//! they were appended, skips closed ones and flushes the rest; the loop ends after a sweep
//! in which every window reported closed.
//!
//! ```text
//! render():
//!   loop
//!     open = 0
//!     for window in windows          (insertion order)
//!       closed? ─ yes ─► skip        (stays in the list)
//!          └─ no ──► flush, open += 1
//!     open == 0 ─► return
//! ```
//!
//! A slow render callback delays every other window; there is no per-window pacing.

use std::rc::Rc;

use crate::core::config::RendererConfig;
use crate::error::{EngineError, EngineResult};
use crate::render::api::{Renderer, Window};
use crate::render::backend::Platform;

/// Renderer that owns and flushes an ordered list of windows
pub struct MultiWindowRenderer {
    platform: Rc<dyn Platform>,
    name: String,
    view_distance: u32,
    windows: Vec<Box<dyn Window>>,
    all_windows_closed: bool,
    initialized: bool,
}

impl MultiWindowRenderer {
    /// Create an uninitialized renderer on `platform`
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self {
            platform,
            name: String::new(),
            view_distance: 0,
            windows: Vec::new(),
            all_windows_closed: false,
            initialized: false,
        }
    }

    /// Create and initialize a renderer in one step
    pub fn with_config(platform: Rc<dyn Platform>, config: RendererConfig) -> EngineResult<Self> {
        let mut renderer = Self::new(platform);
        renderer.init(config)?;
        Ok(renderer)
    }

    /// Run a single sweep over the windows
    ///
    /// Returns `true` while at least one window was still open and got flushed. Applications
    /// with their own outer loop call this instead of [`Renderer::render`].
    pub fn render_once(&mut self) -> EngineResult<bool> {
        if self.windows.is_empty() {
            return Err(EngineError::NotInitialized(format!("renderer {:?}", self.name)));
        }

        let mut any_open = false;
        for window in &mut self.windows {
            if window.is_closed() {
                continue;
            }
            any_open = true;
            window.flush()?;
        }
        self.all_windows_closed = !any_open;
        Ok(any_open)
    }

    /// Whether the last sweep found every window closed
    pub fn all_windows_closed(&self) -> bool {
        self.all_windows_closed
    }

    /// Iterate over the windows in visit order
    pub fn windows(&self) -> impl Iterator<Item = &dyn Window> + '_ {
        self.windows.iter().map(|window| &**window)
    }
}

impl Renderer for MultiWindowRenderer {
    fn init(&mut self, config: RendererConfig) -> EngineResult<()> {
        if self.initialized {
            return Err(EngineError::AlreadyInitialized("renderer"));
        }
        let config = config.resolved();
        self.platform.set_context_hints(&config.context_hints());
        self.name = config.name;
        self.view_distance = config.view_distance;
        self.initialized = true;

        log::info!(
            "Renderer {:?} initialized (OpenGL {}.{}, view distance {})",
            self.name,
            config.version_major,
            config.version_minor,
            self.view_distance
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn view_distance(&self) -> u32 {
        self.view_distance
    }

    fn set_view_distance(&mut self, distance: u32) {
        self.view_distance = distance;
    }

    fn append_window(&mut self, window: Box<dyn Window>) -> EngineResult<()> {
        if !window.is_initialized() {
            return Err(EngineError::InvalidParameter(format!(
                "window {:?} is not initialized",
                window.title()
            )));
        }
        log::debug!(
            "Renderer {:?}: appended window {:?} at index {}",
            self.name,
            window.title(),
            self.windows.len()
        );
        self.windows.push(window);
        self.all_windows_closed = false;
        Ok(())
    }

    fn window(&self, index: usize) -> EngineResult<&dyn Window> {
        let len = self.windows.len();
        self.windows
            .get(index)
            .map(|window| &**window)
            .ok_or(EngineError::IndexOutOfRange { what: "windows", index, len })
    }

    fn window_mut(&mut self, index: usize) -> EngineResult<&mut dyn Window> {
        let len = self.windows.len();
        match self.windows.get_mut(index) {
            Some(window) => Ok(&mut **window),
            None => Err(EngineError::IndexOutOfRange { what: "windows", index, len }),
        }
    }

    fn window_count(&self) -> usize {
        self.windows.len()
    }

    fn render(&mut self) -> EngineResult<()> {
        log::debug!("Renderer {:?}: render loop over {} windows", self.name, self.windows.len());
        while self.render_once()? {}
        log::info!("Renderer {:?}: all windows closed", self.name);
        Ok(())
    }

    fn release(&mut self) {
        for window in &mut self.windows {
            window.destroy();
        }
        let released = self.windows.len();
        self.windows.clear();
        self.all_windows_closed = true;

        if self.initialized {
            self.platform.reset_context_hints();
            self.initialized = false;
            log::info!("Renderer {:?} released {} windows", self.name, released);
        }
    }
}
