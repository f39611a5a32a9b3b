//! Per-window render callback

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::Window;

type Callback = dyn FnMut(&mut dyn Window);

/// Shared, replaceable render callback
///
/// Called once per flush, between clearing and presenting, with the window being flushed.
/// Cloning shares the same closure. The default callback does nothing; the frame is still
/// cleared, presented and its events drained by the flush around it.
///
/// ```rust
/// use lens_engine::render::api::{RenderFn, Window};
///
/// let mut frames = 0;
/// let render_fn = RenderFn::new(move |window: &mut dyn Window| {
///     frames += 1;
///     if frames == 120 {
///         window.close();
///     }
/// });
/// # drop(render_fn);
/// ```
#[derive(Clone)]
pub struct RenderFn(Rc<RefCell<Callback>>);

impl RenderFn {
    /// Wrap a closure
    pub fn new(f: impl FnMut(&mut dyn Window) + 'static) -> Self {
        Self(Rc::new(RefCell::new(f)))
    }

    /// The default callback: draws nothing
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Invoke the callback on `window`
    ///
    /// Returns `false` without calling anything when the callback is already running further
    /// up the stack (a callback that flushes its own window).
    pub fn call(&self, window: &mut dyn Window) -> bool {
        match self.0.try_borrow_mut() {
            Ok(mut callback) => {
                (&mut *callback)(window);
                true
            }
            Err(_) => {
                log::warn!("Render callback re-entered; skipping nested call");
                false
            }
        }
    }

    /// Whether both handles share the same closure
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for RenderFn {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for RenderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderFn")
            .field("shared", &Rc::strong_count(&self.0))
            .finish_non_exhaustive()
    }
}
