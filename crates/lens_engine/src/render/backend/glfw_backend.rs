//! GLFW windows with OpenGL contexts driven through `glow`
//!
//! One [`GlfwPlatform`] owns the GLFW library handle. Every surface it creates is a GLFW
//! window with its own OpenGL context; the GL entry points for that context are loaded
//! into a [`GlowDevice`] the first time the surface is made current.
//!
//! GLFW itself shuts down once the platform and every surface created from it are dropped;
//! [`Platform::terminate`] only stops further surface creation.
//!
//! Shaders and textures may be dropped while another window's context is current. Their
//! deletes therefore switch to the owning context for the duration of the call, and are
//! skipped once that context has been destroyed.

#![allow(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::num::NonZeroU32;
use std::rc::Rc;

use ::glfw::Context as _;
use glow::HasContext;

use super::{
    ActiveUniform, ContextHints, DisplayMode, GraphicsDevice, Platform, ShaderStage, Surface, SurfacePlacement,
    SurfaceRequest, UniformLocation,
};
use crate::error::{EngineError, EngineResult};
use crate::render::shader::UniformValue;

type SharedGlfw = Rc<RefCell<::glfw::Glfw>>;

/// GLFW library handle
pub struct GlfwPlatform {
    glfw: SharedGlfw,
    terminated: Cell<bool>,
}

impl GlfwPlatform {
    /// Initialize GLFW; errors reported by GLFW later on are logged
    pub fn init() -> EngineResult<Rc<Self>> {
        let glfw = ::glfw::init(::glfw::log_errors)
            .map_err(|e| EngineError::BackendInit(format!("GLFW initialization failed: {e:?}")))?;
        log::info!("GLFW {} initialized", ::glfw::get_version_string());

        let platform = Self {
            glfw: Rc::new(RefCell::new(glfw)),
            terminated: Cell::new(false),
        };
        platform.reset_context_hints();
        Ok(Rc::new(platform))
    }
}

impl Platform for GlfwPlatform {
    fn set_context_hints(&self, hints: &ContextHints) {
        use ::glfw::{OpenGlProfileHint, WindowHint};

        let profile = if hints.core_profile {
            OpenGlProfileHint::Core
        } else {
            OpenGlProfileHint::Any
        };
        let mut glfw = self.glfw.borrow_mut();
        glfw.window_hint(WindowHint::ContextVersion(hints.version_major, hints.version_minor));
        glfw.window_hint(WindowHint::OpenGlProfile(profile));
        glfw.window_hint(WindowHint::OpenGlForwardCompat(hints.forward_compatible));
        glfw.window_hint(WindowHint::Resizable(hints.resizable));
        glfw.window_hint(WindowHint::Visible(hints.visible));
        log::debug!(
            "Context hints: OpenGL {}.{} core={} resizable={} visible={}",
            hints.version_major,
            hints.version_minor,
            hints.core_profile,
            hints.resizable,
            hints.visible
        );
    }

    fn reset_context_hints(&self) {
        self.glfw.borrow_mut().default_window_hints();
        self.set_context_hints(&ContextHints::default());
    }

    fn primary_display(&self) -> Option<DisplayMode> {
        self.glfw.borrow_mut().with_primary_monitor(|_, monitor| {
            monitor
                .and_then(|monitor| monitor.get_video_mode())
                .map(|mode| DisplayMode {
                    width: mode.width,
                    height: mode.height,
                })
        })
    }

    fn create_surface(&self, request: &SurfaceRequest) -> EngineResult<Box<dyn Surface>> {
        if self.terminated.get() {
            return Err(EngineError::BackendInit("GLFW is terminated".to_string()));
        }

        let created = {
            let mut glfw = self.glfw.borrow_mut();
            match request.placement {
                SurfacePlacement::Fullscreen => glfw.with_primary_monitor(|glfw, monitor| {
                    let monitor: &::glfw::Monitor = monitor?;
                    glfw.create_window(
                        request.width,
                        request.height,
                        &request.title,
                        ::glfw::WindowMode::FullScreen(monitor),
                    )
                }),
                SurfacePlacement::At(_, _) | SurfacePlacement::BackendDefault => glfw.create_window(
                    request.width,
                    request.height,
                    &request.title,
                    ::glfw::WindowMode::Windowed,
                ),
            }
        };
        let (mut window, events) = created.ok_or_else(|| {
            EngineError::BackendInit(format!("failed to create window {:?}", request.title))
        })?;

        if let SurfacePlacement::At(x, y) = request.placement {
            window.set_pos(x, y);
        }
        window.set_framebuffer_size_polling(true);
        window.set_close_polling(true);

        Ok(Box::new(GlfwSurface {
            glfw: Rc::clone(&self.glfw),
            window,
            events,
            device: None,
        }))
    }

    fn time(&self) -> f64 {
        self.glfw.borrow().get_time()
    }

    fn terminate(&self) {
        if !self.terminated.replace(true) {
            log::info!("GLFW terminated");
        }
    }

    fn is_terminated(&self) -> bool {
        self.terminated.get()
    }
}

struct GlfwSurface {
    glfw: SharedGlfw,
    window: ::glfw::PWindow,
    events: ::glfw::GlfwReceiver<(f64, ::glfw::WindowEvent)>,
    device: Option<Rc<GlowDevice>>,
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Surface for GlfwSurface {
    fn make_current(&mut self) {
        self.window.make_current();
    }

    fn initialize_device(&mut self) -> Result<(), String> {
        if self.device.is_some() {
            return Ok(());
        }
        if !self.window.is_current() {
            return Err("context is not current".to_string());
        }
        let window = &mut self.window;
        let gl = unsafe {
            glow::Context::from_loader_function(|symbol| window.get_proc_address(symbol) as *const _)
        };
        let version = gl.version();
        log::info!(
            "OpenGL {}.{} context ready ({})",
            version.major,
            version.minor,
            version.vendor_info
        );
        self.device = Some(Rc::new(GlowDevice {
            gl,
            context: self.window.window_ptr(),
            alive: Cell::new(true),
        }));
        Ok(())
    }

    fn device(&self) -> Option<Rc<dyn GraphicsDevice>> {
        self.device
            .clone()
            .map(|device| device as Rc<dyn GraphicsDevice>)
    }

    fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    fn poll_events(&mut self) {
        self.glfw.borrow_mut().poll_events();
        for (_, event) in ::glfw::flush_messages(&self.events) {
            match event {
                ::glfw::WindowEvent::FramebufferSize(width, height) => {
                    if let Some(device) = &self.device {
                        device.viewport(width, height);
                    }
                }
                other => log::trace!("Window event: {:?}", other),
            }
        }
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.window.set_size(clamp_i32(width), clamp_i32(height));
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.window.set_pos(x, y);
    }

    fn set_visible(&mut self, visible: bool) {
        if visible {
            self.window.show();
        } else {
            self.window.hide();
        }
    }

    fn is_visible(&self) -> bool {
        self.window.is_visible()
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.window.set_resizable(resizable);
    }

    fn is_resizable(&self) -> bool {
        self.window.is_resizable()
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }
}

impl Drop for GlfwSurface {
    fn drop(&mut self) {
        if let Some(device) = &self.device {
            device.alive.set(false);
        }
    }
}

/// [`GraphicsDevice`] over a `glow` context
pub struct GlowDevice {
    gl: glow::Context,
    context: *mut ::glfw::ffi::GLFWwindow,
    alive: Cell<bool>,
}

fn shader_handle(id: u32) -> Option<glow::NativeShader> {
    NonZeroU32::new(id).map(glow::NativeShader)
}

fn program_handle(id: u32) -> Option<glow::NativeProgram> {
    NonZeroU32::new(id).map(glow::NativeProgram)
}

fn texture_handle(id: u32) -> Option<glow::NativeTexture> {
    NonZeroU32::new(id).map(glow::NativeTexture)
}

fn glsl_type_name(utype: u32) -> Option<&'static str> {
    Some(match utype {
        glow::FLOAT => "float",
        glow::FLOAT_VEC2 => "vec2",
        glow::FLOAT_VEC3 => "vec3",
        glow::FLOAT_VEC4 => "vec4",
        glow::INT => "int",
        glow::UNSIGNED_INT => "uint",
        glow::BOOL => "bool",
        glow::FLOAT_MAT2 => "mat2",
        glow::FLOAT_MAT3 => "mat3",
        glow::FLOAT_MAT4 => "mat4",
        glow::FLOAT_MAT2x3 => "mat2x3",
        glow::FLOAT_MAT3x4 => "mat3x4",
        glow::SAMPLER_2D => "sampler2D",
        glow::SAMPLER_3D => "sampler3D",
        glow::SAMPLER_CUBE => "samplerCube",
        _ => return None,
    })
}

impl GlowDevice {
    /// Resize the viewport to the framebuffer
    pub fn viewport(&self, width: i32, height: i32) {
        unsafe { self.gl.viewport(0, 0, width, height) };
    }

    /// Run `f` with this device's context current, restoring the previous context after
    fn in_own_context(&self, f: impl FnOnce(&glow::Context)) {
        if !self.alive.get() {
            return;
        }
        let previous = unsafe { ::glfw::ffi::glfwGetCurrentContext() };
        let switch = previous != self.context;
        if switch {
            unsafe { ::glfw::ffi::glfwMakeContextCurrent(self.context) };
        }
        f(&self.gl);
        if switch {
            unsafe { ::glfw::ffi::glfwMakeContextCurrent(previous) };
        }
    }
}

impl GraphicsDevice for GlowDevice {
    fn clear(&self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        };
        unsafe {
            let shader = self.gl.create_shader(kind)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(shader.0.get())
        }
    }

    fn delete_stage(&self, stage: u32) {
        if let Some(shader) = shader_handle(stage) {
            self.in_own_context(|gl| unsafe { gl.delete_shader(shader) });
        }
    }

    fn link_program(&self, stages: &[u32]) -> Result<u32, String> {
        let shaders: Vec<_> = stages.iter().filter_map(|id| shader_handle(*id)).collect();
        unsafe {
            let program = self.gl.create_program()?;
            for shader in &shaders {
                self.gl.attach_shader(program, *shader);
            }
            self.gl.link_program(program);
            for shader in &shaders {
                self.gl.detach_shader(program, *shader);
            }
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            Ok(program.0.get())
        }
    }

    fn use_program(&self, program: u32) {
        unsafe { self.gl.use_program(program_handle(program)) };
    }

    fn delete_program(&self, program: u32) {
        if let Some(program) = program_handle(program) {
            self.in_own_context(|gl| unsafe { gl.delete_program(program) });
        }
    }

    fn active_uniforms(&self, program: u32) -> Vec<ActiveUniform> {
        let Some(program) = program_handle(program) else {
            return Vec::new();
        };
        unsafe {
            (0..self.gl.get_active_uniforms(program))
                .filter_map(|index| self.gl.get_active_uniform(program, index))
                .filter_map(|uniform| {
                    let type_name = glsl_type_name(uniform.utype)?;
                    let name = uniform.name.split('[').next().unwrap_or(&uniform.name);
                    Some(ActiveUniform {
                        name: name.to_string(),
                        type_name: type_name.to_string(),
                    })
                })
                .collect()
        }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<UniformLocation> {
        let program = program_handle(program)?;
        unsafe { self.gl.get_uniform_location(program, name) }.map(|location| UniformLocation(location.0))
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let location = Some(glow::NativeUniformLocation(location.0));
        let location = location.as_ref();
        let gl = &self.gl;
        unsafe {
            match value {
                UniformValue::Int(v) => gl.uniform_1_i32(location, *v),
                UniformValue::UInt(v) => gl.uniform_1_u32(location, *v),
                UniformValue::Float(v) => gl.uniform_1_f32(location, *v),
                UniformValue::Vec2(v) => gl.uniform_2_f32_slice(location, v),
                UniformValue::Vec3(v) => gl.uniform_3_f32_slice(location, v),
                UniformValue::Vec4(v) => gl.uniform_4_f32_slice(location, v),
                UniformValue::Mat2(m) => gl.uniform_matrix_2_f32_slice(location, false, m),
                UniformValue::Mat3(m) => gl.uniform_matrix_3_f32_slice(location, false, m),
                UniformValue::Mat4(m) => gl.uniform_matrix_4_f32_slice(location, false, m),
                UniformValue::Mat2x3(m) => gl.uniform_matrix_2x3_f32_slice(location, false, m),
                UniformValue::Mat3x4(m) => gl.uniform_matrix_3x4_f32_slice(location, false, m),
            }
        }
    }

    fn create_texture(&self, width: u32, height: u32, rgba: &[u8]) -> Result<u32, String> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(format!("expected {expected} bytes of RGBA, got {}", rgba.len()));
        }
        unsafe {
            let texture = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                clamp_i32(width),
                clamp_i32(height),
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(rgba)),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(texture.0.get())
        }
    }

    fn bind_texture(&self, unit: u32, texture: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, texture_handle(texture));
        }
    }

    fn delete_texture(&self, texture: u32) {
        if let Some(texture) = texture_handle(texture) {
            self.in_own_context(|gl| unsafe { gl.delete_texture(texture) });
        }
    }
}
