//! Shader programs and uniform values
//!
//! A [`ProgramShader`] is created against the [`GraphicsDevice`] of the window whose
//! context it will be used in; GL objects are not shared between contexts.
//!
//! # Loading
//! Vertex and fragment stages are required, the geometry stage is optional. Each stage is
//! compiled, the stages are linked, and the per-stage objects are deleted afterwards so only
//! the program remains.
//!
//! # Uniforms
//! [`UniformValue`] is the closed set of shapes a uniform can take. Setting a uniform on a
//! shader that is not linked yet succeeds without doing anything, so callers may configure a
//! shader before its sources arrive. A value whose shape does not match the declared GLSL
//! type fails with `InvalidDataType` instead of reaching the driver.
//!
//! # Lifetime
//! The program is deleted on [`Shader::release`] or when the shader drops.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::foundation::math::{Mat2, Mat2x3, Mat3, Mat3x4, Mat4, Vec2, Vec3, Vec4};
use crate::render::api::{Shader, SharedShader, Window};
use crate::render::backend::{GraphicsDevice, ShaderStage};

/// Uniform value shapes supported by [`Shader::set`]
///
/// Matrices are stored column-major, as GL expects them with `transpose = false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int`
    Int(i32),
    /// `uint`
    UInt(u32),
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2([f32; 2]),
    /// `vec3`
    Vec3([f32; 3]),
    /// `vec4`
    Vec4([f32; 4]),
    /// `mat2`
    Mat2([f32; 4]),
    /// `mat3`
    Mat3([f32; 9]),
    /// `mat4`
    Mat4([f32; 16]),
    /// `mat2x3` (2 columns, 3 rows)
    Mat2x3([f32; 6]),
    /// `mat3x4` (3 columns, 4 rows)
    Mat3x4([f32; 12]),
}

impl UniformValue {
    /// GLSL name of the value's type
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat2(_) => "mat2",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
            Self::Mat2x3(_) => "mat2x3",
            Self::Mat3x4(_) => "mat3x4",
        }
    }
}

fn packed<const N: usize>(values: &[f32]) -> [f32; N] {
    let mut out = [0.0; N];
    out.copy_from_slice(values);
    out
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(packed(v.as_slice()))
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(packed(v.as_slice()))
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(packed(v.as_slice()))
    }
}

impl From<Mat2> for UniformValue {
    fn from(m: Mat2) -> Self {
        Self::Mat2(packed(m.as_slice()))
    }
}

impl From<Mat3> for UniformValue {
    fn from(m: Mat3) -> Self {
        Self::Mat3(packed(m.as_slice()))
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        Self::Mat4(packed(m.as_slice()))
    }
}

impl From<Mat2x3> for UniformValue {
    fn from(m: Mat2x3) -> Self {
        Self::Mat2x3(packed(m.as_slice()))
    }
}

impl From<Mat3x4> for UniformValue {
    fn from(m: Mat3x4) -> Self {
        Self::Mat3x4(packed(m.as_slice()))
    }
}

/// Interpret a flat float slice by its length
///
/// 1 → `float`, 2/3/4 → `vec2`/`vec3`/`vec4`, 6 → `mat2x3`, 9 → `mat3`, 12 → `mat3x4`,
/// 16 → `mat4`. A 4-element slice is a `vec4`; build [`UniformValue::Mat2`] explicitly for a
/// 2x2 matrix.
impl TryFrom<&[f32]> for UniformValue {
    type Error = EngineError;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
        Ok(match values.len() {
            1 => Self::Float(values[0]),
            2 => Self::Vec2(packed(values)),
            3 => Self::Vec3(packed(values)),
            4 => Self::Vec4(packed(values)),
            6 => Self::Mat2x3(packed(values)),
            9 => Self::Mat3(packed(values)),
            12 => Self::Mat3x4(packed(values)),
            16 => Self::Mat4(packed(values)),
            n => return Err(EngineError::UnsupportedValueType(format!("[f32; {n}]"))),
        })
    }
}

/// Whether a uniform declared as `declared` can be set from `value`
fn accepts(declared: &str, value: &UniformValue) -> bool {
    match value {
        UniformValue::Int(_) => declared == "int" || declared == "bool" || declared.contains("sampler"),
        UniformValue::UInt(_) => declared == "uint" || declared == "bool",
        UniformValue::Float(_) => declared == "float" || declared == "bool",
        other => declared == other.type_name(),
    }
}

/// A GL program built from vertex, fragment and optional geometry stages
pub struct ProgramShader {
    device: Rc<dyn GraphicsDevice>,
    vertex: PathBuf,
    fragment: PathBuf,
    geometry: Option<PathBuf>,
    id: u32,
    uniform_types: HashMap<String, String>,
}

impl fmt::Debug for ProgramShader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramShader")
            .field("id", &self.id)
            .field("vertex", &self.vertex)
            .field("fragment", &self.fragment)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl ProgramShader {
    /// Create an unlinked shader for `device`
    pub fn new(device: Rc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            vertex: PathBuf::new(),
            fragment: PathBuf::new(),
            geometry: None,
            id: 0,
            uniform_types: HashMap::new(),
        }
    }

    /// Create an unlinked shader for `window`'s context
    pub fn for_window(window: &dyn Window) -> EngineResult<Self> {
        window
            .device()
            .map(Self::new)
            .ok_or_else(|| EngineError::NotInitialized(format!("window {:?}", window.name())))
    }

    /// Create and link a shader from source strings
    pub fn from_memory(
        device: Rc<dyn GraphicsDevice>,
        vertex: &str,
        fragment: &str,
        geometry: Option<&str>,
    ) -> EngineResult<Self> {
        let mut shader = Self::new(device);
        shader.load_memory(vertex, fragment, geometry)?;
        Ok(shader)
    }

    /// Wrap in a handle that windows and callbacks can share
    pub fn into_shared(self) -> SharedShader {
        Rc::new(RefCell::new(self))
    }

    /// Set a uniform from anything convertible to a [`UniformValue`]
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> EngineResult<()> {
        self.set(name, value.into())
    }

    /// Vertex source path, empty when loaded from memory
    pub fn vertex_path(&self) -> &Path {
        &self.vertex
    }

    /// Fragment source path, empty when loaded from memory
    pub fn fragment_path(&self) -> &Path {
        &self.fragment
    }

    /// Geometry source path, if one was used
    pub fn geometry_path(&self) -> Option<&Path> {
        self.geometry.as_deref()
    }

    fn build(&self, vertex: &str, fragment: &str, geometry: Option<&str>) -> EngineResult<u32> {
        let mut sources = vec![(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)];
        if let Some(geometry) = geometry {
            sources.push((ShaderStage::Geometry, geometry));
        }

        let mut stages = Vec::with_capacity(sources.len());
        for (stage, source) in sources {
            match self.device.compile_stage(stage, source) {
                Ok(id) => stages.push(id),
                Err(log) => {
                    for id in stages {
                        self.device.delete_stage(id);
                    }
                    return Err(EngineError::CompileError { stage, log });
                }
            }
        }

        let linked = self.device.link_program(&stages);
        for id in stages {
            self.device.delete_stage(id);
        }
        match linked {
            Ok(0) => Err(EngineError::LinkError("backend returned program 0".to_string())),
            Ok(program) => Ok(program),
            Err(log) => Err(EngineError::LinkError(log)),
        }
    }

    fn replace_program(&mut self, program: u32) {
        self.release();
        self.id = program;
        self.uniform_types = self
            .device
            .active_uniforms(program)
            .into_iter()
            .map(|uniform| (uniform.name, uniform.type_name))
            .collect();
        log::info!("Linked shader program {} ({} uniforms)", program, self.uniform_types.len());
    }
}

fn read_required(path: &Path) -> EngineResult<String> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::invalid_path(path, "path is empty"));
    }
    let source = std::fs::read_to_string(path).map_err(|e| EngineError::invalid_path(path, e))?;
    if source.is_empty() {
        return Err(EngineError::EmptyFile(path.to_path_buf()));
    }
    Ok(source)
}

fn read_optional(path: Option<&Path>) -> EngineResult<Option<String>> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(None);
    };
    match std::fs::read_to_string(path) {
        Ok(source) if source.is_empty() => {
            log::debug!("Geometry shader {} is empty, skipping stage", path.display());
            Ok(None)
        }
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("Geometry shader {} not found, skipping stage", path.display());
            Ok(None)
        }
        Err(e) => Err(EngineError::invalid_path(path, e)),
    }
}

impl Shader for ProgramShader {
    fn load(&mut self, vertex: &Path, fragment: &Path, geometry: Option<&Path>) -> EngineResult<()> {
        let vertex_source = read_required(vertex)?;
        let fragment_source = read_required(fragment)?;
        let geometry_source = read_optional(geometry)?;

        let program = self.build(&vertex_source, &fragment_source, geometry_source.as_deref())?;
        self.replace_program(program);
        self.vertex = vertex.to_path_buf();
        self.fragment = fragment.to_path_buf();
        self.geometry = geometry_source.and(geometry.map(Path::to_path_buf));
        Ok(())
    }

    fn load_memory(&mut self, vertex: &str, fragment: &str, geometry: Option<&str>) -> EngineResult<()> {
        if vertex.is_empty() || fragment.is_empty() {
            return Err(EngineError::InvalidParameter(
                "vertex and fragment sources are required".to_string(),
            ));
        }
        let geometry = geometry.filter(|source| !source.is_empty());

        let program = self.build(vertex, fragment, geometry)?;
        self.replace_program(program);
        self.vertex = PathBuf::new();
        self.fragment = PathBuf::new();
        self.geometry = None;
        Ok(())
    }

    fn set(&self, name: &str, value: UniformValue) -> EngineResult<()> {
        if self.id == 0 {
            log::trace!("Uniform {} set before link, ignored", name);
            return Ok(());
        }
        self.device.use_program(self.id);
        let location = self
            .device
            .uniform_location(self.id, name)
            .ok_or_else(|| EngineError::UniformNotFound {
                name: name.to_string(),
                type_name: value.type_name(),
            })?;
        if let Some(declared) = self.uniform_types.get(name) {
            if !accepts(declared, &value) {
                return Err(EngineError::InvalidDataType(format!(
                    "uniform [{name}] is {declared}, got {}",
                    value.type_name()
                )));
            }
        }
        self.device.set_uniform(location, &value);
        Ok(())
    }

    fn bind(&self) {
        if self.id != 0 {
            self.device.use_program(self.id);
        }
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn release(&mut self) {
        if self.id != 0 {
            log::debug!("Deleting shader program {}", self.id);
            self.device.delete_program(self.id);
            self.id = 0;
            self.uniform_types.clear();
        }
    }
}

impl Drop for ProgramShader {
    fn drop(&mut self) {
        self.release();
    }
}
