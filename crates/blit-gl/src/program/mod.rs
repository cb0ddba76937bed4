//! Shader programs.
//!
//! A [`Program`] compiles and links its stages, then introspects the linked
//! object once: every active vertex attribute and uniform becomes an [`Attr`]
//! in one of two [`AttrFormat`]s, in discovery order. Uniform uploads are
//! checked against those formats before any driver call is made.

mod uniform;

use std::fmt;

use crate::attr::{Attr, AttrFormat, AttrType};
use crate::binder::{BindGuard, Binder, Binding};
use crate::driver::{ActiveVariable, Driver, GlContext};
use crate::error::GlError;

pub use uniform::UniformValue;

const DEFAULT_VERT: &str = include_str!("shaders/default.vert");
const DEFAULT_FRAG: &str = include_str!("shaders/default.frag");

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

impl ShaderStage {
    pub const fn gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::Compute => glow::COMPUTE_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "VERT",
            ShaderStage::Fragment => "FRAG",
            ShaderStage::Geometry => "GEOM",
            ShaderStage::Compute => "COMP",
        })
    }
}

/// One shader stage source.
#[derive(Debug, Clone)]
pub struct Shader {
    pub stage: ShaderStage,
    pub source: String,
}

impl Shader {
    pub fn new(stage: ShaderStage, source: impl Into<String>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn vertex(source: impl Into<String>) -> Self {
        Self::new(ShaderStage::Vertex, source)
    }

    pub fn fragment(source: impl Into<String>) -> Self {
        Self::new(ShaderStage::Fragment, source)
    }
}

/// Linked shader program.
pub struct Program {
    gl: GlContext,
    binder: Binder,
    vertex_format: AttrFormat,
    uniform_format: AttrFormat,
}

impl Program {
    /// Compiles, attaches and links `shaders`.
    ///
    /// On failure every object created so far is deleted and the driver log
    /// is returned in the error.
    pub fn new(gl: GlContext, shaders: &[Shader]) -> Result<Self, GlError> {
        if shaders.is_empty() {
            return Err(GlError::NoShaders);
        }

        let id = gl.create_program()?;
        let mut stages = Vec::with_capacity(shaders.len());
        for shader in shaders {
            match compile(&*gl, shader) {
                Ok(sh) => {
                    gl.attach_shader(id, sh);
                    stages.push(sh);
                }
                Err(e) => {
                    release(&*gl, id, &stages);
                    return Err(e);
                }
            }
        }

        gl.link_program(id);
        if !gl.program_link_status(id) {
            let log = gl.program_info_log(id);
            release(&*gl, id, &stages);
            return Err(GlError::Link { log });
        }

        // Stage objects are not needed once linked.
        for sh in stages {
            gl.detach_shader(id, sh);
            gl.delete_shader(sh);
        }

        let binder = Binder::new(gl.clone(), Binding::Program, id);
        let (uniform_format, vertex_format) = {
            let _bound = binder.scope();
            (find_uniforms(&*gl, id), find_attributes(&*gl, id))
        };

        log::debug!(
            "linked program {id}: {} attribute(s), {} uniform(s)",
            vertex_format.len(),
            uniform_format.len()
        );

        Ok(Self {
            gl,
            binder,
            vertex_format,
            uniform_format,
        })
    }

    /// Builds the shipped sprite program.
    ///
    /// Attribute `vert` packs position in `xy` and texture coordinates in
    /// `zw`. Uniforms: `view`, `proj`, `modl` (mat4), `color` (vec4 mask) and
    /// `tex` (sampler).
    pub fn default_program(gl: GlContext) -> Result<Self, GlError> {
        Self::new(
            gl,
            &[Shader::vertex(DEFAULT_VERT), Shader::fragment(DEFAULT_FRAG)],
        )
    }

    pub fn id(&self) -> u32 {
        self.binder.id()
    }

    pub fn context(&self) -> &GlContext {
        &self.gl
    }

    pub fn vertex_format(&self) -> &AttrFormat {
        &self.vertex_format
    }

    pub fn uniform_format(&self) -> &AttrFormat {
        &self.uniform_format
    }

    /// Makes this the program in use until the guard drops.
    pub fn bind(&self) -> BindGuard<'_> {
        self.binder.scope()
    }

    /// Uploads `value` to the attribute or uniform called `name`.
    ///
    /// Vertex attributes are searched before uniforms.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> Result<(), GlError> {
        let value = value.into();
        let attr = self
            .vertex_format
            .get(name)
            .or_else(|| self.uniform_format.get(name))
            .ok_or_else(|| GlError::UnknownAttribute(name.to_string()))?;

        if !uniform::settable(attr.ty) {
            return Err(GlError::UnsupportedType {
                name: name.to_string(),
                ty: attr.ty,
            });
        }
        if !value.fits(attr.ty) {
            return Err(GlError::TypeMismatch {
                name: name.to_string(),
                expected: attr.ty,
                found: value.attr_type(),
            });
        }

        let loc = attr.location;
        let _bound = self.binder.scope();
        match value {
            UniformValue::Float(v) => self.gl.uniform_f32(loc, &[v]),
            UniformValue::Vec2(v) => self.gl.uniform_f32(loc, &v),
            UniformValue::Vec3(v) => self.gl.uniform_f32(loc, &v),
            UniformValue::Vec4(v) => self.gl.uniform_f32(loc, &v),
            UniformValue::Mat2(m) => self.gl.uniform_matrix(loc, 2, &m),
            UniformValue::Mat3(m) => self.gl.uniform_matrix(loc, 3, &m),
            UniformValue::Mat4(m) => self.gl.uniform_matrix(loc, 4, &m),
            UniformValue::Mat2x3(m) => self.gl.uniform_matrix_nxm(loc, 2, 3, &m),
            UniformValue::Mat2x4(m) => self.gl.uniform_matrix_nxm(loc, 2, 4, &m),
            UniformValue::Mat3x2(m) => self.gl.uniform_matrix_nxm(loc, 3, 2, &m),
            UniformValue::Mat3x4(m) => self.gl.uniform_matrix_nxm(loc, 3, 4, &m),
            UniformValue::Mat4x2(m) => self.gl.uniform_matrix_nxm(loc, 4, 2, &m),
            UniformValue::Mat4x3(m) => self.gl.uniform_matrix_nxm(loc, 4, 3, &m),
            UniformValue::Int(v) => self.gl.uniform_i32(loc, v),
            UniformValue::UInt(v) => self.gl.uniform_u32(loc, v),
        }
        Ok(())
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        self.gl.delete_program(self.binder.id());
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.id())
            .field("vertex_format", &self.vertex_format)
            .field("uniform_format", &self.uniform_format)
            .finish()
    }
}

fn compile(gl: &dyn Driver, shader: &Shader) -> Result<u32, GlError> {
    let id = gl.create_shader(shader.stage.gl())?;
    gl.shader_source(id, &shader.source);
    gl.compile_shader(id);
    if !gl.shader_compile_status(id) {
        let log = gl.shader_info_log(id);
        gl.delete_shader(id);
        return Err(GlError::Compile {
            stage: shader.stage,
            log,
        });
    }
    Ok(id)
}

fn release(gl: &dyn Driver, program: u32, stages: &[u32]) {
    for sh in stages {
        gl.detach_shader(program, *sh);
        gl.delete_shader(*sh);
    }
    gl.delete_program(program);
}

fn known_type(var: &ActiveVariable) -> Option<AttrType> {
    let ty = AttrType::from_gl(var.ty);
    if ty.is_none() {
        log::warn!("skipping {:?}: unsupported GL type {:#x}", var.name, var.ty);
    }
    ty
}

fn find_uniforms(gl: &dyn Driver, program: u32) -> AttrFormat {
    (0..gl.active_uniforms(program))
        .filter_map(|i| gl.active_uniform(program, i))
        .filter_map(|var| {
            let ty = known_type(&var)?;
            let location = gl.uniform_location(program, &var.name)?;
            Some(Attr::new(var.name, ty, location))
        })
        .collect()
}

fn find_attributes(gl: &dyn Driver, program: u32) -> AttrFormat {
    (0..gl.active_attributes(program))
        .filter_map(|i| gl.active_attribute(program, i))
        .filter_map(|var| {
            let ty = known_type(&var)?;
            // Built-ins such as gl_VertexID report no location.
            let location = gl.attrib_location(program, &var.name)?;
            Some(Attr::new(var.name, ty, location))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::driver::{Call, Headless, UniformData};

    fn setup() -> (Rc<Headless>, GlContext) {
        let h = Rc::new(Headless::new());
        let gl: GlContext = h.clone();
        (h, gl)
    }

    const VERT: &str = "#version 330 core
in vec2 pos;
in vec4 color;
uniform mat4 modl;
uniform float color;
uniform dmat3 precise;
uniform mat3x2 skew;
uniform samplerCube sky;
void main() {}
";

    // ── construction ────────────────────────────────────────────────────

    #[test]
    fn default_program_exposes_sprite_interface() {
        let (h, gl) = setup();
        let p = Program::default_program(gl).unwrap();

        let attrs: Vec<_> = p.vertex_format().iter().map(|a| (a.name.as_str(), a.ty)).collect();
        assert_eq!(attrs, vec![("vert", AttrType::Vec4f)]);

        for name in ["view", "proj", "modl"] {
            assert_eq!(p.uniform_format().get(name).map(|a| a.ty), Some(AttrType::Mat4f));
        }
        assert_eq!(p.uniform_format().get("color").map(|a| a.ty), Some(AttrType::Vec4f));
        assert_eq!(p.uniform_format().get("tex").map(|a| a.ty), Some(AttrType::Sampler2D));

        // Only the program survives linking; the prior binding is back.
        assert_eq!(h.live_objects(), 1);
        assert_eq!(h.bound(glow::CURRENT_PROGRAM), 0);
    }

    #[test]
    fn compile_failure_carries_log_and_leaks_nothing() {
        let (h, gl) = setup();
        let err = Program::new(
            gl,
            &[Shader::vertex(VERT), Shader::fragment("#version 330 core\n")],
        )
        .unwrap_err();

        match err {
            GlError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("main"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(h.live_objects(), 0);
    }

    #[test]
    fn link_failure_is_reported() {
        let (h, gl) = setup();
        let frag = "#version 330 core\nvoid main() {}\n";
        let err = Program::new(gl, &[Shader::fragment(frag)]).unwrap_err();
        assert!(matches!(err, GlError::Link { .. }));
        assert_eq!(h.live_objects(), 0);
    }

    #[test]
    fn no_stages_is_an_error() {
        let (_h, gl) = setup();
        assert_eq!(Program::new(gl, &[]).unwrap_err(), GlError::NoShaders);
    }

    #[test]
    fn unknown_gl_types_are_skipped() {
        let (_h, gl) = setup();
        let p = Program::new(gl, &[Shader::vertex(VERT)]).unwrap();
        assert!(p.uniform_format().get("sky").is_none());
        assert!(p.uniform_format().get("precise").is_some());
    }

    // ── set_uniform ─────────────────────────────────────────────────────

    #[test]
    fn unknown_name_makes_no_driver_call() {
        let (h, gl) = setup();
        let p = Program::default_program(gl).unwrap();
        h.clear_calls();

        let err = p.set_uniform("nope", 1.0f32).unwrap_err();
        assert_eq!(err, GlError::UnknownAttribute("nope".into()));
        assert!(h.calls().is_empty());
    }

    #[test]
    fn sets_value_and_restores_program() {
        let (h, gl) = setup();
        let p = Program::default_program(gl).unwrap();
        p.set_uniform("color", [1.0f32, 0.5, 0.25, 1.0]).unwrap();
        p.set_uniform("tex", 0i32).unwrap();

        assert_eq!(
            h.uniform_value(p.id(), "color"),
            Some(UniformData::Float(vec![1.0, 0.5, 0.25, 1.0]))
        );
        assert_eq!(h.uniform_value(p.id(), "tex"), Some(UniformData::Int(0)));
        assert_eq!(h.bound(glow::CURRENT_PROGRAM), 0);
        assert!(h.calls().iter().any(|c| matches!(c, Call::Uniform { .. })));
    }

    #[test]
    fn non_square_matrix_is_uploaded() {
        let (h, gl) = setup();
        let p = Program::new(gl, &[Shader::vertex(VERT)]).unwrap();
        assert_eq!(p.uniform_format().get("skew").map(|a| a.ty), Some(AttrType::Mat3x2f));

        let m = [1.0f32, 0.0, 0.5, 1.0, 2.0, 3.0];
        p.set_uniform("skew", UniformValue::Mat3x2(m)).unwrap();
        assert_eq!(h.uniform_value(p.id(), "skew"), Some(UniformData::Matrix(m.to_vec())));
        assert_eq!(h.bound(glow::CURRENT_PROGRAM), 0);

        // Same element count, transposed shape.
        assert!(matches!(
            p.set_uniform("skew", UniformValue::Mat2x3(m)),
            Err(GlError::TypeMismatch { expected: AttrType::Mat3x2f, found: AttrType::Mat2x3f, .. })
        ));
    }

    #[test]
    fn double_types_are_declared_but_not_settable() {
        let (_h, gl) = setup();
        let p = Program::new(gl, &[Shader::vertex(VERT)]).unwrap();
        assert!(matches!(
            p.set_uniform("precise", 1.0f32),
            Err(GlError::UnsupportedType { ty: AttrType::Mat3d, .. })
        ));
    }

    #[test]
    fn mismatched_value_is_rejected() {
        let (_h, gl) = setup();
        let p = Program::default_program(gl).unwrap();
        assert!(matches!(
            p.set_uniform("modl", 1.0f32),
            Err(GlError::TypeMismatch { expected: AttrType::Mat4f, found: AttrType::Float, .. })
        ));
    }

    #[test]
    fn vertex_attributes_take_precedence() {
        let (_h, gl) = setup();
        let p = Program::new(gl, &[Shader::vertex(VERT)]).unwrap();
        // `color` is both a vec4 attribute and a float uniform.
        assert!(matches!(
            p.set_uniform("color", 1.0f32),
            Err(GlError::TypeMismatch { expected: AttrType::Vec4f, .. })
        ));
    }

    #[test]
    fn drop_deletes_program() {
        let (h, gl) = setup();
        let p = Program::default_program(gl).unwrap();
        drop(p);
        assert_eq!(h.live_objects(), 0);
    }
}
