use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::{ActiveVariable, Driver};
use crate::attr::AttrType;
use crate::error::GlError;

/// One recorded driver call.
///
/// Only state-changing calls are recorded in detail; the rest fall into
/// `Other` with the entry point name.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { kind: &'static str, id: u32 },
    Delete { kind: &'static str, id: u32 },
    Bind { target: u32, id: u32 },
    BufferData { target: u32, len: usize },
    BufferSubData { target: u32, offset: usize, len: usize },
    Uniform { program: u32, location: u32 },
    DrawArrays {
        mode: u32,
        first: i32,
        count: i32,
        program: u32,
        texture: u32,
        vertex_array: u32,
    },
    DrawElements {
        mode: u32,
        count: i32,
        program: u32,
        texture: u32,
        vertex_array: u32,
    },
    Query(u32),
    Other(&'static str),
}

impl Call {
    pub fn is_draw(&self) -> bool {
        matches!(self, Call::DrawArrays { .. } | Call::DrawElements { .. })
    }
}

/// Last value uploaded to a uniform location.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformData {
    Float(Vec<f32>),
    Matrix(Vec<f32>),
    Int(i32),
    UInt(u32),
}

/// Attribute pointer recorded on a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointer {
    pub index: u32,
    pub size: i32,
    pub stride: i32,
    pub offset: i32,
    pub buffer: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
struct Image {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
}

impl Image {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width.max(0) * height.max(0) * 4) as usize],
        }
    }

    fn texel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.pixels.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    fn put(&mut self, x: i32, y: i32, px: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 4) as usize;
        if let Some(dst) = self.pixels.get_mut(i..i + 4) {
            dst.copy_from_slice(&px);
        }
    }
}

#[derive(Debug, Default)]
struct TextureObject {
    image: Image,
    params: HashMap<u32, i32>,
    border: [f32; 4],
}

#[derive(Debug)]
struct ShaderObject {
    stage: u32,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<ActiveVariable>,
    attributes: Vec<ActiveVariable>,
    values: HashMap<u32, UniformData>,
}

#[derive(Debug, Default)]
struct Store {
    next_id: u32,
    bindings: HashMap<u32, u32>,
    buffers: HashMap<u32, Vec<u8>>,
    vertex_arrays: HashMap<u32, Vec<AttribPointer>>,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    textures: HashMap<u32, TextureObject>,
    framebuffers: HashMap<u32, u32>,
    screen: Image,
    viewport: [i32; 4],
    scissor: [i32; 4],
    clear_color: [f32; 4],
    enabled: HashSet<u32>,
    blend: (u32, u32),
    calls: Vec<Call>,
    errors: Vec<String>,
}

impl Store {
    fn alloc(&mut self, kind: &'static str) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        self.calls.push(Call::Create { kind, id });
        id
    }

    fn bound(&self, pname: u32) -> u32 {
        self.bindings.get(&pname).copied().unwrap_or(0)
    }

    fn bound_buffer(&mut self, target: u32, op: &str) -> Option<u32> {
        let id = binding_slots(target).first().map(|p| self.bound(*p)).unwrap_or(0);
        if id == 0 {
            self.errors.push(format!("{op}: no buffer bound to {target:#x}"));
            return None;
        }
        Some(id)
    }

    fn bound_texture(&mut self, target: u32, op: &str) -> Option<u32> {
        let id = self.bound(glow::TEXTURE_BINDING_2D);
        if target != glow::TEXTURE_2D || id == 0 {
            self.errors.push(format!("{op}: no 2D texture bound"));
            return None;
        }
        Some(id)
    }

    /// Color target of framebuffer `fb`; `0` is the window surface.
    fn color_target(&mut self, fb: u32) -> Option<&mut Image> {
        if fb == 0 {
            return Some(&mut self.screen);
        }
        let tex = *self.framebuffers.get(&fb)?;
        self.textures.get_mut(&tex).map(|t| &mut t.image)
    }

    fn current_program(&mut self, op: &str) -> Option<&mut ProgramObject> {
        let id = self.bound(glow::CURRENT_PROGRAM);
        if id == 0 {
            self.errors.push(format!("{op}: no program in use"));
            return None;
        }
        self.programs.get_mut(&id)
    }

    fn set_uniform(&mut self, location: u32, data: UniformData) {
        let program = self.bound(glow::CURRENT_PROGRAM);
        self.calls.push(Call::Uniform { program, location });
        let Some(p) = self.current_program("uniform") else {
            return;
        };
        if location as usize >= p.uniforms.len() + p.attributes.len() {
            self.errors.push(format!("uniform: invalid location {location}"));
            return;
        }
        p.values.insert(location, data);
    }
}

/// Binding-query tokens updated by a bind on `target`.
fn binding_slots(target: u32) -> &'static [u32] {
    match target {
        glow::ARRAY_BUFFER => &[glow::ARRAY_BUFFER_BINDING],
        glow::ELEMENT_ARRAY_BUFFER => &[glow::ELEMENT_ARRAY_BUFFER_BINDING],
        glow::TEXTURE_2D => &[glow::TEXTURE_BINDING_2D],
        glow::FRAMEBUFFER => &[glow::DRAW_FRAMEBUFFER_BINDING, glow::READ_FRAMEBUFFER_BINDING],
        glow::DRAW_FRAMEBUFFER => &[glow::DRAW_FRAMEBUFFER_BINDING],
        glow::READ_FRAMEBUFFER => &[glow::READ_FRAMEBUFFER_BINDING],
        _ => &[],
    }
}

fn glsl_type_token(name: &str) -> Option<u32> {
    AttrType::ALL
        .into_iter()
        .find(|t| t.glsl_name() == name)
        .map(AttrType::gl_token)
        .or(match name {
            "samplerCube" => Some(glow::SAMPLER_CUBE),
            "bool" => Some(glow::BOOL),
            _ => None,
        })
}

/// Collects `uniform` declarations and, for vertex sources, `in`/`attribute`
/// declarations, in source order.
fn parse_declarations(
    source: &str,
    vertex: bool,
    uniforms: &mut Vec<ActiveVariable>,
    attributes: &mut Vec<ActiveVariable>,
) {
    for line in source.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        let Some(decl) = line.strip_suffix(';') else {
            continue;
        };
        let decl = match decl.strip_prefix("layout") {
            Some(rest) => match rest.find(')') {
                Some(i) => &rest[i + 1..],
                None => continue,
            },
            None => decl,
        };

        let mut tokens = decl.split_whitespace().filter(|t| {
            !matches!(*t, "lowp" | "mediump" | "highp" | "flat" | "smooth" | "noperspective")
        });
        let Some(qualifier) = tokens.next() else {
            continue;
        };
        let is_uniform = qualifier == "uniform";
        let is_attribute = vertex && matches!(qualifier, "in" | "attribute");
        if !is_uniform && !is_attribute {
            continue;
        }

        let (Some(ty), Some(name)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let Some(ty) = glsl_type_token(ty) else {
            continue;
        };
        let (name, size) = match name.split_once('[') {
            Some((base, rest)) => (
                format!("{base}[0]"),
                rest.trim_end_matches(']').parse().unwrap_or(1),
            ),
            None => (name.to_string(), 1),
        };

        let list = if is_uniform { &mut *uniforms } else { &mut *attributes };
        if !list.iter().any(|v| v.name == name) {
            list.push(ActiveVariable { name, ty, size });
        }
    }
}

fn find_location(vars: &[ActiveVariable], name: &str) -> Option<u32> {
    vars.iter()
        .position(|v| v.name == name || v.name.strip_suffix("[0]") == Some(name))
        .map(|i| i as u32)
}

/// In-memory software driver.
///
/// Implements object lifetimes, binding state, buffer and texture memory,
/// framebuffer blits (nearest sampling) and program introspection by
/// scanning GLSL declarations. Every call is recorded so tests can assert on
/// the exact driver traffic an operation produced.
///
/// Shaders compile when their source contains `void main`; a program links
/// when it has a compiled vertex stage.
#[derive(Debug)]
pub struct Headless {
    store: RefCell<Store>,
}

impl Headless {
    /// Creates a driver whose window surface is 64x64.
    pub fn new() -> Self {
        Self::with_surface(64, 64)
    }

    pub fn with_surface(width: i32, height: i32) -> Self {
        let store = Store {
            screen: Image::new(width, height),
            viewport: [0, 0, width, height],
            scissor: [0, 0, width, height],
            blend: (glow::ONE, glow::ZERO),
            ..Store::default()
        };
        Self {
            store: RefCell::new(store),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.store.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.store.borrow_mut().calls.clear();
    }

    /// Misuse the driver would have flagged as a GL error.
    pub fn errors(&self) -> Vec<String> {
        self.store.borrow().errors.clone()
    }

    /// Id currently bound for a binding query token (e.g. `ARRAY_BUFFER_BINDING`).
    pub fn bound(&self, pname: u32) -> u32 {
        self.store.borrow().bound(pname)
    }

    pub fn buffer_contents(&self, id: u32) -> Option<Vec<u8>> {
        self.store.borrow().buffers.get(&id).cloned()
    }

    pub fn texture_pixels(&self, id: u32) -> Option<Vec<u8>> {
        self.store.borrow().textures.get(&id).map(|t| t.image.pixels.clone())
    }

    pub fn texture_param(&self, id: u32, pname: u32) -> Option<i32> {
        self.store
            .borrow()
            .textures
            .get(&id)
            .and_then(|t| t.params.get(&pname).copied())
    }

    pub fn texture_border(&self, id: u32) -> Option<[f32; 4]> {
        self.store.borrow().textures.get(&id).map(|t| t.border)
    }

    pub fn framebuffer_attachment(&self, id: u32) -> Option<u32> {
        self.store.borrow().framebuffers.get(&id).copied()
    }

    pub fn surface_pixels(&self) -> Vec<u8> {
        self.store.borrow().screen.pixels.clone()
    }

    pub fn attrib_pointers(&self, vertex_array: u32) -> Vec<AttribPointer> {
        self.store
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .cloned()
            .unwrap_or_default()
    }

    pub fn uniform_value(&self, program: u32, name: &str) -> Option<UniformData> {
        let store = self.store.borrow();
        let p = store.programs.get(&program)?;
        let loc = find_location(&p.uniforms, name)?;
        p.values.get(&loc).cloned()
    }

    pub fn is_enabled(&self, cap: u32) -> bool {
        self.store.borrow().enabled.contains(&cap)
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.store.borrow().clear_color
    }

    pub fn scissor_box(&self) -> [i32; 4] {
        self.store.borrow().scissor
    }

    pub fn blend(&self) -> (u32, u32) {
        self.store.borrow().blend
    }

    /// Number of objects created and not yet deleted.
    pub fn live_objects(&self) -> usize {
        let s = self.store.borrow();
        s.buffers.len()
            + s.vertex_arrays.len()
            + s.shaders.len()
            + s.programs.len()
            + s.textures.len()
            + s.framebuffers.len()
    }

    fn record(&self, call: Call) {
        self.store.borrow_mut().calls.push(call);
    }

    fn bind(&self, target: u32, id: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Bind { target, id });
        for slot in binding_slots(target) {
            s.bindings.insert(*slot, id);
        }
    }
}

impl Default for Headless {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for Headless {
    fn get_integer(&self, pname: u32) -> i32 {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Query(pname));
        match pname {
            glow::MAX_TEXTURE_SIZE => 4096,
            _ => s.bound(pname) as i32,
        }
    }

    fn get_viewport(&self) -> [i32; 4] {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Query(glow::VIEWPORT));
        s.viewport
    }

    fn create_buffer(&self) -> Result<u32, GlError> {
        let mut s = self.store.borrow_mut();
        let id = s.alloc("buffer");
        s.buffers.insert(id, Vec::new());
        Ok(id)
    }

    fn delete_buffer(&self, id: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Delete { kind: "buffer", id });
        s.buffers.remove(&id);
    }

    fn bind_buffer(&self, target: u32, id: u32) {
        self.bind(target, id);
    }

    fn buffer_data(&self, target: u32, data: &[u8], _usage: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::BufferData { target, len: data.len() });
        if let Some(id) = s.bound_buffer(target, "buffer_data") {
            s.buffers.insert(id, data.to_vec());
        }
    }

    fn buffer_sub_data(&self, target: u32, offset: usize, data: &[u8]) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::BufferSubData { target, offset, len: data.len() });
        let Some(id) = s.bound_buffer(target, "buffer_sub_data") else {
            return;
        };
        let dst = s
            .buffers
            .get_mut(&id)
            .and_then(|b| b.get_mut(offset..offset + data.len()));
        match dst {
            Some(dst) => dst.copy_from_slice(data),
            None => s.errors.push(format!("buffer_sub_data: range out of bounds on {id}")),
        }
    }

    fn get_buffer_sub_data(&self, target: u32, offset: usize, out: &mut [u8]) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("get_buffer_sub_data"));
        let Some(id) = s.bound_buffer(target, "get_buffer_sub_data") else {
            return;
        };
        let src = s.buffers.get(&id).and_then(|b| b.get(offset..offset + out.len()));
        match src {
            Some(src) => out.copy_from_slice(src),
            None => s.errors.push(format!("get_buffer_sub_data: range out of bounds on {id}")),
        }
    }

    fn create_vertex_array(&self) -> Result<u32, GlError> {
        let mut s = self.store.borrow_mut();
        let id = s.alloc("vertex_array");
        s.vertex_arrays.insert(id, Vec::new());
        Ok(id)
    }

    fn delete_vertex_array(&self, id: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Delete { kind: "vertex_array", id });
        s.vertex_arrays.remove(&id);
    }

    fn bind_vertex_array(&self, id: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Bind { target: glow::VERTEX_ARRAY_BINDING, id });
        s.bindings.insert(glow::VERTEX_ARRAY_BINDING, id);
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        _ty: u32,
        _normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("vertex_attrib_pointer"));
        let vao = s.bound(glow::VERTEX_ARRAY_BINDING);
        let buffer = s.bound(glow::ARRAY_BUFFER_BINDING);
        if vao == 0 || buffer == 0 {
            s.errors.push("vertex_attrib_pointer: needs a bound vertex array and buffer".into());
            return;
        }
        if let Some(ptrs) = s.vertex_arrays.get_mut(&vao) {
            ptrs.retain(|p| p.index != index);
            ptrs.push(AttribPointer { index, size, stride, offset, buffer, enabled: false });
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("enable_vertex_attrib_array"));
        let vao = s.bound(glow::VERTEX_ARRAY_BINDING);
        if let Some(p) = s
            .vertex_arrays
            .get_mut(&vao)
            .and_then(|ptrs| ptrs.iter_mut().find(|p| p.index == index))
        {
            p.enabled = true;
        }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        let mut s = self.store.borrow_mut();
        let call = Call::DrawArrays {
            mode,
            first,
            count,
            program: s.bound(glow::CURRENT_PROGRAM),
            texture: s.bound(glow::TEXTURE_BINDING_2D),
            vertex_array: s.bound(glow::VERTEX_ARRAY_BINDING),
        };
        s.calls.push(call);
        if s.bound(glow::VERTEX_ARRAY_BINDING) == 0 {
            s.errors.push("draw_arrays: no vertex array bound".into());
        }
    }

    fn draw_elements(&self, mode: u32, count: i32, _ty: u32, _offset: i32) {
        let mut s = self.store.borrow_mut();
        let call = Call::DrawElements {
            mode,
            count,
            program: s.bound(glow::CURRENT_PROGRAM),
            texture: s.bound(glow::TEXTURE_BINDING_2D),
            vertex_array: s.bound(glow::VERTEX_ARRAY_BINDING),
        };
        s.calls.push(call);
        if s.bound(glow::ELEMENT_ARRAY_BUFFER_BINDING) == 0 {
            s.errors.push("draw_elements: no index buffer bound".into());
        }
    }

    fn create_shader(&self, stage: u32) -> Result<u32, GlError> {
        let mut s = self.store.borrow_mut();
        let id = s.alloc("shader");
        s.shaders.insert(
            id,
            ShaderObject { stage, source: String::new(), compiled: false, log: String::new() },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("shader_source"));
        if let Some(sh) = s.shaders.get_mut(&shader) {
            sh.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("compile_shader"));
        if let Some(sh) = s.shaders.get_mut(&shader) {
            sh.compiled = sh.source.contains("void main");
            sh.log = if sh.compiled {
                String::new()
            } else {
                "0:1(1): error: function `main' is not defined".to_string()
            };
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.store
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.store
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Delete { kind: "shader", id: shader });
        s.shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<u32, GlError> {
        let mut s = self.store.borrow_mut();
        let id = s.alloc("program");
        s.programs.insert(id, ProgramObject::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("attach_shader"));
        if let Some(p) = s.programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("detach_shader"));
        if let Some(p) = s.programs.get_mut(&program) {
            p.attached.retain(|id| *id != shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("link_program"));
        let Some(attached) = s.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };

        let mut uniforms = Vec::new();
        let mut attributes = Vec::new();
        let mut has_vertex = false;
        let mut log = String::new();
        for id in &attached {
            match s.shaders.get(id) {
                Some(sh) if sh.compiled => {
                    let vertex = sh.stage == glow::VERTEX_SHADER;
                    has_vertex |= vertex;
                    parse_declarations(&sh.source, vertex, &mut uniforms, &mut attributes);
                }
                _ => log = format!("error: shader {id} is not compiled"),
            }
        }
        if log.is_empty() && !has_vertex {
            log = "error: no vertex shader attached".to_string();
        }

        if let Some(p) = s.programs.get_mut(&program) {
            p.linked = log.is_empty();
            p.log = log;
            if p.linked {
                p.uniforms = uniforms;
                p.attributes = attributes;
            }
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.store
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.store
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Bind { target: glow::CURRENT_PROGRAM, id: program });
        s.bindings.insert(glow::CURRENT_PROGRAM, program);
    }

    fn delete_program(&self, program: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Delete { kind: "program", id: program });
        s.programs.remove(&program);
    }

    fn active_uniforms(&self, program: u32) -> u32 {
        self.record(Call::Other("active_uniforms"));
        self.store
            .borrow()
            .programs
            .get(&program)
            .map_or(0, |p| p.uniforms.len() as u32)
    }

    fn active_uniform(&self, program: u32, index: u32) -> Option<ActiveVariable> {
        self.record(Call::Other("active_uniform"));
        let s = self.store.borrow();
        s.programs.get(&program)?.uniforms.get(index as usize).cloned()
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        self.record(Call::Other("uniform_location"));
        let s = self.store.borrow();
        find_location(&s.programs.get(&program)?.uniforms, name)
    }

    fn active_attributes(&self, program: u32) -> u32 {
        self.record(Call::Other("active_attributes"));
        self.store
            .borrow()
            .programs
            .get(&program)
            .map_or(0, |p| p.attributes.len() as u32)
    }

    fn active_attribute(&self, program: u32, index: u32) -> Option<ActiveVariable> {
        self.record(Call::Other("active_attribute"));
        let s = self.store.borrow();
        s.programs.get(&program)?.attributes.get(index as usize).cloned()
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        self.record(Call::Other("attrib_location"));
        let s = self.store.borrow();
        find_location(&s.programs.get(&program)?.attributes, name)
    }

    fn uniform_f32(&self, location: u32, values: &[f32]) {
        self.store
            .borrow_mut()
            .set_uniform(location, UniformData::Float(values.to_vec()));
    }

    fn uniform_i32(&self, location: u32, value: i32) {
        self.store
            .borrow_mut()
            .set_uniform(location, UniformData::Int(value));
    }

    fn uniform_u32(&self, location: u32, value: u32) {
        self.store
            .borrow_mut()
            .set_uniform(location, UniformData::UInt(value));
    }

    fn uniform_matrix(&self, location: u32, _dim: usize, values: &[f32]) {
        self.store
            .borrow_mut()
            .set_uniform(location, UniformData::Matrix(values.to_vec()));
    }

    fn uniform_matrix_nxm(&self, location: u32, _cols: usize, _rows: usize, values: &[f32]) {
        self.store
            .borrow_mut()
            .set_uniform(location, UniformData::Matrix(values.to_vec()));
    }

    fn create_texture(&self) -> Result<u32, GlError> {
        let mut s = self.store.borrow_mut();
        let id = s.alloc("texture");
        s.textures.insert(id, TextureObject::default());
        Ok(id)
    }

    fn delete_texture(&self, id: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Delete { kind: "texture", id });
        s.textures.remove(&id);
    }

    fn bind_texture(&self, target: u32, id: u32) {
        self.bind(target, id);
    }

    fn tex_image_2d(&self, target: u32, width: i32, height: i32, pixels: Option<&[u8]>) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("tex_image_2d"));
        let Some(id) = s.bound_texture(target, "tex_image_2d") else {
            return;
        };
        let mut image = Image::new(width, height);
        if let Some(px) = pixels {
            if px.len() != image.pixels.len() {
                s.errors.push("tex_image_2d: pixel data size mismatch".into());
                return;
            }
            image.pixels.copy_from_slice(px);
        }
        if let Some(t) = s.textures.get_mut(&id) {
            t.image = image;
        }
    }

    fn tex_sub_image_2d(&self, target: u32, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("tex_sub_image_2d"));
        let Some(id) = s.bound_texture(target, "tex_sub_image_2d") else {
            return;
        };
        let s = &mut *s;
        let Some(t) = s.textures.get_mut(&id) else {
            return;
        };
        let img = &mut t.image;
        let fits = x >= 0 && y >= 0 && x + width <= img.width && y + height <= img.height;
        if !fits || pixels.len() != (width * height * 4) as usize {
            s.errors.push("tex_sub_image_2d: invalid region".into());
            return;
        }
        let row = (width * 4) as usize;
        for r in 0..height {
            let dst = (((y + r) * img.width + x) * 4) as usize;
            let src = r as usize * row;
            img.pixels[dst..dst + row].copy_from_slice(&pixels[src..src + row]);
        }
    }

    fn get_tex_image(&self, target: u32, out: &mut [u8]) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("get_tex_image"));
        let Some(id) = s.bound_texture(target, "get_tex_image") else {
            return;
        };
        if let Some(t) = s.textures.get(&id) {
            let n = out.len().min(t.image.pixels.len());
            out[..n].copy_from_slice(&t.image.pixels[..n]);
        }
    }

    fn tex_parameter_i32(&self, target: u32, pname: u32, value: i32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("tex_parameter_i32"));
        if let Some(id) = s.bound_texture(target, "tex_parameter_i32") {
            if let Some(t) = s.textures.get_mut(&id) {
                t.params.insert(pname, value);
            }
        }
    }

    fn tex_parameter_f32_slice(&self, target: u32, pname: u32, values: &[f32]) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("tex_parameter_f32_slice"));
        let Some(id) = s.bound_texture(target, "tex_parameter_f32_slice") else {
            return;
        };
        if let (glow::TEXTURE_BORDER_COLOR, [r, g, b, a]) = (pname, values) {
            if let Some(t) = s.textures.get_mut(&id) {
                t.border = [*r, *g, *b, *a];
            }
        }
    }

    fn create_framebuffer(&self) -> Result<u32, GlError> {
        let mut s = self.store.borrow_mut();
        let id = s.alloc("framebuffer");
        s.framebuffers.insert(id, 0);
        Ok(id)
    }

    fn delete_framebuffer(&self, id: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Delete { kind: "framebuffer", id });
        s.framebuffers.remove(&id);
    }

    fn bind_framebuffer(&self, target: u32, id: u32) {
        self.bind(target, id);
    }

    fn framebuffer_texture_2d(&self, target: u32, _attachment: u32, _tex_target: u32, texture: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("framebuffer_texture_2d"));
        let fb = binding_slots(target).first().map(|p| s.bound(*p)).unwrap_or(0);
        match s.framebuffers.get_mut(&fb) {
            Some(slot) => *slot = texture,
            None => s.errors.push("framebuffer_texture_2d: no framebuffer bound".into()),
        }
    }

    fn blit_framebuffer(&self, src: [i32; 4], dst: [i32; 4], mask: u32, _filter: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("blit_framebuffer"));
        if mask & glow::COLOR_BUFFER_BIT == 0 {
            return;
        }
        let read = s.bound(glow::READ_FRAMEBUFFER_BINDING);
        let draw = s.bound(glow::DRAW_FRAMEBUFFER_BINDING);
        let Some(source) = s.color_target(read).map(|img| img.clone()) else {
            s.errors.push("blit_framebuffer: incomplete read framebuffer".into());
            return;
        };
        if s.color_target(draw).is_none() {
            s.errors.push("blit_framebuffer: incomplete draw framebuffer".into());
            return;
        }
        let Some(target) = s.color_target(draw) else {
            return;
        };

        let [sx0, sy0, sx1, sy1] = src;
        let [dx0, dy0, dx1, dy1] = dst;
        let (dw, dh) = (dx1 - dx0, dy1 - dy0);
        if dw == 0 || dh == 0 {
            return;
        }
        for dy in dy0.min(dy1)..dy0.max(dy1) {
            for dx in dx0.min(dx1)..dx0.max(dx1) {
                // Sample at the destination texel center, nearest source texel.
                let u = ((dx - dx0) as f32 + 0.5) / dw as f32;
                let v = ((dy - dy0) as f32 + 0.5) / dh as f32;
                let sx = (sx0 as f32 + u * (sx1 - sx0) as f32).floor() as i32;
                let sy = (sy0 as f32 + v * (sy1 - sy0) as f32).floor() as i32;
                if let Some(px) = source.texel(sx, sy) {
                    target.put(dx, dy, px);
                }
            }
        }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("clear_color"));
        s.clear_color = [r, g, b, a];
    }

    fn clear(&self, mask: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("clear"));
        if mask & glow::COLOR_BUFFER_BIT == 0 {
            return;
        }
        let px = s.clear_color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let draw = s.bound(glow::DRAW_FRAMEBUFFER_BINDING);
        if let Some(img) = s.color_target(draw) {
            for chunk in img.pixels.chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("viewport"));
        s.viewport = [x, y, width, height];
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("scissor"));
        s.scissor = [x, y, width, height];
    }

    fn enable(&self, cap: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("enable"));
        s.enabled.insert(cap);
    }

    fn disable(&self, cap: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("disable"));
        s.enabled.remove(&cap);
    }

    fn blend_func(&self, src: u32, dst: u32) {
        let mut s = self.store.borrow_mut();
        s.calls.push(Call::Other("blend_func"));
        s.blend = (src, dst);
    }
}
