//! Vertex attribute and uniform layouts.
//!
//! An [`AttrFormat`] is an ordered list of [`Attr`]s. Insertion order is buffer
//! layout order: offsets are the exclusive prefix sum of member byte lengths
//! and the stride is their total. No padding is modeled.

/// Element kind of an attribute or uniform.
///
/// Matrix names are `MatCxR` (columns x rows), matching GLSL.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttrType {
    Float,
    Vec2f,
    Vec3f,
    Vec4f,
    Mat2f,
    Mat3f,
    Mat4f,
    Mat2x3f,
    Mat2x4f,
    Mat3x2f,
    Mat3x4f,
    Mat4x2f,
    Mat4x3f,

    Int,
    Vec2i,
    Vec3i,
    Vec4i,

    UInt,
    Vec2ui,
    Vec3ui,
    Vec4ui,

    Double,
    Vec2d,
    Vec3d,
    Vec4d,
    Mat2d,
    Mat3d,
    Mat4d,
    Mat2x3d,
    Mat2x4d,
    Mat3x2d,
    Mat3x4d,
    Mat4x2d,
    Mat4x3d,

    /// 2D texture sampler; uploaded as a texture unit index.
    Sampler2D,
}

impl AttrType {
    pub const ALL: [AttrType; 35] = [
        AttrType::Float,
        AttrType::Vec2f,
        AttrType::Vec3f,
        AttrType::Vec4f,
        AttrType::Mat2f,
        AttrType::Mat3f,
        AttrType::Mat4f,
        AttrType::Mat2x3f,
        AttrType::Mat2x4f,
        AttrType::Mat3x2f,
        AttrType::Mat3x4f,
        AttrType::Mat4x2f,
        AttrType::Mat4x3f,
        AttrType::Int,
        AttrType::Vec2i,
        AttrType::Vec3i,
        AttrType::Vec4i,
        AttrType::UInt,
        AttrType::Vec2ui,
        AttrType::Vec3ui,
        AttrType::Vec4ui,
        AttrType::Double,
        AttrType::Vec2d,
        AttrType::Vec3d,
        AttrType::Vec4d,
        AttrType::Mat2d,
        AttrType::Mat3d,
        AttrType::Mat4d,
        AttrType::Mat2x3d,
        AttrType::Mat2x4d,
        AttrType::Mat3x2d,
        AttrType::Mat3x4d,
        AttrType::Mat4x2d,
        AttrType::Mat4x3d,
        AttrType::Sampler2D,
    ];

    /// Number of scalar components.
    pub const fn element_count(self) -> usize {
        use AttrType::*;
        match self {
            Float | Int | UInt | Double | Sampler2D => 1,
            Vec2f | Vec2i | Vec2ui | Vec2d => 2,
            Vec3f | Vec3i | Vec3ui | Vec3d => 3,
            Vec4f | Vec4i | Vec4ui | Vec4d | Mat2f | Mat2d => 4,
            Mat2x3f | Mat3x2f | Mat2x3d | Mat3x2d => 6,
            Mat2x4f | Mat4x2f | Mat2x4d | Mat4x2d => 8,
            Mat3f | Mat3d => 9,
            Mat3x4f | Mat4x3f | Mat3x4d | Mat4x3d => 12,
            Mat4f | Mat4d => 16,
        }
    }

    /// Width of one scalar component in bytes.
    pub const fn component_size(self) -> usize {
        use AttrType::*;
        match self {
            Double | Vec2d | Vec3d | Vec4d | Mat2d | Mat3d | Mat4d | Mat2x3d | Mat2x4d
            | Mat3x2d | Mat3x4d | Mat4x2d | Mat4x3d => 8,
            _ => 4,
        }
    }

    pub const fn byte_len(self) -> usize {
        self.element_count() * self.component_size()
    }

    /// True for single-precision float scalars and vectors, the only kinds a
    /// vertex array can bind with a float attribute pointer.
    pub const fn is_float_vector(self) -> bool {
        matches!(
            self,
            AttrType::Float | AttrType::Vec2f | AttrType::Vec3f | AttrType::Vec4f
        )
    }

    /// GL type token reported by program introspection.
    pub const fn gl_token(self) -> u32 {
        use AttrType::*;
        match self {
            Float => glow::FLOAT,
            Vec2f => glow::FLOAT_VEC2,
            Vec3f => glow::FLOAT_VEC3,
            Vec4f => glow::FLOAT_VEC4,
            Mat2f => glow::FLOAT_MAT2,
            Mat3f => glow::FLOAT_MAT3,
            Mat4f => glow::FLOAT_MAT4,
            Mat2x3f => glow::FLOAT_MAT2x3,
            Mat2x4f => glow::FLOAT_MAT2x4,
            Mat3x2f => glow::FLOAT_MAT3x2,
            Mat3x4f => glow::FLOAT_MAT3x4,
            Mat4x2f => glow::FLOAT_MAT4x2,
            Mat4x3f => glow::FLOAT_MAT4x3,
            Int => glow::INT,
            Vec2i => glow::INT_VEC2,
            Vec3i => glow::INT_VEC3,
            Vec4i => glow::INT_VEC4,
            UInt => glow::UNSIGNED_INT,
            Vec2ui => glow::UNSIGNED_INT_VEC2,
            Vec3ui => glow::UNSIGNED_INT_VEC3,
            Vec4ui => glow::UNSIGNED_INT_VEC4,
            Double => glow::DOUBLE,
            Vec2d => glow::DOUBLE_VEC2,
            Vec3d => glow::DOUBLE_VEC3,
            Vec4d => glow::DOUBLE_VEC4,
            Mat2d => glow::DOUBLE_MAT2,
            Mat3d => glow::DOUBLE_MAT3,
            Mat4d => glow::DOUBLE_MAT4,
            Mat2x3d => glow::DOUBLE_MAT2x3,
            Mat2x4d => glow::DOUBLE_MAT2x4,
            Mat3x2d => glow::DOUBLE_MAT3x2,
            Mat3x4d => glow::DOUBLE_MAT3x4,
            Mat4x2d => glow::DOUBLE_MAT4x2,
            Mat4x3d => glow::DOUBLE_MAT4x3,
            Sampler2D => glow::SAMPLER_2D,
        }
    }

    pub fn from_gl(token: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.gl_token() == token)
    }

    /// GLSL spelling of the type.
    pub const fn glsl_name(self) -> &'static str {
        use AttrType::*;
        match self {
            Float => "float",
            Vec2f => "vec2",
            Vec3f => "vec3",
            Vec4f => "vec4",
            Mat2f => "mat2",
            Mat3f => "mat3",
            Mat4f => "mat4",
            Mat2x3f => "mat2x3",
            Mat2x4f => "mat2x4",
            Mat3x2f => "mat3x2",
            Mat3x4f => "mat3x4",
            Mat4x2f => "mat4x2",
            Mat4x3f => "mat4x3",
            Int => "int",
            Vec2i => "ivec2",
            Vec3i => "ivec3",
            Vec4i => "ivec4",
            UInt => "uint",
            Vec2ui => "uvec2",
            Vec3ui => "uvec3",
            Vec4ui => "uvec4",
            Double => "double",
            Vec2d => "dvec2",
            Vec3d => "dvec3",
            Vec4d => "dvec4",
            Mat2d => "dmat2",
            Mat3d => "dmat3",
            Mat4d => "dmat4",
            Mat2x3d => "dmat2x3",
            Mat2x4d => "dmat2x4",
            Mat3x2d => "dmat3x2",
            Mat3x4d => "dmat3x4",
            Mat4x2d => "dmat4x2",
            Mat4x3d => "dmat4x3",
            Sampler2D => "sampler2D",
        }
    }
}

/// One named attribute or uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub ty: AttrType,
    /// Binding location reported by the driver.
    pub location: u32,
    /// Integer data is normalized to `[0, 1]` / `[-1, 1]` when bound.
    pub normalized: bool,
}

impl Attr {
    pub fn new(name: impl Into<String>, ty: AttrType, location: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            location,
            normalized: false,
        }
    }
}

/// Ordered attribute layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrFormat {
    attrs: Vec<Attr>,
}

impl AttrFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Total scalar components of one record.
    pub fn element_count(&self) -> usize {
        self.attrs.iter().map(|a| a.ty.element_count()).sum()
    }

    /// Total bytes of one record.
    pub fn stride(&self) -> usize {
        self.attrs.iter().map(|a| a.ty.byte_len()).sum()
    }

    /// Byte offset of each member, in order.
    pub fn offsets(&self) -> Vec<usize> {
        self.attrs
            .iter()
            .scan(0, |acc, a| {
                let off = *acc;
                *acc += a.ty.byte_len();
                Some(off)
            })
            .collect()
    }
}

impl FromIterator<Attr> for AttrFormat {
    fn from_iter<I: IntoIterator<Item = Attr>>(iter: I) -> Self {
        Self {
            attrs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AttrFormat {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}
