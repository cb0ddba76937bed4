use crate::attr::AttrType;

/// Typed uniform payload.
///
/// Matrices are column-major. Non-square variants are named `MatCxR`
/// (columns x rows) like their GLSL types.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
    Mat2x3([f32; 6]),
    Mat2x4([f32; 8]),
    Mat3x2([f32; 6]),
    Mat3x4([f32; 12]),
    Mat4x2([f32; 8]),
    Mat4x3([f32; 12]),
    Int(i32),
    UInt(u32),
}

impl UniformValue {
    /// Attribute type this value uploads as.
    pub const fn attr_type(&self) -> AttrType {
        match self {
            UniformValue::Float(_) => AttrType::Float,
            UniformValue::Vec2(_) => AttrType::Vec2f,
            UniformValue::Vec3(_) => AttrType::Vec3f,
            UniformValue::Vec4(_) => AttrType::Vec4f,
            UniformValue::Mat2(_) => AttrType::Mat2f,
            UniformValue::Mat3(_) => AttrType::Mat3f,
            UniformValue::Mat4(_) => AttrType::Mat4f,
            UniformValue::Mat2x3(_) => AttrType::Mat2x3f,
            UniformValue::Mat2x4(_) => AttrType::Mat2x4f,
            UniformValue::Mat3x2(_) => AttrType::Mat3x2f,
            UniformValue::Mat3x4(_) => AttrType::Mat3x4f,
            UniformValue::Mat4x2(_) => AttrType::Mat4x2f,
            UniformValue::Mat4x3(_) => AttrType::Mat4x3f,
            UniformValue::Int(_) => AttrType::Int,
            UniformValue::UInt(_) => AttrType::UInt,
        }
    }

    /// Whether a value of this kind may be uploaded to a `declared` slot.
    ///
    /// Samplers take a texture unit as `Int`.
    pub(crate) fn fits(&self, declared: AttrType) -> bool {
        match declared {
            AttrType::Sampler2D => matches!(self, UniformValue::Int(_)),
            other => other == self.attr_type(),
        }
    }
}

/// Types with an upload path. Integer vectors and doubles are declared-only.
pub(crate) const fn settable(ty: AttrType) -> bool {
    matches!(
        ty,
        AttrType::Float
            | AttrType::Vec2f
            | AttrType::Vec3f
            | AttrType::Vec4f
            | AttrType::Mat2f
            | AttrType::Mat3f
            | AttrType::Mat4f
            | AttrType::Mat2x3f
            | AttrType::Mat2x4f
            | AttrType::Mat3x2f
            | AttrType::Mat3x4f
            | AttrType::Mat4x2f
            | AttrType::Mat4x3f
            | AttrType::Int
            | AttrType::UInt
            | AttrType::Sampler2D
    )
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(v: [f32; 16]) -> Self {
        UniformValue::Mat4(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::UInt(v)
    }
}
