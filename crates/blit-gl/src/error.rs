use std::fmt;

use crate::attr::AttrType;
use crate::binder::Binding;
use crate::program::ShaderStage;

/// Errors produced by GL resource construction and typed uploads.
#[derive(Debug, Clone, PartialEq)]
pub enum GlError {
    /// A shader stage failed to compile. `log` is the driver info log.
    Compile { stage: ShaderStage, log: String },
    /// Program linking failed. `log` is the driver info log.
    Link { log: String },
    /// A program was requested with no shader stages.
    NoShaders,
    /// The driver refused to create an object.
    Create(String),
    /// No vertex attribute or uniform with this name exists.
    UnknownAttribute(String),
    /// The attribute exists but its type has no upload path.
    UnsupportedType { name: String, ty: AttrType },
    /// The value supplied for an attribute does not match its declared type.
    TypeMismatch { name: String, expected: AttrType, found: AttrType },
    /// Supplied data length disagrees with the expected shape.
    ShapeMismatch { what: &'static str, expected: usize, found: usize },
    /// A region lies outside the bounds of the object it addresses.
    OutOfBounds { what: &'static str },
    /// A vertex slice was requested with `len > cap`.
    LenExceedsCap { len: usize, cap: usize },
    /// `restore` was called more times than `bind`.
    UnbalancedRestore(Binding),
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlError::Compile { stage, log } => write!(f, "{stage} shader compile failed: {log}"),
            GlError::Link { log } => write!(f, "program link failed: {log}"),
            GlError::NoShaders => write!(f, "program needs at least one shader stage"),
            GlError::Create(what) => write!(f, "failed to create GL object: {what}"),
            GlError::UnknownAttribute(name) => write!(f, "attribute not found: {name:?}"),
            GlError::UnsupportedType { name, ty } => {
                write!(f, "attribute {name:?} has unsupported type {ty:?}")
            }
            GlError::TypeMismatch { name, expected, found } => {
                write!(f, "attribute {name:?} expects {expected:?}, got {found:?}")
            }
            GlError::ShapeMismatch { what, expected, found } => {
                write!(f, "{what}: expected {expected} elements, got {found}")
            }
            GlError::OutOfBounds { what } => write!(f, "{what}: region out of bounds"),
            GlError::LenExceedsCap { len, cap } => {
                write!(f, "vertex slice len {len} exceeds capacity {cap}")
            }
            GlError::UnbalancedRestore(binding) => {
                write!(f, "restore without matching bind on {binding:?}")
            }
        }
    }
}

impl std::error::Error for GlError {}
