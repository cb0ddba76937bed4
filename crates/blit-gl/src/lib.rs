//! Blit GL crate.
//!
//! Thin wrappers over OpenGL objects (programs, buffers, textures,
//! framebuffers) that bind through save/restore stacks, plus the
//! growable vertex slice used by sprite rendering.
//!
//! Everything here is single-threaded: a [`GlContext`] is an `Rc` and must
//! stay on the thread that owns the current GL context.

pub mod attr;
pub mod binder;
pub mod buffer;
pub mod driver;
pub mod frame;
pub mod program;
pub mod state;
pub mod texture;
pub mod vertex;

mod error;

pub use attr::{Attr, AttrFormat, AttrType};
pub use binder::{BindGuard, Binder, Binding};
pub use buffer::{DrawMode, IndexBuffer, Usage, VertexBuffer};
pub use driver::{ActiveVariable, Driver, GlContext};
pub use error::GlError;
pub use frame::Frame;
pub use program::{Program, Shader, ShaderStage, UniformValue};
pub use texture::{Filter, Region, Texture};
pub use vertex::{VertexArray, VertexSlice};
