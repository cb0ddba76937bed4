//! Scene objects.
//!
//! - [`Orienter`]: shared transform node with an optional parent
//! - [`Camera`]: view/projection source for a program's `view` and `proj`
//! - [`Sprite`]: textured quad drawn through a shared program and texture
//! - [`Animation`] and [`SpriteSheet`]: frame sequencing and named regions

mod animation;
mod camera;
mod orienter;
mod sheet;
mod sprite;

pub use animation::Animation;
pub use camera::Camera;
pub use orienter::{Orienter, OrienterError};
pub use sheet::{SpriteSheet, SpriteSheetError};
pub use sprite::Sprite;
