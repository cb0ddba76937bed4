//! Input subsystem.
//!
//! The public API does not expose winit types. The runtime translates
//! platform events through [`platform::winit`] and feeds them to the
//! window's [`InputState`], which applications read by reference.

pub mod platform;
mod state;
mod types;

pub use state::InputState;
pub use types::{ButtonState, InputEvent, Key, KeyAction, Modifiers, MouseButton};
