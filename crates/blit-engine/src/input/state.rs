use std::collections::HashSet;

use crate::math::Vec2;

use super::types::{ButtonState, InputEvent, Key, KeyAction, Modifiers, MouseButton};

/// Input state for one window.
///
/// Held keys and buttons persist across frames. Mouse delta, scroll and the
/// pressed/released transition sets accumulate over a frame and are cleared
/// by [`end_frame`](Self::end_frame), which the runtime calls after each
/// `on_frame`.
#[derive(Debug, Default)]
pub struct InputState {
    modifiers: Modifiers,
    focused: bool,

    mouse_pos: Option<Vec2>,
    mouse_delta: Vec2,
    scroll: Vec2,

    keys_down: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,

    keys_pressed: HashSet<Key>,
    keys_released: HashSet<Key>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, ev: &InputEvent) {
        match *ev {
            InputEvent::Key { key, action } => match action {
                KeyAction::Press => {
                    if self.keys_down.insert(key) {
                        self.keys_pressed.insert(key);
                    }
                }
                // Held, never a fresh press.
                KeyAction::Repeat => {
                    self.keys_down.insert(key);
                }
                KeyAction::Release => {
                    if self.keys_down.remove(&key) {
                        self.keys_released.insert(key);
                    }
                }
            },

            InputEvent::MouseButton { button, state } => match state {
                ButtonState::Pressed => {
                    if self.buttons_down.insert(button) {
                        self.buttons_pressed.insert(button);
                    }
                }
                ButtonState::Released => {
                    if self.buttons_down.remove(&button) {
                        self.buttons_released.insert(button);
                    }
                }
            },

            InputEvent::MouseMoved { x, y } => {
                let pos = Vec2::new(x, y);
                // The first sample has nothing to diff against.
                if let Some(prev) = self.mouse_pos {
                    self.mouse_delta += pos - prev;
                }
                self.mouse_pos = Some(pos);
            }

            InputEvent::Scroll { dx, dy } => {
                self.scroll += Vec2::new(dx, dy);
            }

            InputEvent::ModifiersChanged(m) => self.modifiers = m,

            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // No release events arrive while unfocused.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::Resized { .. } => {}
        }
    }

    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll = Vec2::ZERO;
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
    }

    pub fn key_held(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Went down during the current frame.
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn button_held(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Last known cursor position; origin when the cursor never entered.
    pub fn mouse_pos(&self) -> Vec2 {
        self.mouse_pos.unwrap_or_default()
    }

    /// Cursor motion accumulated this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll accumulated this frame.
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn focused(&self) -> bool {
        self.focused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, action: KeyAction) -> InputEvent {
        InputEvent::Key { key, action }
    }

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::MouseMoved { x, y }
    }

    // ── keys / buttons ────────────────────────────────────────────────────

    #[test]
    fn key_held_until_released() {
        let mut s = InputState::new();
        s.apply_event(&key(Key::W, KeyAction::Press));
        assert!(s.key_held(Key::W));
        assert!(s.key_pressed(Key::W));

        s.end_frame();
        assert!(s.key_held(Key::W));
        assert!(!s.key_pressed(Key::W));

        s.apply_event(&key(Key::W, KeyAction::Release));
        assert!(!s.key_held(Key::W));
        assert!(s.key_released(Key::W));
    }

    #[test]
    fn repeat_counts_as_held() {
        let mut s = InputState::new();
        s.apply_event(&key(Key::Space, KeyAction::Repeat));
        assert!(s.key_held(Key::Space));
        assert!(!s.key_pressed(Key::Space));
    }

    #[test]
    fn repeat_after_focus_loss_is_not_a_press() {
        let mut s = InputState::new();
        s.apply_event(&key(Key::D, KeyAction::Press));
        s.end_frame();
        s.apply_event(&InputEvent::Focused(false));
        s.apply_event(&InputEvent::Focused(true));

        s.apply_event(&key(Key::D, KeyAction::Repeat));
        assert!(s.key_held(Key::D));
        assert!(!s.key_pressed(Key::D));
    }

    #[test]
    fn unseen_key_is_not_held() {
        let s = InputState::new();
        assert!(!s.key_held(Key::Unknown(42)));
        assert!(!s.button_held(MouseButton::Left));
    }

    #[test]
    fn buttons_track_press_and_release() {
        let mut s = InputState::new();
        let press = InputEvent::MouseButton {
            button: MouseButton::Middle,
            state: ButtonState::Pressed,
        };
        s.apply_event(&press);
        s.apply_event(&press);
        assert!(s.button_held(MouseButton::Middle));
        assert!(s.button_pressed(MouseButton::Middle));

        s.apply_event(&InputEvent::MouseButton {
            button: MouseButton::Middle,
            state: ButtonState::Released,
        });
        assert!(!s.button_held(MouseButton::Middle));
        assert!(s.button_released(MouseButton::Middle));
    }

    #[test]
    fn focus_loss_clears_held() {
        let mut s = InputState::new();
        s.apply_event(&InputEvent::Focused(true));
        s.apply_event(&key(Key::A, KeyAction::Press));
        s.apply_event(&InputEvent::MouseButton {
            button: MouseButton::Left,
            state: ButtonState::Pressed,
        });

        s.apply_event(&InputEvent::Focused(false));
        assert!(!s.focused());
        assert!(!s.key_held(Key::A));
        assert!(!s.button_held(MouseButton::Left));
    }

    // ── mouse ─────────────────────────────────────────────────────────────

    #[test]
    fn mouse_delta_accumulates_per_frame() {
        let mut s = InputState::new();
        s.apply_event(&moved(10.0, 10.0));
        assert_eq!(s.mouse_delta(), Vec2::ZERO);

        s.apply_event(&moved(13.0, 8.0));
        s.apply_event(&moved(15.0, 9.0));
        assert_eq!(s.mouse_pos(), Vec2::new(15.0, 9.0));
        assert_eq!(s.mouse_delta(), Vec2::new(5.0, -1.0));

        s.end_frame();
        assert_eq!(s.mouse_delta(), Vec2::ZERO);
        assert_eq!(s.mouse_pos(), Vec2::new(15.0, 9.0));
    }

    #[test]
    fn scroll_accumulates_and_resets() {
        let mut s = InputState::new();
        s.apply_event(&InputEvent::Scroll { dx: 0.0, dy: 1.0 });
        s.apply_event(&InputEvent::Scroll { dx: 0.5, dy: 2.0 });
        assert_eq!(s.scroll(), Vec2::new(0.5, 3.0));
        s.end_frame();
        assert_eq!(s.scroll(), Vec2::ZERO);
    }

    #[test]
    fn modifiers_follow_events() {
        let mut s = InputState::new();
        let m = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        s.apply_event(&InputEvent::ModifiersChanged(m));
        assert!(s.modifiers().shift && s.modifiers().any());
    }
}
