use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::picking::CLICK_SLOP;

/// Identifier for a keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    /// Letters are stored uppercase; punctuation as typed.
    Character(char),
    Digit(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        Some(Self::from_char(ch))
    }

    pub fn from_char(ch: char) -> Self {
        if let Some(digit) = ch.to_digit(10) {
            Self::Digit(digit as u8)
        } else if ch.is_ascii_alphabetic() {
            Self::Character(ch.to_ascii_uppercase())
        } else {
            Self::Character(ch)
        }
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Escape" | "Esc" => Escape,
        "Plus" => return Some(KeyCode::Character('+')),
        "Minus" => return Some(KeyCode::Character('-')),
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Escape,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);
    pub const MIDDLE: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }
}

/// Input snapshot shared between the window event handlers.
///
/// Left-button movement is reported as drag deltas; a left press and
/// release that stay within [`CLICK_SLOP`] pixels is reported as a click.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    mouse_buttons: RwLock<HashSet<MouseButton>>,
    mouse_position: RwLock<Vec2>,
    press_origin: RwLock<Option<Vec2>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    /// Forgets held keys, e.g. when the window loses focus and the
    /// releases will never arrive.
    pub fn release_keys(&self) {
        self.keys.write().clear();
    }

    pub fn set_mouse_button_down(&self, button: MouseButton) {
        self.mouse_buttons.write().insert(button);
        if button == MouseButton::LEFT {
            *self.press_origin.write() = Some(self.mouse_position());
        }
    }

    /// Returns the click position when this release completes a click.
    pub fn set_mouse_button_up(&self, button: MouseButton) -> Option<Vec2> {
        self.mouse_buttons.write().remove(&button);
        if button != MouseButton::LEFT {
            return None;
        }
        let origin = self.press_origin.write().take()?;
        let position = self.mouse_position();
        (position.distance(origin) <= CLICK_SLOP).then_some(position)
    }

    /// Records the pointer and returns the drag delta since the last
    /// position while the left button is held.
    pub fn set_mouse_position(&self, position: Vec2) -> Option<Vec2> {
        let previous = std::mem::replace(&mut *self.mouse_position.write(), position);
        self.is_mouse_button_down(MouseButton::LEFT)
            .then(|| position - previous)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.read().contains(&button)
    }

    pub fn mouse_position(&self) -> Vec2 {
        *self.mouse_position.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_character_keys() {
        assert_eq!(
            KeyCode::from_name("Space"),
            Some(KeyCode::Named(NamedKey::Space))
        );
        assert_eq!(KeyCode::from_name("r"), Some(KeyCode::Character('R')));
        assert_eq!(KeyCode::from_name("3"), Some(KeyCode::Digit(3)));
        assert_eq!(KeyCode::from_name("+"), Some(KeyCode::Character('+')));
        assert_eq!(KeyCode::from_name("Minus"), Some(KeyCode::Character('-')));
        assert_eq!(KeyCode::from_name("Bogus"), None);
    }

    #[test]
    fn input_state_tracks_keys() {
        let state = InputState::new();
        state.set_key_down(KeyCode::Named(NamedKey::Space));
        assert!(state.is_key_down(KeyCode::Named(NamedKey::Space)));
        state.set_key_up(KeyCode::Named(NamedKey::Space));
        assert!(!state.is_key_down(KeyCode::Named(NamedKey::Space)));
        state.set_key_down(KeyCode::Digit(1));
        state.release_keys();
        assert!(!state.is_key_down(KeyCode::Digit(1)));
    }

    #[test]
    fn short_press_is_a_click() {
        let state = InputState::new();
        state.set_mouse_position(Vec2::new(100.0, 100.0));
        state.set_mouse_button_down(MouseButton::LEFT);
        assert_eq!(
            state.set_mouse_position(Vec2::new(103.0, 102.0)),
            Some(Vec2::new(3.0, 2.0))
        );
        assert_eq!(
            state.set_mouse_button_up(MouseButton::LEFT),
            Some(Vec2::new(103.0, 102.0))
        );
    }

    #[test]
    fn long_drag_is_not_a_click() {
        let state = InputState::new();
        state.set_mouse_button_down(MouseButton::LEFT);
        state.set_mouse_position(Vec2::new(40.0, 0.0));
        assert_eq!(state.set_mouse_button_up(MouseButton::LEFT), None);
        assert_eq!(state.set_mouse_position(Vec2::new(50.0, 0.0)), None);
    }

    #[test]
    fn right_button_never_clicks() {
        let state = InputState::new();
        state.set_mouse_button_down(MouseButton::RIGHT);
        assert!(state.is_mouse_button_down(MouseButton::RIGHT));
        assert_eq!(state.set_mouse_button_up(MouseButton::RIGHT), None);
    }
}
