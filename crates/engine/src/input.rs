use winit::keyboard::KeyCode;

use crate::character::{Character, MovementIntent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Jump,
}

impl InputAction {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
            KeyCode::Space | KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::Jump),
            _ => None,
        }
    }

    const fn intent(self) -> Option<MovementIntent> {
        match self {
            InputAction::MoveLeft => Some(MovementIntent::MOVE_LEFT),
            InputAction::MoveRight => Some(MovementIntent::MOVE_RIGHT),
            InputAction::Jump => None,
        }
    }
}

/// Applies a key transition to the character's movement intent. Jump only
/// fires on press. Returns the action the key mapped to, if any.
pub fn apply_key(character: &mut Character, key: KeyCode, is_down: bool) -> Option<InputAction> {
    let action = InputAction::from_key(key)?;
    match (action.intent(), is_down) {
        (Some(intent), true) => character.set_movement_intent(intent),
        (Some(intent), false) => character.unset_movement_intent(intent),
        (None, true) => {
            character.jump();
        }
        (None, false) => {}
    }
    Some(action)
}
