//! Keyboard bindings

use crate::actuator::ActuatorId;

use super::action::{Action, COARSE_STEP, FINE_STEP};

/// Escape key
pub const ESC: char = '\x1b';

/// Result of a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Action(Action),
    ShowHelp,
    Quit,
}

/// Map a key to its binding, if it has one
pub fn map_key(key: char) -> Option<KeyInput> {
    let input = match key {
        '1'..='7' => {
            let index = key as usize - '1' as usize;
            KeyInput::Action(Action::Select(ActuatorId::SERVOS[index]))
        }
        'w' => KeyInput::Action(Action::Increment(COARSE_STEP)),
        's' => KeyInput::Action(Action::Increment(-COARSE_STEP)),
        '+' | '=' | ']' => KeyInput::Action(Action::Increment(FINE_STEP)),
        '-' | '_' | '[' => KeyInput::Action(Action::Increment(-FINE_STEP)),
        '0' => KeyInput::Action(Action::CenterAll),
        'h' => KeyInput::Action(Action::Home),
        'r' => KeyInput::Action(Action::ResetCurrent),
        '?' => KeyInput::ShowHelp,
        'q' | 'Q' | ESC => KeyInput::Quit,
        _ => return None,
    };
    Some(input)
}

/// Operator instructions for the keyboard front-end
pub fn instructions() -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();
    out.push_str(&rule);
    out.push_str("\n     WALL-E SERVO CONTROL - KEYBOARD INTERFACE\n");
    out.push_str(&rule);
    out.push_str("\n\nSERVO SELECTION:\n");
    for (i, id) in ActuatorId::SERVOS.iter().enumerate() {
        out.push_str(&format!("  {} - {}\n", i + 1, id.label()));
    }
    out.push_str("\nSERVO CONTROL:\n");
    out.push_str(&format!("  w - Increase position (+{})\n", COARSE_STEP));
    out.push_str(&format!("  s - Decrease position (-{})\n", COARSE_STEP));
    out.push_str(&format!("  + / ] - Increase position (+{})\n", FINE_STEP));
    out.push_str(&format!("  - / [ - Decrease position (-{})\n", FINE_STEP));
    out.push_str("\nPRESETS:\n");
    out.push_str("  0 - Center all\n");
    out.push_str("  h - Home position\n");
    out.push_str("  r - Reset current servo\n");
    out.push_str("\nEXIT:\n");
    out.push_str("  q / ESC - Quit\n");
    out.push_str(&rule);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_keys_follow_declaration_order() {
        for (i, key) in ('1'..='7').enumerate() {
            assert_eq!(
                map_key(key),
                Some(KeyInput::Action(Action::Select(ActuatorId::SERVOS[i])))
            );
        }
        assert_eq!(map_key('8'), None);
    }

    #[test]
    fn test_increment_keys() {
        assert_eq!(map_key('w'), Some(KeyInput::Action(Action::Increment(5))));
        assert_eq!(map_key('s'), Some(KeyInput::Action(Action::Increment(-5))));
        for key in ['+', '=', ']'] {
            assert_eq!(map_key(key), Some(KeyInput::Action(Action::Increment(1))));
        }
        for key in ['-', '_', '['] {
            assert_eq!(map_key(key), Some(KeyInput::Action(Action::Increment(-1))));
        }
    }

    #[test]
    fn test_preset_and_control_keys() {
        assert_eq!(map_key('0'), Some(KeyInput::Action(Action::CenterAll)));
        assert_eq!(map_key('h'), Some(KeyInput::Action(Action::Home)));
        assert_eq!(map_key('r'), Some(KeyInput::Action(Action::ResetCurrent)));
        assert_eq!(map_key('?'), Some(KeyInput::ShowHelp));
        for key in ['q', 'Q', ESC] {
            assert_eq!(map_key(key), Some(KeyInput::Quit));
        }
        assert_eq!(map_key('x'), None);
        assert_eq!(map_key('W'), None);
    }

    #[test]
    fn test_instructions_list_every_servo() {
        let text = instructions();
        for id in ActuatorId::SERVOS {
            assert!(text.contains(id.label()));
        }
    }
}
