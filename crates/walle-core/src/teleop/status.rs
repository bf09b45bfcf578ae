//! Text status table

use std::fmt::Write;

use crate::actuator::{ActuatorId, ActuatorKind, ActuatorState};

/// Cells per bar
pub const BAR_WIDTH: usize = 20;

const FILLED: char = '█';
const EMPTY: char = '░';

/// Bar for one actuator value
///
/// Servo bars fill from the left, one cell per 5%. Drive bars grow out
/// from the middle, one cell per 10 in the direction of the sign.
pub fn bar(id: ActuatorId, value: i32) -> String {
    let value = id.clamp(value);
    let (start, end) = match id.kind() {
        ActuatorKind::Servo => (0, value as usize / 5),
        ActuatorKind::Drive => {
            let half = BAR_WIDTH / 2;
            let cells = value.unsigned_abs() as usize / 10;
            if value >= 0 {
                (half, half + cells)
            } else {
                (half - cells, half)
            }
        }
    };
    (0..BAR_WIDTH)
        .map(|i| if (start..end).contains(&i) { FILLED } else { EMPTY })
        .collect()
}

/// Render the selection and every commanded value
pub fn render(state: &ActuatorState, selected: ActuatorId) -> String {
    let rule = "-".repeat(60);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Current: {}", selected.label());
    let _ = writeln!(out, "Position: {}", format_value(selected, state.get(selected)));
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "All Positions:");
    for (id, value) in state.iter() {
        let marker = if id == selected { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:15} [{}] {}",
            marker,
            id.label(),
            bar(id, value),
            format_value(id, value)
        );
    }
    let _ = writeln!(out, "{}", rule);
    out
}

fn format_value(id: ActuatorId, value: i32) -> String {
    match id.kind() {
        ActuatorKind::Servo => format!("{}%", value),
        ActuatorKind::Drive => format!("{:+}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::ActuatorRegistry;

    fn count(bar: &str, c: char) -> usize {
        bar.chars().filter(|&x| x == c).count()
    }

    #[test]
    fn test_servo_bar() {
        assert_eq!(bar(ActuatorId::NeckTop, 0), "░".repeat(20));
        assert_eq!(bar(ActuatorId::NeckTop, 100), "█".repeat(20));
        let half = bar(ActuatorId::NeckTop, 50);
        assert_eq!(half, format!("{}{}", "█".repeat(10), "░".repeat(10)));
        assert_eq!(count(&bar(ActuatorId::NeckTop, 54), FILLED), 10);
    }

    #[test]
    fn test_drive_bar_centred() {
        assert_eq!(bar(ActuatorId::DriveLinear, 0), "░".repeat(20));
        let forward = bar(ActuatorId::DriveLinear, 30);
        assert_eq!(
            forward,
            format!("{}{}{}", "░".repeat(10), "█".repeat(3), "░".repeat(7))
        );
        let reverse = bar(ActuatorId::DriveTurn, -100);
        assert_eq!(reverse, format!("{}{}", "█".repeat(10), "░".repeat(10)));
    }

    #[test]
    fn test_render_lists_all_actuators() {
        let mut registry = ActuatorRegistry::new();
        registry.set(ActuatorId::EyeLeft, 40);
        registry.set(ActuatorId::DriveTurn, -25);
        let text = render(&registry.snapshot(), ActuatorId::EyeLeft);

        assert!(text.contains("Current: Eye Left"));
        assert!(text.contains("Position: 40%"));
        assert!(text.contains("> Eye Left"));
        assert!(text.contains("Drive Turn"));
        assert!(text.contains("-25"));
        for id in ActuatorId::ALL {
            assert!(text.contains(id.label()));
        }
    }
}
