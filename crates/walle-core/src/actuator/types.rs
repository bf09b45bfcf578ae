//! Actuator table
//!
//! Every actuator the controller understands, with its wire symbol,
//! valid range and startup default. The table is fixed at compile time.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Number of actuators in the table
pub const NUM_ACTUATORS: usize = 9;

/// How an actuator interprets its commanded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// Absolute percentage of joint travel, 0..=100
    Servo,
    /// Signed percentage of speed, -100..=100
    Drive,
}

impl ActuatorKind {
    /// Valid commanded range
    pub const fn range(self) -> RangeInclusive<i32> {
        match self {
            Self::Servo => 0..=100,
            Self::Drive => -100..=100,
        }
    }

    /// Startup default (mid-scale for servos, stopped for drives)
    pub const fn default_value(self) -> i32 {
        match self {
            Self::Servo => 50,
            Self::Drive => 0,
        }
    }
}

/// Identifier of an actuator
///
/// Declaration order is significant: presets and `center_all` move the
/// actuators in this order, and keyboard selection keys `1`-`7` map to
/// the servos in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorId {
    HeadRotation,
    NeckTop,
    NeckBottom,
    EyeRight,
    EyeLeft,
    ArmLeft,
    ArmRight,
    /// Forward/back drive channel
    DriveLinear,
    /// Turn drive channel
    DriveTurn,
}

struct Spec {
    symbol: char,
    kind: ActuatorKind,
    name: &'static str,
    label: &'static str,
}

// Indexed by `ActuatorId as usize`.
const TABLE: [Spec; NUM_ACTUATORS] = [
    Spec { symbol: 'G', kind: ActuatorKind::Servo, name: "head_rotation", label: "Head Rotation" },
    Spec { symbol: 'T', kind: ActuatorKind::Servo, name: "neck_top", label: "Neck Top" },
    Spec { symbol: 'B', kind: ActuatorKind::Servo, name: "neck_bottom", label: "Neck Bottom" },
    Spec { symbol: 'U', kind: ActuatorKind::Servo, name: "eye_right", label: "Eye Right" },
    Spec { symbol: 'E', kind: ActuatorKind::Servo, name: "eye_left", label: "Eye Left" },
    Spec { symbol: 'L', kind: ActuatorKind::Servo, name: "arm_left", label: "Arm Left" },
    Spec { symbol: 'R', kind: ActuatorKind::Servo, name: "arm_right", label: "Arm Right" },
    Spec { symbol: 'Y', kind: ActuatorKind::Drive, name: "drive_linear", label: "Drive Linear" },
    Spec { symbol: 'X', kind: ActuatorKind::Drive, name: "drive_turn", label: "Drive Turn" },
];

impl ActuatorId {
    /// All actuators in declaration order
    pub const ALL: [ActuatorId; NUM_ACTUATORS] = [
        Self::HeadRotation,
        Self::NeckTop,
        Self::NeckBottom,
        Self::EyeRight,
        Self::EyeLeft,
        Self::ArmLeft,
        Self::ArmRight,
        Self::DriveLinear,
        Self::DriveTurn,
    ];

    /// Servo-style actuators in declaration order
    pub const SERVOS: [ActuatorId; 7] = [
        Self::HeadRotation,
        Self::NeckTop,
        Self::NeckBottom,
        Self::EyeRight,
        Self::EyeLeft,
        Self::ArmLeft,
        Self::ArmRight,
    ];

    /// Drive-style channels, linear first
    pub const DRIVES: [ActuatorId; 2] = [Self::DriveLinear, Self::DriveTurn];

    #[inline]
    fn spec(self) -> &'static Spec {
        &TABLE[self as usize]
    }

    /// Position of this actuator in declaration order
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-character command symbol on the wire
    #[inline]
    pub fn symbol(self) -> char {
        self.spec().symbol
    }

    #[inline]
    pub fn kind(self) -> ActuatorKind {
        self.spec().kind
    }

    /// snake_case name, as used in configuration files
    #[inline]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Human-readable label for status output
    #[inline]
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// Valid commanded range
    #[inline]
    pub fn range(self) -> RangeInclusive<i32> {
        self.kind().range()
    }

    /// Value at bridge startup
    #[inline]
    pub fn default_value(self) -> i32 {
        self.kind().default_value()
    }

    #[inline]
    pub fn is_drive(self) -> bool {
        self.kind() == ActuatorKind::Drive
    }

    /// Clamp a value into this actuator's range
    #[inline]
    pub fn clamp(self, value: i32) -> i32 {
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }

    /// Look up an actuator by its command symbol
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.symbol() == symbol)
    }

    /// Look up an actuator by its snake_case name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_matches_declaration_order() {
        for (i, id) in ActuatorId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_symbol_mapping_is_bijective() {
        let symbols: HashSet<char> = ActuatorId::ALL.iter().map(|id| id.symbol()).collect();
        assert_eq!(symbols.len(), NUM_ACTUATORS);
        for id in ActuatorId::ALL {
            assert_eq!(ActuatorId::from_symbol(id.symbol()), Some(id));
        }
        assert_eq!(ActuatorId::from_symbol('Z'), None);
    }

    #[test]
    fn test_wire_symbols() {
        assert_eq!(ActuatorId::DriveLinear.symbol(), 'Y');
        assert_eq!(ActuatorId::DriveTurn.symbol(), 'X');
        assert_eq!(ActuatorId::HeadRotation.symbol(), 'G');
        assert_eq!(ActuatorId::NeckTop.symbol(), 'T');
        assert_eq!(ActuatorId::NeckBottom.symbol(), 'B');
        assert_eq!(ActuatorId::EyeRight.symbol(), 'U');
        assert_eq!(ActuatorId::EyeLeft.symbol(), 'E');
        assert_eq!(ActuatorId::ArmLeft.symbol(), 'L');
        assert_eq!(ActuatorId::ArmRight.symbol(), 'R');
    }

    #[test]
    fn test_ranges_and_defaults() {
        for id in ActuatorId::SERVOS {
            assert_eq!(id.range(), 0..=100);
            assert_eq!(id.default_value(), 50);
            assert!(!id.is_drive());
        }
        for id in ActuatorId::DRIVES {
            assert_eq!(id.range(), -100..=100);
            assert_eq!(id.default_value(), 0);
            assert!(id.is_drive());
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(ActuatorId::NeckTop.clamp(-5), 0);
        assert_eq!(ActuatorId::NeckTop.clamp(150), 100);
        assert_eq!(ActuatorId::DriveTurn.clamp(-150), -100);
        assert_eq!(ActuatorId::DriveTurn.clamp(-42), -42);
    }

    #[test]
    fn test_names_round_trip_through_serde() {
        for id in ActuatorId::ALL {
            assert_eq!(ActuatorId::from_name(id.name()), Some(id));
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.name()));
        }
    }
}
