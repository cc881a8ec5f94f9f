//! Structured control input consumed once per simulation step.
//!
//! The simulation core only ever sees this one type. Legacy encodings
//! (the old discrete integer actions, bare throttle/brake flags) are
//! translated by the adapter constructors at the boundary, never inside
//! the step loop.

use serde::{Deserialize, Serialize};

/// Gear change request for this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GearCmd {
    Down,
    #[default]
    Hold,
    Up,
}

impl GearCmd {
    pub fn delta(self) -> i32 {
        match self {
            GearCmd::Down => -1,
            GearCmd::Hold => 0,
            GearCmd::Up => 1,
        }
    }
}

/// One tick of player input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Throttle in `[0, 1]`
    pub throttle: f32,
    /// Brake in `[0, 1]`
    pub brake: f32,
    /// Steering in `[-1, 1]`, negative = left
    pub steer: f32,
    #[serde(default)]
    pub gear: GearCmd,
}

impl Action {
    pub fn new(throttle: f32, brake: f32, steer: f32) -> Self {
        Self {
            throttle,
            brake,
            steer,
            gear: GearCmd::Hold,
        }
    }

    /// No input at all
    pub fn coast() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn with_gear(mut self, gear: GearCmd) -> Self {
        self.gear = gear;
        self
    }

    /// Adapter for boolean throttle/brake controllers
    pub fn from_flags(throttle: bool, brake: bool, steer: f32) -> Self {
        Self::new(
            if throttle { 1.0 } else { 0.0 },
            if brake { 1.0 } else { 0.0 },
            steer,
        )
    }

    /// Adapter for the legacy discrete action set:
    /// 0 = throttle, 1 = brake, anything else = coast
    pub fn from_legacy_discrete(action: u8) -> Self {
        match action {
            0 => Self::new(1.0, 0.0, 0.0),
            1 => Self::new(0.0, 1.0, 0.0),
            _ => Self::coast(),
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::coast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gear_delta() {
        assert_eq!(GearCmd::Down.delta(), -1);
        assert_eq!(GearCmd::Hold.delta(), 0);
        assert_eq!(GearCmd::Up.delta(), 1);
    }

    #[test]
    fn test_legacy_adapter() {
        assert_eq!(Action::from_legacy_discrete(0).throttle, 1.0);
        assert_eq!(Action::from_legacy_discrete(1).brake, 1.0);
        assert_eq!(Action::from_legacy_discrete(2), Action::coast());
        assert_eq!(Action::from_legacy_discrete(200), Action::coast());
    }

    #[test]
    fn test_flags_adapter() {
        let action = Action::from_flags(true, false, -0.5);
        assert_eq!(action.throttle, 1.0);
        assert_eq!(action.brake, 0.0);
        assert_eq!(action.steer, -0.5);
    }

    #[test]
    fn test_json_roundtrip_without_gear() {
        let action: Action =
            serde_json::from_str(r#"{"throttle": 1.0, "brake": 0.0, "steer": 0.5}"#).unwrap();
        assert_eq!(action.gear, GearCmd::Hold);
    }
}
