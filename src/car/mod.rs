//! Vehicle models: the base [`Car`] plus the AI specializations in
//! [`traffic`] and [`cpu`].

pub mod cpu;
pub mod traffic;

use serde::{Deserialize, Serialize};

use crate::race::constants::{gear_torque_factor, gears, steer_authority, steering};
use crate::track::{DrivableSurface, Positioned};
use crate::util::vec2::Vec2;

pub use cpu::{CpuCar, CpuState};
pub use traffic::TrafficCar;

/// Arcade car: position, heading, speed and a two-gear transmission.
///
/// Speed is kept in `[0, gear_max[gear]]` by clamping at every mutation
/// site; `unlimited` (hyper mode) disables the upper clamp only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub pos: Vec2,
    /// Heading in radians, 0 = east
    pub angle: f32,
    /// Forward speed in units/second, never negative
    pub speed: f32,
    /// Index into `gear_max`
    pub gear: usize,
    /// Per-gear speed caps
    pub gear_max: [f32; 2],
    pub acceleration: f32,
    /// Turn rate at full steering lock (radians/second)
    pub turn_rate: f32,
    /// Total successful gear changes this episode
    pub shift_count: u32,
    /// Hyper mode flag: disables the gear speed clamp
    pub unlimited: bool,
}

impl Car {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            angle: 0.0,
            speed: 0.0,
            gear: 0,
            gear_max: gears::GEAR_MAX,
            acceleration: gears::ACCELERATION,
            turn_rate: steering::TURN_RATE,
            shift_count: 0,
            unlimited: false,
        }
    }

    /// Speed cap of the current gear
    #[inline]
    pub fn gear_cap(&self) -> f32 {
        self.gear_max[self.gear.min(self.gear_max.len() - 1)]
    }

    /// Advance the car by one timestep.
    ///
    /// Stage order matters: torque, clamp, steering, integration, then
    /// surface effects, so the integrated position uses the new speed
    /// and surface friction acts on the position just reached.
    pub fn apply_controls(
        &mut self,
        throttle: f32,
        brake: f32,
        steering_input: f32,
        dt: f32,
        surface: Option<&dyn DrivableSurface>,
    ) {
        let throttle = throttle.clamp(0.0, 1.0);
        let brake = brake.clamp(0.0, 1.0);
        let steering_input = steering_input.clamp(-1.0, 1.0);

        // Higher gears pull harder
        self.speed += self.acceleration * gear_torque_factor(self.gear) * throttle * dt;
        self.speed -= self.acceleration * brake * dt;

        let cap = self.gear_cap();
        if self.unlimited {
            self.speed = self.speed.max(0.0);
        } else {
            self.speed = self.speed.clamp(0.0, cap);
        }

        // Steering authority fades with speed to keep high-speed driving
        // stable while low-speed maneuvering stays snappy
        let authority = steer_authority(self.speed, cap);
        self.angle += steering_input * self.turn_rate * authority * dt;

        self.pos += Vec2::from_angle(self.angle) * (self.speed * dt);

        if let Some(surface) = surface {
            self.speed *= surface.friction_at(self.pos);
            self.angle += surface.slip_at(self.pos) * dt;
        }
    }

    /// Change gear by `delta`, clamped to the valid range. Returns
    /// whether the gear actually changed; only real changes count
    /// toward `shift_count` (drives shift audio/HUD feedback).
    pub fn shift(&mut self, delta: i32) -> bool {
        let top = self.gear_max.len() as i32 - 1;
        let next = (self.gear as i32 + delta).clamp(0, top) as usize;
        if next == self.gear {
            return false;
        }
        self.gear = next;
        self.shift_count += 1;
        true
    }

    /// Disable the car after a collision: dead stop, back to low gear
    pub fn crash(&mut self) {
        self.speed = 0.0;
        self.gear = 0;
    }

    /// Normalized engine load in `[0, 1]`, consumed by audio pitch
    pub fn rpm(&self) -> f32 {
        (self.speed / self.gear_cap()).clamp(0.0, 1.0)
    }
}

impl Positioned for Car {
    fn pos(&self) -> Vec2 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-friction stub so physics tests need no real track
    struct StubSurface {
        friction: f32,
        slip: f32,
    }

    impl DrivableSurface for StubSurface {
        fn on_road_at(&self, _pos: Vec2) -> bool {
            true
        }
        fn friction_at(&self, _pos: Vec2) -> f32 {
            self.friction
        }
        fn progress_at(&self, _pos: Vec2) -> f32 {
            0.0
        }
        fn slip_at(&self, _pos: Vec2) -> f32 {
            self.slip
        }
    }

    #[test]
    fn test_throttle_from_rest() {
        // One full-throttle second in low gear: speed = accel * 1 * 1,
        // position advances by the new speed along an eastward heading
        let mut car = Car::new(50.0, 50.0);
        car.apply_controls(1.0, 0.0, 0.0, 1.0, None);
        assert!((car.speed - 2.0).abs() < 1e-5);
        assert!((car.pos.x - 52.0).abs() < 1e-5);
        assert!((car.pos.y - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_gear_clamp_invariant() {
        let mut car = Car::new(0.0, 0.0);
        for _ in 0..100 {
            car.apply_controls(1.0, 0.0, 0.3, 0.1, None);
            assert!(car.speed <= car.gear_max[0] + 1e-5);
            assert!(car.speed >= 0.0);
        }
        car.shift(1);
        for _ in 0..100 {
            car.apply_controls(1.0, 0.0, 0.0, 0.1, None);
            assert!(car.speed <= car.gear_max[1] + 1e-5);
        }
    }

    #[test]
    fn test_brake_floors_at_zero() {
        let mut car = Car::new(0.0, 0.0);
        car.speed = 1.0;
        car.apply_controls(0.0, 1.0, 0.0, 2.0, None);
        assert_eq!(car.speed, 0.0);
    }

    #[test]
    fn test_higher_gear_pulls_harder() {
        let mut low = Car::new(0.0, 0.0);
        let mut high = Car::new(0.0, 0.0);
        high.shift(1);
        low.apply_controls(1.0, 0.0, 0.0, 1.0, None);
        high.apply_controls(1.0, 0.0, 0.0, 1.0, None);
        assert!(high.speed > low.speed);
        assert!((high.speed - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_steering_authority_fades_with_speed() {
        let mut slow = Car::new(0.0, 0.0);
        let mut fast = Car::new(0.0, 0.0);
        fast.shift(1);
        fast.speed = fast.gear_max[1];
        slow.apply_controls(0.0, 0.0, 1.0, 0.1, None);
        let slow_turn = slow.angle;
        fast.apply_controls(0.0, 0.0, 1.0, 0.1, None);
        assert!(fast.angle < slow_turn);
        assert!(fast.angle > 0.0);
    }

    #[test]
    fn test_shift_counting() {
        let mut car = Car::new(0.0, 0.0);
        assert!(car.shift(1));
        assert_eq!(car.shift_count, 1);
        // Already at top gear: no-ops must not count
        assert!(!car.shift(1));
        assert!(!car.shift(1));
        assert_eq!(car.shift_count, 1);
        assert!(car.shift(-1));
        assert!(car.shift(1));
        assert_eq!(car.shift_count, 3);
        // Below bottom gear clamps too
        car.shift(-1);
        assert!(!car.shift(-1));
        assert_eq!(car.shift_count, 4);
    }

    #[test]
    fn test_crash_resets() {
        let mut car = Car::new(0.0, 0.0);
        car.shift(1);
        car.speed = 12.0;
        car.crash();
        assert_eq!(car.speed, 0.0);
        assert_eq!(car.gear, 0);
    }

    #[test]
    fn test_rpm_normalized() {
        let mut car = Car::new(0.0, 0.0);
        assert_eq!(car.rpm(), 0.0);
        car.speed = car.gear_max[0];
        assert!((car.rpm() - 1.0).abs() < 1e-6);
        car.unlimited = true;
        car.speed = car.gear_max[0] * 3.0;
        assert_eq!(car.rpm(), 1.0);
    }

    #[test]
    fn test_unlimited_bypasses_cap() {
        let mut car = Car::new(0.0, 0.0);
        car.unlimited = true;
        car.speed = car.gear_max[0] + 1.0;
        car.apply_controls(1.0, 0.0, 0.0, 1.0, None);
        assert!(car.speed > car.gear_max[0]);
    }

    #[test]
    fn test_surface_friction_applied() {
        let surface = StubSurface {
            friction: 0.5,
            slip: 0.0,
        };
        let mut car = Car::new(0.0, 0.0);
        car.apply_controls(1.0, 0.0, 0.0, 1.0, Some(&surface));
        assert!((car.speed - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_surface_slip_drifts_heading() {
        let surface = StubSurface {
            friction: 1.0,
            slip: 0.2,
        };
        let mut car = Car::new(0.0, 0.0);
        car.speed = 5.0;
        car.apply_controls(0.0, 0.0, 0.0, 1.0, Some(&surface));
        assert!((car.angle - 0.2).abs() < 1e-5);
    }
}
