//! Traffic cars: non-player vehicles that hold a cruise speed and keep
//! to the track centerline.

use serde::{Deserialize, Serialize};

use crate::car::Car;
use crate::race::constants::traffic;
use crate::track::{Positioned, Track};
use crate::util::vec2::Vec2;

/// Simple opponent that follows a constant speed profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficCar {
    pub car: Car,
    pub target_speed: f32,
}

impl TrafficCar {
    pub fn new(x: f32, y: f32, target_speed: f32) -> Self {
        let mut car = Car::new(x, y);
        // Traffic steers gently, it is scenery more than competition
        car.turn_rate = 1.0;
        Self { car, target_speed }
    }

    /// Bang-bang speed hold plus proportional lane keeping toward the
    /// centerline. Returns `(throttle, brake, steer)`.
    pub fn policy(&self, track: &Track) -> (f32, f32, f32) {
        let throttle = if self.car.speed < self.target_speed {
            1.0
        } else {
            0.0
        };
        let brake = if self.car.speed > self.target_speed {
            1.0
        } else {
            0.0
        };

        let offset = track.y_at(self.car.pos.x) - self.car.pos.y;
        let steer = (offset * traffic::STEER_GAIN).clamp(-1.0, 1.0);

        (throttle, brake, steer)
    }
}

impl Positioned for TrafficCar {
    fn pos(&self) -> Vec2 {
        self.car.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_holds_target_speed() {
        let track = Track::new(200.0, 200.0);
        let mut traffic = TrafficCar::new(10.0, 100.0, 5.0);

        let (throttle, brake, _) = traffic.policy(&track);
        assert_eq!(throttle, 1.0);
        assert_eq!(brake, 0.0);

        traffic.car.speed = 6.0;
        let (throttle, brake, _) = traffic.policy(&track);
        assert_eq!(throttle, 0.0);
        assert_eq!(brake, 1.0);
    }

    #[test]
    fn test_policy_steers_toward_centerline() {
        let track = Track::new(200.0, 200.0);
        let below = TrafficCar::new(10.0, 90.0, 5.0);
        let (_, _, steer) = below.policy(&track);
        assert!(steer > 0.0);

        let above = TrafficCar::new(10.0, 110.0, 5.0);
        let (_, _, steer) = above.policy(&track);
        assert!(steer < 0.0);
    }

    #[test]
    fn test_lane_keeping_converges() {
        let track = Track::new(200.0, 200.0);
        let mut traffic = TrafficCar::new(10.0, 90.0, 5.0);
        traffic.car.speed = 5.0;
        let start_offset = (traffic.car.pos.y - 100.0).abs();

        for _ in 0..10 {
            let (throttle, brake, steer) = traffic.policy(&track);
            traffic.car.apply_controls(throttle, brake, steer, 0.2, None);
            traffic.car.pos = track.wrap_position(traffic.car.pos);
        }

        let end_offset = (traffic.car.pos.y - 100.0).abs();
        assert!(end_offset < start_offset);
    }
}
