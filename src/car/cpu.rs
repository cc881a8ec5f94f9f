//! CPU blocker: an opponent with just enough brains to get in the way.
//!
//! A three-state machine drives it: CRUISE picks a lane and watches for
//! the player drafting up behind, BLOCK swerves across for a fixed
//! window, RECOVER eases back to the preferred lane. Light rubber-band
//! behavior without pathfinding; the RNG comes from the simulation so
//! lane picks stay reproducible under a fixed seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::car::Car;
use crate::race::constants::traffic;
use crate::track::{Positioned, Track};
use crate::util::vec2::Vec2;

/// Behavior state of a CPU blocker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    Cruise,
    Block,
    Recover,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuCar {
    pub car: Car,
    pub target_speed: f32,
    pub state: CpuState,
    /// Absolute y the car drifts back to when not blocking
    pub preferred_lane: f32,
    block_timer: f32,
    block_cooldown: f32,
    lane_timer: f32,
}

impl CpuCar {
    pub fn new(x: f32, y: f32, target_speed: f32) -> Self {
        Self {
            car: Car::new(x, y),
            target_speed,
            state: CpuState::Cruise,
            preferred_lane: y,
            block_timer: 0.0,
            block_cooldown: 0.0,
            lane_timer: 0.0,
        }
    }

    /// True when the player sits in the blocking window: directly
    /// behind within a short longitudinal gap and in the same lane.
    pub fn blocking(&self, player: &Car, track: &Track) -> bool {
        let behind = track.forward_distance(player.pos.x, self.car.pos.x);
        behind <= traffic::BLOCK_WINDOW
            && (self.car.pos.y - player.pos.y).abs() < traffic::SAME_LANE
    }

    /// Advance the state machine and return `(throttle, brake, steer)`
    /// for this tick. The caller applies the controls through the normal
    /// car physics. The stages run sequentially so a freshly triggered
    /// block swerves on the same tick it was detected.
    pub fn update(
        &mut self,
        dt: f32,
        track: &Track,
        player: &Car,
        rng: &mut impl Rng,
    ) -> (f32, f32, f32) {
        self.block_cooldown = (self.block_cooldown - dt).max(0.0);

        if self.state == CpuState::Cruise {
            self.lane_timer -= dt;
            if self.lane_timer <= 0.0 {
                self.lane_timer =
                    rng.gen_range(traffic::LANE_INTERVAL_MIN..traffic::LANE_INTERVAL_MAX);
                let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                self.preferred_lane = track.y_at(self.car.pos.x) + side * traffic::LANE_OFFSET;
            }

            if self.block_cooldown <= 0.0 && self.blocking(player, track) {
                self.state = CpuState::Block;
                self.block_timer = traffic::BLOCK_DURATION;
                self.block_cooldown = traffic::BLOCK_COOLDOWN + traffic::BLOCK_DURATION;
            }
        }

        let mut steer = self.steer_toward(self.preferred_lane);

        if self.state == CpuState::Block {
            // Swerve across the player's side of the road
            steer = if player.pos.y > self.car.pos.y {
                -1.0
            } else {
                1.0
            };
            self.block_timer -= dt;
            if self.block_timer <= 0.0 {
                self.state = CpuState::Recover;
            }
        }

        if self.state == CpuState::Recover
            && (self.preferred_lane - self.car.pos.y).abs() < traffic::RECOVER_EPSILON
        {
            self.state = CpuState::Cruise;
        }

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
        (throttle, brake, steer)
    }

    fn steer_toward(&self, target_y: f32) -> f32 {
        ((target_y - self.car.pos.y) * traffic::LANE_STEER_GAIN).clamp(-1.0, 1.0)
    }
}

impl Positioned for CpuCar {
    fn pos(&self) -> Vec2 {
        self.car.pos
    }
}
