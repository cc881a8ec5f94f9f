//! Off-road, puddle and skid handling for the player car.

use rand::Rng;

use crate::car::Car;
use crate::race::constants::{skid, surface};
use crate::track::{DrivableSurface, Track};

/// Outcome of the off-road check for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffRoadOutcome {
    OnRoad,
    OffRoad,
    /// The car stayed off the road long enough to be wrecked
    Wrecked,
}

/// Cap speed off the pavement and count consecutive off-road ticks.
/// Staying off too long wrecks the car (the caller runs the shared
/// crash/recovery sequence).
pub fn apply_off_road(car: &mut Car, track: &Track, off_road_ticks: &mut u32) -> OffRoadOutcome {
    if track.on_road_at(car.pos) {
        *off_road_ticks = 0;
        return OffRoadOutcome::OnRoad;
    }

    car.speed = car.speed.min(surface::OFF_ROAD_SPEED_CAP);
    *off_road_ticks += 1;
    if *off_road_ticks > surface::OFF_ROAD_CRASH_TICKS {
        *off_road_ticks = 0;
        OffRoadOutcome::Wrecked
    } else {
        OffRoadOutcome::OffRoad
    }
}

/// Bounded random heading jitter while crossing a puddle. Deterministic
/// for a given RNG state, which the simulation seeds per episode.
pub fn apply_puddle_jitter(car: &mut Car, track: &Track, rng: &mut impl Rng, dt: f32) -> bool {
    if !track.in_puddle(car.pos) {
        return false;
    }
    let jitter = surface::PUDDLE_ANGLE_JITTER;
    car.angle += rng.gen_range(-jitter..jitter) * dt;
    true
}

/// Hard steering at speed scrubs velocity and raises the skid flag
/// for the audio/HUD hooks. Returns true when a new skid started.
pub fn apply_skid(car: &mut Car, steer: f32, skid_timer: &mut f32, dt: f32) -> bool {
    if steer.abs() > skid::STEER_THRESHOLD && car.speed > skid::SPEED_THRESHOLD {
        car.speed *= skid::SPEED_SCALE;
        let fresh = *skid_timer <= 0.0;
        *skid_timer = skid::DURATION;
        fresh
    } else {
        *skid_timer = (*skid_timer - dt).max(0.0);
        false
    }
}
