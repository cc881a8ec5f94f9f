//! Lap crossing and overtake detection from per-tick progress samples.

use crate::track::Track;
use crate::util::vec2::Vec2;

/// A drop of more than half a lap between consecutive progress samples
/// can only be the start/finish wraparound, never backward driving
const WRAP_THRESHOLD: f32 = 0.5;

/// Did progress wrap from near 1.0 back to near 0.0 this tick?
pub fn lap_crossed(prev_progress: f32, progress: f32) -> bool {
    prev_progress - progress > WRAP_THRESHOLD
}

/// Forward progress made this tick, accounting for the wrap
pub fn progress_delta(prev_progress: f32, progress: f32) -> f32 {
    if lap_crossed(prev_progress, progress) {
        (1.0 - prev_progress) + progress
    } else {
        progress - prev_progress
    }
}

/// Window ahead of the player in which overtakes are tracked
const PASS_WINDOW: f32 = 15.0;

/// True while `other` is ahead of the player within the pass window
pub fn is_ahead(track: &Track, player: Vec2, other: Vec2) -> bool {
    let rel = track.relative_x(player.x, other.x);
    rel > 0.0 && rel <= PASS_WINDOW
}

/// An overtake completes when a car that was ahead in the window last
/// tick is now behind
pub fn passed(track: &Track, player: Vec2, other: Vec2, was_ahead: bool) -> bool {
    was_ahead && track.relative_x(player.x, other.x) <= 0.0
}
