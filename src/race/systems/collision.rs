//! Car-versus-car proximity testing.

use crate::race::constants::physics::{CAR_LENGTH, CAR_WIDTH};
use crate::track::Track;
use crate::util::vec2::Vec2;

/// Axis-aligned proximity box used for player/traffic collisions:
/// tight in the lateral direction, slightly forgiving longitudinally.
pub fn proximity_hit(track: &Track, player: Vec2, other: Vec2) -> bool {
    let dx = track.relative_x(player.x, other.x);
    let dy = other.y - player.y;
    dx.abs() <= CAR_LENGTH * 0.75 && dy.abs() <= CAR_WIDTH / 2.0
}

/// First traffic position colliding with the player, if any
pub fn first_hit(track: &Track, player: Vec2, others: &[Vec2]) -> Option<usize> {
    others
        .iter()
        .position(|&other| proximity_hit(track, player, other))
}
