//! Fixed-length observation vector handed to agents each step.
//!
//! Layout: `[player.x, player.y, player.speed, rival.x, rival.y,
//! rival.speed, remaining_time]` followed by the `(dx, dy)` offsets of
//! the 5 nearest traffic cars, sorted by toroidal distance and padded
//! with zeros when fewer exist.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::car::Car;
use crate::race::constants::observation::{LEN, NEAREST_K};
use crate::track::Track;
use crate::util::vec2::Vec2;

/// One step's observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f32; LEN]);

impl Observation {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Compact byte encoding, used by determinism checks and loggers
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .expect("observation encoding is infallible")
    }
}

/// Assemble the observation for the current tick
pub fn build(
    player: &Car,
    rival: &Car,
    remaining_time: f32,
    traffic_positions: &[Vec2],
    track: &Track,
) -> Observation {
    let mut values = [0.0_f32; LEN];
    values[0] = player.pos.x;
    values[1] = player.pos.y;
    values[2] = player.speed;
    values[3] = rival.pos.x;
    values[4] = rival.pos.y;
    values[5] = rival.speed;
    values[6] = remaining_time;

    // Nearest-first relative offsets, shortest-path across the wrap
    let mut offsets: SmallVec<[(f32, Vec2); 8]> = traffic_positions
        .iter()
        .map(|&p| {
            let offset = Vec2::new(track.relative_x(player.pos.x, p.x), p.y - player.pos.y);
            (track.distance(player.pos, p), offset)
        })
        .collect();
    offsets.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    for (i, (_, offset)) in offsets.iter().take(NEAREST_K).enumerate() {
        values[7 + i * 2] = offset.x;
        values[7 + i * 2 + 1] = offset.y;
    }

    Observation(values)
}
