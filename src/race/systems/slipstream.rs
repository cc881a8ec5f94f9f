//! Slipstream (draft) tracking: sustained tailgating earns a capped
//! speed boost.

use crate::car::Car;
use crate::race::constants::slipstream;
use crate::track::Track;
use crate::util::vec2::Vec2;

/// Result of the slipstream update for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Clear,
    /// In the draft window, boost not yet earned
    Drafting,
    /// Boost applied this tick; `fresh` marks the first boosted tick
    Boosted { fresh: bool },
}

/// True when `leader` sits directly ahead of the player inside the
/// draft window
fn in_draft_window(track: &Track, player: Vec2, leader: Vec2) -> bool {
    let ahead = track.relative_x(player.x, leader.x);
    ahead > 0.0 && ahead <= slipstream::WINDOW && (leader.y - player.y).abs() < slipstream::LATERAL
}

/// Accumulate draft time behind any leading car and apply the boost
/// once the sustain window is met. The boost is capped relative to the
/// current gear so drafting cannot snowball indefinitely.
pub fn update(
    player: &mut Car,
    leaders: &[Vec2],
    track: &Track,
    slip_timer: &mut f32,
    dt: f32,
) -> DraftState {
    let drafting = leaders
        .iter()
        .any(|&leader| in_draft_window(track, player.pos, leader));

    if !drafting {
        *slip_timer = 0.0;
        return DraftState::Clear;
    }

    let before = *slip_timer;
    *slip_timer += dt;
    if *slip_timer < slipstream::SUSTAIN {
        return DraftState::Drafting;
    }

    let boosted = player.speed * slipstream::BOOST_FACTOR;
    player.speed = if player.unlimited {
        boosted
    } else {
        let cap = player.gear_cap() * slipstream::MAX_OVERSPEED;
        boosted.min(cap.max(player.speed))
    };
    DraftState::Boosted {
        fresh: before < slipstream::SUSTAIN,
    }
}
