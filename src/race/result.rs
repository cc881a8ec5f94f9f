//! End-of-episode summary and qualifying rank tiers.
//!
//! The scoreboard and leaderboard live outside this crate; they consume
//! the integer score and lap times collected here.

use serde::{Deserialize, Serialize};

use crate::config::RaceMode;
use crate::race::constants::qualify;
use crate::race::sim::RaceSimulation;

/// Grid position earned by a qualifying time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualifyRank {
    Pole,
    FrontRow,
    Qualified,
    /// Did not qualify
    Dnq,
}

impl QualifyRank {
    pub fn from_time(lap_time: f32) -> Self {
        if lap_time <= qualify::POLE {
            Self::Pole
        } else if lap_time <= qualify::FRONT_ROW {
            Self::FrontRow
        } else if lap_time <= qualify::QUALIFIED {
            Self::Qualified
        } else {
            Self::Dnq
        }
    }
}

/// Everything the out-of-scope leaderboard and metrics layers consume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSummary {
    pub mode: RaceMode,
    pub score: f32,
    /// Integer score for the scoreboard
    pub final_score: i64,
    pub laps: u32,
    pub lap_times: Vec<f32>,
    pub last_lap_time: Option<f32>,
    pub best_lap_time: Option<f32>,
    pub qualifying_time: Option<f32>,
    pub rank: Option<QualifyRank>,
    pub crashes: u32,
    pub passes: u32,
    pub gear_shifts: u32,
    /// Ticks the rival car spent off the road
    pub ai_offtrack: u32,
    pub episode_reward: f32,
}

/// Summarize a finished (or abandoned) episode
pub fn summarize(sim: &RaceSimulation) -> RaceSummary {
    let best_lap_time = sim
        .lap_times
        .iter()
        .copied()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = match sim.config().mode {
        RaceMode::Qualify => Some(
            sim.qualifying_time
                .map(QualifyRank::from_time)
                .unwrap_or(QualifyRank::Dnq),
        ),
        RaceMode::Race => None,
    };

    RaceSummary {
        mode: sim.config().mode,
        score: sim.score,
        final_score: sim.final_score(),
        laps: sim.lap,
        lap_times: sim.lap_times.clone(),
        last_lap_time: sim.last_lap_time,
        best_lap_time,
        qualifying_time: sim.qualifying_time,
        rank,
        crashes: sim.crashes,
        passes: sim.passes,
        gear_shifts: sim.player.shift_count,
        ai_offtrack: sim.ai_offtrack,
        episode_reward: sim.episode_reward,
    }
}
