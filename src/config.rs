//! Episode configuration.
//!
//! One `RaceConfig` describes everything an episode needs up front:
//! mode, difficulty, seed, timestep and the parity flags carried over
//! from the arcade original. Environment variables can override the
//! defaults; invalid values log a warning and keep the default instead
//! of aborting.

use serde::{Deserialize, Serialize};

use crate::race::constants::{physics, timing, traffic};

/// What kind of session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceMode {
    /// Solo timed lap; episode ends when the lap completes
    Qualify,
    /// Full grid with traffic, rival and a lap target
    Race,
}

impl RaceMode {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "qualify" | "qualifying" => Some(Self::Qualify),
            "race" => Some(Self::Race),
            _ => None,
        }
    }
}

/// Difficulty tier, controls the starting time limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    fn index(self) -> usize {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Expert => 2,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    pub mode: RaceMode,
    pub difficulty: Difficulty,
    /// Seed for the episode RNG; `reset` may override per call
    pub seed: u64,
    /// Fixed timestep in seconds
    pub dt: f32,
    /// Step budget before truncation
    pub max_steps: u32,
    /// Laps required to finish a race
    pub lap_target: u32,
    /// Traffic cars seeded in race mode (one CPU blocker is added on top)
    pub traffic_count: usize,
    /// Named built-in track; `None` uses the default straight course
    pub track: Option<String>,
    /// Uncap the player car and scatter bonus billboards
    pub hyper_mode: bool,
    /// Arcade parity flag: ignore the brake channel entirely
    pub disable_brake: bool,
    /// Explicit time limit override in seconds
    pub time_limit: Option<f32>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            mode: RaceMode::Race,
            difficulty: Difficulty::Beginner,
            seed: 0,
            dt: physics::DT,
            max_steps: timing::DEFAULT_MAX_STEPS,
            lap_target: timing::DEFAULT_LAP_TARGET,
            traffic_count: traffic::DEFAULT_COUNT,
            track: None,
            hyper_mode: false,
            disable_brake: false,
            time_limit: None,
        }
    }
}

impl RaceConfig {
    /// Load config from environment variables or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("RACE_MODE") {
            match RaceMode::parse(&mode) {
                Some(parsed) => config.mode = parsed,
                None => tracing::warn!("Invalid RACE_MODE '{}', using default", mode),
            }
        }

        if let Ok(difficulty) = std::env::var("RACE_DIFFICULTY") {
            match Difficulty::parse(&difficulty) {
                Some(parsed) => config.difficulty = parsed,
                None => tracing::warn!("Invalid RACE_DIFFICULTY '{}', using default", difficulty),
            }
        }

        if let Ok(seed) = std::env::var("RACE_SEED") {
            match seed.parse() {
                Ok(parsed) => config.seed = parsed,
                Err(_) => tracing::warn!("Invalid RACE_SEED '{}', using default", seed),
            }
        }

        if let Ok(count) = std::env::var("RACE_TRAFFIC") {
            match count.parse::<usize>() {
                Ok(parsed) if parsed <= 32 => config.traffic_count = parsed,
                _ => tracing::warn!("RACE_TRAFFIC must be 0-32, using default"),
            }
        }

        if let Ok(track) = std::env::var("RACE_TRACK") {
            if !track.is_empty() {
                config.track = Some(track);
            }
        }

        config.hyper_mode = env_flag("HYPER_MODE");
        config.disable_brake = env_flag("DISABLE_BRAKE");

        config
    }

    /// Validate configuration before an episode starts
    pub fn validate(&self) -> Result<(), String> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err("dt must be positive".to_string());
        }
        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".to_string());
        }
        if self.lap_target == 0 {
            return Err("lap_target must be at least 1".to_string());
        }
        if self.traffic_count > 32 {
            return Err("traffic_count cannot exceed 32".to_string());
        }
        if let Some(limit) = self.time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err("time_limit must be positive".to_string());
            }
        }
        Ok(())
    }

    /// Starting value of the race clock for this mode and difficulty
    pub fn initial_time_limit(&self) -> f32 {
        if let Some(limit) = self.time_limit {
            return limit;
        }
        let i = self.difficulty.index();
        match self.mode {
            RaceMode::Race => timing::RACE_TIME_LIMITS[i],
            RaceMode::Qualify => timing::QUALIFY_TIME_LIMITS[i],
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}
