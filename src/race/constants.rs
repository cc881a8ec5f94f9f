//! Tuning constants for the race simulation.
//!
//! Every gameplay-relevant number lives here so the arcade feel can be
//! retuned in one place. The source material carried several divergent
//! revisions of the friction and timing values; the set below is the one
//! consistent tuning this crate commits to.

/// Core physics constants
pub mod physics {
    /// Simulation tick rate in Hz
    pub const TICK_RATE: u32 = 30;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 30.0;
    /// Car collision box length (track units)
    pub const CAR_LENGTH: f32 = 2.0;
    /// Car collision box width (track units)
    pub const CAR_WIDTH: f32 = 1.0;
}

/// Transmission and engine constants
pub mod gears {
    /// Per-gear speed caps (units/second). Index 0 is low gear.
    pub const GEAR_MAX: [f32; 2] = [8.0, 16.0];
    /// Base acceleration (units/second^2)
    pub const ACCELERATION: f32 = 2.0;
    /// Extra torque per gear step: factor = 1 + GEAR_TORQUE_STEP * gear
    pub const GEAR_TORQUE_STEP: f32 = 0.5;
}

/// Steering constants
pub mod steering {
    /// Full-lock turn rate at low speed (radians/second)
    pub const TURN_RATE: f32 = 2.0;
    /// Minimum steering authority retained at top speed
    pub const MIN_AUTHORITY: f32 = 0.4;
    /// Speed (as a multiple of the gear cap) at which authority bottoms out
    pub const AUTHORITY_FALLOFF: f32 = 1.2;
}

/// Road surface and weather constants
pub mod surface {
    /// Speed multiplier while inside a puddle
    pub const PUDDLE_SPEED_FACTOR: f32 = 0.65;
    /// Maximum random angular jitter from a puddle (radians/second)
    pub const PUDDLE_ANGLE_JITTER: f32 = 0.2;
    /// Off-road speed multiplier on plain ground
    pub const OFF_ROAD_FACTOR: f32 = 0.5;
    /// Off-road speed multiplier while also in a puddle
    pub const OFF_ROAD_PUDDLE_FACTOR: f32 = 0.5;
    /// Hard speed cap while off the paved corridor (arcade "mud")
    pub const OFF_ROAD_SPEED_CAP: f32 = 4.0;
    /// Consecutive off-road ticks before the car is wrecked
    pub const OFF_ROAD_CRASH_TICKS: u32 = 90;
    /// Default paved corridor width (full width, not half)
    pub const DEFAULT_ROAD_WIDTH: f32 = 8.0;
}

/// Crash and recovery constants
pub mod crash {
    /// Seconds the car stays disabled after a collision
    pub const RECOVERY_DURATION: f32 = 2.5;
    /// Invulnerability window granted after respawn (seconds)
    pub const INVULN_DURATION: f32 = 1.0;
    /// Reward signal emitted on the crash tick
    pub const CRASH_PENALTY: f32 = -5.0;
    /// Race time subtracted when a billboard is struck (seconds)
    pub const BILLBOARD_TIME_PENALTY: f32 = 2.0;
}

/// Skid detection constants
pub mod skid {
    /// Steering magnitude beyond which a skid can start
    pub const STEER_THRESHOLD: f32 = 0.7;
    /// Minimum speed for a skid (units/second)
    pub const SPEED_THRESHOLD: f32 = 6.0;
    /// Speed multiplier applied on the skid tick
    pub const SPEED_SCALE: f32 = 0.95;
    /// How long the skid flag stays up for audio/HUD (seconds)
    pub const DURATION: f32 = 0.5;
}

/// Slipstream (draft) constants
pub mod slipstream {
    /// Longitudinal window behind a leading car (units)
    pub const WINDOW: f32 = 5.0;
    /// Maximum lateral offset to count as drafting (units)
    pub const LATERAL: f32 = 1.0;
    /// Seconds the draft must be held before the boost fires
    pub const SUSTAIN: f32 = 0.5;
    /// Speed multiplier granted by the boost
    pub const BOOST_FACTOR: f32 = 1.2;
    /// Boost cap as a multiple of the current gear's speed cap
    pub const MAX_OVERSPEED: f32 = 1.1;
}

/// Race timing constants
pub mod timing {
    /// Start-light countdown length (seconds), split over READY and SET
    pub const COUNTDOWN: f32 = 3.0;
    /// Seconds added to the clock when a lap is completed
    pub const LAP_TIME_EXTENSION: f32 = 20.0;
    /// Laps required to finish a race
    pub const DEFAULT_LAP_TARGET: u32 = 4;
    /// Step budget before an episode is truncated
    pub const DEFAULT_MAX_STEPS: u32 = 10_000;
    /// Race-mode time limits by difficulty: beginner, intermediate, expert
    pub const RACE_TIME_LIMITS: [f32; 3] = [90.0, 80.0, 75.0];
    /// Qualifying time limits by difficulty: beginner, intermediate, expert
    pub const QUALIFY_TIME_LIMITS: [f32; 3] = [73.0, 70.0, 67.0];
}

/// AI traffic constants
pub mod traffic {
    /// Default number of traffic cars seeded in race mode
    pub const DEFAULT_COUNT: usize = 4;
    /// Lane offset from the centerline (units)
    pub const LANE_OFFSET: f32 = 2.5;
    /// Traffic cruise speed range (units/second)
    pub const SPEED_MIN: f32 = 4.0;
    pub const SPEED_MAX: f32 = 7.0;
    /// Centerline steering gain for lane keeping
    pub const STEER_GAIN: f32 = 0.05;
    /// Longitudinal window in which a trailing player triggers blocking
    pub const BLOCK_WINDOW: f32 = 7.0;
    /// Lateral distance that counts as "same lane"
    pub const SAME_LANE: f32 = 0.5;
    /// Seconds a blocking swerve lasts
    pub const BLOCK_DURATION: f32 = 1.0;
    /// Cooldown before blocking can re-trigger (seconds)
    pub const BLOCK_COOLDOWN: f32 = 2.0;
    /// Lane re-pick interval bounds while cruising (seconds)
    pub const LANE_INTERVAL_MIN: f32 = 2.0;
    pub const LANE_INTERVAL_MAX: f32 = 4.0;
    /// Lateral tolerance for finishing a lane recovery
    pub const RECOVER_EPSILON: f32 = 0.1;
    /// Steering gain for CPU lane changes and recovery
    pub const LANE_STEER_GAIN: f32 = 0.5;
    /// Steering gain toward the player used by the rival car
    pub const RIVAL_STEER_GAIN: f32 = 1.0;
}

/// Arcade scoring constants
pub mod scoring {
    /// Score per unit of distance covered
    pub const DISTANCE_RATE: f32 = 1.0;
    /// Bonus for overtaking a traffic car
    pub const PASS_BONUS: f32 = 50.0;
    /// Bonus for completing a lap
    pub const LAP_BONUS: f32 = 200.0;
    /// Bonus per second left on the clock at the finish
    pub const FINISH_BONUS_PER_SEC: f32 = 200.0;
    /// Reward per unit of speed in race mode
    pub const SPEED_REWARD: f32 = 0.05;
    /// Reward per unit of lap progress in qualifying
    pub const PROGRESS_REWARD: f32 = 100.0;
    /// Reward drained per second in qualifying
    pub const QUALIFY_TIME_PENALTY: f32 = 0.1;
}

/// Observation layout constants
pub mod observation {
    /// Number of nearest traffic cars reported in the observation
    pub const NEAREST_K: usize = 5;
    /// Fixed observation length: 7 scalars + NEAREST_K (dx, dy) pairs
    pub const LEN: usize = 7 + NEAREST_K * 2;
}

/// Qualifying rank thresholds (seconds for one flying lap)
pub mod qualify {
    pub const POLE: f32 = 58.0;
    pub const FRONT_ROW: f32 = 62.0;
    pub const QUALIFIED: f32 = 70.0;
}

/// Torque multiplier for a gear index
#[inline]
pub fn gear_torque_factor(gear: usize) -> f32 {
    1.0 + gears::GEAR_TORQUE_STEP * gear as f32
}

/// Steering authority at a given speed and gear cap.
/// Full authority at rest, tapering to `MIN_AUTHORITY` near top speed.
#[inline]
pub fn steer_authority(speed: f32, gear_cap: f32) -> f32 {
    let falloff = 1.0 - speed / (gear_cap * steering::AUTHORITY_FALLOFF);
    falloff.max(steering::MIN_AUTHORITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate() {
        assert_eq!(physics::TICK_RATE, 30);
        assert!((physics::DT - 1.0 / 30.0).abs() < 0.0001);
    }

    #[test]
    fn test_gear_caps_increasing() {
        assert!(gears::GEAR_MAX[0] < gears::GEAR_MAX[1]);
    }

    #[test]
    fn test_gear_torque_factor() {
        assert!((gear_torque_factor(0) - 1.0).abs() < 1e-6);
        assert!((gear_torque_factor(1) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_steer_authority_at_rest() {
        assert!((steer_authority(0.0, gears::GEAR_MAX[0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_steer_authority_clamped_at_speed() {
        // At the gear cap authority is 1 - 1/1.2 ~= 0.167, clamped up to 0.4
        let cap = gears::GEAR_MAX[1];
        assert!((steer_authority(cap, cap) - steering::MIN_AUTHORITY).abs() < 1e-6);
    }

    #[test]
    fn test_steer_authority_monotonic() {
        let cap = gears::GEAR_MAX[1];
        let speeds = [0.0, 4.0, 8.0, 12.0, 16.0];
        for w in speeds.windows(2) {
            assert!(steer_authority(w[0], cap) >= steer_authority(w[1], cap));
        }
    }

    #[test]
    fn test_friction_factors_in_unit_range() {
        assert!(surface::PUDDLE_SPEED_FACTOR > 0.0 && surface::PUDDLE_SPEED_FACTOR < 1.0);
        assert!(surface::OFF_ROAD_FACTOR > 0.0 && surface::OFF_ROAD_FACTOR < 1.0);
        assert!(surface::OFF_ROAD_PUDDLE_FACTOR > 0.0 && surface::OFF_ROAD_PUDDLE_FACTOR < 1.0);
    }

    #[test]
    fn test_time_limits_ordering() {
        // Harder difficulties get less time
        assert!(timing::RACE_TIME_LIMITS[0] > timing::RACE_TIME_LIMITS[1]);
        assert!(timing::RACE_TIME_LIMITS[1] > timing::RACE_TIME_LIMITS[2]);
        assert!(timing::QUALIFY_TIME_LIMITS[0] > timing::QUALIFY_TIME_LIMITS[2]);
    }

    #[test]
    fn test_qualify_thresholds_ordering() {
        assert!(qualify::POLE < qualify::FRONT_ROW);
        assert!(qualify::FRONT_ROW < qualify::QUALIFIED);
    }

    #[test]
    fn test_observation_len() {
        assert_eq!(observation::LEN, 17);
    }
}
