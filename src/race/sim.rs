//! The race simulation: episode state, `reset` and the per-tick `step`
//! state machine.
//!
//! One `step(action)` call advances exactly one timestep and returns
//! before the caller may issue the next action; there is no background
//! simulation thread. The stage order inside `step` is load-bearing:
//! collisions are authoritative and short-circuit the rest of the tick,
//! and the lap-extension flag must be set before the time-up check runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::car::{Car, CpuCar, TrafficCar};
use crate::config::{RaceConfig, RaceMode};
use crate::race::action::Action;
use crate::race::constants::{crash, scoring, timing, traffic};
use crate::race::events::{EventBus, RaceEvent, StartPhase};
use crate::race::observation::{self, Observation};
use crate::race::planner::{resolve_target_speed, HoldSpeedPlanner, PlannerView, SpeedPlanner};
use crate::race::systems::{collision, progress, slipstream, surface};
use crate::track::hazard::Obstacle;
use crate::track::Track;
use crate::util::vec2::Vec2;

/// Fixed grid slots, matching the arcade original
const PLAYER_START_X: f32 = 50.0;
const RIVAL_START_X: f32 = 150.0;
/// Billboards scattered on reset in hyper mode
const HYPER_BILLBOARDS: usize = 6;

/// Everything a caller gets back from one `step`
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f32,
    /// Episode reached a terminal condition (finish, time up)
    pub terminated: bool,
    /// Step budget exhausted without a terminal condition
    pub truncated: bool,
    /// Discrete events raised this tick, in order
    pub events: SmallVec<[RaceEvent; 4]>,
}

/// Returned by `reset`
#[derive(Debug, Clone)]
pub struct ResetInfo {
    pub seed: u64,
    pub track_hash: u64,
    pub observation: Observation,
}

pub struct RaceSimulation {
    config: RaceConfig,
    pub track: Track,
    pub player: Car,
    /// Planner-driven secondary car
    pub rival: Car,
    pub traffic: Vec<TrafficCar>,
    pub blockers: Vec<CpuCar>,

    // Episode state
    pub current_step: u32,
    pub remaining_time: f32,
    pub lap: u32,
    pub lap_timer: f32,
    pub last_lap_time: Option<f32>,
    pub lap_times: Vec<f32>,
    pub score: f32,
    pub episode_reward: f32,
    pub crash_timer: f32,
    pub crashes: u32,
    pub passes: u32,
    pub skid_timer: f32,
    pub start_phase: StartPhase,
    pub start_timer: f32,
    pub qualifying_time: Option<f32>,
    /// Ticks the rival has spent off the road, for the episode summary
    pub ai_offtrack: u32,
    pub safe_point: Vec2,
    /// Marquee text for the HUD ("READY", "FINAL LAP", ...)
    pub game_message: Option<&'static str>,

    invuln_timer: f32,
    off_road_ticks: u32,
    slip_timer: f32,
    prev_progress: f32,
    /// Per traffic car: was it ahead in the pass window last tick?
    prev_ahead: Vec<bool>,
    /// Set on the tick a lap granted bonus time; suppresses the time-up
    /// termination for that tick (grace period)
    lap_extended: bool,
    finished: bool,

    planner: Box<dyn SpeedPlanner>,
    events: EventBus,
    rng: StdRng,
}

impl RaceSimulation {
    pub fn new(config: RaceConfig) -> Self {
        let seed = config.seed;
        let mut sim = Self {
            config,
            track: Track::new(200.0, 200.0),
            player: Car::new(PLAYER_START_X, 100.0),
            rival: Car::new(RIVAL_START_X, 100.0),
            traffic: Vec::new(),
            blockers: Vec::new(),
            current_step: 0,
            remaining_time: 0.0,
            lap: 0,
            lap_timer: 0.0,
            last_lap_time: None,
            lap_times: Vec::new(),
            score: 0.0,
            episode_reward: 0.0,
            crash_timer: 0.0,
            crashes: 0,
            passes: 0,
            skid_timer: 0.0,
            start_phase: StartPhase::Ready,
            start_timer: timing::COUNTDOWN,
            qualifying_time: None,
            game_message: None,
            ai_offtrack: 0,
            safe_point: Vec2::ZERO,
            invuln_timer: 0.0,
            off_road_ticks: 0,
            slip_timer: 0.0,
            prev_progress: 0.0,
            prev_ahead: Vec::new(),
            lap_extended: false,
            finished: false,
            planner: Box::new(HoldSpeedPlanner),
            events: EventBus::new(),
            rng: StdRng::seed_from_u64(seed),
        };
        sim.reset(None);
        sim
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Swap in an external speed planner for the rival car
    pub fn set_planner(&mut self, planner: Box<dyn SpeedPlanner>) {
        self.planner = planner;
    }

    /// Event stream for audio/HUD collaborators
    pub fn subscribe_events(&self) -> crossbeam_channel::Receiver<RaceEvent> {
        self.events.subscribe()
    }

    /// Deterministic fingerprint of the current track configuration
    pub fn track_hash(&self) -> u64 {
        self.track.track_hash()
    }

    /// Integer score for the scoreboard
    pub fn final_score(&self) -> i64 {
        self.score.round() as i64
    }

    /// Last completed lap time in milliseconds
    pub fn last_lap_time_ms(&self) -> Option<u64> {
        self.last_lap_time.map(|t| (t * 1000.0).round() as u64)
    }

    /// Jump straight to the green light (practice starts, tests)
    pub fn skip_countdown(&mut self) {
        self.start_timer = 0.0;
        self.start_phase = StartPhase::Go;
    }

    /// Rebuild the episode from scratch. The RNG is reseeded here and
    /// owned exclusively by the simulation, so a fixed seed reproduces
    /// the track, the grid and every later observation bit for bit.
    pub fn reset(&mut self, seed: Option<u64>) -> ResetInfo {
        let seed = seed.unwrap_or(self.config.seed);
        self.rng = StdRng::seed_from_u64(seed);

        self.track = match self.config.track.as_deref() {
            Some(name) => Track::load_or_default(name),
            None => Track::new(200.0, 200.0),
        };
        if self.config.hyper_mode {
            self.scatter_hyper_billboards();
        }

        self.player = Car::new(PLAYER_START_X, self.track.y_at(PLAYER_START_X));
        self.player.unlimited = self.config.hyper_mode;
        self.rival = Car::new(RIVAL_START_X, self.track.y_at(RIVAL_START_X));

        self.traffic.clear();
        self.blockers.clear();
        if self.config.mode == RaceMode::Race {
            self.spawn_grid();
        }
        self.prev_ahead = vec![false; self.traffic.len()];

        self.current_step = 0;
        self.remaining_time = self.config.initial_time_limit();
        self.lap = 0;
        self.lap_timer = 0.0;
        self.last_lap_time = None;
        self.lap_times.clear();
        self.score = 0.0;
        self.episode_reward = 0.0;
        self.crash_timer = 0.0;
        self.crashes = 0;
        self.passes = 0;
        self.skid_timer = 0.0;
        self.qualifying_time = None;
        self.ai_offtrack = 0;
        self.invuln_timer = 0.0;
        self.off_road_ticks = 0;
        self.slip_timer = 0.0;
        self.lap_extended = false;
        self.finished = false;

        self.start_phase = StartPhase::Ready;
        self.start_timer = timing::COUNTDOWN;
        self.game_message = Some("READY");
        self.events.emit(RaceEvent::Countdown(StartPhase::Ready));

        self.safe_point = self.player.pos;
        self.prev_progress = self.track.progress(&self.player);

        let track_hash = self.track.track_hash();
        info!(seed, track_hash, mode = ?self.config.mode, "episode reset");
        ResetInfo {
            seed,
            track_hash,
            observation: self.observe(),
        }
    }

    /// Advance one timestep
    pub fn step(&mut self, action: &Action) -> StepOutcome {
        let dt = self.config.dt;
        let mut events: SmallVec<[RaceEvent; 4]> = SmallVec::new();
        self.current_step += 1;
        self.lap_extended = false;

        // 1. Start lights run without blocking car motion; the race
        //    clock only drains once the green light is out
        if self.start_phase != StartPhase::Go {
            self.start_timer -= dt;
            let phase = if self.start_timer <= 0.0 {
                StartPhase::Go
            } else if self.start_timer <= timing::COUNTDOWN - 1.0 {
                StartPhase::Set
            } else {
                StartPhase::Ready
            };
            if phase != self.start_phase {
                self.start_phase = phase;
                self.game_message = Some(match phase {
                    StartPhase::Ready => "READY",
                    StartPhase::Set => "SET",
                    StartPhase::Go => "GO!",
                });
                self.emit(&mut events, RaceEvent::Countdown(phase));
            }
        } else {
            self.remaining_time -= dt;
            self.lap_timer += dt;
        }

        // 2. Player input; control effects freeze while wrecked
        if self.crash_timer <= 0.0 {
            let delta = action.gear.delta();
            if delta != 0 && self.player.shift(delta) {
                self.emit(
                    &mut events,
                    RaceEvent::GearShift {
                        gear: self.player.gear,
                    },
                );
            }
            let brake = if self.config.disable_brake {
                0.0
            } else {
                action.brake
            };
            self.player
                .apply_controls(action.throttle, brake, action.steer, dt, Some(&self.track));
        }

        // 3. Opponents
        if self.config.mode == RaceMode::Race {
            self.drive_rival(dt);
            for i in 0..self.traffic.len() {
                let (throttle, brake, steer) = self.traffic[i].policy(&self.track);
                self.traffic[i]
                    .car
                    .apply_controls(throttle, brake, steer, dt, Some(&self.track));
            }
            for i in 0..self.blockers.len() {
                let (throttle, brake, steer) =
                    self.blockers[i].update(dt, &self.track, &self.player, &mut self.rng);
                self.blockers[i]
                    .car
                    .apply_controls(throttle, brake, steer, dt, Some(&self.track));
            }
        }

        // 4. Keep everyone inside the track topology
        self.player.pos = self.track.wrap_position(self.player.pos);
        self.rival.pos = self.track.wrap_position(self.rival.pos);
        for t in &mut self.traffic {
            t.car.pos = self.track.wrap_position(t.car.pos);
        }
        for b in &mut self.blockers {
            b.car.pos = self.track.wrap_position(b.car.pos);
        }

        // 5. Collisions are authoritative: a hit ends the tick early
        if self.crash_timer <= 0.0 && self.invuln_timer <= 0.0 {
            let opponents = self.opponent_positions();
            let hit_traffic = self.config.mode == RaceMode::Race
                && collision::first_hit(&self.track, self.player.pos, &opponents).is_some();
            if hit_traffic || self.track.obstacle_hit(&self.player) {
                self.begin_crash(&mut events);
                return self.crash_outcome(events);
            }
        }

        let prev = self.prev_progress;

        if self.crash_timer <= 0.0 {
            // 6. Off-road: mud-cap the speed, wreck after sustained abuse
            match surface::apply_off_road(&mut self.player, &self.track, &mut self.off_road_ticks)
            {
                surface::OffRoadOutcome::Wrecked => {
                    self.begin_crash(&mut events);
                    return self.crash_outcome(events);
                }
                surface::OffRoadOutcome::OnRoad => {
                    // Last known-good spot for the respawn teleport
                    self.safe_point = self.player.pos;
                }
                surface::OffRoadOutcome::OffRoad => {}
            }

            // 7. Puddles jostle the wheel
            surface::apply_puddle_jitter(&mut self.player, &self.track, &mut self.rng, dt);

            // 8. Billboards bleed time and wreck the car, once each
            if self.track.billboard_hit(&self.player) {
                self.remaining_time -= crash::BILLBOARD_TIME_PENALTY;
                self.emit(&mut events, RaceEvent::BillboardHit);
                self.begin_crash(&mut events);
                return self.crash_outcome(events);
            }

            // 9. Skid check
            if surface::apply_skid(&mut self.player, action.steer, &mut self.skid_timer, dt) {
                self.emit(&mut events, RaceEvent::Skid);
            }

            // 10. Slipstream
            let leaders = self.opponent_positions();
            if let slipstream::DraftState::Boosted { fresh: true } = slipstream::update(
                &mut self.player,
                &leaders,
                &self.track,
                &mut self.slip_timer,
                dt,
            ) {
                self.emit(&mut events, RaceEvent::SlipstreamBoost);
            }
        }

        // 11. Crash recovery countdown and respawn
        if self.crash_timer > 0.0 {
            self.crash_timer -= dt;
            if self.crash_timer <= 0.0 {
                self.crash_timer = 0.0;
                self.player.pos = self.safe_point;
                self.player.speed = 0.0;
                self.player.angle = self.track.angle_at(self.safe_point.x);
                self.invuln_timer = crash::INVULN_DURATION;
                debug!(x = self.safe_point.x, y = self.safe_point.y, "respawned at safe point");
            }
        } else {
            self.invuln_timer = (self.invuln_timer - dt).max(0.0);
        }

        // 12. Lap crossing and overtakes
        let progress_now = self.track.progress(&self.player);
        if progress::lap_crossed(prev, progress_now) {
            self.complete_lap(&mut events);
        }
        self.prev_progress = progress_now;

        if self.config.mode == RaceMode::Race {
            for i in 0..self.traffic.len() {
                let pos = self.traffic[i].car.pos;
                if progress::passed(&self.track, self.player.pos, pos, self.prev_ahead[i]) {
                    self.passes += 1;
                    self.score += scoring::PASS_BONUS;
                }
                self.prev_ahead[i] = progress::is_ahead(&self.track, self.player.pos, pos);
            }
        }

        // 13. Reward and termination
        let mut terminated = false;
        let reward = match self.config.mode {
            RaceMode::Qualify => {
                if self.qualifying_time.is_some() {
                    terminated = true;
                    if !self.finished {
                        self.finished = true;
                        self.game_message = Some("GOAL");
                        self.emit(&mut events, RaceEvent::Finish);
                    }
                } else if self.start_phase == StartPhase::Go && self.remaining_time <= 0.0 {
                    terminated = true;
                    self.game_message = Some("TIME UP");
                }
                progress::progress_delta(prev, progress_now) * scoring::PROGRESS_REWARD
                    - scoring::QUALIFY_TIME_PENALTY * dt
            }
            RaceMode::Race => {
                self.score += self.player.speed * dt * scoring::DISTANCE_RATE;
                if self.lap >= self.config.lap_target {
                    terminated = true;
                    if !self.finished {
                        self.finished = true;
                        self.score += self.remaining_time.max(0.0) * scoring::FINISH_BONUS_PER_SEC;
                        self.game_message = Some("GOAL");
                        self.emit(&mut events, RaceEvent::Finish);
                    }
                } else if self.start_phase == StartPhase::Go
                    && self.remaining_time <= 0.0
                    && !self.lap_extended
                {
                    terminated = true;
                    self.game_message = Some("TIME UP");
                }
                self.player.speed * scoring::SPEED_REWARD
            }
        };
        let truncated = !terminated && self.current_step >= self.config.max_steps;

        // 14. Observation
        self.episode_reward += reward;
        StepOutcome {
            observation: self.observe(),
            reward,
            terminated,
            truncated,
            events,
        }
    }

    fn emit(&self, events: &mut SmallVec<[RaceEvent; 4]>, event: RaceEvent) {
        events.push(event);
        self.events.emit(event);
    }

    fn crash_outcome(&mut self, events: SmallVec<[RaceEvent; 4]>) -> StepOutcome {
        let reward = crash::CRASH_PENALTY;
        self.episode_reward += reward;
        StepOutcome {
            observation: self.observe(),
            reward,
            terminated: false,
            truncated: false,
            events,
        }
    }

    fn begin_crash(&mut self, events: &mut SmallVec<[RaceEvent; 4]>) {
        self.crashes += 1;
        self.crash_timer = crash::RECOVERY_DURATION;
        self.player.crash();
        self.game_message = Some("CRASH");
        self.emit(events, RaceEvent::Crash);
        debug!(crashes = self.crashes, "player wrecked");
    }

    fn complete_lap(&mut self, events: &mut SmallVec<[RaceEvent; 4]>) {
        self.lap += 1;
        let lap_time = self.lap_timer;
        self.last_lap_time = Some(lap_time);
        self.lap_times.push(lap_time);
        self.lap_timer = 0.0;
        self.emit(
            events,
            RaceEvent::LapComplete {
                lap: self.lap,
                time: lap_time,
            },
        );
        match self.config.mode {
            RaceMode::Race => {
                self.remaining_time += timing::LAP_TIME_EXTENSION;
                self.score += scoring::LAP_BONUS;
                self.lap_extended = true;
                if self.lap + 1 == self.config.lap_target {
                    self.game_message = Some("FINAL LAP");
                    self.emit(events, RaceEvent::FinalLap);
                }
            }
            RaceMode::Qualify => {
                if self.qualifying_time.is_none() {
                    self.qualifying_time = Some(lap_time);
                }
            }
        }
        info!(lap = self.lap, time = lap_time, "lap completed");
    }

    /// Planner target speed plus proportional steering toward the
    /// player, wrapped across the track
    fn drive_rival(&mut self, dt: f32) {
        let view = PlannerView {
            x: self.rival.pos.x,
            y: self.rival.pos.y,
            speed: self.rival.speed,
        };
        let target = resolve_target_speed(self.planner.as_mut(), &view);

        let dx = self.track.relative_x(self.rival.pos.x, self.player.pos.x);
        let dy = self.player.pos.y - self.rival.pos.y;
        let mut error = dy.atan2(dx) - self.rival.angle;
        while error > std::f32::consts::PI {
            error -= std::f32::consts::TAU;
        }
        while error < -std::f32::consts::PI {
            error += std::f32::consts::TAU;
        }
        let steer = (error * traffic::RIVAL_STEER_GAIN).clamp(-1.0, 1.0);

        let throttle = if self.rival.speed < target { 1.0 } else { 0.0 };
        let brake = if self.rival.speed > target { 1.0 } else { 0.0 };
        self.rival
            .apply_controls(throttle, brake, steer, dt, Some(&self.track));
        if !self.track.on_road(&self.rival) {
            self.ai_offtrack += 1;
        }
    }

    fn observe(&self) -> Observation {
        let opponents = self.opponent_positions();
        observation::build(
            &self.player,
            &self.rival,
            self.remaining_time,
            &opponents,
            &self.track,
        )
    }

    fn opponent_positions(&self) -> SmallVec<[Vec2; 8]> {
        self.traffic
            .iter()
            .map(|t| t.car.pos)
            .chain(self.blockers.iter().map(|b| b.car.pos))
            .collect()
    }

    /// Seed the race grid: traffic spread around the lap in alternating
    /// lanes, plus one CPU blocker ahead of the player
    fn spawn_grid(&mut self) {
        for i in 0..self.config.traffic_count {
            let x = self.rng.gen_range(0.0..self.track.width);
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = self.track.y_at(x) + side * traffic::LANE_OFFSET;
            let target = self.rng.gen_range(traffic::SPEED_MIN..traffic::SPEED_MAX);
            let mut car = TrafficCar::new(x, y, target);
            car.car.speed = target;
            self.traffic.push(car);
        }

        if self.config.traffic_count > 0 {
            let x = (PLAYER_START_X + 25.0).rem_euclid(self.track.width);
            let target = self.rng.gen_range(traffic::SPEED_MIN..traffic::SPEED_MAX);
            let mut blocker = CpuCar::new(x, self.track.y_at(x), target);
            blocker.car.speed = target;
            self.blockers.push(blocker);
        }
    }

    fn scatter_hyper_billboards(&mut self) {
        for _ in 0..HYPER_BILLBOARDS {
            let x = self.rng.gen_range(0.0..self.track.width);
            let offset = self.rng.gen_range(-self.track.road_width..self.track.road_width);
            let y = self.track.y_at(x) + offset;
            self.track.obstacles.push(Obstacle {
                x,
                y,
                width: 3.0,
                height: 3.0,
                billboard: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::action::GearCmd;

    /// Race config with a one-second tick, which makes single-step
    /// effects (slipstream sustain, lap timing) easy to stage
    fn race_config() -> RaceConfig {
        RaceConfig {
            dt: 1.0,
            seed: 42,
            ..Default::default()
        }
    }

    fn quiet_config() -> RaceConfig {
        RaceConfig {
            dt: 1.0,
            seed: 42,
            traffic_count: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_reset_initial_state() {
        let mut sim = RaceSimulation::new(race_config());
        let info = sim.reset(None);
        assert_eq!(sim.start_phase, StartPhase::Ready);
        assert_eq!(sim.player.pos.x, PLAYER_START_X);
        assert_eq!(sim.rival.pos.x, RIVAL_START_X);
        assert_eq!(info.observation.as_slice().len(), 17);
        assert_eq!(sim.lap, 0);
        assert!(sim.remaining_time > 0.0);
    }

    #[test]
    fn test_reset_seed_determinism() {
        let mut sim = RaceSimulation::new(race_config());
        let a = sim.reset(Some(42));
        let b = sim.reset(Some(42));
        assert_eq!(a.track_hash, b.track_hash);
        assert_eq!(a.observation.to_bytes(), b.observation.to_bytes());
    }

    #[test]
    fn test_step_determinism_over_episode() {
        let run = || {
            let mut sim = RaceSimulation::new(race_config());
            sim.reset(Some(7));
            let mut bytes = Vec::new();
            for i in 0..200 {
                let action = Action::new(0.5, 0.0, if i % 3 == 0 { 0.2 } else { -0.1 });
                let outcome = sim.step(&action);
                bytes.extend(outcome.observation.to_bytes());
            }
            (sim.track_hash(), bytes)
        };
        let (h1, o1) = run();
        let (h2, o2) = run();
        assert_eq!(h1, h2);
        assert_eq!(o1, o2);
    }

    #[test]
    fn test_countdown_sequence() {
        let mut sim = RaceSimulation::new(quiet_config());
        assert_eq!(sim.start_phase, StartPhase::Ready);

        let outcome = sim.step(&Action::coast());
        assert_eq!(sim.start_phase, StartPhase::Set);
        assert!(outcome
            .events
            .contains(&RaceEvent::Countdown(StartPhase::Set)));

        sim.step(&Action::coast());
        let outcome = sim.step(&Action::coast());
        assert_eq!(sim.start_phase, StartPhase::Go);
        assert!(outcome
            .events
            .contains(&RaceEvent::Countdown(StartPhase::Go)));
    }

    #[test]
    fn test_clock_waits_for_green_light() {
        let mut sim = RaceSimulation::new(quiet_config());
        let before = sim.remaining_time;
        sim.step(&Action::coast());
        assert_eq!(sim.remaining_time, before);

        sim.skip_countdown();
        sim.step(&Action::coast());
        assert!(sim.remaining_time < before);
    }

    #[test]
    fn test_countdown_does_not_block_motion() {
        let mut sim = RaceSimulation::new(quiet_config());
        let x0 = sim.player.pos.x;
        sim.step(&Action::new(1.0, 0.0, 0.0));
        assert!(sim.player.pos.x > x0);
    }

    /// Park a traffic car dead on the player so the proximity box hits
    /// after the movement stages run
    fn park_on_player(sim: &mut RaceSimulation) {
        sim.traffic[0].car.pos = sim.player.pos;
        sim.traffic[0].car.speed = 0.0;
        sim.traffic[0].target_speed = 0.0;
    }

    #[test]
    fn test_traffic_collision_triggers_crash() {
        let mut sim = RaceSimulation::new(race_config());
        sim.skip_countdown();
        park_on_player(&mut sim);
        let outcome = sim.step(&Action::coast());
        assert_eq!(sim.crashes, 1);
        assert!(sim.crash_timer > 0.0);
        assert_eq!(sim.player.speed, 0.0);
        assert!(outcome.reward < 0.0);
        assert!(outcome.events.contains(&RaceEvent::Crash));
    }

    #[test]
    fn test_crash_recovery_respawns_at_safe_point() {
        let mut sim = RaceSimulation::new(race_config());
        sim.skip_countdown();
        // Drive a bit to establish a safe point on the road
        sim.step(&Action::new(1.0, 0.0, 0.0));
        let safe = sim.safe_point;

        park_on_player(&mut sim);
        sim.step(&Action::coast());
        assert!(sim.crash_timer > 0.0);

        // Ride out the recovery window (2.5s at a 1s tick)
        for _ in 0..3 {
            sim.step(&Action::coast());
        }
        assert_eq!(sim.crash_timer, 0.0);
        assert_eq!(sim.player.pos, safe);
        assert_eq!(sim.player.speed, 0.0);
    }

    #[test]
    fn test_controls_frozen_while_crashed() {
        let mut sim = RaceSimulation::new(race_config());
        sim.skip_countdown();
        park_on_player(&mut sim);
        sim.step(&Action::coast());
        let x = sim.player.pos.x;
        sim.step(&Action::new(1.0, 0.0, 0.0));
        assert_eq!(sim.player.pos.x, x);
        assert_eq!(sim.player.speed, 0.0);
    }

    #[test]
    fn test_lap_crossing_counts_and_extends_time() {
        let mut sim = RaceSimulation::new(quiet_config());
        sim.skip_countdown();

        sim.player.pos.x = sim.track.start_x + sim.track.width - 1.0;
        sim.step(&Action::coast());
        let before_time = sim.remaining_time;

        sim.player.pos.x = sim.track.start_x + 1.0;
        let outcome = sim.step(&Action::coast());
        assert_eq!(sim.lap, 1);
        assert_eq!(sim.lap_timer, 0.0);
        assert!(sim.last_lap_time.is_some());
        assert!(sim.remaining_time > before_time);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, RaceEvent::LapComplete { lap: 1, .. })));
    }

    #[test]
    fn test_repeated_laps() {
        let mut sim = RaceSimulation::new(quiet_config());
        sim.skip_countdown();
        for _ in 0..4 {
            sim.player.pos.x = sim.track.start_x + sim.track.width - 1.0;
            sim.step(&Action::coast());
            sim.player.pos.x = sim.track.start_x + 1.0;
            sim.step(&Action::coast());
        }
        assert!(sim.lap >= 4);
    }

    #[test]
    fn test_time_up_terminates() {
        let config = RaceConfig {
            time_limit: Some(1.5),
            ..quiet_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        let outcome = sim.step(&Action::coast());
        assert!(!outcome.terminated);
        let outcome = sim.step(&Action::coast());
        assert!(outcome.terminated);
    }

    #[test]
    fn test_lap_grace_defers_time_up() {
        let config = RaceConfig {
            time_limit: Some(2.0),
            ..quiet_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        sim.player.pos.x = sim.track.start_x + sim.track.width - 1.0;
        sim.step(&Action::coast());
        // Clock would expire this tick, but the lap bonus arrives first
        sim.player.pos.x = sim.track.start_x + 1.0;
        let outcome = sim.step(&Action::coast());
        assert!(!outcome.terminated);
        assert!(sim.remaining_time > 0.0);
    }

    #[test]
    fn test_offroad_slows_the_car() {
        let mut sim = RaceSimulation::new(quiet_config());
        sim.skip_countdown();
        sim.player.pos.y = 1.0;
        sim.player.gear = 1;
        sim.step(&Action::new(1.0, 0.0, 0.0));
        // Throttle alone would reach 3.0; off-road friction halves it
        assert!(sim.player.speed < 2.0);
    }

    #[test]
    fn test_slipstream_boost() {
        let mut sim = RaceSimulation::new(race_config());
        sim.skip_countdown();
        // Move everyone but the lead car far out of the draft picture
        for t in sim.traffic.iter_mut().skip(1) {
            t.car.pos.y = 150.0;
        }
        for b in sim.blockers.iter_mut() {
            b.car.pos.y = 150.0;
        }
        let lead_pos = sim.traffic[0].car.pos;
        sim.traffic[0].target_speed = 5.0;
        sim.traffic[0].car.speed = 5.0;
        sim.player.pos = Vec2::new(lead_pos.x - 3.0, lead_pos.y);
        sim.player.gear = 1;
        sim.player.speed = 5.0;
        let outcome = sim.step(&Action::coast());
        assert!(sim.player.speed > 5.0);
        assert!(outcome.events.contains(&RaceEvent::SlipstreamBoost));
    }

    #[test]
    fn test_billboard_bleeds_time_and_wrecks() {
        let mut sim = RaceSimulation::new(quiet_config());
        sim.skip_countdown();
        sim.track.obstacles.push(Obstacle {
            x: 60.0,
            y: 100.0,
            width: 4.0,
            height: 4.0,
            billboard: true,
        });
        sim.player.pos = Vec2::new(60.0, 100.0);
        let before = sim.remaining_time;
        let outcome = sim.step(&Action::new(1.0, 0.0, 0.0));
        assert!(sim.remaining_time < before);
        assert!(sim.crash_timer > 0.0);
        assert!(sim.track.obstacles.is_empty());
        assert!(outcome.events.contains(&RaceEvent::BillboardHit));
    }

    #[test]
    fn test_gear_shift_event() {
        let mut sim = RaceSimulation::new(quiet_config());
        sim.skip_countdown();
        let outcome = sim.step(&Action::coast().with_gear(GearCmd::Up));
        assert_eq!(sim.player.gear, 1);
        assert_eq!(sim.player.shift_count, 1);
        assert!(outcome
            .events
            .contains(&RaceEvent::GearShift { gear: 1 }));
    }

    #[test]
    fn test_skid_event_and_penalty() {
        // Fine timestep keeps the hard turn from leaving the road
        // before the skid check runs
        let config = RaceConfig {
            dt: 0.1,
            ..quiet_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        sim.player.gear = 1;
        sim.player.speed = 10.0;
        let outcome = sim.step(&Action::new(0.0, 0.0, 0.9));
        assert!(outcome.events.contains(&RaceEvent::Skid));
        assert!(sim.skid_timer > 0.0);
        assert!(sim.player.speed < 10.0);
    }

    #[test]
    fn test_qualify_terminates_on_full_lap() {
        let config = RaceConfig {
            mode: RaceMode::Qualify,
            ..quiet_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        assert!(sim.traffic.is_empty());

        sim.player.pos.x = sim.track.start_x + sim.track.width - 1.0;
        sim.step(&Action::coast());
        sim.player.pos.x = sim.track.start_x + 1.0;
        let outcome = sim.step(&Action::coast());
        assert!(outcome.terminated);
        assert!(sim.qualifying_time.is_some());
        assert!(outcome.events.contains(&RaceEvent::Finish));
    }

    #[test]
    fn test_race_finish_awards_time_bonus() {
        let config = RaceConfig {
            lap_target: 1,
            ..quiet_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        sim.player.pos.x = sim.track.start_x + sim.track.width - 1.0;
        sim.step(&Action::coast());
        let score_before = sim.score;
        sim.player.pos.x = sim.track.start_x + 1.0;
        let outcome = sim.step(&Action::coast());
        assert!(outcome.terminated);
        assert!(outcome.events.contains(&RaceEvent::Finish));
        assert!(sim.score > score_before + scoring::LAP_BONUS);
    }

    #[test]
    fn test_observation_padding_with_sparse_traffic() {
        let config = RaceConfig {
            traffic_count: 2,
            ..race_config()
        };
        let sim = RaceSimulation::new(config);
        // 2 traffic + 1 blocker = 3 pairs, the last 2 pairs stay zero
        let obs = sim.observe();
        assert_eq!(obs.0[13], 0.0);
        assert_eq!(obs.0[14], 0.0);
        assert_eq!(obs.0[15], 0.0);
        assert_eq!(obs.0[16], 0.0);
    }

    #[test]
    fn test_hyper_mode_uncaps_and_scatters_billboards() {
        let config = RaceConfig {
            hyper_mode: true,
            ..quiet_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        assert!(sim.player.unlimited);
        assert_eq!(sim.track.obstacles.len(), HYPER_BILLBOARDS);

        // Clear the scattered signs so the speed check cannot crash
        sim.track.obstacles.clear();
        sim.player.speed = sim.player.gear_max[0] + 1.0;
        sim.player.pos.y = sim.track.y_at(sim.player.pos.x);
        sim.step(&Action::new(1.0, 0.0, 0.0));
        assert!(sim.player.speed > sim.player.gear_max[0]);
    }

    #[test]
    fn test_overtake_counting() {
        let config = RaceConfig {
            traffic_count: 1,
            ..race_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        // Park a traffic car just ahead, then teleport past it
        sim.traffic[0].car.pos = Vec2::new(sim.player.pos.x + 5.0, sim.player.pos.y + 3.0);
        sim.traffic[0].target_speed = 0.0;
        sim.traffic[0].car.speed = 0.0;
        sim.step(&Action::coast());

        sim.player.pos.x += 10.0;
        let passes_before = sim.passes;
        let score_before = sim.score;
        sim.step(&Action::coast());
        assert_eq!(sim.passes, passes_before + 1);
        assert!(sim.score >= score_before + scoring::PASS_BONUS);
    }

    #[test]
    fn test_event_bus_delivery() {
        let mut sim = RaceSimulation::new(quiet_config());
        let rx = sim.subscribe_events();
        sim.skip_countdown();
        sim.step(&Action::coast().with_gear(GearCmd::Up));
        let received: Vec<_> = rx.try_iter().collect();
        assert!(received.contains(&RaceEvent::GearShift { gear: 1 }));
    }

    #[test]
    fn test_step_budget_truncates() {
        let config = RaceConfig {
            max_steps: 3,
            time_limit: Some(1000.0),
            ..quiet_config()
        };
        let mut sim = RaceSimulation::new(config);
        sim.skip_countdown();
        sim.step(&Action::coast());
        sim.step(&Action::coast());
        let outcome = sim.step(&Action::coast());
        assert!(outcome.truncated);
        assert!(!outcome.terminated);
    }
}
