//! Pole Circuit simulation core
//!
//! The real-time simulation heart of an arcade pseudo-3D racing game:
//! track geometry and curvature, gear-based car physics, AI traffic, and
//! the per-tick race state machine (laps, crashes, timers, scoring).
//!
//! Rendering, audio synthesis and leaderboard persistence live outside
//! this crate; they consume read-only state, the event stream in
//! [`race::events`] and the final score through narrow interfaces.

pub mod config;
pub mod util;
pub mod track;
pub mod car;
pub mod race;
