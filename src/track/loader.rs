//! Track asset loading.
//!
//! Assets are JSON documents whose `segments` list holds either `[x, y]`
//! waypoints or `[x, y, curvature, length]` curve tuples; the loader
//! dispatches on the form it finds. Malformed assets fail fast with a
//! typed error; callers that must stay playable in degraded environments
//! use [`Track::load_or_default`], which logs and falls back to the
//! built-in straight course.

use std::path::Path;

use hashbrown::HashMap;
use serde::Deserialize;
use tracing::warn;

use crate::race::constants::surface::DEFAULT_ROAD_WIDTH;
use crate::track::curve::TrackCurve;
use crate::track::hazard::{IcyPatch, Obstacle, Puddle, SurfaceZone};
use crate::track::Track;
use crate::util::vec2::Vec2;

/// Errors raised while loading a track asset
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("failed to read track file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed track json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid track: {0}")]
    Invalid(String),
    #[error("unknown track '{0}'")]
    Unknown(String),
}

/// One entry of the `segments` list, either form
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SegmentSpec {
    /// Straight waypoint `[x, y]`
    Waypoint([f32; 2]),
    /// Curve tuple `[x, y, curvature, length]`
    Curve([f32; 4]),
}

/// On-disk track schema
#[derive(Debug, Deserialize)]
struct TrackFile {
    #[serde(default = "default_dimension")]
    width: f32,
    #[serde(default = "default_dimension")]
    height: f32,
    road_width: Option<f32>,
    #[serde(default)]
    start_x: f32,
    segments: Vec<SegmentSpec>,
    #[serde(default)]
    obstacles: Vec<Obstacle>,
    #[serde(default)]
    puddles: Vec<Puddle>,
    #[serde(default)]
    surfaces: Vec<SurfaceZone>,
    #[serde(default)]
    icy_patches: Vec<IcyPatch>,
}

fn default_dimension() -> f32 {
    200.0
}

/// Built-in tracks shipped with the crate
fn builtin_tracks() -> HashMap<&'static str, &'static str> {
    let mut tracks = HashMap::new();
    tracks.insert("fuji", include_str!("../../assets/tracks/fuji.json"));
    tracks.insert(
        "snow_mountain",
        include_str!("../../assets/tracks/snow_mountain.json"),
    );
    tracks
}

impl Track {
    /// Parse a track from its JSON description
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let file: TrackFile = serde_json::from_str(json)?;

        if file.segments.len() < 2 {
            return Err(TrackError::Invalid(
                "track requires at least two segments".into(),
            ));
        }
        if file.width <= 0.0 || file.height <= 0.0 {
            return Err(TrackError::Invalid(
                "track dimensions must be positive".into(),
            ));
        }

        let all_waypoints = file
            .segments
            .iter()
            .all(|s| matches!(s, SegmentSpec::Waypoint(_)));
        let all_curves = file
            .segments
            .iter()
            .all(|s| matches!(s, SegmentSpec::Curve(_)));
        if !all_waypoints && !all_curves {
            return Err(TrackError::Invalid(
                "segments must be all waypoints or all curve tuples".into(),
            ));
        }

        let road_width = file.road_width.unwrap_or(DEFAULT_ROAD_WIDTH);
        if road_width <= 0.0 {
            return Err(TrackError::Invalid("road_width must be positive".into()));
        }

        let mut track = if all_curves {
            let tuples: Vec<(f32, f32, f32, f32)> = file
                .segments
                .iter()
                .map(|s| match s {
                    SegmentSpec::Curve([x, y, curvature, length]) => {
                        (*x, *y, *curvature, *length)
                    }
                    SegmentSpec::Waypoint(_) => unreachable!(),
                })
                .collect();
            Track::with_curve(
                file.width,
                file.height,
                road_width,
                TrackCurve::from_tuples(&tuples),
            )
        } else {
            let mut track = Track::new(file.width, file.height);
            track.road_width = road_width;
            track.waypoints = file
                .segments
                .iter()
                .map(|s| match s {
                    SegmentSpec::Waypoint([x, y]) => Vec2::new(*x, *y),
                    SegmentSpec::Curve(_) => unreachable!(),
                })
                .collect();
            track
        };

        track.start_x = file.start_x;
        track.obstacles = file.obstacles;
        track.puddles = file.puddles;
        track.surfaces = file.surfaces;
        track.icy_patches = file.icy_patches;
        Ok(track)
    }

    /// Read a track asset from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a built-in named track
    pub fn load(name: &str) -> Result<Self, TrackError> {
        match builtin_tracks().get(name) {
            Some(json) => Self::from_json(json),
            None => Err(TrackError::Unknown(name.to_string())),
        }
    }

    /// Load a named track, falling back to the default straight course
    /// so the game stays playable when an asset is missing or corrupt
    pub fn load_or_default(name: &str) -> Self {
        match Self::load(name) {
            Ok(track) => track,
            Err(err) => {
                warn!("track '{}' unavailable ({}), using default course", name, err);
                Self::new(200.0, 200.0)
            }
        }
    }
}
