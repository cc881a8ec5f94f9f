//! Track geometry: centerline lookups, the paved corridor, lap progress
//! and surface hazards.
//!
//! A track is either waypoint-based (piecewise-linear centerline over a
//! toroidal strip, the classic arcade loop) or curve-based (an arbitrary
//! bounded course described by a [`TrackCurve`]). Exactly one of the two
//! is authoritative for centerline and progress queries.

pub mod curve;
pub mod hazard;
pub mod loader;

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::race::constants::surface;
use crate::util::vec2::Vec2;

pub use curve::{CurveSegment, TrackCurve};
pub use hazard::{IcyPatch, Obstacle, Puddle, SurfaceZone};
pub use loader::TrackError;

/// Anything with a position in track space
pub trait Positioned {
    fn pos(&self) -> Vec2;
}

impl Positioned for Vec2 {
    fn pos(&self) -> Vec2 {
        *self
    }
}

/// Surface queries the car physics needs from a track.
///
/// Kept object-safe so physics can run against a stub surface in tests.
pub trait DrivableSurface {
    /// Is the position inside the paved corridor?
    fn on_road_at(&self, pos: Vec2) -> bool;
    /// Combined speed multiplier from puddles, surface zones and off-road
    fn friction_at(&self, pos: Vec2) -> f32;
    /// Fractional lap progress in `[0, 1)`
    fn progress_at(&self, pos: Vec2) -> f32;
    /// Heading drift (radians/second) from icy patches
    fn slip_at(&self, pos: Vec2) -> f32;
}

#[derive(Debug, Clone)]
pub struct Track {
    /// Bounding box of the track space
    pub width: f32,
    pub height: f32,
    /// Full width of the paved corridor
    pub road_width: f32,
    /// X coordinate of the start/finish line
    pub start_x: f32,
    /// Piecewise-linear centerline, parameterized by fractional x
    pub waypoints: Vec<Vec2>,
    /// Optional curve centerline; overrides `waypoints` when present
    pub curve: Option<TrackCurve>,
    pub obstacles: Vec<Obstacle>,
    pub puddles: Vec<Puddle>,
    pub surfaces: Vec<SurfaceZone>,
    pub icy_patches: Vec<IcyPatch>,
}

impl Track {
    /// Minimal straight course down the middle of the bounding box
    pub fn new(width: f32, height: f32) -> Self {
        let mid = height / 2.0;
        Self {
            width,
            height,
            road_width: surface::DEFAULT_ROAD_WIDTH,
            start_x: 0.0,
            waypoints: vec![Vec2::new(0.0, mid), Vec2::new(width, mid)],
            curve: None,
            obstacles: Vec::new(),
            puddles: Vec::new(),
            surfaces: Vec::new(),
            icy_patches: Vec::new(),
        }
    }

    /// Bounded course following a curve centerline
    pub fn with_curve(width: f32, height: f32, road_width: f32, curve: TrackCurve) -> Self {
        Self {
            width,
            height,
            road_width,
            start_x: 0.0,
            waypoints: Vec::new(),
            curve: Some(curve),
            obstacles: Vec::new(),
            puddles: Vec::new(),
            surfaces: Vec::new(),
            icy_patches: Vec::new(),
        }
    }

    /// Centerline height at `x`. Curve tracks treat `x` as arc length.
    pub fn y_at(&self, x: f32) -> f32 {
        if let Some(curve) = &self.curve {
            return curve.point_at(x).y;
        }
        match self.waypoint_span(x) {
            Some((a, b, frac)) => a.y + (b.y - a.y) * frac,
            None => self.height / 2.0,
        }
    }

    /// Centerline heading at `x` in radians
    pub fn angle_at(&self, x: f32) -> f32 {
        if let Some(curve) = &self.curve {
            return curve.tangent_at(x).angle();
        }
        match self.waypoint_span(x) {
            Some((a, b, _)) => (b - a).angle(),
            None => 0.0,
        }
    }

    /// Signed centerline curvature at `x` (1/radius, finite differences
    /// for curve tracks, zero for piecewise-linear ones)
    pub fn curvature_at(&self, x: f32) -> f32 {
        match &self.curve {
            Some(curve) => {
                let delta = 1.0;
                let a = curve.tangent_at(x).angle();
                let b = curve.tangent_at(x + delta).angle();
                let mut dtheta = b - a;
                while dtheta > std::f32::consts::PI {
                    dtheta -= std::f32::consts::TAU;
                }
                while dtheta < -std::f32::consts::PI {
                    dtheta += std::f32::consts::TAU;
                }
                dtheta / delta
            }
            None => 0.0,
        }
    }

    /// Bracketing waypoints and interpolation fraction for `x`
    fn waypoint_span(&self, x: f32) -> Option<(Vec2, Vec2, f32)> {
        let n = self.waypoints.len();
        if n < 2 || self.width <= 0.0 {
            return None;
        }
        let f = (x / self.width).rem_euclid(1.0);
        let t = f * (n - 1) as f32;
        let i = (t.floor() as usize).min(n - 2);
        Some((self.waypoints[i], self.waypoints[i + 1], t - i as f32))
    }

    pub fn on_road(&self, p: &impl Positioned) -> bool {
        self.on_road_at(p.pos())
    }

    pub fn friction_factor(&self, p: &impl Positioned) -> f32 {
        self.friction_at(p.pos())
    }

    /// Fractional position along one lap, in `[0, 1)`.
    ///
    /// Separate from `on_road` on purpose: leaving the road laterally
    /// must not reset longitudinal progress.
    pub fn progress(&self, p: &impl Positioned) -> f32 {
        self.progress_at(p.pos())
    }

    pub fn slip_angle(&self, p: &impl Positioned) -> f32 {
        self.slip_at(p.pos())
    }

    pub fn in_puddle(&self, pos: Vec2) -> bool {
        self.puddles.iter().any(|puddle| puddle.contains(pos))
    }

    /// One-shot billboard collision: removes the struck billboard so it
    /// cannot be hit again, and reports whether a hit happened.
    pub fn billboard_hit(&mut self, p: &impl Positioned) -> bool {
        let pos = p.pos();
        if let Some(i) = self
            .obstacles
            .iter()
            .position(|o| o.billboard && o.hits_car(pos))
        {
            self.obstacles.remove(i);
            return true;
        }
        false
    }

    /// Collision test against solid (non-billboard) obstacles
    pub fn obstacle_hit(&self, p: &impl Positioned) -> bool {
        let pos = p.pos();
        self.obstacles
            .iter()
            .any(|o| !o.billboard && o.hits_car(pos))
    }

    /// Wrap or clamp a position according to the track topology: curve
    /// courses are bounded boxes, waypoint courses wrap in the travel
    /// direction only and leave `y` free for off-track excursions.
    pub fn wrap_position(&self, pos: Vec2) -> Vec2 {
        if self.curve.is_some() {
            Vec2::new(pos.x.clamp(0.0, self.width), pos.y.clamp(0.0, self.height))
        } else {
            Vec2::new(pos.x.rem_euclid(self.width), pos.y)
        }
    }

    /// Shortest separation between two positions, respecting the x wrap
    /// of waypoint tracks
    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        let dy = a.y - b.y;
        let dx = if self.curve.is_some() {
            a.x - b.x
        } else {
            let raw = (a.x - b.x).abs();
            raw.min(self.width - raw)
        };
        (dx * dx + dy * dy).sqrt()
    }

    /// Shortest signed x offset from `from` to `to` (positive = ahead)
    pub fn relative_x(&self, from: f32, to: f32) -> f32 {
        if self.curve.is_some() {
            to - from
        } else {
            (to - from + self.width / 2.0).rem_euclid(self.width) - self.width / 2.0
        }
    }

    /// Toroidal distance from `from` forward (in +x) to `to`
    pub fn forward_distance(&self, from: f32, to: f32) -> f32 {
        if self.curve.is_some() {
            to - from
        } else {
            (to - from).rem_euclid(self.width)
        }
    }

    /// Deterministic fingerprint over every structural field.
    ///
    /// Recomputed on each call so hazard mutations (billboards consumed
    /// mid-race) show up; uses FxHasher, which is stable across processes
    /// unlike the std `RandomState`.
    pub fn track_hash(&self) -> u64 {
        fn write_f32(hasher: &mut FxHasher, v: f32) {
            hasher.write_u32(v.to_bits());
        }
        let mut hasher = FxHasher::default();

        write_f32(&mut hasher, self.width);
        write_f32(&mut hasher, self.height);
        write_f32(&mut hasher, self.road_width);
        write_f32(&mut hasher, self.start_x);

        hasher.write_usize(self.waypoints.len());
        for wp in &self.waypoints {
            write_f32(&mut hasher, wp.x);
            write_f32(&mut hasher, wp.y);
        }

        match &self.curve {
            Some(curve) => {
                hasher.write_u8(1);
                hasher.write_usize(curve.segments().len());
                for seg in curve.segments() {
                    write_f32(&mut hasher, seg.x);
                    write_f32(&mut hasher, seg.y);
                    write_f32(&mut hasher, seg.curvature);
                    write_f32(&mut hasher, seg.length);
                }
            }
            None => hasher.write_u8(0),
        }

        hasher.write_usize(self.obstacles.len());
        for o in &self.obstacles {
            write_f32(&mut hasher, o.x);
            write_f32(&mut hasher, o.y);
            write_f32(&mut hasher, o.width);
            write_f32(&mut hasher, o.height);
            hasher.write_u8(o.billboard as u8);
        }
        hasher.write_usize(self.puddles.len());
        for p in &self.puddles {
            write_f32(&mut hasher, p.x);
            write_f32(&mut hasher, p.y);
            write_f32(&mut hasher, p.radius);
        }
        hasher.write_usize(self.surfaces.len());
        for z in &self.surfaces {
            write_f32(&mut hasher, z.x);
            write_f32(&mut hasher, z.y);
            write_f32(&mut hasher, z.width);
            write_f32(&mut hasher, z.height);
            write_f32(&mut hasher, z.friction);
        }
        hasher.write_usize(self.icy_patches.len());
        for i in &self.icy_patches {
            write_f32(&mut hasher, i.x);
            write_f32(&mut hasher, i.y);
            write_f32(&mut hasher, i.radius);
            write_f32(&mut hasher, i.drift);
        }

        hasher.finish()
    }
}

impl DrivableSurface for Track {
    fn on_road_at(&self, pos: Vec2) -> bool {
        let half = self.road_width / 2.0;
        match &self.curve {
            Some(curve) => curve.lateral_offset(pos).abs() <= half,
            None => (pos.y - self.y_at(pos.x)).abs() <= half,
        }
    }

    fn friction_at(&self, pos: Vec2) -> f32 {
        let in_puddle = self.in_puddle(pos);
        let mut factor = if in_puddle {
            surface::PUDDLE_SPEED_FACTOR
        } else if let Some(zone) = self.surfaces.iter().find(|z| z.contains(pos)) {
            zone.friction
        } else {
            1.0
        };
        if !self.on_road_at(pos) {
            factor *= if in_puddle {
                surface::OFF_ROAD_PUDDLE_FACTOR
            } else {
                surface::OFF_ROAD_FACTOR
            };
        }
        factor
    }

    fn progress_at(&self, pos: Vec2) -> f32 {
        match &self.curve {
            Some(curve) => {
                let total = curve.total_length();
                if total <= 0.0 {
                    return 0.0;
                }
                (curve.nearest_arc_length(pos) / total).min(1.0 - f32::EPSILON)
            }
            None => {
                if self.width <= 0.0 {
                    return 0.0;
                }
                (pos.x - self.start_x).rem_euclid(self.width) / self.width
            }
        }
    }

    fn slip_at(&self, pos: Vec2) -> f32 {
        self.icy_patches
            .iter()
            .filter(|patch| patch.contains(pos))
            .map(|patch| patch.drift)
            .sum()
    }
}
