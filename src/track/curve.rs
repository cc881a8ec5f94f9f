//! Centerline curve interpolation.
//!
//! A [`TrackCurve`] turns a list of piecewise constant-curvature segments
//! into a dense polyline sampled at one-unit arc steps, so point, tangent
//! and progress queries stay cheap during the simulation tick.

use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// Curvature magnitudes below this are treated as straight lines
const STRAIGHT_EPSILON: f32 = 1e-6;

/// Maximum arc-length spacing between precomputed samples
const SAMPLE_STEP: f32 = 1.0;

/// One constant-curvature piece of a centerline.
///
/// `x`/`y` give the segment's start point; the first segment always
/// starts the walk at the origin with an eastward heading, later
/// segments reposition the walk at their declared start while the
/// heading carries over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSegment {
    pub x: f32,
    pub y: f32,
    /// Signed curvature (1/radius); positive bends left
    pub curvature: f32,
    pub length: f32,
}

/// Open centerline curve with precomputed arc-length samples.
///
/// Queries clamp to `[0, total_length]` rather than wrapping; lap
/// wraparound is the track's concern, not the curve's.
#[derive(Debug, Clone)]
pub struct TrackCurve {
    segments: Vec<CurveSegment>,
    points: Vec<Vec2>,
    /// Cumulative arc length per sample; `lengths[0] == 0.0`,
    /// monotonically non-decreasing, last entry equals `total_length`
    lengths: Vec<f32>,
    total_length: f32,
}

impl TrackCurve {
    pub fn from_segments(segments: Vec<CurveSegment>) -> Self {
        let mut curve = Self {
            segments,
            points: Vec::new(),
            lengths: Vec::new(),
            total_length: 0.0,
        };
        curve.build();
        curve
    }

    pub fn from_tuples(data: &[(f32, f32, f32, f32)]) -> Self {
        let segments = data
            .iter()
            .map(|&(x, y, curvature, length)| CurveSegment {
                x,
                y,
                curvature,
                length,
            })
            .collect();
        Self::from_segments(segments)
    }

    /// Walk every segment in fixed steps, recording each sample and its
    /// cumulative arc length. Curved steps rotate about the instantaneous
    /// center instead of integrating the tangent, so sample positions are
    /// exact regardless of step size.
    fn build(&mut self) {
        let mut pos = Vec2::ZERO;
        let mut angle = 0.0_f32;
        self.points.push(pos);
        self.lengths.push(0.0);

        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                pos = Vec2::new(seg.x, seg.y);
            }
            let mut dist = 0.0;
            while dist < seg.length {
                let step = SAMPLE_STEP.min(seg.length - dist);
                if seg.curvature.abs() > STRAIGHT_EPSILON {
                    let radius = 1.0 / seg.curvature;
                    let center = Vec2::new(
                        pos.x - radius * angle.sin(),
                        pos.y + radius * angle.cos(),
                    );
                    angle += step * seg.curvature;
                    pos = Vec2::new(
                        center.x + radius * angle.sin(),
                        center.y - radius * angle.cos(),
                    );
                } else {
                    pos += Vec2::from_angle(angle) * step;
                }
                dist += step;
                self.total_length += step;
                self.points.push(pos);
                self.lengths.push(self.total_length);
            }
        }
    }

    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Index of the first sample at arc length >= `s` (after clamping)
    fn sample_index(&self, s: f32) -> usize {
        let s = s.clamp(0.0, self.total_length);
        self.lengths.partition_point(|&l| l < s)
    }

    /// Position at arc length `s`, clamped to the curve's extent
    pub fn point_at(&self, s: f32) -> Vec2 {
        if self.points.len() < 2 {
            return Vec2::ZERO;
        }
        self.points[self.sample_index(s).min(self.points.len() - 1)]
    }

    /// Unit tangent at arc length `s`
    pub fn tangent_at(&self, s: f32) -> Vec2 {
        if self.points.len() < 2 {
            return Vec2::ZERO;
        }
        let i = self.sample_index(s).clamp(1, self.points.len() - 1);
        (self.points[i] - self.points[i - 1]).normalize()
    }

    /// Unit normal at arc length `s` (tangent rotated 90 degrees CCW)
    pub fn normal_at(&self, s: f32) -> Vec2 {
        self.tangent_at(s).perpendicular()
    }

    /// Arc length of the sample nearest to `p`.
    ///
    /// Linear scan over the precomputed samples; fine at the one-unit
    /// build density for the track sizes this crate deals in.
    pub fn nearest_arc_length(&self, p: Vec2) -> f32 {
        let mut best = 0.0;
        let mut best_dist = f32::INFINITY;
        for (point, &length) in self.points.iter().zip(&self.lengths) {
            let d = point.distance_sq_to(p);
            if d < best_dist {
                best_dist = d;
                best = length;
            }
        }
        best
    }

    /// Perpendicular offset of `p` from the curve at its nearest sample
    pub fn lateral_offset(&self, p: Vec2) -> f32 {
        let s = self.nearest_arc_length(p);
        (p - self.point_at(s)).dot(self.normal_at(s))
    }
}
