//! Track-side hazards: obstacles, puddles, friction zones, ice.

use serde::{Deserialize, Serialize};

use crate::race::constants::physics::{CAR_LENGTH, CAR_WIDTH};
use crate::util::vec2::Vec2;

/// Solid obstacle placed on or near the road.
///
/// Billboard obstacles are one-shot: the track removes them on the first
/// hit so the same sign cannot be struck twice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub billboard: bool,
}

impl Obstacle {
    /// Axis-aligned overlap test against a car's collision box at `pos`
    pub fn hits_car(&self, pos: Vec2) -> bool {
        (pos.x - self.x).abs() <= (self.width + CAR_LENGTH) / 2.0
            && (pos.y - self.y).abs() <= (self.height + CAR_WIDTH) / 2.0
    }
}

/// Circular patch of standing water
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Puddle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Puddle {
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.distance_sq_to(Vec2::new(self.x, self.y)) <= self.radius * self.radius
    }
}

/// Rectangular zone with its own friction coefficient (dirt, gravel, ...).
/// `x`/`y` give the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceZone {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub friction: f32,
}

impl SurfaceZone {
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.x
            && pos.x <= self.x + self.width
            && pos.y >= self.y
            && pos.y <= self.y + self.height
    }
}

/// Circular icy patch that drifts the car's heading while crossed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcyPatch {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Heading drift in radians/second while inside
    pub drift: f32,
}

impl IcyPatch {
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.distance_sq_to(Vec2::new(self.x, self.y)) <= self.radius * self.radius
    }
}
