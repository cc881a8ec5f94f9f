//! High-level speed planning for the rival car.
//!
//! The real planner is an external collaborator (a language-model agent
//! in the source arcade) that answers with free text. The simulation
//! only depends on this trait and must survive malformed, slow or absent
//! answers by falling back to the car's current speed.

/// Snapshot of the rival car handed to the planner
#[derive(Debug, Clone, Copy)]
pub struct PlannerView {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
}

/// Produces a free-text plan whose last token is read as a target speed
pub trait SpeedPlanner {
    /// `None` means "no plan available this tick"
    fn plan(&mut self, view: &PlannerView) -> Option<String>;
}

/// Default planner: never suggests anything, the rival holds its speed
#[derive(Debug, Default)]
pub struct HoldSpeedPlanner;

impl SpeedPlanner for HoldSpeedPlanner {
    fn plan(&mut self, _view: &PlannerView) -> Option<String> {
        None
    }
}

/// Test/demo planner that always suggests one speed
#[derive(Debug)]
pub struct FixedSpeedPlanner(pub f32);

impl SpeedPlanner for FixedSpeedPlanner {
    fn plan(&mut self, _view: &PlannerView) -> Option<String> {
        Some(format!("hold target speed {}", self.0))
    }
}

/// Read a target speed from the last whitespace token of a plan
pub fn parse_target_speed(text: &str) -> Option<f32> {
    text.split_whitespace().last()?.parse().ok()
}

/// Run the planner and fall back to the current speed when its answer
/// is missing, malformed or out of range
pub fn resolve_target_speed(planner: &mut dyn SpeedPlanner, view: &PlannerView) -> f32 {
    planner
        .plan(view)
        .as_deref()
        .and_then(parse_target_speed)
        .filter(|speed| speed.is_finite() && *speed >= 0.0)
        .unwrap_or(view.speed)
}
