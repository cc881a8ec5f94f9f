//! The race simulation: action input, tick orchestration, events,
//! observations and episode results.

pub mod action;
pub mod constants;
pub mod events;
pub mod observation;
pub mod planner;
pub mod result;
pub mod sim;
pub mod systems;

pub use action::{Action, GearCmd};
pub use events::{EventBus, RaceEvent, StartPhase};
pub use observation::Observation;
pub use planner::{HoldSpeedPlanner, PlannerView, SpeedPlanner};
pub use result::{summarize, QualifyRank, RaceSummary};
pub use sim::{RaceSimulation, ResetInfo, StepOutcome};
