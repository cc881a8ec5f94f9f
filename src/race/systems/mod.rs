//! Per-concern pieces of the tick pipeline. Each module is a set of
//! free functions over car and track state, invoked by the simulation
//! in a fixed order every step.

pub mod collision;
pub mod progress;
pub mod slipstream;
pub mod surface;
