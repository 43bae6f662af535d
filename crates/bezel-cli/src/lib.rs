//! Headless host shell for the navigator: scene files, flight plans and
//! scripted interaction replays.

pub mod replay;
pub mod scene;

pub use replay::{ReplayRecord, ScriptStep, load_script, replay};
pub use scene::{PlanReport, Scene, plan_flight};
