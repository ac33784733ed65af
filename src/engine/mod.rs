// src/engine/mod.rs

//! Build planning on top of the core.
//!
//! This module ties together:
//! - the change classifier (flat source → target verdicts)
//! - the template graph (forcing pages whose ancestors or includes changed)
//! - reporting of the resulting plan
//! - the watch session that re-plans on every settled change
//!
//! It never invokes compilers; a plan is the hand-off point to whatever
//! does the actual building.

pub mod planner;
pub mod report;
pub mod session;

pub use planner::{BuildPlanner, PipelinePlan, PlannedChange};
pub use report::{OutputFormat, PlanReporter};
pub use session::WatchSession;
