//! Host runtime
//!
//! Drives the reconciler for every instance named in a manifest: load the
//! manifest and state, plan, then apply sequentially. Ordering between
//! instances is manifest order; dependencies are the author's concern.

pub mod apply;
pub mod manifest;
pub mod plan;
pub mod state;

pub use apply::{Applier, ApplyReport, Outcome, Status};
pub use manifest::{Address, Manifest, ResourceSpec};
pub use plan::{Action, Plan, PlannedChange};
pub use state::State;
