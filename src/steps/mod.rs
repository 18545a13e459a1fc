//! Step definitions and per-step state.
//!
//! - [`StepDescriptor`] - Immutable definition of one unit of work
//! - [`Action`] - The side effect a step triggers
//! - [`StepPlan`] - Ordered descriptors, composed before a run starts
//! - [`StepState`] / [`StepStatus`] - Mutable status tracked by the run
//! - [`BatchedAction`] - Splits a step's workload into bounded batches
//! - [`StepContext`] - Progress reporting handle passed to actions
//!
//! # Example
//!
//! ```
//! use launchpad::steps::{StepDescriptor, StepPlan};
//!
//! let plan = StepPlan::new()
//!     .push(StepDescriptor::from_fn("deploy-contract", "Deploy contract", |_| async { Ok(()) }))
//!     .push_if(false, || {
//!         StepDescriptor::from_fn("airdrop-tokens", "Airdrop tokens", |_| async { Ok(()) })
//!     });
//!
//! assert_eq!(plan.len(), 1);
//! ```

pub mod batch;
pub mod context;
pub mod descriptor;
pub mod status;

pub use batch::{
    Batch, BatchAction, BatchPlan, BatchedAction, FnBatchAction, DEFAULT_BATCH_SIZE,
};
pub use context::StepContext;
pub use descriptor::{Action, FnAction, StepDescriptor, StepId, StepPlan};
pub use status::{StepState, StepStatus};
