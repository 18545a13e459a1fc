//! Launchpad - a multi-step execution and retry engine, with token and NFT
//! collection launch flows built on it.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Launch plan loading, validation, and interpolation
//! - [`error`] - Error types and result aliases
//! - [`launch`] - Token and NFT collection launch flows
//! - [`runner`] - Ordered step execution, retry, error translation, tracking
//! - [`shell`] - Shell command execution
//! - [`steps`] - Step descriptors, states, and batched actions
//! - [`ui`] - Prompts, spinners, and step status rendering
//!
//! # Example
//!
//! ```
//! use launchpad::runner::Sequencer;
//! use launchpad::steps::{StepDescriptor, StepPlan, StepStatus};
//!
//! let sequencer = Sequencer::new();
//! let run = sequencer.initialize(
//!     StepPlan::new()
//!         .push(StepDescriptor::from_fn("deploy", "Deploy", |_| async { Ok(()) }))
//!         .push(StepDescriptor::from_fn("mint", "Mint", |_| async {
//!             Err(anyhow::anyhow!("insufficient funds for gas"))
//!         })),
//! );
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! assert!(runtime.block_on(sequencer.run(&run, 0)).is_err());
//! assert_eq!(run.steps()[0].status, StepStatus::Completed);
//! assert_eq!(
//!     run.steps()[1].status,
//!     StepStatus::Error("insufficient funds for gas".to_string())
//! );
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{LaunchError, Result};
