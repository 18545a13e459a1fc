//! Step execution orchestration.
//!
//! - [`Sequencer`] drives a [`Run`] forward and resumes it after failures
//! - [`ErrorTranslator`] turns failures into step error messages
//! - [`TrackingSink`] receives run-level attempt/success/error events

pub mod patterns;
pub mod recovery;
pub mod run;
pub mod sequencer;
pub mod telemetry;

pub use patterns::{DisplayMessage, ErrorParser, ErrorTranslator, UNKNOWN_ERROR};
pub use recovery::{
    confirm_launch, prompt_recovery, RecoveryAction, CONFIRM_PROMPT_KEY, RECOVERY_PROMPT_KEY,
};
pub use run::{Run, RunObserver, RunSnapshot};
pub use sequencer::{CompletionCallback, Sequencer};
pub use telemetry::{
    CollectingSink, NoopSink, TracingSink, TrackingContext, TrackingEvent, TrackingKind,
    TrackingSink,
};
