//! Ordered step execution with resume-from-failure.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{LaunchError, Result};
use crate::steps::{StepContext, StepPlan, StepStatus};

use super::patterns::{ErrorParser, ErrorTranslator};
use super::run::{Run, RunObserver};
use super::telemetry::{TracingSink, TrackingContext, TrackingKind, TrackingSink};

/// Invoked once when every step of a run has completed.
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

/// Executes a run's steps in order, halting on the first failure.
///
/// A halted run is resumed with [`run`](Sequencer::run) from the failed
/// index or with [`retry`](Sequencer::retry) by step id. Steps before the
/// resume point are never re-executed.
///
/// # Example
///
/// ```
/// use launchpad::runner::Sequencer;
/// use launchpad::steps::{StepDescriptor, StepPlan};
///
/// # tokio_test_block_on(async {
/// let sequencer = Sequencer::new();
/// let run = sequencer.initialize(
///     StepPlan::new().push(StepDescriptor::from_fn("deploy", "Deploy", |_| async { Ok(()) })),
/// );
/// sequencer.run(&run, 0).await.unwrap();
/// assert!(run.is_complete());
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct Sequencer {
    translator: Arc<dyn ErrorTranslator>,
    tracker: Arc<dyn TrackingSink>,
    tracking: TrackingContext,
    observers: Vec<Arc<dyn RunObserver>>,
    on_complete: Option<CompletionCallback>,
}

impl Sequencer {
    /// Create a sequencer with the default translator and a tracing sink.
    pub fn new() -> Self {
        Self {
            translator: Arc::new(ErrorParser::new()),
            tracker: Arc::new(TracingSink),
            tracking: TrackingContext::default(),
            observers: Vec::new(),
            on_complete: None,
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn ErrorTranslator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn TrackingSink>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Set the category and properties attached to tracking events.
    pub fn with_tracking_context(mut self, tracking: TrackingContext) -> Self {
        self.tracking = tracking;
        self
    }

    /// Register an observer on every run this sequencer initializes.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Set the callback fired after the last step completes.
    pub fn on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    /// The tracking context events are built from.
    pub fn tracking_context(&self) -> &TrackingContext {
        &self.tracking
    }

    /// Build a run with every step idle.
    pub fn initialize(&self, plan: StepPlan) -> Run {
        let mut seen = HashSet::new();
        for id in plan.ids() {
            if !seen.insert(id.as_str()) {
                warn!("Duplicate step id '{}': retry will target the first", id);
            }
        }
        debug!("Initialized run with {} steps", plan.len());
        Run::with_observers(plan, self.observers.clone())
    }

    /// Execute steps `[start, len)` in order.
    ///
    /// Steps after `start` lose their confirmed batches before anything runs.
    ///
    /// Returns the first failure as [`LaunchError::StepFailed`] after writing
    /// it into the failed step's state. On full success, batch counters are
    /// cleared, a success event is tracked and the completion callback fires.
    pub async fn run(&self, run: &Run, start: usize) -> Result<()> {
        let _token = run.try_begin()?;

        if run.is_reset() {
            return Err(LaunchError::RunDiscarded);
        }
        let len = run.len();
        if start > len {
            return Err(LaunchError::InvalidStartIndex { index: start, len });
        }

        let generation = run.generation();
        // Only the resume point keeps its confirmed batches; later steps start over.
        run.clear_batch_progress(generation, start + 1);
        self.track(TrackingKind::Attempt);

        for index in start..len {
            let Some(descriptor) = run.descriptor(index) else {
                break;
            };

            run.update(generation, index, |step| step.status = StepStatus::Pending);
            info!("Step '{}' ({}/{}) pending", descriptor.id, index + 1, len);

            let ctx = StepContext::new(run.clone(), index, generation, descriptor.id.clone());
            let outcome = descriptor.action.execute(&ctx).await;

            if run.generation() != generation {
                debug!("Run reset while '{}' was executing", descriptor.id);
                return Err(LaunchError::RunDiscarded);
            }

            match outcome {
                Ok(()) => {
                    run.update(generation, index, |step| {
                        step.status = StepStatus::Completed
                    });
                    info!("Step '{}' completed", descriptor.id);
                }
                Err(err) => {
                    let display = self.translator.translate(&err);
                    let message = display.text.clone();
                    run.update(generation, index, |step| {
                        step.status = StepStatus::Error(message)
                    });
                    warn!("Step '{}' failed: {:#}", descriptor.id, err);
                    self.track(TrackingKind::Error {
                        message: display.tracking_text().to_string(),
                    });
                    return Err(LaunchError::StepFailed {
                        step: descriptor.id.to_string(),
                        message: display.text,
                    });
                }
            }
        }

        run.clear_batch_progress(generation, 0);
        self.track(TrackingKind::Success);
        info!("All {} steps completed", len);
        if let Some(callback) = &self.on_complete {
            callback();
        }
        Ok(())
    }

    /// Resume a run from the step with `step_id`.
    ///
    /// An unknown id is ignored. A failure is not returned; it is already
    /// recorded on the step.
    pub async fn retry(&self, run: &Run, step_id: &str) {
        let Some(index) = run.position(step_id) else {
            debug!("Retry ignored: no step '{}'", step_id);
            return;
        };

        if let Err(err) = self.run(run, index).await {
            debug!("Retry of '{}' halted: {}", step_id, err);
        }
    }

    fn track(&self, kind: TrackingKind) {
        self.tracker.track(self.tracking.event(&kind));
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("tracking", &self.tracking)
            .field("observers", &self.observers.len())
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}
