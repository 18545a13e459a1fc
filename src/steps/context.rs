//! Execution context handed to a step's action.

use crate::runner::Run;

use super::descriptor::StepId;

/// Handle an action uses to report progress on its own step.
///
/// Writes go through the owning [`Run`] and are tagged with the run
/// generation the step started under, so an action that outlives a
/// discarded run cannot touch the state of its successor.
#[derive(Debug, Clone)]
pub struct StepContext {
    run: Run,
    index: usize,
    generation: u64,
    id: StepId,
}

impl StepContext {
    pub(crate) fn new(run: Run, index: usize, generation: u64, id: StepId) -> Self {
        Self {
            run,
            index,
            generation,
            id,
        }
    }

    /// Id of the executing step.
    pub fn step_id(&self) -> &StepId {
        &self.id
    }

    /// Position of the executing step in the run.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Replace the step's progress text.
    pub fn set_description(&self, description: impl Into<String>) {
        let description = description.into();
        self.run.update(self.generation, self.index, |step| {
            step.description = Some(description);
        });
    }

    /// Batches already confirmed for this step.
    pub fn batches_processed(&self) -> usize {
        self.run
            .step(self.index)
            .map(|step| step.batches_processed)
            .unwrap_or(0)
    }

    /// Record one more confirmed batch.
    pub fn record_batch(&self) {
        self.run.update(self.generation, self.index, |step| {
            step.batches_processed += 1;
        });
    }

    /// Whether the owning run was discarded after this step started.
    pub fn is_stale(&self) -> bool {
        self.run.generation() != self.generation
    }
}
