//! The shared state of one execution of a step plan.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{LaunchError, Result};
use crate::steps::{StepDescriptor, StepPlan, StepState, StepStatus};

/// Receives every step transition, synchronously and in order.
pub trait RunObserver: Send + Sync {
    /// Called after the step at `index` changed.
    fn on_transition(&self, index: usize, state: &StepState);
}

/// Point-in-time copy of a run's step states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSnapshot {
    /// Bumped every time the run is reset.
    pub generation: u64,
    /// One state per descriptor, in plan order. Empty after a reset.
    pub steps: Vec<StepState>,
}

struct RunInner {
    descriptors: Vec<StepDescriptor>,
    state: watch::Sender<RunSnapshot>,
    exec: Mutex<()>,
    observers: Vec<Arc<dyn RunObserver>>,
}

/// Cloneable handle over a run's descriptors and step states.
///
/// The descriptor list is fixed at construction. Step states live behind a
/// `watch` channel: each transition is one atomic update, and renderers can
/// [`subscribe`](Run::subscribe) to observe them. At most one `run` or
/// `retry` may drive a run at a time.
#[derive(Clone)]
pub struct Run {
    inner: Arc<RunInner>,
}

impl Run {
    /// Create a run with every step idle.
    pub fn new(plan: StepPlan) -> Self {
        Self::with_observers(plan, Vec::new())
    }

    pub(crate) fn with_observers(plan: StepPlan, observers: Vec<Arc<dyn RunObserver>>) -> Self {
        let descriptors = plan.into_steps();
        let steps = descriptors.iter().map(StepState::idle).collect();
        let (state, _) = watch::channel(RunSnapshot {
            generation: 0,
            steps,
        });
        Self {
            inner: Arc::new(RunInner {
                descriptors,
                state,
                exec: Mutex::new(()),
                observers,
            }),
        }
    }

    /// Number of steps in the plan.
    pub fn len(&self) -> usize {
        self.inner.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.descriptors.is_empty()
    }

    /// The descriptor at `index`.
    pub fn descriptor(&self, index: usize) -> Option<&StepDescriptor> {
        self.inner.descriptors.get(index)
    }

    /// Index of the step with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.inner.descriptors.iter().position(|d| d.id == id)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> RunSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Copy of the current step states.
    pub fn steps(&self) -> Vec<StepState> {
        self.inner.state.borrow().steps.clone()
    }

    /// Copy of one step state.
    pub fn step(&self, index: usize) -> Option<StepState> {
        self.inner.state.borrow().steps.get(index).cloned()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.inner.state.subscribe()
    }

    /// Whether every step has completed.
    pub fn is_complete(&self) -> bool {
        let state = self.inner.state.borrow();
        !state.steps.is_empty()
            && state
                .steps
                .iter()
                .all(|s| matches!(s.status, StepStatus::Completed))
    }

    /// Index of the first step in `error`, if any.
    pub fn failed_step(&self) -> Option<usize> {
        self.inner
            .state
            .borrow()
            .steps
            .iter()
            .position(|s| s.status.is_error())
    }

    /// Whether a `run` or `retry` currently holds this run.
    pub fn is_executing(&self) -> bool {
        self.inner.exec.try_lock().is_err()
    }

    /// Tear the run down.
    ///
    /// Clears every step state and bumps the generation. Writes from an
    /// action still in flight are ignored, and the run can no longer be
    /// executed; build a new one with `Sequencer::initialize`.
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            state.generation += 1;
            state.steps.clear();
        });
        debug!("Run reset");
    }

    /// Whether [`reset`](Run::reset) has been called.
    pub fn is_reset(&self) -> bool {
        self.generation() != 0
    }

    /// Take the single-writer execution token.
    pub(crate) fn try_begin(&self) -> Result<MutexGuard<'_, ()>> {
        self.inner
            .exec
            .try_lock()
            .map_err(|_| LaunchError::RunInProgress)
    }

    /// Apply `f` to the step at `index` if the run is still at `generation`.
    ///
    /// Returns `false` when the write was dropped.
    pub(crate) fn update(
        &self,
        generation: u64,
        index: usize,
        f: impl FnOnce(&mut StepState),
    ) -> bool {
        let mut changed = None;
        self.inner.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            match state.steps.get_mut(index) {
                Some(step) => {
                    f(step);
                    changed = Some(step.clone());
                    true
                }
                None => false,
            }
        });

        match changed {
            Some(step) => {
                for observer in &self.inner.observers {
                    observer.on_transition(index, &step);
                }
                true
            }
            None => false,
        }
    }

    /// Zero the batch counters of every step from index `from` onwards.
    pub(crate) fn clear_batch_progress(&self, generation: u64, from: usize) {
        self.inner.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            let mut modified = false;
            for step in state
                .steps
                .iter_mut()
                .skip(from)
                .filter(|s| s.batches_processed > 0)
            {
                step.batches_processed = 0;
                modified = true;
            }
            modified
        });
    }
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("descriptors", &self.inner.descriptors)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::StepDescriptor;
    use std::sync::Mutex as StdMutex;

    fn noop(id: &str) -> StepDescriptor {
        StepDescriptor::from_fn(id, id, |_| async { Ok(()) })
    }

    fn three_steps() -> Run {
        Run::new(
            StepPlan::new()
                .push(noop("deploy"))
                .push(noop("mint"))
                .push(noop("configure")),
        )
    }

    #[derive(Default)]
    struct Recorder {
        seen: StdMutex<Vec<(usize, String)>>,
    }

    impl RunObserver for Recorder {
        fn on_transition(&self, index: usize, state: &StepState) {
            self.seen
                .lock()
                .unwrap()
                .push((index, state.status.name().to_string()));
        }
    }

    #[test]
    fn new_run_is_all_idle() {
        let run = three_steps();
        assert_eq!(run.len(), 3);
        assert!(run.steps().iter().all(|s| s.status == StepStatus::Idle));
        assert!(!run.is_complete());
        assert_eq!(run.generation(), 0);
    }

    #[test]
    fn position_finds_step() {
        let run = three_steps();
        assert_eq!(run.position("mint"), Some(1));
        assert_eq!(run.position("missing"), None);
    }

    #[test]
    fn update_applies_and_notifies() {
        let recorder = Arc::new(Recorder::default());
        let run = Run::with_observers(
            StepPlan::new().push(noop("deploy")),
            vec![recorder.clone() as Arc<dyn RunObserver>],
        );

        assert!(run.update(0, 0, |s| s.status = StepStatus::Pending));
        assert_eq!(run.step(0).unwrap().status, StepStatus::Pending);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![(0, "pending".to_string())]
        );
    }

    #[test]
    fn stale_generation_is_ignored() {
        let run = three_steps();
        run.reset();
        assert!(!run.update(0, 0, |s| s.status = StepStatus::Completed));
        assert!(run.steps().is_empty());
        assert!(run.is_reset());
    }

    #[test]
    fn out_of_range_update_is_ignored() {
        let run = three_steps();
        assert!(!run.update(0, 7, |s| s.status = StepStatus::Completed));
    }

    #[test]
    fn subscribers_see_updates() {
        let run = three_steps();
        let mut rx = run.subscribe();
        run.update(0, 2, |s| s.status = StepStatus::Error("boom".into()));
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.steps[2].status, StepStatus::Error("boom".into()));
        assert_eq!(run.failed_step(), Some(2));
    }

    #[test]
    fn clear_batch_progress_zeroes_counters() {
        let run = three_steps();
        run.update(0, 1, |s| s.batches_processed = 2);
        run.clear_batch_progress(0, 0);
        assert_eq!(run.step(1).unwrap().batches_processed, 0);
    }

    #[test]
    fn clear_batch_progress_keeps_earlier_counters() {
        let run = three_steps();
        run.update(0, 0, |s| s.batches_processed = 1);
        run.update(0, 2, |s| s.batches_processed = 2);
        run.clear_batch_progress(0, 1);
        assert_eq!(run.step(0).unwrap().batches_processed, 1);
        assert_eq!(run.step(2).unwrap().batches_processed, 0);
    }

    #[tokio::test]
    async fn execution_token_is_exclusive() {
        let run = three_steps();
        let guard = run.try_begin().unwrap();
        assert!(run.is_executing());
        assert!(matches!(run.try_begin(), Err(LaunchError::RunInProgress)));
        drop(guard);
        assert!(!run.is_executing());
        assert!(run.try_begin().is_ok());
    }
}
