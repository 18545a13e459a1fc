//! Batch splitting for steps whose action has a per-call item ceiling.
//!
//! A batched step divides `N` items into `ceil(N / batch_size)` calls. The
//! number of confirmed batches lives on the step's state, so retrying a
//! partially processed step resumes at the first unconfirmed batch instead
//! of redoing confirmed work.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::context::StepContext;
use super::descriptor::Action;

/// Items per call the downstream contract calls accept.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// One bounded slice of a batched step's workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based batch number.
    pub index: usize,
    /// First item covered by this batch.
    pub start_index: usize,
    /// Number of items in this batch.
    pub count: usize,
    /// Total number of batches in the step.
    pub total_batches: usize,
}

impl Batch {
    /// Human-readable progress line for this batch.
    pub fn progress_text(&self) -> String {
        format!(
            "Processing batch {} of {}",
            self.index + 1,
            self.total_batches
        )
    }
}

/// Splits `total_items` into batches of at most `batch_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    total_items: usize,
    batch_size: usize,
}

impl BatchPlan {
    /// Create a plan. A zero batch size is treated as one.
    pub fn new(total_items: usize, batch_size: usize) -> Self {
        Self {
            total_items,
            batch_size: batch_size.max(1),
        }
    }

    /// Total items covered.
    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// Maximum items per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches; always at least one.
    pub fn batch_count(&self) -> usize {
        if self.total_items <= self.batch_size {
            1
        } else {
            self.total_items.div_ceil(self.batch_size)
        }
    }

    /// Whether the workload spans more than one call.
    pub fn is_split(&self) -> bool {
        self.batch_count() > 1
    }

    /// The batch at `index`, if in range.
    pub fn batch(&self, index: usize) -> Option<Batch> {
        let total_batches = self.batch_count();
        if index >= total_batches {
            return None;
        }
        if total_batches == 1 {
            return Some(Batch {
                index: 0,
                start_index: 0,
                count: self.total_items,
                total_batches,
            });
        }
        let start_index = index * self.batch_size;
        Some(Batch {
            index,
            start_index,
            count: self.batch_size.min(self.total_items - start_index),
            total_batches,
        })
    }

    /// Batches from `first` (inclusive) to the end.
    pub fn batches_from(&self, first: usize) -> impl Iterator<Item = Batch> + '_ {
        (first..self.batch_count()).filter_map(move |index| self.batch(index))
    }
}

/// The per-batch effect of a batched step.
#[async_trait]
pub trait BatchAction: Send + Sync {
    /// Process one batch.
    async fn execute_batch(&self, batch: Batch) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`BatchAction`].
pub struct FnBatchAction<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> BatchAction for FnBatchAction<F>
where
    F: Fn(Batch) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn execute_batch(&self, batch: Batch) -> anyhow::Result<()> {
        (self.f)(batch).await
    }
}

/// An [`Action`] that drives a [`BatchAction`] over a [`BatchPlan`].
///
/// Before each batch the step description is set to the progress line (only
/// when there is more than one batch). After each batch succeeds the step's
/// counter advances. A failing batch leaves the counter at the last
/// confirmed batch.
pub struct BatchedAction {
    plan: BatchPlan,
    inner: Arc<dyn BatchAction>,
}

impl BatchedAction {
    pub fn new(plan: BatchPlan, inner: Arc<dyn BatchAction>) -> Self {
        Self { plan, inner }
    }

    /// Build from an async closure over a batch.
    pub fn from_fn<F, Fut>(plan: BatchPlan, f: F) -> Self
    where
        F: Fn(Batch) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(plan, Arc::new(FnBatchAction { f }))
    }

    pub fn plan(&self) -> BatchPlan {
        self.plan
    }
}

#[async_trait]
impl Action for BatchedAction {
    async fn execute(&self, ctx: &StepContext) -> anyhow::Result<()> {
        let total = self.plan.batch_count();
        let resume_at = ctx.batches_processed().min(total);
        if resume_at > 0 {
            debug!(
                "Resuming '{}' at batch {} of {}",
                ctx.step_id(),
                resume_at + 1,
                total
            );
        }

        for batch in self.plan.batches_from(resume_at) {
            if self.plan.is_split() {
                ctx.set_description(batch.progress_text());
            }
            self.inner.execute_batch(batch).await?;
            ctx.record_batch();
        }

        Ok(())
    }
}
