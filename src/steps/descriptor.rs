//! Step descriptors and the action capability they carry.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::context::StepContext;

/// Stable identity of a step within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Create a step id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for StepId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StepId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The side effect a step performs.
///
/// The sequencer never looks inside an action; it only awaits the outcome.
/// Anything the action needs (form values, a previously deployed contract
/// address) is captured by the implementor.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use launchpad::steps::{Action, StepContext};
///
/// struct Deploy;
///
/// #[async_trait]
/// impl Action for Deploy {
///     async fn execute(&self, _ctx: &StepContext) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Action: Send + Sync {
    /// Perform the step's effect.
    async fn execute(&self, ctx: &StepContext) -> anyhow::Result<()>;
}

/// Adapts an async closure into an [`Action`].
pub struct FnAction<F> {
    f: F,
}

impl<F> FnAction<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Action for FnAction<F>
where
    F: Fn(StepContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn execute(&self, ctx: &StepContext) -> anyhow::Result<()> {
        (self.f)(ctx.clone()).await
    }
}

/// Immutable definition of one unit of work.
#[derive(Clone)]
pub struct StepDescriptor {
    /// Unique id within the run.
    pub id: StepId,
    /// Display name.
    pub label: String,
    /// Initial progress text.
    pub description: Option<String>,
    /// The effect this step triggers.
    pub action: Arc<dyn Action>,
}

impl StepDescriptor {
    /// Create a descriptor for an action.
    pub fn new(id: impl Into<StepId>, label: impl Into<String>, action: Arc<dyn Action>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            action,
        }
    }

    /// Create a descriptor from an async closure.
    pub fn from_fn<F, Fut>(id: impl Into<StepId>, label: impl Into<String>, f: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(id, label, Arc::new(FnAction::new(f)))
    }

    /// Set the initial progress text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered list of descriptors, composed before a run starts.
///
/// Composition (including conditionally appended trailing steps) happens
/// here, so the list handed to the sequencer is already final.
#[derive(Debug, Clone, Default)]
pub struct StepPlan {
    steps: Vec<StepDescriptor>,
}

impl StepPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(mut self, descriptor: StepDescriptor) -> Self {
        self.steps.push(descriptor);
        self
    }

    /// Append a step only when `condition` holds.
    ///
    /// The descriptor is built lazily so that unused actions are never
    /// constructed.
    pub fn push_if(self, condition: bool, descriptor: impl FnOnce() -> StepDescriptor) -> Self {
        if condition {
            self.push(descriptor())
        } else {
            self
        }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ids in order.
    pub fn ids(&self) -> Vec<&StepId> {
        self.steps.iter().map(|s| &s.id).collect()
    }

    /// Borrow the descriptors in order.
    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    /// Consume the plan.
    pub fn into_steps(self) -> Vec<StepDescriptor> {
        self.steps
    }
}

impl From<Vec<StepDescriptor>> for StepPlan {
    fn from(steps: Vec<StepDescriptor>) -> Self {
        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(id: &str) -> StepDescriptor {
        StepDescriptor::from_fn(id, id.to_uppercase(), |_| async { Ok(()) })
    }

    #[test]
    fn step_id_compares_with_str() {
        let id = StepId::new("deploy-contract");
        assert_eq!(id, "deploy-contract");
        assert_eq!(id.to_string(), "deploy-contract");
    }

    #[test]
    fn plan_preserves_order() {
        let plan = StepPlan::new().push(noop("a")).push(noop("b")).push(noop("c"));
        let ids: Vec<_> = plan.ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn push_if_appends_only_when_true() {
        let plan = StepPlan::new()
            .push(noop("a"))
            .push_if(false, || noop("skipped"))
            .push_if(true, || noop("tail"));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps()[1].id, "tail");
    }

    #[test]
    fn push_if_false_never_builds_descriptor() {
        let plan = StepPlan::new().push_if(false, || panic!("must not be built"));
        assert!(plan.is_empty());
    }

    #[test]
    fn debug_omits_action() {
        let rendered = format!("{:?}", noop("deploy").with_description("waiting"));
        assert!(rendered.contains("deploy"));
        assert!(rendered.contains("waiting"));
    }
}
