//! Ordered step pipeline with context threading.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use tracing::debug;

use crate::error::TxError;

/// Context values produced by steps. `merge` overlays the fields a patch sets.
pub trait Merge {
    fn merge(&mut self, patch: Self);
}

type StepFn<G, C> = Box<dyn Fn(G, C) -> BoxFuture<'static, Result<Option<C>, TxError>> + Send + Sync>;

struct Step<G, C> {
    name: String,
    run: StepFn<G, C>,
}

/// Steps are added with [`TxBuilder::build`] and executed by [`TxBuilder::run`].
///
/// `G` is the global value every step receives (the live signer); `C` is the
/// context threaded from step to step.
pub struct TxBuilder<G, C> {
    steps: Vec<Step<G, C>>,
}

impl<G, C> Default for TxBuilder<G, C> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<G, C> TxBuilder<G, C>
where
    G: Clone + Send + 'static,
    C: Merge + Default + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. A step returning `Some(patch)` makes the patch visible
    /// to every later step of the same run.
    pub fn build<F, Fut>(&mut self, name: impl Into<String>, step: F) -> &mut Self
    where
        F: Fn(G, C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<C>, TxError>> + Send + 'static,
    {
        self.steps.push(Step {
            name: name.into(),
            run: Box::new(move |global, ctx| step(global, ctx).boxed()),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Execute every step in order, aborting on the first error.
    pub async fn run(&self, global: G) -> Result<C, TxError> {
        let mut context = C::default();
        for step in &self.steps {
            debug!(step = %step.name, "running pipeline step");
            let patch = (step.run)(global.clone(), context.clone())
                .await
                .map_err(|e| TxError::Step {
                    step: step.name.clone(),
                    source: Box::new(e),
                })?;
            if let Some(patch) = patch {
                context.merge(patch);
            }
            debug!(step = %step.name, "pipeline step finished");
        }
        Ok(context)
    }
}
