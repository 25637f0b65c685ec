//! The staged request pipeline.
//!
//! Every attempt runs the [`Phase::Build`], [`Phase::Sign`], [`Phase::Send`]
//! and [`Phase::ValidateResponse`] phases in order. A failing stage stops
//! its phase and leaves the error on the [`RequestContext`]. The
//! [`Phase::AfterRetry`] stages then decide whether to clear it and start
//! over from a fresh request. Once an attempt succeeds, [`Phase::Unmarshal`]
//! decodes the response.
//!
//! Stages are named, so callers can add their own or replace the built-in
//! ones through [`Handlers`].

use crate::RequestContext;
use async_trait::async_trait;
use awsrpc_core::Result;
use log::debug;
use std::fmt::Debug;
use std::sync::Arc;

mod retry;
pub use retry::BackoffPolicy;
pub use retry::DefaultRetryPolicy;
pub use retry::ExponentialBackoff;
pub use retry::NoRetryPolicy;
pub use retry::RetryPolicy;

mod stages;
pub use stages::AfterRetry;
pub use stages::Build;
pub use stages::ContentLength;
pub use stages::RequestDump;
pub use stages::ResponseDump;
pub use stages::SendRequest;
pub use stages::Sign;
pub use stages::Unmarshal;
pub use stages::UserAgent;
pub use stages::ValidateResponse;

/// Lifecycle points of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Place the parameters into the outgoing request.
    Build,
    /// Authenticate the outgoing request.
    Sign,
    /// Deliver the request and receive the response.
    Send,
    /// Turn error responses into errors.
    ValidateResponse,
    /// Inspect a failed attempt and decide whether to retry.
    AfterRetry,
    /// Decode the successful response.
    Unmarshal,
}

impl Phase {
    const ATTEMPT: [Phase; 4] = [
        Phase::Build,
        Phase::Sign,
        Phase::Send,
        Phase::ValidateResponse,
    ];

    fn index(self) -> usize {
        match self {
            Phase::Build => 0,
            Phase::Sign => 1,
            Phase::Send => 2,
            Phase::ValidateResponse => 3,
            Phase::AfterRetry => 4,
            Phase::Unmarshal => 5,
        }
    }
}

/// A named step of the pipeline.
#[async_trait]
pub trait Stage: Debug + Send + Sync + 'static {
    /// Name used to find the stage in [`Handlers`].
    fn name(&self) -> &str;

    /// Run the stage.
    ///
    /// Returning an error, or setting one with [`RequestContext::set_error`],
    /// stops the remaining stages of the phase.
    async fn handle(&self, rctx: &mut RequestContext) -> Result<()>;
}

/// Ordered stage lists, one per phase.
#[derive(Debug, Clone, Default)]
pub struct Handlers {
    phases: [Vec<Arc<dyn Stage>>; 6],
}

impl Handlers {
    /// Create handlers with no stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to `phase`.
    pub fn push_back(&mut self, phase: Phase, stage: impl Stage) {
        self.phases[phase.index()].push(Arc::new(stage));
    }

    /// Prepend a stage to `phase`.
    pub fn push_front(&mut self, phase: Phase, stage: impl Stage) {
        self.phases[phase.index()].insert(0, Arc::new(stage));
    }

    /// Replace the stage called `name` in place. Returns false if no such
    /// stage exists.
    pub fn replace(&mut self, phase: Phase, name: &str, stage: impl Stage) -> bool {
        match self.phases[phase.index()]
            .iter_mut()
            .find(|v| v.name() == name)
        {
            Some(slot) => {
                *slot = Arc::new(stage);
                true
            }
            None => false,
        }
    }

    /// Remove every stage called `name`. Returns false if none existed.
    pub fn remove(&mut self, phase: Phase, name: &str) -> bool {
        let stages = &mut self.phases[phase.index()];
        let before = stages.len();
        stages.retain(|v| v.name() != name);
        stages.len() != before
    }

    /// Remove all stages of `phase`.
    pub fn clear(&mut self, phase: Phase) {
        self.phases[phase.index()].clear();
    }

    /// Names of the stages of `phase` in execution order.
    pub fn names(&self, phase: Phase) -> Vec<&str> {
        self.phases[phase.index()]
            .iter()
            .map(|v| v.name())
            .collect()
    }

    /// Run the stages of one phase in order.
    pub async fn run_phase(&self, phase: Phase, rctx: &mut RequestContext) -> Result<()> {
        for stage in &self.phases[phase.index()] {
            debug!(
                "{}: running stage {} of phase {phase:?}",
                rctx.operation().name,
                stage.name()
            );
            stage.handle(rctx).await?;

            if phase != Phase::AfterRetry {
                if let Some(err) = rctx.take_error() {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Run a whole call: attempts until one succeeds or the after-retry
    /// stages leave the error in place, then unmarshal.
    pub async fn run(&self, rctx: &mut RequestContext) -> Result<()> {
        loop {
            if let Err(err) = self.run_attempt(rctx).await {
                rctx.set_error(err);
            }
            if rctx.error().is_none() {
                break;
            }

            self.run_phase(Phase::AfterRetry, rctx).await?;
            if let Some(err) = rctx.take_error() {
                return Err(err);
            }

            debug!(
                "{}: starting attempt {}",
                rctx.operation().name,
                rctx.retry_count() + 1
            );
            rctx.reset_request()?;
        }

        self.run_phase(Phase::Unmarshal, rctx).await
    }

    async fn run_attempt(&self, rctx: &mut RequestContext) -> Result<()> {
        for phase in Phase::ATTEMPT {
            self.run_phase(phase, rctx).await?;
        }
        Ok(())
    }
}
