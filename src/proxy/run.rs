//! Running closed pipelines.

use crate::cancel::{CancelToken, Interrupted};
use crate::effect::Effect;
use crate::proxy::algebra::{Proxy, Void};
use crate::proxy::shapes::Closed;

/// A closed pipeline is itself an effect: running it steps through its
/// effect nodes until it finishes.
///
/// The loop is a trampoline, so pipelines of any length run in constant
/// stack. The first failing step ends the run with that step's error.
impl<R, E, Env> Effect for Proxy<Void, (), (), Void, R, E, Env>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    type Output = R;
    type Error = E;
    type Env = Env;

    async fn run(self, env: &Env) -> Result<R, E> {
        let mut current = self;
        loop {
            match current {
                Proxy::Pure(r) => return Ok(r),
                Proxy::Effect(step) => current = step.run(env).await?,
                Proxy::Request(never, _) => match never {},
                Proxy::Respond(never, _) => match never {},
            }
        }
    }
}

/// Run a closed pipeline to completion.
///
/// ```rust
/// use millrace::proxy::{self, Closed};
/// use millrace::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let pipeline: Closed<i32> = proxy::lift(pure(41)).map(|x| x + 1);
/// assert_eq!(proxy::run(pipeline, &()).await, Ok(42));
/// # });
/// ```
pub async fn run<R, E, Env>(pipeline: Closed<R, E, Env>, env: &Env) -> Result<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    Effect::run(pipeline, env).await
}

/// Run a closed pipeline until it finishes or `token` is cancelled.
///
/// The token is checked before each effect step and raced against the
/// step in flight. On cancellation the in-flight step and the remainder of
/// the pipeline are dropped, which releases everything they own (sink
/// guards complete their channels, for example).
pub async fn run_until_cancelled<R, E, Env>(
    pipeline: Closed<R, E, Env>,
    env: &Env,
    token: &CancelToken,
) -> Result<R, Interrupted<E>>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    let mut current = pipeline;
    loop {
        if token.is_cancelled() {
            tracing::debug!("pipeline cancelled between steps");
            return Err(Interrupted::Cancelled);
        }
        match current {
            Proxy::Pure(r) => return Ok(r),
            Proxy::Effect(step) => {
                current = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("pipeline cancelled during an effect step");
                        return Err(Interrupted::Cancelled);
                    }
                    next = step.run(env) => next.map_err(Interrupted::Failed)?,
                };
            }
            Proxy::Request(never, _) => match never {},
            Proxy::Respond(never, _) => match never {},
        }
    }
}
