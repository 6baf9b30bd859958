//! Span instrumentation for effects.

use crate::effect::trait_def::Effect;

/// An effect that runs inside a tracing span.
///
/// Created by [`EffectTracingExt::instrument`].
#[derive(Debug)]
pub struct Instrument<E> {
    inner: E,
    span: tracing::Span,
}

impl<E> Effect for Instrument<E>
where
    E: Effect,
{
    type Output = E::Output;
    type Error = E::Error;
    type Env = E::Env;

    async fn run(self, env: &Self::Env) -> Result<Self::Output, Self::Error> {
        use tracing::Instrument as _;
        self.inner.run(env).instrument(self.span).await
    }
}

/// Adds [`instrument`](EffectTracingExt::instrument) to every effect.
///
/// Lifting an instrumented effect into a proxy puts that pipeline step
/// under the span:
///
/// ```rust
/// use millrace::effect::prelude::*;
/// use millrace::proxy::{self, Producer};
///
/// let step: Producer<i32, (), String, ()> = proxy::lift(
///     pure(3).instrument(tracing::debug_span!("load_batch")),
/// )
/// .and_then(proxy::yielding);
/// # drop(step);
/// ```
pub trait EffectTracingExt: Effect {
    /// Enter `span` whenever this effect is polled.
    fn instrument(self, span: tracing::Span) -> Instrument<Self> {
        Instrument { inner: self, span }
    }
}

impl<E: Effect> EffectTracingExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::constructors::{fail, pure};
    use crate::effect::ext::EffectExt;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn instrumented_value_passes_through() {
        let effect = pure::<_, String, ()>(42).instrument(tracing::info_span!("answer"));
        assert_eq!(effect.run(&()).await, Ok(42));
    }

    #[tokio::test]
    async fn instrumented_error_passes_through() {
        let effect =
            fail::<i32, _, ()>("oops".to_string()).instrument(tracing::info_span!("failing"));
        assert_eq!(effect.run(&()).await, Err("oops".to_string()));
    }

    #[tokio::test]
    #[traced_test]
    async fn events_inside_the_effect_carry_the_span() {
        let effect = crate::effect::constructors::from_fn(|_: &()| {
            tracing::info!("inside step");
            Ok::<_, String>(1)
        })
        .instrument(tracing::info_span!("pipeline_step"))
        .map(|x| x + 1);

        assert_eq!(effect.run(&()).await, Ok(2));
        assert!(logs_contain("pipeline_step"));
        assert!(logs_contain("inside step"));
    }
}
