//! Combinator methods available on every [`Effect`].

use std::marker::PhantomData;

use crate::effect::boxed::BoxedEffect;
use crate::effect::combinators::{AndThen, Map, MapErr, OrElse, Recover};
use crate::effect::trait_def::Effect;

/// Sequencing, transformation and recovery for any [`Effect`].
///
/// Each method wraps `self` in a combinator struct; nothing runs until the
/// result is run.
///
/// ```rust
/// use millrace::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = pure::<_, String, ()>(21)
///     .map(|x| x * 2)
///     .and_then(|x| pure(x + 1))
///     .map_err(|e| format!("step failed: {}", e));
///
/// assert_eq!(effect.execute(&()).await, Ok(43));
/// # });
/// ```
pub trait EffectExt: Effect {
    /// Apply `transform` to the output.
    fn map<U, F>(self, transform: F) -> Map<Self, F>
    where
        F: FnOnce(Self::Output) -> U + Send,
        U: Send,
    {
        Map {
            effect: self,
            transform,
        }
    }

    /// Apply `transform` to the error.
    fn map_err<E2, F>(self, transform: F) -> MapErr<Self, F>
    where
        F: FnOnce(Self::Error) -> E2 + Send,
        E2: Send,
    {
        MapErr {
            effect: self,
            transform,
        }
    }

    /// Continue with the effect `next` builds from the output.
    fn and_then<Next, F>(self, next: F) -> AndThen<Self, F>
    where
        Next: Effect<Error = Self::Error, Env = Self::Env>,
        F: FnOnce(Self::Output) -> Next + Send,
    {
        AndThen { effect: self, next }
    }

    /// On failure, continue with the effect `handler` builds from the error.
    fn or_else<Fallback, H>(self, handler: H) -> OrElse<Self, H>
    where
        Fallback: Effect<Output = Self::Output, Env = Self::Env>,
        H: FnOnce(Self::Error) -> Fallback + Send,
    {
        OrElse {
            effect: self,
            handler,
        }
    }

    /// Like [`or_else`](Self::or_else), but only for errors `matches`
    /// accepts.
    fn recover<P, H, Fallback>(self, matches: P, handler: H) -> Recover<Self, P, H, Fallback>
    where
        P: FnOnce(&Self::Error) -> bool + Send,
        H: FnOnce(Self::Error) -> Fallback + Send,
        Fallback: Effect<Output = Self::Output, Error = Self::Error, Env = Self::Env>,
    {
        Recover {
            effect: self,
            matches,
            handler,
            _fallback: PhantomData,
        }
    }

    /// Erase the concrete type, e.g. to store the effect in a proxy.
    fn boxed(self) -> BoxedEffect<Self::Output, Self::Error, Self::Env>
    where
        Self: 'static,
        Self::Output: 'static,
        Self::Error: 'static,
        Self::Env: 'static,
    {
        BoxedEffect::new(self)
    }

    /// Run and await.
    #[allow(async_fn_in_trait)]
    async fn execute(self, env: &Self::Env) -> Result<Self::Output, Self::Error> {
        self.run(env).await
    }
}

impl<E: Effect> EffectExt for E {}
