//! Concrete effect types returned by the constructors and by
//! [`EffectExt`](crate::effect::EffectExt).
//!
//! Most code never names these types; they show up behind `impl Effect`
//! until a proxy boxes them.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use crate::effect::trait_def::Effect;

// Closures have no useful `Debug`; print the shape only.
macro_rules! opaque_debug {
    ($name:ident<$($param:ident),+> { $($field:ident),* }) => {
        impl<$($param),+> fmt::Debug for $name<$($param),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &"<opaque>"))*
                    .finish()
            }
        }
    };
}

/// Succeeds with a value it already holds. See [`pure`](crate::effect::pure).
#[derive(Debug, Clone)]
pub struct Pure<T, E, Env> {
    pub(crate) value: T,
    pub(crate) _types: PhantomData<fn() -> (E, Env)>,
}

impl<T, E, Env> Effect for Pure<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Env) -> Result<T, E> {
        Ok(self.value)
    }
}

/// Fails with an error it already holds. See [`fail`](crate::effect::fail).
#[derive(Debug, Clone)]
pub struct Fail<T, E, Env> {
    pub(crate) error: E,
    pub(crate) _types: PhantomData<fn() -> (T, Env)>,
}

impl<T, E, Env> Effect for Fail<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Env) -> Result<T, E> {
        Err(self.error)
    }
}

/// A synchronous, possibly failing function of the environment. See
/// [`from_fn`](crate::effect::from_fn).
pub struct FromFn<F, Env> {
    pub(crate) body: F,
    pub(crate) _env: PhantomData<fn(Env)>,
}

opaque_debug!(FromFn<F, Env> { body });

impl<F, T, E, Env> Effect for FromFn<F, Env>
where
    F: FnOnce(&Env) -> Result<T, E> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, env: &Env) -> Result<T, E> {
        (self.body)(env)
    }
}

/// An async function of the environment. See
/// [`from_async`](crate::effect::from_async).
///
/// The future it returns is cancelled by dropping it, which is how the
/// pipeline runner interrupts an in-flight step.
pub struct FromAsync<F, Env> {
    pub(crate) body: F,
    pub(crate) _env: PhantomData<fn(Env)>,
}

opaque_debug!(FromAsync<F, Env> { body });

impl<F, Fut, T, E, Env> Effect for FromAsync<F, Env>
where
    F: FnOnce(&Env) -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    fn run(self, env: &Env) -> impl Future<Output = Result<T, E>> + Send {
        (self.body)(env)
    }
}

/// Transforms the output. Created by `EffectExt::map`.
pub struct Map<Eff, F> {
    pub(crate) effect: Eff,
    pub(crate) transform: F,
}

opaque_debug!(Map<Eff, F> { effect, transform });

impl<Eff, F, U> Effect for Map<Eff, F>
where
    Eff: Effect,
    F: FnOnce(Eff::Output) -> U + Send,
    U: Send,
{
    type Output = U;
    type Error = Eff::Error;
    type Env = Eff::Env;

    async fn run(self, env: &Eff::Env) -> Result<U, Eff::Error> {
        self.effect.run(env).await.map(self.transform)
    }
}

/// Feeds the output into a dependent effect. Created by
/// `EffectExt::and_then`.
///
/// Both effects share an error type; `map_err` first when they do not.
pub struct AndThen<Eff, F> {
    pub(crate) effect: Eff,
    pub(crate) next: F,
}

opaque_debug!(AndThen<Eff, F> { effect, next });

impl<Eff, F, Next> Effect for AndThen<Eff, F>
where
    Eff: Effect,
    Next: Effect<Error = Eff::Error, Env = Eff::Env>,
    F: FnOnce(Eff::Output) -> Next + Send,
{
    type Output = Next::Output;
    type Error = Eff::Error;
    type Env = Eff::Env;

    async fn run(self, env: &Eff::Env) -> Result<Next::Output, Eff::Error> {
        let value = self.effect.run(env).await?;
        (self.next)(value).run(env).await
    }
}

/// Transforms the error. Created by `EffectExt::map_err`.
pub struct MapErr<Eff, F> {
    pub(crate) effect: Eff,
    pub(crate) transform: F,
}

opaque_debug!(MapErr<Eff, F> { effect, transform });

impl<Eff, F, E2> Effect for MapErr<Eff, F>
where
    Eff: Effect,
    F: FnOnce(Eff::Error) -> E2 + Send,
    E2: Send,
{
    type Output = Eff::Output;
    type Error = E2;
    type Env = Eff::Env;

    async fn run(self, env: &Eff::Env) -> Result<Eff::Output, E2> {
        self.effect.run(env).await.map_err(self.transform)
    }
}

/// Replaces any failure with the effect the handler builds from it.
/// Created by `EffectExt::or_else`.
pub struct OrElse<Eff, H> {
    pub(crate) effect: Eff,
    pub(crate) handler: H,
}

opaque_debug!(OrElse<Eff, H> { effect, handler });

impl<Eff, H, Fallback> Effect for OrElse<Eff, H>
where
    Eff: Effect,
    Fallback: Effect<Output = Eff::Output, Env = Eff::Env>,
    H: FnOnce(Eff::Error) -> Fallback + Send,
{
    type Output = Eff::Output;
    type Error = Fallback::Error;
    type Env = Eff::Env;

    async fn run(self, env: &Eff::Env) -> Result<Eff::Output, Fallback::Error> {
        match self.effect.run(env).await {
            Ok(value) => Ok(value),
            Err(error) => (self.handler)(error).run(env).await,
        }
    }
}

/// Recovers from errors that satisfy a predicate; other errors propagate.
/// Created by `EffectExt::recover`.
///
/// Channel-state errors are usually matched with
/// [`Error::is`](crate::Error::is).
///
/// # Example
///
/// ```rust
/// use millrace::effect::prelude::*;
/// use millrace::{Error, ErrorKind};
///
/// # tokio_test::block_on(async {
/// let effect = fail::<i32, _, ()>(Error::Full)
///     .recover(|e: &Error| e.is(ErrorKind::Full), |_| pure(0));
/// assert_eq!(effect.run(&()).await, Ok(0));
///
/// let effect = fail::<i32, _, ()>(Error::Closed)
///     .recover(|e: &Error| e.is(ErrorKind::Full), |_| pure(0));
/// assert_eq!(effect.run(&()).await, Err(Error::Closed));
/// # });
/// ```
pub struct Recover<Eff, P, H, Fallback> {
    pub(crate) effect: Eff,
    pub(crate) matches: P,
    pub(crate) handler: H,
    pub(crate) _fallback: PhantomData<fn() -> Fallback>,
}

opaque_debug!(Recover<Eff, P, H, Fallback> { effect, matches, handler });

impl<Eff, P, H, Fallback> Effect for Recover<Eff, P, H, Fallback>
where
    Eff: Effect,
    P: FnOnce(&Eff::Error) -> bool + Send,
    H: FnOnce(Eff::Error) -> Fallback + Send,
    Fallback: Effect<Output = Eff::Output, Error = Eff::Error, Env = Eff::Env>,
{
    type Output = Eff::Output;
    type Error = Eff::Error;
    type Env = Eff::Env;

    async fn run(self, env: &Eff::Env) -> Result<Eff::Output, Eff::Error> {
        match self.effect.run(env).await {
            Err(error) if (self.matches)(&error) => (self.handler)(error).run(env).await,
            settled => settled,
        }
    }
}
