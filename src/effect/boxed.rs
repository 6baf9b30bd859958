//! Type-erased effects.
//!
//! Proxies store their pending steps as [`BoxedEffect`]: every step has a
//! different combinator type, and a proxy needs one type for all of them.
//! A boxed effect owns a clone of the environment while it runs, which
//! makes its future `'static`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::effect::trait_def::Effect;

/// A pinned, boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// Object-safe view of an effect: consume the box, own the environment.
trait Erased<T, E, Env>: Send {
    fn start(self: Box<Self>, env: Env) -> BoxFuture<'static, Result<T, E>>;
}

impl<Eff> Erased<Eff::Output, Eff::Error, Eff::Env> for Eff
where
    Eff: Effect + 'static,
    Eff::Output: 'static,
    Eff::Error: 'static,
    Eff::Env: 'static,
{
    fn start(
        self: Box<Self>,
        env: Eff::Env,
    ) -> BoxFuture<'static, Result<Eff::Output, Eff::Error>> {
        Box::pin(async move { (*self).run(&env).await })
    }
}

/// An effect whose concrete type has been erased.
///
/// # Example
///
/// ```rust
/// use millrace::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let steps: Vec<BoxedEffect<i32, String, ()>> = vec![
///     pure(1).boxed(),
///     pure(2).map(|x| x * 10).boxed(),
/// ];
/// let mut total = 0;
/// for step in steps {
///     total += step.run(&()).await.unwrap();
/// }
/// assert_eq!(total, 21);
/// # });
/// ```
pub struct BoxedEffect<T, E, Env> {
    effect: Box<dyn Erased<T, E, Env>>,
}

impl<T, E, Env> fmt::Debug for BoxedEffect<T, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedEffect(<effect>)")
    }
}

impl<T, E, Env> BoxedEffect<T, E, Env>
where
    T: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Box `effect`.
    pub fn new<Eff>(effect: Eff) -> Self
    where
        Eff: Effect<Output = T, Error = E, Env = Env> + 'static,
    {
        BoxedEffect {
            effect: Box::new(effect),
        }
    }
}

impl<T, E, Env> Effect for BoxedEffect<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    fn run(self, env: &Env) -> impl Future<Output = Result<T, E>> + Send {
        self.effect.start(env.clone())
    }
}
