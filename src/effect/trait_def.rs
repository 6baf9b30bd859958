//! The effect-monad contract consumed by the streaming core.
//!
//! Every suspension point inside a [`Proxy`](crate::proxy::Proxy) is an
//! `Effect`: a one-shot computation that, given an environment, either
//! produces a value or fails with a typed error. The proxy algebra never
//! looks inside an effect; it only runs it and continues with the result.
//!
//! The trait mirrors `Future`: combinators return concrete types and
//! `.boxed()` erases them when a uniform type is needed (which is always
//! the case for effects stored inside a proxy).

use std::future::Future;

/// A computation that may perform side effects.
///
/// * `Output` - value produced on success
/// * `Error` - typed failure
/// * `Env` - environment the effect reads its dependencies from
///
/// `Env` is `Clone` so that boxed effects can own a copy for a `'static`
/// future. Keep heavy dependencies behind `Arc`.
///
/// # Example
///
/// ```rust
/// use millrace::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = pure::<_, String, ()>(20).map(|x| x + 1).and_then(|x| pure(x * 2));
/// assert_eq!(effect.run(&()).await, Ok(42));
/// # });
/// ```
pub trait Effect: Sized + Send {
    /// The success type.
    type Output: Send;

    /// The failure type.
    type Error: Send;

    /// The environment required to run the effect.
    type Env: Clone + Send + Sync;

    /// Run the effect to completion.
    fn run(self, env: &Self::Env)
        -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}
