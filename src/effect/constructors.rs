//! Free-function constructors for effects.

use std::future::Future;
use std::marker::PhantomData;

use crate::effect::combinators::{Fail, FromAsync, FromFn, Pure};

/// An effect that succeeds with `value`.
///
/// ```rust
/// use millrace::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// assert_eq!(pure::<_, String, ()>(42).run(&()).await, Ok(42));
/// # });
/// ```
pub fn pure<T, E, Env>(value: T) -> Pure<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    Pure {
        value,
        _types: PhantomData,
    }
}

/// An effect that fails with `error`.
///
/// ```rust
/// use millrace::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// assert_eq!(fail::<i32, _, ()>("boom").run(&()).await, Err("boom"));
/// # });
/// ```
pub fn fail<T, E, Env>(error: E) -> Fail<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    Fail {
        error,
        _types: PhantomData,
    }
}

/// An effect from a synchronous function of the environment.
pub fn from_fn<T, E, Env, F>(f: F) -> FromFn<F, Env>
where
    F: FnOnce(&Env) -> Result<T, E> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    FromFn {
        body: f,
        _env: PhantomData,
    }
}

/// Lift an asynchronous operation into an effect.
///
/// ```rust
/// use millrace::effect::prelude::*;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let effect = from_async(|_: &()| async {
///     tokio::time::sleep(Duration::from_millis(1)).await;
///     Ok::<_, String>(7)
/// });
/// assert_eq!(effect.run(&()).await, Ok(7));
/// # });
/// ```
pub fn from_async<T, E, Env, F, Fut>(f: F) -> FromAsync<F, Env>
where
    F: FnOnce(&Env) -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    FromAsync {
        body: f,
        _env: PhantomData,
    }
}

/// An effect from a `Result`.
pub fn from_result<T, E, Env>(
    result: Result<T, E>,
) -> FromFn<impl FnOnce(&Env) -> Result<T, E> + Send, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    from_fn(move |_: &Env| result)
}
