//! Schedule-driven retry, repeat and timeout for effects.
//!
//! All three take a factory (`Fn() -> Effect`) rather than an effect:
//! effects are consumed when run, so every attempt builds a fresh one.

use std::time::Duration;

use tokio::time::Instant;

use crate::effect::boxed::BoxedEffect;
use crate::effect::constructors::from_async;
use crate::effect::ext::EffectExt;
use crate::effect::trait_def::Effect;
use crate::schedule::{RetryExhausted, Schedule, TimeoutError};

/// Retry a failing effect once per schedule delay.
///
/// The first attempt runs immediately; after each failure the next delay
/// is slept before trying again. When the schedule is exhausted the last
/// error is returned inside [`RetryExhausted`].
///
/// ```rust
/// use millrace::effect::prelude::*;
/// use millrace::effect::retry;
/// use millrace::Schedule;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let calls = Arc::new(AtomicU32::new(0));
/// let counter = calls.clone();
/// let effect = retry(
///     move || {
///         let n = counter.fetch_add(1, Ordering::SeqCst);
///         from_fn(move |_: &()| if n < 2 { Err("flaky") } else { Ok(n) })
///     },
///     Schedule::recurs(5),
/// );
/// assert_eq!(effect.run(&()).await, Ok(2));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
pub fn retry<T, E, Env, F, Eff>(make: F, schedule: Schedule) -> BoxedEffect<T, RetryExhausted<E>, Env>
where
    T: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Eff + Send + 'static,
    Eff: Effect<Output = T, Error = E, Env = Env> + 'static,
{
    retry_if(make, schedule, |_: &E| true)
}

/// Retry only errors for which `should_retry` holds.
///
/// A non-retryable error ends the loop at once, still wrapped in
/// [`RetryExhausted`] so the attempt count is available.
pub fn retry_if<T, E, Env, F, Eff, P>(
    make: F,
    schedule: Schedule,
    should_retry: P,
) -> BoxedEffect<T, RetryExhausted<E>, Env>
where
    T: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Eff + Send + 'static,
    Eff: Effect<Output = T, Error = E, Env = Env> + 'static,
    P: Fn(&E) -> bool + Send + 'static,
{
    from_async(move |env: &Env| {
        let env = env.clone();
        async move {
            let start = Instant::now();
            let mut delays = schedule.into_iter();
            let mut attempts = 0u32;

            loop {
                attempts += 1;
                let error = match make().run(&env).await {
                    Ok(value) => return Ok(value),
                    Err(error) => error,
                };

                if !should_retry(&error) {
                    return Err(RetryExhausted::new(error, attempts, start.elapsed()));
                }

                match delays.next() {
                    Some(delay) => {
                        tracing::debug!(attempts, ?delay, "effect failed, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::debug!(attempts, "retry schedule exhausted");
                        return Err(RetryExhausted::new(error, attempts, start.elapsed()));
                    }
                }
            }
        }
    })
    .boxed()
}

/// Run an effect once, then again after every schedule delay.
///
/// Stops at the first failure. On success returns the output of the last run.
pub fn repeat<T, E, Env, F, Eff>(make: F, schedule: Schedule) -> BoxedEffect<T, E, Env>
where
    T: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Eff + Send + 'static,
    Eff: Effect<Output = T, Error = E, Env = Env> + 'static,
{
    from_async(move |env: &Env| {
        let env = env.clone();
        async move {
            let mut last = make().run(&env).await?;
            for delay in schedule {
                tokio::time::sleep(delay).await;
                last = make().run(&env).await?;
            }
            Ok(last)
        }
    })
    .boxed()
}

/// Fail with [`TimeoutError::Timeout`] if `effect` takes longer than `duration`.
///
/// The effect's future is dropped when the deadline passes.
pub fn with_timeout<Eff>(
    effect: Eff,
    duration: Duration,
) -> BoxedEffect<Eff::Output, TimeoutError<Eff::Error>, Eff::Env>
where
    Eff: Effect + 'static,
    Eff::Output: 'static,
    Eff::Error: 'static,
    Eff::Env: 'static,
{
    from_async(move |env: &Eff::Env| {
        let env = env.clone();
        async move {
            match tokio::time::timeout(duration, effect.run(&env)).await {
                Ok(result) => result.map_err(TimeoutError::Inner),
                Err(_) => Err(TimeoutError::Timeout { duration }),
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::constructors::{fail, from_fn, pure};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_after_schedule() {
        let effect = retry(
            || fail::<(), _, ()>("nope"),
            Schedule::spaced(Duration::from_millis(5)).take(3),
        );
        let exhausted = effect.run(&()).await.unwrap_err();
        assert_eq!(exhausted.attempts, 4);
        assert_eq!(exhausted.final_error, "nope");
    }

    #[tokio::test]
    async fn retry_if_stops_on_permanent_error() {
        #[derive(Debug, PartialEq)]
        enum Failure {
            Transient,
            Permanent,
        }

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let effect = retry_if(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                from_fn(move |_: &()| {
                    Err::<(), _>(if n == 0 {
                        Failure::Transient
                    } else {
                        Failure::Permanent
                    })
                })
            },
            Schedule::recurs(10),
            |e| *e == Failure::Transient,
        );

        let exhausted = effect.run(&()).await.unwrap_err();
        assert_eq!(exhausted.final_error, Failure::Permanent);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_runs_once_per_delay_plus_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let effect = repeat(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                pure::<_, String, ()>(n)
            },
            Schedule::spaced(Duration::from_millis(10)).take(3),
        );
        assert_eq!(effect.run(&()).await, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires() {
        let slow = from_async(|_: &()| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, String>(1)
        });
        let result = with_timeout(slow, Duration::from_millis(10)).run(&()).await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn timeout_passes_inner_error_through() {
        let result = with_timeout(fail::<i32, _, ()>("inner"), Duration::from_secs(1))
            .run(&())
            .await;
        assert_eq!(result, Err(TimeoutError::Inner("inner")));
    }
}
