//! Running effects concurrently.
//!
//! - [`par2`] runs two heterogeneous effects side by side
//! - [`par_all`] runs many boxed effects and aggregates every failure
//! - [`join_combined`] joins two raw futures the same way; the channel
//!   layer uses it for fan-out posts

use std::future::Future;

use crate::effect::boxed::BoxedEffect;
use crate::effect::trait_def::Effect;
use crate::semigroup::Semigroup;

/// Run two effects concurrently and return both outcomes.
///
/// ```rust
/// use millrace::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let (a, b) = par2(pure::<_, String, ()>(1), pure::<_, String, ()>("two"), &()).await;
/// assert_eq!(a, Ok(1));
/// assert_eq!(b, Ok("two"));
/// # });
/// ```
pub async fn par2<E1, E2>(
    e1: E1,
    e2: E2,
    env: &E1::Env,
) -> (Result<E1::Output, E1::Error>, Result<E2::Output, E2::Error>)
where
    E1: Effect,
    E2: Effect<Env = E1::Env>,
{
    futures::join!(e1.run(env), e2.run(env))
}

/// Run boxed effects concurrently.
///
/// Every effect runs to completion. On success the outputs come back in
/// input order; otherwise all failures are folded into one error with
/// [`Semigroup::combine`], in input order.
pub async fn par_all<T, E, Env>(effects: Vec<BoxedEffect<T, E, Env>>, env: &Env) -> Result<Vec<T>, E>
where
    T: Send + 'static,
    E: Semigroup + Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    let results = futures::future::join_all(effects.into_iter().map(|eff| eff.run(env))).await;

    let mut values = Vec::with_capacity(results.len());
    let mut failure: Option<E> = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(e) => {
                failure = Some(match failure {
                    Some(acc) => acc.combine(e),
                    None => e,
                })
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Await two fallible futures concurrently, never short-circuiting.
///
/// Both futures always run to completion. If both fail, the errors are
/// combined left-then-right.
pub async fn join_combined<A, B, E, FA, FB>(left: FA, right: FB) -> Result<(A, B), E>
where
    FA: Future<Output = Result<A, E>>,
    FB: Future<Output = Result<B, E>>,
    E: Semigroup,
{
    match futures::join!(left, right) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(l), Err(r)) => Err(l.combine(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::constructors::{fail, from_async, pure};
    use crate::effect::ext::EffectExt;
    use std::time::Duration;

    fn delayed(value: i32, ms: u64) -> BoxedEffect<i32, Vec<String>, ()> {
        from_async(move |_: &()| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(value)
        })
        .boxed()
    }

    #[tokio::test]
    async fn par_all_keeps_input_order() {
        let effects = vec![delayed(1, 30), delayed(2, 10), delayed(3, 20)];
        assert_eq!(par_all(effects, &()).await, Ok(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn par_all_collects_every_failure() {
        let effects = vec![
            fail::<i32, _, ()>(vec!["a".to_string()]).boxed(),
            pure(2).boxed(),
            fail(vec!["c".to_string()]).boxed(),
        ];
        assert_eq!(
            par_all(effects, &()).await,
            Err(vec!["a".to_string(), "c".to_string()])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn par2_runs_concurrently() {
        let start = tokio::time::Instant::now();
        let (a, b) = par2(delayed(1, 100), delayed(2, 100), &()).await;
        assert_eq!((a, b), (Ok(1), Ok(2)));
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn join_combined_does_not_short_circuit() {
        let result: Result<((), ()), Vec<&str>> =
            join_combined(async { Err(vec!["left"]) }, async { Err(vec!["right"]) }).await;
        assert_eq!(result, Err(vec!["left", "right"]));
    }
}
