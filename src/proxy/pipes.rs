//! Stateless pipe stages.
//!
//! Every stage here loops until its upstream is exhausted, so its result
//! type is free and the composed pipeline finishes with upstream's result.

use std::sync::Arc;

use crate::effect::Effect;
use crate::proxy::algebra::Proxy;
use crate::proxy::repeat::repeat;
use crate::proxy::shapes::{awaiting, lift, yielding, Consumer, Pipe};

/// Apply `f` to every value.
pub fn map<A, B, R, E, Env, F>(f: F) -> Pipe<A, B, R, E, Env>
where
    A: Send + 'static,
    B: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    let f = Arc::new(f);
    repeat(move || {
        let f = f.clone();
        awaiting().and_then(move |a| yielding(f(a)))
    })
}

/// Run the effect `f` builds for every value and emit its output.
pub fn map_m<A, B, R, E, Env, F, Eff>(f: F) -> Pipe<A, B, R, E, Env>
where
    A: Send + 'static,
    B: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(A) -> Eff + Send + Sync + 'static,
    Eff: Effect<Output = B, Error = E, Env = Env> + 'static,
{
    let f = Arc::new(f);
    repeat(move || {
        let f = f.clone();
        awaiting().and_then(move |a| lift(f(a)).and_then(yielding))
    })
}

/// Forward only the values `keep` accepts.
pub fn filter<A, R, E, Env, P>(keep: P) -> Pipe<A, A, R, E, Env>
where
    A: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    let keep = Arc::new(keep);
    repeat(move || {
        let keep = keep.clone();
        awaiting().and_then(move |a| {
            if keep(&a) {
                yielding(a)
            } else {
                Proxy::Pure(())
            }
        })
    })
}

/// Forward the first `n` values, then finish.
///
/// Finishing ends the whole composed pipeline, so upstream is never asked
/// for value `n + 1`.
pub fn take<A, E, Env>(n: usize) -> Pipe<A, A, (), E, Env>
where
    A: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    if n == 0 {
        return Proxy::Pure(());
    }
    awaiting().and_then(move |a| yielding(a).and_then(move |()| take(n - 1)))
}

/// Accept and discard every value.
pub fn drain<A, R, E, Env>() -> Consumer<A, R, E, Env>
where
    A: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    repeat(|| awaiting().map(drop))
}
