//! Closing a producer by folding what it emits.

use std::sync::Arc;

use crate::effect::EffectExt;
use crate::proxy::algebra::Proxy;
use crate::proxy::shapes::{Closed, Producer};

/// Fold every value `producer` emits into an accumulator.
///
/// The result is a closed pipeline finishing with the accumulator and the
/// producer's own result.
pub fn fold_producer<O, R, S, E, Env, F>(
    producer: Producer<O, R, E, Env>,
    init: S,
    f: F,
) -> Closed<(S, R), E, Env>
where
    O: Send + 'static,
    R: Send + 'static,
    S: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, O) -> S + Send + Sync + 'static,
{
    folding(producer, init, Arc::new(f))
}

fn folding<O, R, S, E, Env, F>(
    mut producer: Producer<O, R, E, Env>,
    mut acc: S,
    f: Arc<F>,
) -> Closed<(S, R), E, Env>
where
    O: Send + 'static,
    R: Send + 'static,
    S: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, O) -> S + Send + Sync + 'static,
{
    loop {
        match producer {
            Proxy::Respond(value, next) => {
                acc = f(acc, value);
                producer = next(());
            }
            Proxy::Effect(step) => {
                return Proxy::Effect(step.map(move |p| folding(p, acc, f)).boxed())
            }
            Proxy::Pure(r) => return Proxy::Pure((acc, r)),
            Proxy::Request(never, _) => match never {},
        }
    }
}

/// Collect every value `producer` emits, in order.
pub fn to_vec<O, R, E, Env>(producer: Producer<O, R, E, Env>) -> Closed<Vec<O>, E, Env>
where
    O: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    fold_producer(producer, Vec::new(), |mut values, value| {
        values.push(value);
        values
    })
    .map(|(values, _)| values)
}
