//! Looping a proxy, optionally paced by a [`Schedule`].
//!
//! The factory closures rebuild the loop body for each iteration because
//! proxies are one-shot. A body should communicate or suspend at least
//! once; a body that finishes without either spins without yielding to
//! the runner.

use std::sync::Arc;

use crate::effect::Effect;
use crate::proxy::algebra::Proxy;
use crate::proxy::shapes::{lift, sleep, yielding};
use crate::schedule::{Delays, Schedule};

/// Run the proxy built by `make`, forever.
///
/// The loop never finishes by itself; it ends when the other side of a
/// composition finishes or an effect step fails.
pub fn repeat<UO, UI, DI, DO, R, R2, E, Env, F>(make: F) -> Proxy<UO, UI, DI, DO, R2, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    R: Send + 'static,
    R2: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Proxy<UO, UI, DI, DO, R, E, Env> + Send + Sync + 'static,
{
    forever(Arc::new(make))
}

fn forever<UO, UI, DI, DO, R, R2, E, Env, F>(make: Arc<F>) -> Proxy<UO, UI, DI, DO, R2, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    R: Send + 'static,
    R2: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Proxy<UO, UI, DI, DO, R, E, Env> + Send + Sync + 'static,
{
    let body = make();
    body.and_then(move |_| forever(make))
}

/// Run the proxy built by `make` once, then again after each delay of
/// `schedule`, finishing with the last iteration's result.
///
/// `Schedule::recurs(2)` gives three runs in total; `Schedule::never()`
/// runs the body exactly once.
pub fn repeat_with<UO, UI, DI, DO, R, E, Env, F>(
    schedule: Schedule,
    make: F,
) -> Proxy<UO, UI, DI, DO, R, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Proxy<UO, UI, DI, DO, R, E, Env> + Send + Sync + 'static,
{
    paced(Arc::new(make), schedule.delays())
}

fn paced<UO, UI, DI, DO, R, E, Env, F>(
    make: Arc<F>,
    mut delays: Delays,
) -> Proxy<UO, UI, DI, DO, R, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Proxy<UO, UI, DI, DO, R, E, Env> + Send + Sync + 'static,
{
    let body = make();
    body.and_then(move |r| match delays.next() {
        Some(delay) => sleep(delay).and_then(move |()| paced(make, delays)),
        None => Proxy::Pure(r),
    })
}

/// A producer that runs `make()` forever and emits each output.
///
/// ```rust
/// use millrace::proxy::{self, pipes, Closed, Producer};
/// use millrace::effect::prelude::*;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let counter = Arc::new(AtomicU32::new(0));
/// let ticks: Producer<u32> = proxy::repeat_m(move || {
///     let counter = counter.clone();
///     from_fn(move |_: &()| Ok(counter.fetch_add(1, Ordering::SeqCst)))
/// });
/// let first_three: Closed<Vec<u32>> = proxy::to_vec(ticks.pipe(pipes::take(3)));
/// assert_eq!(proxy::run(first_three, &()).await, Ok(vec![0, 1, 2]));
/// # });
/// ```
pub fn repeat_m<UO, UI, O, R, E, Env, F, Eff>(make: F) -> Proxy<UO, UI, (), O, R, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    O: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Eff + Send + Sync + 'static,
    Eff: Effect<Output = O, Error = E, Env = Env> + 'static,
{
    repeat(move || lift(make()).and_then(yielding))
}

/// Like [`repeat_m`], but emits once and then once more after each delay
/// of `schedule`, finishing when the schedule is exhausted.
pub fn repeat_m_with<UO, UI, O, E, Env, F, Eff>(
    schedule: Schedule,
    make: F,
) -> Proxy<UO, UI, (), O, (), E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn() -> Eff + Send + Sync + 'static,
    Eff: Effect<Output = O, Error = E, Env = Env> + 'static,
{
    repeat_with(schedule, move || lift(make()).and_then(yielding))
}
