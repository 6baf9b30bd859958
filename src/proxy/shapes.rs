//! Named shapes of `Proxy` and the primitive communication steps.

use std::time::Duration;

use crate::effect::{from_async, Effect};
use crate::error::Error;
use crate::proxy::algebra::{Proxy, Void};

/// Emits `O` downstream, never requests.
pub type Producer<O, R = (), E = Error, Env = ()> = Proxy<Void, (), (), O, R, E, Env>;

/// Awaits `I` from upstream, never responds.
pub type Consumer<I, R = (), E = Error, Env = ()> = Proxy<(), I, (), Void, R, E, Env>;

/// Awaits `I` from upstream and emits `O` downstream.
pub type Pipe<I, O, R = (), E = Error, Env = ()> = Proxy<(), I, (), O, R, E, Env>;

/// Sends requests upstream and receives responses, never responds.
pub type Client<Req, Resp, R = (), E = Error, Env = ()> = Proxy<Req, Resp, (), Void, R, E, Env>;

/// Receives requests from downstream and answers them, never requests.
pub type Server<Req, Resp, R = (), E = Error, Env = ()> = Proxy<Void, (), Req, Resp, R, E, Env>;

/// Both ends closed: only effect steps remain, so it can be run.
pub type Closed<R, E = Error, Env = ()> = Proxy<Void, (), (), Void, R, E, Env>;

/// Send `value` upstream and finish with the reply.
pub fn request<UO, UI, DI, DO, E, Env>(value: UO) -> Proxy<UO, UI, DI, DO, UI, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    E: Send + 'static,
    Env: Send + 'static,
{
    Proxy::Request(value, Box::new(Proxy::Pure))
}

/// Send `value` downstream and finish with the reply.
pub fn respond<UO, UI, DI, DO, E, Env>(value: DO) -> Proxy<UO, UI, DI, DO, DI, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    E: Send + 'static,
    Env: Send + 'static,
{
    Proxy::Respond(value, Box::new(Proxy::Pure))
}

/// Ask upstream for the next value.
pub fn awaiting<UI, DI, DO, E, Env>() -> Proxy<(), UI, DI, DO, UI, E, Env>
where
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    E: Send + 'static,
    Env: Send + 'static,
{
    request(())
}

/// Emit `value` downstream.
pub fn yielding<UO, UI, DO, E, Env>(value: DO) -> Proxy<UO, UI, (), DO, (), E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DO: Send + 'static,
    E: Send + 'static,
    Env: Send + 'static,
{
    Proxy::Respond(value, Box::new(|()| Proxy::Pure(())))
}

/// Lift an effect into any proxy shape.
pub fn lift<UO, UI, DI, DO, R, E, Env, Eff>(effect: Eff) -> Proxy<UO, UI, DI, DO, R, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    Eff: Effect<Output = R, Error = E, Env = Env> + 'static,
{
    Proxy::lift(effect)
}

/// Suspend for `duration` on the tokio clock.
pub fn sleep<UO, UI, DI, DO, E, Env>(duration: Duration) -> Proxy<UO, UI, DI, DO, (), E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    lift(from_async(move |_: &Env| async move {
        tokio::time::sleep(duration).await;
        Ok(())
    }))
}

/// The identity pipe: forward every value unchanged, forever.
pub fn cat<A, R, E, Env>() -> Pipe<A, A, R, E, Env>
where
    A: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Send + 'static,
{
    Proxy::Request((), Box::new(|a| Proxy::Respond(a, Box::new(|()| cat()))))
}

/// Emit every item of `items` in order, then finish.
///
/// The iterator is advanced lazily, one item per downstream demand.
pub fn each<I, UO, UI, E, Env>(items: I) -> Proxy<UO, UI, (), I::Item, (), E, Env>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
    UO: Send + 'static,
    UI: Send + 'static,
    E: Send + 'static,
    Env: Send + 'static,
{
    emit_from(items.into_iter())
}

fn emit_from<It, UO, UI, E, Env>(mut items: It) -> Proxy<UO, UI, (), It::Item, (), E, Env>
where
    It: Iterator + Send + 'static,
    It::Item: Send + 'static,
    UO: Send + 'static,
    UI: Send + 'static,
    E: Send + 'static,
    Env: Send + 'static,
{
    match items.next() {
        Some(item) => Proxy::Respond(item, Box::new(move |()| emit_from(items))),
        None => Proxy::Pure(()),
    }
}
