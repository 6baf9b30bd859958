//! The `Proxy` sum type and its monad instance.

use std::fmt;

use crate::effect::{from_async, pure, BoxedEffect, Effect, EffectExt};
use crate::error::Error;

/// A one-shot continuation waiting for a value of type `I`.
pub type Next<I, P> = Box<dyn FnOnce(I) -> P + Send>;

/// The uninhabited type: a port typed `Void` can never carry a value.
///
/// Producers never request (their upstream-out port is `Void`) and
/// consumers never respond (their downstream-out port is `Void`), so a
/// pipeline with both ends closed cannot communicate at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Void {}

impl Void {
    /// Anything follows from a value that cannot exist.
    pub fn absurd<T>(self) -> T {
        match self {}
    }
}

/// A bidirectional, effectful process with four ports.
///
/// * `UO` / `UI` - what it sends upstream / what upstream sends back
/// * `DI` / `DO` - what downstream sends back / what it sends downstream
/// * `R` - the value it returns when it finishes
/// * `E` / `Env` - error and environment of its effect steps
///
/// A proxy is one-shot: continuations are `FnOnce`, and running or
/// composing a proxy consumes it.
pub enum Proxy<UO, UI, DI, DO, R, E = Error, Env = ()> {
    /// Send `UO` upstream and continue with the reply.
    Request(UO, Next<UI, Proxy<UO, UI, DI, DO, R, E, Env>>),
    /// Send `DO` downstream and continue with what comes back.
    Respond(DO, Next<DI, Proxy<UO, UI, DI, DO, R, E, Env>>),
    /// Run one effect step, then continue with the proxy it produces.
    Effect(BoxedEffect<Proxy<UO, UI, DI, DO, R, E, Env>, E, Env>),
    /// Finished with a result.
    Pure(R),
}

impl<UO, UI, DI, DO, R, E, Env> fmt::Debug for Proxy<UO, UI, DI, DO, R, E, Env>
where
    UO: fmt::Debug,
    DO: fmt::Debug,
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proxy::Request(out, _) => f
                .debug_tuple("Request")
                .field(out)
                .field(&"<continuation>")
                .finish(),
            Proxy::Respond(out, _) => f
                .debug_tuple("Respond")
                .field(out)
                .field(&"<continuation>")
                .finish(),
            Proxy::Effect(_) => f.debug_tuple("Effect").field(&"<effect>").finish(),
            Proxy::Pure(r) => f.debug_tuple("Pure").field(r).finish(),
        }
    }
}

impl<UO, UI, DI, DO, R, E, Env> Proxy<UO, UI, DI, DO, R, E, Env>
where
    UO: Send + 'static,
    UI: Send + 'static,
    DI: Send + 'static,
    DO: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// A proxy that is already finished.
    pub fn pure(value: R) -> Self {
        Proxy::Pure(value)
    }

    /// Suspend on `effect` and finish with its output.
    pub fn lift<Eff>(effect: Eff) -> Self
    where
        Eff: Effect<Output = R, Error = E, Env = Env> + 'static,
    {
        Proxy::Effect(effect.map(Proxy::Pure).boxed())
    }

    /// True if the proxy has finished.
    pub fn is_pure(&self) -> bool {
        matches!(self, Proxy::Pure(_))
    }

    /// Monadic bind: continue with `f(result)` once this proxy finishes.
    ///
    /// Requests and responds pass through unchanged; effect steps are
    /// bound through the effect's own `map`.
    pub fn and_then<R2, F>(self, f: F) -> Proxy<UO, UI, DI, DO, R2, E, Env>
    where
        R2: Send + 'static,
        F: FnOnce(R) -> Proxy<UO, UI, DI, DO, R2, E, Env> + Send + 'static,
    {
        match self {
            Proxy::Request(out, next) => {
                Proxy::Request(out, Box::new(move |reply| next(reply).and_then(f)))
            }
            Proxy::Respond(out, next) => {
                Proxy::Respond(out, Box::new(move |reply| next(reply).and_then(f)))
            }
            Proxy::Effect(step) => Proxy::Effect(step.map(move |p| p.and_then(f)).boxed()),
            Proxy::Pure(r) => f(r),
        }
    }

    /// Transform the result.
    pub fn map<R2, F>(self, f: F) -> Proxy<UO, UI, DI, DO, R2, E, Env>
    where
        R2: Send + 'static,
        F: FnOnce(R) -> R2 + Send + 'static,
    {
        self.and_then(move |r| Proxy::Pure(f(r)))
    }

    /// Swap the upstream and downstream ports.
    ///
    /// Every `Request` becomes a `Respond` and vice versa, turning a
    /// producer into a client-shaped proxy and back. Reflecting twice
    /// gives back a proxy that behaves exactly like the original.
    pub fn reflect(self) -> Proxy<DO, DI, UI, UO, R, E, Env> {
        match self {
            Proxy::Request(out, next) => {
                Proxy::Respond(out, Box::new(move |reply| next(reply).reflect()))
            }
            Proxy::Respond(out, next) => {
                Proxy::Request(out, Box::new(move |reply| next(reply).reflect()))
            }
            Proxy::Effect(step) => Proxy::Effect(step.map(|p| p.reflect()).boxed()),
            Proxy::Pure(r) => Proxy::Pure(r),
        }
    }

    /// Wrap the whole proxy in one effect step.
    ///
    /// The step runs every effect up to the next request, respond or
    /// result, so consecutive effects are fused and the outermost node of
    /// an observed proxy is always `Effect`. Combinators built from several
    /// proxies use this so callers cannot tell how many effect steps sit
    /// between two communications.
    pub fn observe(self) -> Self {
        let step = from_async(move |env: &Env| self.settle(env.clone()));
        Proxy::Effect(step.boxed())
    }

    // Run effect steps until the next communication or the result.
    async fn settle(self, env: Env) -> Result<Self, E> {
        let mut current = self;
        loop {
            match current {
                Proxy::Effect(step) => current = step.run(&env).await?,
                Proxy::Request(out, next) => {
                    return Ok(Proxy::Request(out, Box::new(move |reply| next(reply).observe())))
                }
                Proxy::Respond(out, next) => {
                    return Ok(Proxy::Respond(out, Box::new(move |reply| next(reply).observe())))
                }
                Proxy::Pure(r) => return Ok(Proxy::Pure(r)),
            }
        }
    }

    /// Change the error type of every effect step.
    pub fn map_err<E2, F>(self, f: F) -> Proxy<UO, UI, DI, DO, R, E2, Env>
    where
        E2: Send + 'static,
        F: Fn(E) -> E2 + Clone + Send + Sync + 'static,
    {
        match self {
            Proxy::Request(out, next) => {
                Proxy::Request(out, Box::new(move |reply| next(reply).map_err(f)))
            }
            Proxy::Respond(out, next) => {
                Proxy::Respond(out, Box::new(move |reply| next(reply).map_err(f)))
            }
            Proxy::Effect(step) => {
                let rest = f.clone();
                Proxy::Effect(step.map_err(f).map(move |p| p.map_err(rest)).boxed())
            }
            Proxy::Pure(r) => Proxy::Pure(r),
        }
    }

    /// Recover from failing effect steps.
    ///
    /// When a step fails, the rest of this proxy is abandoned and
    /// `handler(error)` takes its place. Failures raised by the handler's
    /// proxy propagate normally.
    pub fn catch<H>(self, handler: H) -> Self
    where
        H: Fn(E) -> Self + Clone + Send + Sync + 'static,
    {
        match self {
            Proxy::Request(out, next) => {
                Proxy::Request(out, Box::new(move |reply| next(reply).catch(handler)))
            }
            Proxy::Respond(out, next) => {
                Proxy::Respond(out, Box::new(move |reply| next(reply).catch(handler)))
            }
            Proxy::Effect(step) => {
                let rest = handler.clone();
                Proxy::Effect(
                    step.map(move |p| p.catch(rest))
                        .or_else(move |e| pure::<_, E, Env>(handler(e)))
                        .boxed(),
                )
            }
            Proxy::Pure(r) => Proxy::Pure(r),
        }
    }
}
