//! The composition operators.
//!
//! | operator | function |
//! |----------|----------|
//! | `p >-> q` (pull composition, fixed to `()` requests) | [`compose`], [`Proxy::pipe`] |
//! | `f +>> q` (pull-based, request-driven) | [`pull`] |
//! | `p >>~ f` (push-based, respond-driven) | [`push`] |
//! | `p //> f` (replace every respond) | [`for_each_respond`] |
//! | `f >\\ q` (replace every request) | [`for_each_request`] |
//!
//! Type parameters follow the port letters: an upstream proxy with ports
//! `(A1, A, B1, B)` meets a downstream proxy with ports `(B1, B, C1, C)`
//! and the result exposes `(A1, A, C1, C)`. A `1` suffix marks the
//! request-side ("primed") type of a pair.
//!
//! Interleaving is driven by the downstream side: control passes upstream
//! only when downstream requests, and comes back when upstream responds.
//! The pairing loops below step synchronously through consecutive
//! request/respond hand-offs and only build continuations at effect steps
//! or at the pipeline's outer ports, so long pure exchanges run in
//! constant stack.

use std::sync::Arc;

use crate::effect::EffectExt;
use crate::proxy::algebra::{Next, Proxy};

/// Pull composition: serve every request of `downstream` with `upstream`.
///
/// `upstream` is started with the first request `downstream` makes. If
/// `downstream` finishes without requesting, `upstream` never runs.
/// Whichever side finishes first ends the composed proxy with its result.
pub fn pull<A1, A, B1, B, C1, C, R, E, Env, F>(
    upstream: F,
    downstream: Proxy<B1, B, C1, C, R, E, Env>,
) -> Proxy<A1, A, C1, C, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    C1: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: FnOnce(B1) -> Proxy<A1, A, B1, B, R, E, Env> + Send + 'static,
{
    serve_request(Box::new(upstream), downstream)
}

/// Push composition: feed every respond of `upstream` into `downstream`.
///
/// `downstream` is started with the first value `upstream` emits.
pub fn push<A1, A, B1, B, C1, C, R, E, Env, F>(
    upstream: Proxy<A1, A, B1, B, R, E, Env>,
    downstream: F,
) -> Proxy<A1, A, C1, C, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    C1: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: FnOnce(B) -> Proxy<B1, B, C1, C, R, E, Env> + Send + 'static,
{
    serve_respond(upstream, Box::new(downstream))
}

/// Connect a proxy whose downstream requests are `()` to one that only
/// ever requests `()`.
///
/// This is the everyday `producer >-> pipe >-> consumer` operator.
///
/// ```rust
/// use millrace::proxy::{self, pipes, Closed, Producer};
///
/// # tokio_test::block_on(async {
/// let numbers: Producer<i32> = proxy::each(1..=3);
/// let doubled = proxy::compose(numbers, pipes::map(|x: i32| x * 2));
/// let total: Closed<(i32, ())> = proxy::fold_producer(doubled, 0, |acc, x| acc + x);
/// assert_eq!(proxy::run(total, &()).await, Ok((12, ())));
/// # });
/// ```
pub fn compose<A1, A, B, C1, C, R, E, Env>(
    upstream: Proxy<A1, A, (), B, R, E, Env>,
    downstream: Proxy<(), B, C1, C, R, E, Env>,
) -> Proxy<A1, A, C1, C, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C1: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    serve_request(Box::new(move |()| upstream), downstream)
}

impl<A1, A, B, R, E, Env> Proxy<A1, A, (), B, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Method form of [`compose`]: `self >-> downstream`.
    pub fn pipe<C1, C>(
        self,
        downstream: Proxy<(), B, C1, C, R, E, Env>,
    ) -> Proxy<A1, A, C1, C, R, E, Env>
    where
        C1: Send + 'static,
        C: Send + 'static,
    {
        compose(self, downstream)
    }
}

// Downstream drives. Upstream is parked as a continuation waiting for the
// next request.
fn serve_request<A1, A, B1, B, C1, C, R, E, Env>(
    mut upstream: Next<B1, Proxy<A1, A, B1, B, R, E, Env>>,
    mut downstream: Proxy<B1, B, C1, C, R, E, Env>,
) -> Proxy<A1, A, C1, C, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    C1: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    loop {
        match downstream {
            Proxy::Request(b1, resume_down) => match upstream(b1) {
                Proxy::Respond(b, resume_up) => {
                    upstream = resume_up;
                    downstream = resume_down(b);
                }
                Proxy::Request(a1, resume_up) => {
                    return Proxy::Request(
                        a1,
                        Box::new(move |a| serve_respond(resume_up(a), resume_down)),
                    )
                }
                Proxy::Effect(step) => {
                    return Proxy::Effect(
                        step.map(move |up| serve_respond(up, resume_down)).boxed(),
                    )
                }
                Proxy::Pure(r) => return Proxy::Pure(r),
            },
            Proxy::Respond(c, resume_down) => {
                return Proxy::Respond(
                    c,
                    Box::new(move |c1| serve_request(upstream, resume_down(c1))),
                )
            }
            Proxy::Effect(step) => {
                return Proxy::Effect(
                    step.map(move |down| serve_request(upstream, down)).boxed(),
                )
            }
            Proxy::Pure(r) => return Proxy::Pure(r),
        }
    }
}

// Upstream drives until it responds. Downstream is parked waiting for the
// value.
fn serve_respond<A1, A, B1, B, C1, C, R, E, Env>(
    upstream: Proxy<A1, A, B1, B, R, E, Env>,
    downstream: Next<B, Proxy<B1, B, C1, C, R, E, Env>>,
) -> Proxy<A1, A, C1, C, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    C1: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    match upstream {
        Proxy::Request(a1, resume_up) => Proxy::Request(
            a1,
            Box::new(move |a| serve_respond(resume_up(a), downstream)),
        ),
        Proxy::Respond(b, resume_up) => serve_request(resume_up, downstream(b)),
        Proxy::Effect(step) => {
            Proxy::Effect(step.map(move |up| serve_respond(up, downstream)).boxed())
        }
        Proxy::Pure(r) => Proxy::Pure(r),
    }
}

/// Replace every respond of `proxy` with the proxy `f` builds for the
/// emitted value; the value `f`'s proxy finishes with becomes the reply.
///
/// With a producer and an effectful `f` this is "for each emitted value,
/// do something".
///
/// ```rust
/// use millrace::proxy::{self, Closed, Producer};
/// use millrace::effect::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// # tokio_test::block_on(async {
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let producer: Producer<&str> = proxy::each(["a", "b"]);
/// let pipeline: Closed<()> = proxy::for_each_respond(producer, move |s: &str| {
///     let sink = sink.clone();
///     proxy::lift(from_fn(move |_: &()| {
///         sink.lock().unwrap().push(s.to_uppercase());
///         Ok(())
///     }))
/// });
/// proxy::run(pipeline, &()).await.unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec!["A", "B"]);
/// # });
/// ```
pub fn for_each_respond<X1, X, B1, B, C1, C, R, E, Env, F>(
    proxy: Proxy<X1, X, B1, B, R, E, Env>,
    f: F,
) -> Proxy<X1, X, C1, C, R, E, Env>
where
    X1: Send + 'static,
    X: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    C1: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(B) -> Proxy<X1, X, C1, C, B1, E, Env> + Send + Sync + 'static,
{
    replace_respond(proxy, Arc::new(f))
}

fn replace_respond<X1, X, B1, B, C1, C, R, E, Env, F>(
    mut proxy: Proxy<X1, X, B1, B, R, E, Env>,
    f: Arc<F>,
) -> Proxy<X1, X, C1, C, R, E, Env>
where
    X1: Send + 'static,
    X: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    C1: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(B) -> Proxy<X1, X, C1, C, B1, E, Env> + Send + Sync + 'static,
{
    loop {
        match proxy {
            Proxy::Request(x1, next) => {
                return Proxy::Request(x1, Box::new(move |x| replace_respond(next(x), f)))
            }
            Proxy::Respond(b, next) => {
                let body = f(b);
                match body {
                    Proxy::Pure(b1) => proxy = next(b1),
                    body => return body.and_then(move |b1| replace_respond(next(b1), f)),
                }
            }
            Proxy::Effect(step) => {
                return Proxy::Effect(step.map(move |p| replace_respond(p, f)).boxed())
            }
            Proxy::Pure(r) => return Proxy::Pure(r),
        }
    }
}

/// Replace every request of `proxy` with the proxy `f` builds for the
/// request; the value `f`'s proxy finishes with becomes the reply.
///
/// With a client and a pure `f` this serves every request locally.
pub fn for_each_request<A1, A, B1, B, Y1, Y, R, E, Env, F>(
    f: F,
    proxy: Proxy<B1, B, Y1, Y, R, E, Env>,
) -> Proxy<A1, A, Y1, Y, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    Y1: Send + 'static,
    Y: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(B1) -> Proxy<A1, A, Y1, Y, B, E, Env> + Send + Sync + 'static,
{
    replace_request(Arc::new(f), proxy)
}

fn replace_request<A1, A, B1, B, Y1, Y, R, E, Env, F>(
    f: Arc<F>,
    mut proxy: Proxy<B1, B, Y1, Y, R, E, Env>,
) -> Proxy<A1, A, Y1, Y, R, E, Env>
where
    A1: Send + 'static,
    A: Send + 'static,
    B1: Send + 'static,
    B: Send + 'static,
    Y1: Send + 'static,
    Y: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(B1) -> Proxy<A1, A, Y1, Y, B, E, Env> + Send + Sync + 'static,
{
    loop {
        match proxy {
            Proxy::Request(b1, next) => {
                let body = f(b1);
                match body {
                    Proxy::Pure(b) => proxy = next(b),
                    body => return body.and_then(move |b| replace_request(f, next(b))),
                }
            }
            Proxy::Respond(y, next) => {
                return Proxy::Respond(y, Box::new(move |y1| replace_request(f, next(y1))))
            }
            Proxy::Effect(step) => {
                return Proxy::Effect(step.map(move |p| replace_request(f, p)).boxed())
            }
            Proxy::Pure(r) => return Proxy::Pure(r),
        }
    }
}
