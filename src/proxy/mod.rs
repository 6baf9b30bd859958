//! Bidirectional streaming pipelines.
//!
//! A [`Proxy`] is a process with an upstream interface (it sends `UO`
//! requests and receives `UI` replies) and a downstream interface (it
//! receives `DI` requests and sends `DO` responses). Every other streaming
//! shape is a `Proxy` with some ports closed off by [`Void`] or `()`:
//!
//! | shape | upstream | downstream |
//! |-------|----------|------------|
//! | [`Producer<O>`](Producer) | closed | emits `O` |
//! | [`Consumer<I>`](Consumer) | awaits `I` | closed |
//! | [`Pipe<I, O>`](Pipe) | awaits `I` | emits `O` |
//! | [`Client<Req, Resp>`](Client) | requests | closed |
//! | [`Server<Req, Resp>`](Server) | closed | responds |
//! | [`Closed<R>`](Closed) | closed | closed |
//!
//! Pipelines are built by composition ([`compose`], [`pull`], [`push`],
//! [`for_each_respond`], [`for_each_request`]) and are inert values until
//! a closed one is run, either as an [`Effect`](crate::effect::Effect) or
//! with [`run`] / [`run_until_cancelled`].
//!
//! ```rust
//! use millrace::proxy::{self, pipes, Closed, Producer};
//!
//! # tokio_test::block_on(async {
//! let words: Producer<&str> = proxy::each(["tick", "", "tock"]);
//! let pipeline: Closed<Vec<usize>> = proxy::to_vec(
//!     words
//!         .pipe(pipes::filter(|w: &&str| !w.is_empty()))
//!         .pipe(pipes::map(|w: &str| w.len())),
//! );
//! assert_eq!(proxy::run(pipeline, &()).await, Ok(vec![4, 4]));
//! # });
//! ```

mod algebra;
mod collect;
mod compose;
pub mod fold;
pub mod pipes;
mod repeat;
mod run;
mod shapes;

pub use algebra::{Next, Proxy, Void};
pub use collect::{fold_producer, to_vec};
pub use compose::{compose, for_each_request, for_each_respond, pull, push};
pub use repeat::{repeat, repeat_m, repeat_m_with, repeat_with};
pub use run::{run, run_until_cancelled};
pub use shapes::{
    awaiting, cat, each, lift, request, respond, sleep, yielding, Client, Closed, Consumer, Pipe,
    Producer, Server,
};

#[cfg(test)]
mod tests;
