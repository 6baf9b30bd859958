//! The effect-monad contract.
//!
//! The streaming core is generic over "some effect that can suspend and
//! can fail". In Rust that contract is the [`Effect`] trait:
//!
//! | contract | here |
//! |----------|------|
//! | `pure` | [`pure`] |
//! | `bind` / `map` | [`EffectExt::and_then`] / [`EffectExt::map`] |
//! | `liftAsync` | [`from_async`] |
//! | `fail` | [`fail`] |
//! | `catch(m, predicate, handler)` | [`EffectExt::recover`], [`EffectExt::or_else`] |
//!
//! Combinators are zero-cost structs; proxies store their steps as
//! [`BoxedEffect`]. Concurrency is whatever the future executor provides:
//! nothing here spawns threads.
//!
//! Scheduling glue lives in [`retry()`], [`retry_if`],
//! [`repeat`] and [`with_timeout`], all driven by a
//! [`Schedule`](crate::Schedule).

pub mod boxed;
pub mod combinators;
pub mod constructors;
pub mod ext;
pub mod parallel;
pub mod prelude;
mod retry;
pub mod tracing;
mod trait_def;

pub use boxed::{BoxFuture, BoxedEffect};
pub use combinators::{AndThen, Fail, FromAsync, FromFn, Map, MapErr, OrElse, Pure, Recover};
pub use constructors::{fail, from_async, from_fn, from_result, pure};
pub use ext::EffectExt;
pub use parallel::{join_combined, par2, par_all};
pub use retry::{repeat, retry, retry_if, with_timeout};
pub use trait_def::Effect;
pub use tracing::{EffectTracingExt, Instrument};
