//! One-stop import for the effect contract.
//!
//! ```rust
//! use millrace::effect::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let effect = pure::<_, String, ()>(1).and_then(|x| pure(x + 1));
//! assert_eq!(effect.execute(&()).await, Ok(2));
//! # });
//! ```

pub use crate::effect::boxed::{BoxFuture, BoxedEffect};
pub use crate::effect::combinators::{
    AndThen, Fail, FromAsync, FromFn, Map, MapErr, OrElse, Pure, Recover,
};
pub use crate::effect::constructors::{fail, from_async, from_fn, from_result, pure};
pub use crate::effect::ext::EffectExt;
pub use crate::effect::parallel::{par2, par_all};
pub use crate::effect::trait_def::Effect;
pub use crate::effect::tracing::{EffectTracingExt, Instrument};
