//! Aggregating pipes.
//!
//! Each pipe folds incoming values into an accumulator and emits the
//! accumulator downstream when its emission rule fires, then starts again
//! from `init`. The folding function borrows each value so the emission
//! predicates can look at it too.
//!
//! Windowed variants measure time on the tokio clock and check the window
//! when a value arrives: a pipe cannot emit while its upstream is silent,
//! because it only runs when it is handed a value. When the schedule runs
//! out, the pipe flushes what it holds and finishes with `()`.
//!
//! A partial accumulator is not emitted when upstream finishes: the
//! composed pipeline ends with upstream's result at that point.
//!
//! ```rust
//! use millrace::proxy::{self, fold, Closed, Producer};
//!
//! # tokio_test::block_on(async {
//! // Sum runs of values, emitting once a run reaches 10.
//! let values: Producer<u32> = proxy::each([4, 5, 3, 9, 1, 1]);
//! let sums = values.pipe(fold::fold_until(|s, x: &u32| s + x, |s, _| *s >= 10, 0));
//! let out: Closed<Vec<u32>> = proxy::to_vec(sums);
//! assert_eq!(proxy::run(out, &()).await, Ok(vec![12, 10]));
//! # });
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::proxy::algebra::Proxy;
use crate::proxy::shapes::{awaiting, yielding, Pipe};
use crate::schedule::{Delays, Schedule};

type NoPredicate<S, A> = fn(&S, &A) -> bool;

enum Rule<P> {
    Window,
    Until(P),
    While(P),
}

struct Folder<F, P, S> {
    fold: F,
    rule: Rule<P>,
    init: S,
}

struct State<S> {
    acc: S,
    // Whether `acc` holds anything folded since the last reset.
    dirty: bool,
}

impl<F, P, S> Folder<F, P, S>
where
    S: Clone,
{
    fn fresh(&self) -> State<S> {
        State {
            acc: self.init.clone(),
            dirty: false,
        }
    }

    // Fold one value in; returns an accumulator to emit, if the rule fired.
    fn absorb<A>(&self, state: State<S>, value: &A) -> (State<S>, Option<S>)
    where
        F: Fn(S, &A) -> S,
        P: Fn(&S, &A) -> bool,
    {
        match &self.rule {
            Rule::Window => {
                let acc = (self.fold)(state.acc, value);
                (State { acc, dirty: true }, None)
            }
            Rule::Until(done) => {
                let acc = (self.fold)(state.acc, value);
                if done(&acc, value) {
                    (self.fresh(), Some(acc))
                } else {
                    (State { acc, dirty: true }, None)
                }
            }
            Rule::While(keep) => {
                let next = (self.fold)(state.acc.clone(), value);
                if keep(&next, value) {
                    (
                        State {
                            acc: next,
                            dirty: true,
                        },
                        None,
                    )
                } else {
                    let restarted = State {
                        acc: (self.fold)(self.init.clone(), value),
                        dirty: true,
                    };
                    let emitted = state.dirty.then_some(state.acc);
                    (restarted, emitted)
                }
            }
        }
    }
}

struct Window {
    delays: Delays,
    length: Duration,
    started: Instant,
}

impl Window {
    fn open(schedule: &Schedule) -> Option<Self> {
        let mut delays = schedule.delays();
        let length = delays.next()?;
        Some(Window {
            delays,
            length,
            started: Instant::now(),
        })
    }

    fn elapsed(&self) -> bool {
        self.started.elapsed() >= self.length
    }

    // Start the next window, or `None` when the schedule is exhausted.
    fn advance(mut self) -> Option<Self> {
        let length = self.delays.next()?;
        Some(Window {
            delays: self.delays,
            length,
            started: Instant::now(),
        })
    }
}

enum Continue {
    Untimed,
    Timed(Window),
    Finished,
}

fn step<A, S, E, Env, F, P>(
    folder: Arc<Folder<F, P, S>>,
    state: State<S>,
    window: Option<Window>,
) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
    P: Fn(&S, &A) -> bool + Send + Sync + 'static,
{
    awaiting().and_then(move |value: A| {
        let (mut state, fired) = folder.absorb(state, &value);
        let mut emit: Vec<S> = fired.into_iter().collect();

        let next = match window {
            None => Continue::Untimed,
            Some(window) if window.elapsed() => {
                if state.dirty {
                    emit.push(state.acc);
                    state = folder.fresh();
                }
                match window.advance() {
                    Some(window) => Continue::Timed(window),
                    None => Continue::Finished,
                }
            }
            Some(window) => Continue::Timed(window),
        };

        let rest: Pipe<A, S, (), E, Env> = match next {
            Continue::Untimed => step(folder, state, None),
            Continue::Timed(window) => step(folder, state, Some(window)),
            Continue::Finished => Proxy::Pure(()),
        };
        emit_all(emit, rest)
    })
}

fn emit_all<A, S, E, Env>(values: Vec<S>, rest: Pipe<A, S, (), E, Env>) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    values
        .into_iter()
        .rev()
        .fold(rest, |rest, value| yielding(value).and_then(move |()| rest))
}

fn start<A, S, E, Env, F, P>(
    schedule: Option<Schedule>,
    fold: F,
    rule: Rule<P>,
    init: S,
) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
    P: Fn(&S, &A) -> bool + Send + Sync + 'static,
{
    let folder = Arc::new(Folder { fold, rule, init });
    let state = folder.fresh();
    match schedule {
        None => step(folder, state, None),
        Some(schedule) => match Window::open(&schedule) {
            Some(window) => step(folder, state, Some(window)),
            None => Proxy::Pure(()),
        },
    }
}

/// Accumulate values and emit the accumulator each time a schedule window
/// has elapsed.
///
/// The first window starts when the pipe is built; each later window
/// starts at the emission that closed the previous one.
pub fn fold<A, S, E, Env, F>(schedule: Schedule, f: F, init: S) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
{
    start::<A, S, E, Env, F, NoPredicate<S, A>>(Some(schedule), f, Rule::Window, init)
}

/// Accumulate until `done(&state, &value)` holds, then emit and reset.
pub fn fold_until<A, S, E, Env, F, P>(f: F, done: P, init: S) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
    P: Fn(&S, &A) -> bool + Send + Sync + 'static,
{
    start(None, f, Rule::Until(done), init)
}

/// Accumulate while `keep(&next, &value)` holds for the would-be state.
///
/// A value that breaks the predicate is not folded into the current run:
/// the run is emitted as it was and a new run starts from that value.
pub fn fold_while<A, S, E, Env, F, P>(f: F, keep: P, init: S) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
    P: Fn(&S, &A) -> bool + Send + Sync + 'static,
{
    start(None, f, Rule::While(keep), init)
}

/// [`fold_until`], additionally emitting whenever a schedule window
/// elapses.
pub fn fold_until_within<A, S, E, Env, F, P>(
    schedule: Schedule,
    f: F,
    done: P,
    init: S,
) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
    P: Fn(&S, &A) -> bool + Send + Sync + 'static,
{
    start(Some(schedule), f, Rule::Until(done), init)
}

/// [`fold_while`], additionally emitting whenever a schedule window
/// elapses.
pub fn fold_while_within<A, S, E, Env, F, P>(
    schedule: Schedule,
    f: F,
    keep: P,
    init: S,
) -> Pipe<A, S, (), E, Env>
where
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
    P: Fn(&S, &A) -> bool + Send + Sync + 'static,
{
    start(Some(schedule), f, Rule::While(keep), init)
}
