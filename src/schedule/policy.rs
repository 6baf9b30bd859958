//! Schedule types.

use std::time::Duration;

/// A lazy, possibly infinite sequence of delays.
///
/// Schedules are plain data: they describe timing and termination, the
/// combinators that consume them (`repeat_with`, the fold pipes, `retry`)
/// do the sleeping. An exhausted schedule means "stop".
///
/// # Examples
///
/// ```rust
/// use millrace::Schedule;
/// use std::time::Duration;
///
/// let schedule = Schedule::exponential(Duration::from_millis(10)).take(4);
/// let delays: Vec<_> = schedule.delays().collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_millis(10),
///         Duration::from_millis(20),
///         Duration::from_millis(40),
///         Duration::from_millis(80),
///     ]
/// );
///
/// // Without a bound the sequence never ends.
/// let forever = Schedule::spaced(Duration::from_secs(1));
/// assert!(!forever.is_finite());
/// assert_eq!(forever.delays().take(1000).count(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    strategy: Strategy,
    max_recurs: Option<u32>,
    max_delay: Option<Duration>,
    jitter: Jitter,
}

/// How successive delays grow.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// The same delay every time.
    Spaced(Duration),
    /// `base * (n + 1)`.
    Linear {
        /// Base delay.
        base: Duration,
    },
    /// `base * 2^n`.
    Exponential {
        /// Base delay.
        base: Duration,
    },
    /// `base * fib(n + 1)`.
    Fibonacci {
        /// Base delay.
        base: Duration,
    },
    /// An explicit, finite list of delays.
    Fixed(Vec<Duration>),
}

/// Randomisation applied to each delay.
///
/// Without the `jitter` feature every variant leaves the delay unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Jitter {
    /// No randomisation.
    #[default]
    None,
    /// `±factor` of the delay.
    Proportional(f64),
    /// Uniform in `0..=delay`.
    Full,
    /// Uniform in `delay..=3 * previous`.
    Decorrelated,
}

impl Schedule {
    /// The same delay between every recurrence, forever.
    pub fn spaced(delay: Duration) -> Self {
        Self::with_strategy(Strategy::Spaced(delay))
    }

    /// Linearly growing delays: base, 2·base, 3·base, …
    ///
    /// ```rust
    /// use millrace::Schedule;
    /// use std::time::Duration;
    ///
    /// let s = Schedule::linear(Duration::from_millis(100));
    /// assert_eq!(s.delay_for(0), Some(Duration::from_millis(100)));
    /// assert_eq!(s.delay_for(2), Some(Duration::from_millis(300)));
    /// ```
    pub fn linear(base: Duration) -> Self {
        Self::with_strategy(Strategy::Linear { base })
    }

    /// Doubling delays: base, 2·base, 4·base, …
    pub fn exponential(base: Duration) -> Self {
        Self::with_strategy(Strategy::Exponential { base })
    }

    /// Fibonacci delays: base, base, 2·base, 3·base, 5·base, …
    pub fn fibonacci(base: Duration) -> Self {
        Self::with_strategy(Strategy::Fibonacci { base })
    }

    /// Exactly the given delays, in order.
    pub fn from_delays(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self::with_strategy(Strategy::Fixed(delays.into_iter().collect()))
    }

    /// `n` recurrences with no delay between them.
    pub fn recurs(n: u32) -> Self {
        Self::spaced(Duration::ZERO).take(n)
    }

    /// A single recurrence with no delay.
    pub fn once() -> Self {
        Self::recurs(1)
    }

    /// An already exhausted schedule.
    pub fn never() -> Self {
        Self::from_delays(std::iter::empty())
    }

    fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            max_recurs: None,
            max_delay: None,
            jitter: Jitter::None,
        }
    }

    /// Limit the schedule to at most `n` delays.
    pub fn take(mut self, n: u32) -> Self {
        self.max_recurs = Some(match self.max_recurs {
            Some(existing) => existing.min(n),
            None => n,
        });
        self
    }

    /// Cap every delay at `max`.
    ///
    /// ```rust
    /// use millrace::Schedule;
    /// use std::time::Duration;
    ///
    /// let s = Schedule::exponential(Duration::from_millis(100))
    ///     .with_max_delay(Duration::from_millis(300));
    /// assert_eq!(s.delay_for(1), Some(Duration::from_millis(200)));
    /// assert_eq!(s.delay_for(5), Some(Duration::from_millis(300)));
    /// ```
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Randomise each delay by `±factor` (clamped to `0.0..=1.0`).
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter = Jitter::Proportional(factor.clamp(0.0, 1.0));
        self
    }

    /// Pick each delay uniformly between zero and the computed delay.
    pub fn with_full_jitter(mut self) -> Self {
        self.jitter = Jitter::Full;
        self
    }

    /// Pick each delay between the computed delay and three times the previous one.
    pub fn with_decorrelated_jitter(mut self) -> Self {
        self.jitter = Jitter::Decorrelated;
        self
    }

    /// The growth strategy.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// The recurrence bound, if any.
    pub fn max_recurs(&self) -> Option<u32> {
        self.max_recurs
    }

    /// The delay cap, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// The jitter applied to each delay.
    pub fn jitter(&self) -> &Jitter {
        &self.jitter
    }

    /// Whether the schedule eventually runs out.
    pub fn is_finite(&self) -> bool {
        self.max_recurs.is_some() || matches!(self.strategy, Strategy::Fixed(_))
    }

    /// The `n`th delay (0-indexed) before jitter, or `None` once exhausted.
    pub fn delay_for(&self, n: u32) -> Option<Duration> {
        if self.max_recurs.is_some_and(|max| n >= max) {
            return None;
        }

        let delay = match &self.strategy {
            Strategy::Spaced(d) => *d,
            Strategy::Linear { base } => base.saturating_mul(n.saturating_add(1)),
            Strategy::Exponential { base } => base.saturating_mul(2u32.saturating_pow(n)),
            Strategy::Fibonacci { base } => base.saturating_mul(fibonacci(n.saturating_add(1))),
            Strategy::Fixed(delays) => *delays.get(n as usize)?,
        };

        Some(match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        })
    }

    /// Iterate the delays, with jitter applied.
    pub fn delays(&self) -> Delays {
        Delays {
            schedule: self.clone(),
            n: 0,
            prev: None,
        }
    }
}

impl IntoIterator for Schedule {
    type Item = Duration;
    type IntoIter = Delays;

    fn into_iter(self) -> Delays {
        Delays {
            schedule: self,
            n: 0,
            prev: None,
        }
    }
}

/// Iterator over the delays of a [`Schedule`].
#[derive(Debug, Clone)]
pub struct Delays {
    schedule: Schedule,
    n: u32,
    prev: Option<Duration>,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let base = self.schedule.delay_for(self.n)?;
        let delay = self
            .schedule
            .jitter
            .apply(base, self.prev, self.schedule.max_delay);
        self.n = self.n.saturating_add(1);
        self.prev = Some(delay);
        Some(delay)
    }
}

impl Jitter {
    /// Randomise `delay`.
    pub fn apply(
        &self,
        delay: Duration,
        #[cfg_attr(not(feature = "jitter"), allow(unused_variables))] prev: Option<Duration>,
        max_delay: Option<Duration>,
    ) -> Duration {
        let jittered = match self {
            Jitter::None => delay,
            #[cfg(feature = "jitter")]
            Jitter::Proportional(factor) => {
                use rand::Rng;
                let millis = delay.as_millis() as f64;
                let spread = millis * factor;
                let low = (millis - spread).max(0.0);
                Duration::from_millis(rand::rng().random_range(low..=millis + spread) as u64)
            }
            #[cfg(feature = "jitter")]
            Jitter::Full => {
                use rand::Rng;
                let millis = delay.as_millis() as u64;
                Duration::from_millis(rand::rng().random_range(0..=millis))
            }
            #[cfg(feature = "jitter")]
            Jitter::Decorrelated => {
                use rand::Rng;
                let low = delay.as_millis() as u64;
                let high = prev.unwrap_or(delay).as_millis().saturating_mul(3) as u64;
                if high <= low {
                    delay
                } else {
                    Duration::from_millis(rand::rng().random_range(low..=high))
                }
            }
            #[cfg(not(feature = "jitter"))]
            Jitter::Proportional(_) | Jitter::Full | Jitter::Decorrelated => delay,
        };

        match max_delay {
            Some(max) => jittered.min(max),
            None => jittered,
        }
    }
}

fn fibonacci(n: u32) -> u32 {
    let (mut a, mut b) = (0u32, 1u32);
    for _ in 1..n {
        (a, b) = (b, a.saturating_add(b));
    }
    if n == 0 {
        0
    } else {
        b
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn spaced_repeats_the_same_delay() {
        let s = Schedule::spaced(ms(50)).take(3);
        assert_eq!(s.delays().collect::<Vec<_>>(), vec![ms(50); 3]);
    }

    #[test]
    fn fibonacci_sequence() {
        let s = Schedule::fibonacci(ms(10)).take(6);
        assert_eq!(
            s.delays().collect::<Vec<_>>(),
            vec![ms(10), ms(10), ms(20), ms(30), ms(50), ms(80)]
        );
        assert_eq!(fibonacci(0), 0);
        assert_eq!(fibonacci(7), 13);
    }

    #[test]
    fn take_only_narrows() {
        let s = Schedule::spaced(ms(1)).take(5).take(10);
        assert_eq!(s.max_recurs(), Some(5));
    }

    #[test]
    fn fixed_schedule_is_finite() {
        let s = Schedule::from_delays([ms(3), ms(1)]);
        assert!(s.is_finite());
        assert_eq!(s.delays().collect::<Vec<_>>(), vec![ms(3), ms(1)]);
    }

    #[test]
    fn never_yields_nothing() {
        assert_eq!(Schedule::never().delays().next(), None);
    }

    #[test]
    fn recurs_has_zero_delays() {
        assert_eq!(
            Schedule::recurs(3).into_iter().collect::<Vec<_>>(),
            vec![Duration::ZERO; 3]
        );
    }

    #[test]
    fn exponential_saturates_instead_of_overflowing() {
        let s = Schedule::exponential(Duration::from_secs(1));
        assert!(s.delay_for(200).is_some());
    }

    #[test]
    fn jitter_none_keeps_delay() {
        assert_eq!(Jitter::None.apply(ms(100), None, None), ms(100));
        assert_eq!(Jitter::None.apply(ms(100), None, Some(ms(40))), ms(40));
    }

    #[cfg(feature = "jitter")]
    #[test]
    fn proportional_jitter_stays_in_range() {
        let s = Schedule::spaced(ms(100)).with_jitter(0.25).take(50);
        for d in s.delays() {
            assert!(d >= ms(75) && d <= ms(125), "{:?}", d);
        }
    }
}
