//! Associative combination, used to aggregate failures.
//!
//! Fan-out operations (combined sinks, [`par_all`](crate::effect::par_all))
//! never pick one error and drop the rest: every failure is folded into one
//! value with [`Semigroup::combine`].
//!
//! ```
//! use millrace::Semigroup;
//!
//! assert_eq!(vec![1, 2].combine(vec![3]), vec![1, 2, 3]);
//! assert_eq!("dis".to_string().combine("connected".to_string()), "disconnected");
//! ```

/// A type with an associative binary operation.
///
/// Implementations must satisfy
/// `a.combine(b).combine(c) == a.combine(b.combine(c))`.
pub trait Semigroup: Sized {
    /// Combine two values.
    fn combine(self, other: Self) -> Self;
}

impl<T> Semigroup for Vec<T> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl Semigroup for String {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

impl<T: Semigroup> Semigroup for Option<T> {
    fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.combine(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

macro_rules! impl_semigroup_tuple {
    ($($idx:tt $T:ident),+) => {
        impl<$($T: Semigroup),+> Semigroup for ($($T,)+) {
            #[inline]
            fn combine(self, other: Self) -> Self {
                ($(self.$idx.combine(other.$idx),)+)
            }
        }
    };
}

impl_semigroup_tuple!(0 T1, 1 T2);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn option_keeps_present_side() {
        assert_eq!(Some(vec![1]).combine(None), Some(vec![1]));
        assert_eq!(None.combine(Some(vec![2])), Some(vec![2]));
        assert_eq!(Some(vec![1]).combine(Some(vec![2])), Some(vec![1, 2]));
    }

    #[test]
    fn tuples_combine_componentwise() {
        let left = (vec![1], "a".to_string());
        let right = (vec![2], "b".to_string());
        assert_eq!(left.combine(right), (vec![1, 2], "ab".to_string()));
    }

    proptest! {
        #[test]
        fn vec_is_associative(
            a in prop::collection::vec(any::<u8>(), 0..8),
            b in prop::collection::vec(any::<u8>(), 0..8),
            c in prop::collection::vec(any::<u8>(), 0..8),
        ) {
            let left = a.clone().combine(b.clone()).combine(c.clone());
            let right = a.combine(b.combine(c));
            prop_assert_eq!(left, right);
        }
    }
}
