//! `Either`: one of two values, used for exclusive routing.

/// A value of one of two types.
///
/// [`SinkExt::route`](crate::channel::SinkExt::route) sends each value to
/// the left or right child depending on which side the split produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    /// The left alternative.
    Left(L),
    /// The right alternative.
    Right(R),
}

impl<L, R> Either<L, R> {
    /// True for `Left`.
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    /// True for `Right`.
    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    /// Map the left side.
    pub fn map_left<L2>(self, f: impl FnOnce(L) -> L2) -> Either<L2, R> {
        match self {
            Either::Left(l) => Either::Left(f(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    /// Map the right side.
    pub fn map_right<R2>(self, f: impl FnOnce(R) -> R2) -> Either<L, R2> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(f(r)),
        }
    }

    /// Collapse both sides into one value.
    pub fn fold<T>(self, left: impl FnOnce(L) -> T, right: impl FnOnce(R) -> T) -> T {
        match self {
            Either::Left(l) => left(l),
            Either::Right(r) => right(r),
        }
    }

    /// Swap the sides.
    pub fn flip(self) -> Either<R, L> {
        match self {
            Either::Left(l) => Either::Right(l),
            Either::Right(r) => Either::Left(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_and_fold() {
        let e: Either<i32, &str> = Either::Left(2);
        assert_eq!(e.map_left(|x| x * 10).fold(|x| x, |s| s.len() as i32), 20);
        let e: Either<i32, &str> = Either::Right("abc");
        assert!(e.is_right());
        assert_eq!(e.flip(), Either::Left("abc"));
        assert_eq!(e.map_right(str::len), Either::Right(3));
    }
}
