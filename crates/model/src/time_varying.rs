//! System matrices that may change over time.

use ndarray::{Array2, ArrayView2};

/// A system matrix that is either fixed or has one slice per time index.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeVarying<A> {
    /// The same matrix at every time index.
    Fixed(Array2<A>),
    /// One matrix per time index.
    Varying(Vec<Array2<A>>),
}

impl<A> TimeVarying<A> {
    /// Returns the matrix in effect at time `t`.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is time-varying and `t` is past the last slice.
    /// Models are checked with
    /// [`StateSpaceModel::check_nobs()`](crate::StateSpaceModel::check_nobs)
    /// before any recursion indexes them.
    pub fn at(&self, t: usize) -> ArrayView2<'_, A> {
        match self {
            Self::Fixed(m) => m.view(),
            Self::Varying(slices) => slices[t].view(),
        }
    }

    /// Number of time slices, or `None` for a fixed matrix.
    pub fn n_periods(&self) -> Option<usize> {
        match self {
            Self::Fixed(_) => None,
            Self::Varying(slices) => Some(slices.len()),
        }
    }

    /// Returns `true` if the matrix changes over time.
    pub fn is_time_varying(&self) -> bool {
        matches!(self, Self::Varying(_))
    }

    /// Iterates over every stored slice (one for a fixed matrix).
    pub(crate) fn slices(&self) -> impl Iterator<Item = &Array2<A>> {
        let (head, tail): (Option<&Array2<A>>, &[Array2<A>]) = match self {
            Self::Fixed(m) => (Some(m), &[]),
            Self::Varying(slices) => (None, slices.as_slice()),
        };
        head.into_iter().chain(tail.iter())
    }
}

impl<A> From<Array2<A>> for TimeVarying<A> {
    fn from(m: Array2<A>) -> Self {
        Self::Fixed(m)
    }
}

impl<A> From<Vec<Array2<A>>> for TimeVarying<A> {
    fn from(slices: Vec<Array2<A>>) -> Self {
        Self::Varying(slices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fixed_is_same_everywhere() {
        let tv: TimeVarying<f64> = array![[1.0, 2.0]].into();
        assert_eq!(tv.at(0), tv.at(100));
        assert_eq!(tv.n_periods(), None);
        assert!(!tv.is_time_varying());
        assert_eq!(tv.slices().count(), 1);
    }

    #[test]
    fn varying_indexes_by_time() {
        let tv: TimeVarying<f64> = vec![array![[1.0]], array![[2.0]], array![[3.0]]].into();
        assert_eq!(tv.at(1)[[0, 0]], 2.0);
        assert_eq!(tv.n_periods(), Some(3));
        assert!(tv.is_time_varying());
        assert_eq!(tv.slices().count(), 3);
    }
}
