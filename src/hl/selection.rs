use std::fmt::{self, Display};
use std::ops::Deref;

use crate::hl::extents::Ix;

/// One axis of a strided hyperslab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawSlice {
    pub start: Ix,
    pub step: Ix,
    pub count: Ix,
}

impl RawSlice {
    pub fn new(start: Ix, step: Ix, count: Ix) -> Self {
        Self { start, step, count }
    }

    /// Index of the last selected element, if any.
    pub fn last(&self) -> Option<Ix> {
        if self.count == 0 {
            None
        } else {
            Some(self.start + self.step * (self.count - 1))
        }
    }
}

impl Display for RawSlice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.start)?;
        if self.step != 1 {
            write!(f, ";{}", self.step)?;
        }
        write!(f, "x{}", self.count)
    }
}

/// A strided rectangular selection: start, step and count per axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hyperslab {
    dims: Vec<RawSlice>,
}

impl Deref for Hyperslab {
    type Target = [RawSlice];

    fn deref(&self) -> &Self::Target {
        &self.dims
    }
}

impl From<Vec<RawSlice>> for Hyperslab {
    fn from(dims: Vec<RawSlice>) -> Self {
        Self { dims }
    }
}

impl Hyperslab {
    /// Builds a hyperslab from per-axis arrays; `stride` defaults to 1 on every axis.
    pub fn new(start: &[Ix], count: &[Ix], stride: Option<&[Ix]>) -> Self {
        let dims = start
            .iter()
            .zip(count)
            .enumerate()
            .map(|(i, (&start, &count))| {
                let step = stride.map_or(1, |s| s[i]);
                RawSlice::new(start, step, count)
            })
            .collect();
        Self { dims }
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn start(&self) -> Vec<Ix> {
        self.dims.iter().map(|s| s.start).collect()
    }

    pub fn count(&self) -> Vec<Ix> {
        self.dims.iter().map(|s| s.count).collect()
    }

    pub fn stride(&self) -> Vec<Ix> {
        self.dims.iter().map(|s| s.step).collect()
    }

    /// Number of selected elements.
    pub fn size(&self) -> usize {
        self.dims.iter().map(|s| s.count).product()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns `true` if every selected element lies within `shape`.
    pub fn is_within(&self, shape: &[Ix]) -> bool {
        self.ndim() == shape.len()
            && self.dims.iter().zip(shape).all(|(s, &n)| s.last().map_or(true, |last| last < n))
    }

    /// Row-major linear offsets of the selected elements inside an array of `shape`,
    /// in selection order.
    pub fn offsets(&self, shape: &[Ix]) -> Vec<usize> {
        let n = self.size();
        let mut out = Vec::with_capacity(n);
        if n == 0 {
            return out;
        }
        let ndim = self.ndim();
        let mut strides = vec![1; ndim];
        for d in (0..ndim.saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * shape[d + 1];
        }
        let mut index = vec![0; ndim];
        for _ in 0..n {
            out.push(
                (0..ndim)
                    .map(|d| (self.dims[d].start + index[d] * self.dims[d].step) * strides[d])
                    .sum(),
            );
            for d in (0..ndim).rev() {
                index[d] += 1;
                if index[d] < self.dims[d].count {
                    break;
                }
                index[d] = 0;
            }
        }
        out
    }
}

impl Display for Hyperslab {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let slices = self.dims.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "({})", slices)
    }
}

/// A selection of elements in a stored dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    None,
    Hyperslab(Hyperslab),
}

impl Default for Selection {
    fn default() -> Self {
        Self::All
    }
}

impl From<Hyperslab> for Selection {
    fn from(hyper: Hyperslab) -> Self {
        Self::Hyperslab(hyper)
    }
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Number of selected elements in an array of `shape` (empty for a scalar).
    pub fn len(&self, shape: &[Ix]) -> usize {
        match self {
            Self::All => shape.iter().product(),
            Self::None => 0,
            Self::Hyperslab(hyper) => hyper.size(),
        }
    }

    pub fn offsets(&self, shape: &[Ix]) -> Vec<usize> {
        match self {
            Self::All => (0..shape.iter().product()).collect(),
            Self::None => Vec::new(),
            Self::Hyperslab(hyper) => hyper.offsets(shape),
        }
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::All => write!(f, ".."),
            Self::None => write!(f, "<none>"),
            Self::Hyperslab(hyper) => write!(f, "{}", hyper),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    pub fn test_raw_slice() {
        assert_eq!(RawSlice::new(2, 3, 4).last(), Some(11));
        assert_eq!(RawSlice::new(2, 3, 0).last(), None);
        assert_eq!(RawSlice::new(2, 1, 4).to_string(), "2x4");
        assert_eq!(RawSlice::new(2, 3, 4).to_string(), "2;3x4");
    }

    #[test]
    pub fn test_hyperslab_offsets() {
        let h = Hyperslab::new(&[1, 0], &[2, 2], Some(&[1, 2]));
        assert_eq!(h.size(), 4);
        assert_eq!(h.offsets(&[3, 4]), vec![4, 6, 8, 10]);
        assert!(h.is_within(&[3, 4]));
        assert!(!h.is_within(&[2, 4]));
        assert!(!h.is_within(&[3, 2]));
        assert_eq!(h.to_string(), "(1x2, 0;2x2)");

        let h = Hyperslab::new(&[5], &[0], None);
        assert!(h.is_empty());
        assert!(h.offsets(&[5]).is_empty());
        assert!(h.is_within(&[5]));
    }

    #[test]
    pub fn test_selection() {
        assert_eq!(Selection::All.offsets(&[2, 2]), vec![0, 1, 2, 3]);
        assert_eq!(Selection::All.len(&[]), 1);
        assert_eq!(Selection::None.len(&[2, 2]), 0);
        let sel = Selection::from(Hyperslab::new(&[1, 1, 1], &[1, 1, 2], None));
        assert_eq!(sel.offsets(&[2, 3, 4]), vec![17, 18]);
        assert_eq!(sel.len(&[2, 3, 4]), 2);
    }
}
