use std::fmt::{self, Debug, Display};
use std::ops::{Deref, RangeFrom};

use crate::config::MAX_RANK;

pub type Ix = usize;

/// Current and maximum dimension size for a particular dimension.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Current dimension size.
    pub dim: Ix,
    /// Maximum dimension size (or `None` if unlimited).
    pub max: Option<Ix>,
}

impl Debug for Extent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Extent({})", self)
    }
}

impl Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.max {
            Some(max) if max != self.dim => write!(f, "{}..={}", self.dim, max),
            Some(_) => write!(f, "{}", self.dim),
            None => write!(f, "{}..", self.dim),
        }
    }
}

impl From<Ix> for Extent {
    fn from(dim: Ix) -> Self {
        Self::fixed(dim)
    }
}

impl From<RangeFrom<Ix>> for Extent {
    fn from(range: RangeFrom<Ix>) -> Self {
        Self::resizable(range.start)
    }
}

impl Extent {
    pub fn new(dim: Ix, max: Option<Ix>) -> Self {
        Self { dim, max }
    }

    /// Creates a new extent with maximum size equal to the current size.
    pub fn fixed(dim: Ix) -> Self {
        Self { dim, max: Some(dim) }
    }

    /// Creates a new extent with unlimited maximum size.
    pub fn resizable(dim: Ix) -> Self {
        Self { dim, max: None }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max.is_none()
    }

    pub fn is_valid(&self) -> bool {
        self.max.unwrap_or(self.dim) >= self.dim
    }

    /// Returns `true` if the current size may change to `dim`.
    pub fn can_resize(&self, dim: Ix) -> bool {
        self.max.map_or(true, |max| dim <= max)
    }
}

/// Extents of a simple dataspace: a multidimensional array of elements whose rank is fixed
/// at creation time and whose dimensions may grow up to their maximum size.
#[derive(Clone, PartialEq, Eq)]
pub struct SimpleExtents {
    inner: Vec<Extent>,
}

impl SimpleExtents {
    pub fn from_vec(extents: Vec<Extent>) -> Self {
        Self { inner: extents }
    }

    pub fn new<T>(extents: T) -> Self
    where
        T: IntoIterator,
        T::Item: Into<Extent>,
    {
        Self::from_vec(extents.into_iter().map(Into::into).collect())
    }

    pub fn ndim(&self) -> usize {
        self.inner.len()
    }

    pub fn dims(&self) -> Vec<Ix> {
        self.inner.iter().map(|e| e.dim).collect()
    }

    pub fn maxdims(&self) -> Vec<Option<Ix>> {
        self.inner.iter().map(|e| e.max).collect()
    }

    pub fn size(&self) -> usize {
        self.inner.iter().map(|e| e.dim).product()
    }

    pub fn is_unlimited(&self) -> bool {
        self.inner.iter().any(Extent::is_unlimited)
    }

    pub fn is_valid(&self) -> bool {
        self.inner.iter().all(Extent::is_valid) && self.ndim() <= MAX_RANK
    }

    /// Replaces the current sizes, keeping the maximum sizes.
    pub fn resized(&self, dims: &[Ix]) -> Option<Self> {
        if dims.len() != self.ndim() {
            return None;
        }
        let mut inner = self.inner.clone();
        for (extent, &dim) in inner.iter_mut().zip(dims) {
            if !extent.can_resize(dim) {
                return None;
            }
            extent.dim = dim;
        }
        Some(Self { inner })
    }
}

impl Deref for SimpleExtents {
    type Target = [Extent];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for SimpleExtents {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SimpleExtents({})", self)
    }
}

impl Display for SimpleExtents {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.ndim() == 1 {
            write!(f, "({},)", self[0])
        } else {
            let extents = self.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            write!(f, "({})", extents)
        }
    }
}

impl From<Vec<Extent>> for SimpleExtents {
    fn from(extents: Vec<Extent>) -> Self {
        Self::from_vec(extents)
    }
}

impl From<&[Ix]> for SimpleExtents {
    fn from(dims: &[Ix]) -> Self {
        Self::new(dims.iter().copied())
    }
}

/// Shape of a stored dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extents {
    /// A single element; by convention of rank zero.
    Scalar,
    Simple(SimpleExtents),
}

impl Extents {
    pub fn scalar() -> Self {
        Self::Scalar
    }

    pub fn simple<T: Into<SimpleExtents>>(extents: T) -> Self {
        Self::Simple(extents.into())
    }

    pub fn as_simple(&self) -> Option<&SimpleExtents> {
        match self {
            Self::Simple(extents) => Some(extents),
            Self::Scalar => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar)
    }

    pub fn ndim(&self) -> usize {
        self.as_simple().map_or(0, SimpleExtents::ndim)
    }

    pub fn dims(&self) -> Vec<Ix> {
        self.as_simple().map_or_else(Vec::new, SimpleExtents::dims)
    }

    pub fn maxdims(&self) -> Vec<Option<Ix>> {
        self.as_simple().map_or_else(Vec::new, SimpleExtents::maxdims)
    }

    pub fn size(&self) -> usize {
        self.as_simple().map_or(1, SimpleExtents::size)
    }

    pub fn is_unlimited(&self) -> bool {
        self.as_simple().map_or(false, SimpleExtents::is_unlimited)
    }

    pub fn is_valid(&self) -> bool {
        self.as_simple().map_or(true, SimpleExtents::is_valid)
    }
}

impl Display for Extents {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Simple(e) => write!(f, "{}", e),
        }
    }
}
