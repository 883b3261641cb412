/// A flat buffer of elements of a single type.
///
/// Fixed-size elements are packed back to back in native byte order. Variable-length
/// elements (strings, vlens) are each held in their own allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Data {
    Fixed { size: usize, bytes: Vec<u8> },
    VarLen(Vec<Vec<u8>>),
}

impl Data {
    pub fn fixed(size: usize, bytes: Vec<u8>) -> Self {
        debug_assert!(size > 0 && bytes.len() % size == 0);
        Self::Fixed { size, bytes }
    }

    /// `n` zero-initialized elements of `size` bytes, or `n` empty variable-length ones
    /// if `size` is `None`.
    pub fn zeroed(size: Option<usize>, n: usize) -> Self {
        match size {
            Some(size) => Self::Fixed { size, bytes: vec![0; size * n] },
            None => Self::VarLen(vec![Vec::new(); n]),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Fixed { size, bytes } => bytes.len() / size,
            Self::VarLen(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_size(&self) -> Option<usize> {
        match self {
            Self::Fixed { size, .. } => Some(*size),
            Self::VarLen(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Fixed { bytes, .. } => Some(bytes),
            Self::VarLen(_) => None,
        }
    }

    /// Returns `true` if elements of `other` can be copied into `self` as they are.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.element_size() == other.element_size()
    }

    /// Copy of the `i`-th element.
    pub fn element(&self, i: usize) -> Self {
        match self {
            Self::Fixed { size, bytes } => {
                Self::Fixed { size: *size, bytes: bytes[i * size..(i + 1) * size].to_vec() }
            }
            Self::VarLen(items) => Self::VarLen(vec![items[i].clone()]),
        }
    }

    /// Overwrites element `dst` of `self` with element `src` of `from`.
    ///
    /// Variable-length elements are deep-copied. Both buffers must share a layout.
    pub fn copy_element(&mut self, dst: usize, from: &Self, src: usize) {
        match (self, from) {
            (Self::Fixed { size, bytes }, Self::Fixed { bytes: other, .. }) => {
                let n = *size;
                bytes[dst * n..(dst + 1) * n].copy_from_slice(&other[src * n..(src + 1) * n]);
            }
            (Self::VarLen(items), Self::VarLen(other)) => items[dst] = other[src].clone(),
            _ => panic!("copy_element: mismatched buffer layouts"),
        }
    }

    /// A buffer holding `n` copies of the first element of `value`.
    pub fn repeat(value: &Self, n: usize) -> Self {
        match value {
            Self::Fixed { size, bytes } => {
                Self::Fixed { size: *size, bytes: bytes[..*size].repeat(n) }
            }
            Self::VarLen(items) => Self::VarLen(vec![items[0].clone(); n]),
        }
    }

    /// Reverses the byte order of every fixed-size element in place (`word` bytes wide).
    pub fn swap_bytes(&mut self, word: usize) {
        if let Self::Fixed { bytes, .. } = self {
            if word > 1 {
                bytes.chunks_exact_mut(word).for_each(<[u8]>::reverse);
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::Data;

    #[test]
    pub fn test_fixed_elements() {
        let mut data = Data::zeroed(Some(2), 3);
        assert_eq!(data.len(), 3);
        let src = Data::fixed(2, vec![1, 2, 3, 4]);
        data.copy_element(2, &src, 1);
        assert_eq!(data.as_bytes().unwrap(), &[0, 0, 0, 0, 3, 4]);
        assert_eq!(data.element(2), Data::fixed(2, vec![3, 4]));
        assert_eq!(Data::repeat(&src, 2), Data::fixed(2, vec![1, 2, 1, 2]));
        data.swap_bytes(2);
        assert_eq!(data.as_bytes().unwrap(), &[0, 0, 0, 0, 4, 3]);
    }

    #[test]
    pub fn test_var_len_elements() {
        let fill = Data::VarLen(vec![b"fill".to_vec()]);
        let mut data = Data::repeat(&fill, 3);
        assert_eq!(data.len(), 3);
        assert_eq!(data.element_size(), None);
        data.copy_element(1, &Data::VarLen(vec![b"x".to_vec()]), 0);
        assert_eq!(data, Data::VarLen(vec![b"fill".to_vec(), b"x".to_vec(), b"fill".to_vec()]));
        assert!(Data::zeroed(None, 0).is_empty());
    }
}
