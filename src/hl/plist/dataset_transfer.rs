//! Dataset transfer properties.

/// How a read or write is carried out when several processes share a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// Each process transfers on its own.
    Independent,
    /// Every process takes part in each transfer, possibly with an empty selection.
    Collective,
}

impl Default for Transfer {
    fn default() -> Self {
        Self::Independent
    }
}

impl Transfer {
    pub fn is_collective(self) -> bool {
        self == Self::Collective
    }
}
