//! Dataset creation properties.

use nc4_types::Data;

use crate::error::Result;
use crate::hl::extents::Ix;
use crate::hl::filters::{pipeline_order, Filter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Compact,
    Contiguous,
    Chunked,
}

impl Default for Layout {
    fn default() -> Self {
        Self::Contiguous
    }
}

/// When storage is initialized with the fill value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillTime {
    IfSet,
    Alloc,
    Never,
}

impl Default for FillTime {
    fn default() -> Self {
        Self::IfSet
    }
}

/// Byte order of a dataset's elements on storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Native,
    Little,
    Big,
}

impl Default for Endianness {
    fn default() -> Self {
        Self::Native
    }
}

impl Endianness {
    /// Returns `true` if elements are stored in the opposite of the native byte order.
    pub fn is_swapped(self) -> bool {
        match self {
            Self::Native => false,
            Self::Little => cfg!(target_endian = "big"),
            Self::Big => cfg!(target_endian = "little"),
        }
    }
}

/// Dataset creation properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetCreate {
    layout: Layout,
    chunk: Option<Vec<Ix>>,
    filters: Vec<Filter>,
    fill_value: Option<Data>,
    fill_time: FillTime,
    endianness: Endianness,
}

/// Builder used to create dataset creation properties.
#[derive(Clone, Debug, Default)]
pub struct DatasetCreateBuilder {
    layout: Option<Layout>,
    chunk: Option<Vec<Ix>>,
    filters: Vec<Filter>,
    fill_value: Option<Data>,
    fill_time: Option<FillTime>,
    endianness: Option<Endianness>,
}

impl DatasetCreateBuilder {
    /// Creates a new dataset creation properties builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new builder from existing properties.
    pub fn from_plist(plist: &DatasetCreate) -> Self {
        Self {
            layout: Some(plist.layout),
            chunk: plist.chunk.clone(),
            filters: plist.filters.clone(),
            fill_value: plist.fill_value.clone(),
            fill_time: Some(plist.fill_time),
            endianness: Some(plist.endianness),
        }
    }

    pub fn layout(&mut self, layout: Layout) -> &mut Self {
        self.layout = Some(layout);
        self
    }

    pub fn chunk(&mut self, dims: &[Ix]) -> &mut Self {
        self.chunk = Some(dims.to_vec());
        self
    }

    pub fn filters(&mut self, filters: &[Filter]) -> &mut Self {
        self.filters = filters.to_vec();
        self
    }

    pub fn fill_value(&mut self, value: Data) -> &mut Self {
        self.fill_value = Some(value);
        self
    }

    pub fn fill_time(&mut self, fill_time: FillTime) -> &mut Self {
        self.fill_time = Some(fill_time);
        self
    }

    pub fn endianness(&mut self, endianness: Endianness) -> &mut Self {
        self.endianness = Some(endianness);
        self
    }

    pub fn finish(&self) -> Result<DatasetCreate> {
        let layout = self
            .layout
            .unwrap_or(if self.chunk.is_some() { Layout::Chunked } else { Layout::Contiguous });
        let chunk = match (layout, &self.chunk) {
            (Layout::Chunked, Some(chunk)) => {
                ensure!(
                    !chunk.is_empty() && chunk.iter().all(|&c| c > 0),
                    "invalid chunk shape: {:?}",
                    chunk
                );
                Some(chunk.clone())
            }
            (Layout::Chunked, None) => fail!("chunked layout requires a chunk shape"),
            _ => None,
        };
        ensure!(
            self.filters.is_empty() || layout == Layout::Chunked,
            "filters require chunked layout, got {:?}",
            layout
        );
        if let Some(ref value) = self.fill_value {
            ensure!(value.len() == 1, "fill value must hold exactly one element");
        }
        Ok(DatasetCreate {
            layout,
            chunk,
            filters: pipeline_order(&self.filters),
            fill_value: self.fill_value.clone(),
            fill_time: self.fill_time.unwrap_or_default(),
            endianness: self.endianness.unwrap_or_default(),
        })
    }
}

impl DatasetCreate {
    pub fn build() -> DatasetCreateBuilder {
        DatasetCreateBuilder::new()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn chunk(&self) -> Option<&[Ix]> {
        self.chunk.as_deref()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn fill_value(&self) -> Option<&Data> {
        self.fill_value.as_ref()
    }

    pub fn fill_time(&self) -> FillTime {
        self.fill_time
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_layout_from_chunk() {
        let plist = DatasetCreate::build().chunk(&[10, 2]).finish().unwrap();
        assert_eq!(plist.layout(), Layout::Chunked);
        assert_eq!(plist.chunk(), Some(&[10, 2][..]));
        let plist = DatasetCreate::build().finish().unwrap();
        assert_eq!(plist.layout(), Layout::Contiguous);
        assert_eq!(plist.chunk(), None);
        assert_eq!(plist.fill_time(), FillTime::IfSet);
    }

    #[test]
    pub fn test_invalid_plists() {
        assert!(DatasetCreate::build().layout(Layout::Chunked).finish().is_err());
        assert!(DatasetCreate::build().chunk(&[0]).finish().is_err());
        assert!(DatasetCreate::build().filters(&[Filter::Shuffle]).finish().is_err());
        let two = Data::zeroed(Some(4), 2);
        assert!(DatasetCreate::build().fill_value(two).finish().is_err());
    }

    #[test]
    pub fn test_filters_ordered() {
        let plist = DatasetCreate::build()
            .chunk(&[4])
            .filters(&[Filter::Deflate(4), Filter::Shuffle])
            .finish()
            .unwrap();
        assert_eq!(plist.filters(), &[Filter::Shuffle, Filter::Deflate(4)]);
        assert_eq!(DatasetCreateBuilder::from_plist(&plist).finish().unwrap(), plist);
    }

    #[test]
    pub fn test_endianness() {
        assert!(!Endianness::Native.is_swapped());
        assert_ne!(Endianness::Little.is_swapped(), Endianness::Big.is_swapped());
    }
}
