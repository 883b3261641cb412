pub mod extents;
pub mod filters;
pub mod plist;
pub mod selection;

pub use self::{
    extents::{Extent, Extents, Ix, SimpleExtents},
    filters::{Filter, SZip},
    plist::{ChunkCache, DatasetAccess, DatasetCreate, Endianness, FillTime, Layout, Transfer},
    selection::{Hyperslab, RawSlice, Selection},
};
