//! The storage engine the variable layer persists into.
//!
//! Every call is blocking. Datasets and groups are addressed through handles (`Hid`)
//! returned by the engine; dataset access properties are bound when a dataset is opened,
//! so changing them means closing and reopening the dataset.

use std::fmt::{self, Debug, Display};

use nc4_types::{Data, TypeDescriptor};

use crate::error::Result;
use crate::hl::extents::{Extents, Ix};
use crate::hl::plist::{DatasetAccess, DatasetCreate, Transfer};
use crate::hl::selection::Selection;

pub mod mem;

pub use self::mem::{DatasetSnapshot, MemEngine, TransferStats};

/// Handle to an open group or dataset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hid(pub u64);

impl Debug for Hid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<Hid {}>", self.0)
    }
}

impl Display for Hid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Group,
    Dataset,
}

/// A named link inside a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkInfo {
    pub name: String,
    pub kind: LinkKind,
}

/// Everything the engine knows about an open dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetInfo {
    pub dtype: TypeDescriptor,
    pub extents: Extents,
    pub create: DatasetCreate,
    pub access: DatasetAccess,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub dtype: TypeDescriptor,
    pub data: Data,
}

pub trait StorageEngine: Send + Sync {
    /// Handle of the root group.
    fn root(&self) -> Hid;

    fn create_group(&self, parent: Hid, name: &str) -> Result<Hid>;

    fn open_group(&self, parent: Hid, name: &str) -> Result<Hid>;

    /// Links of a group in creation order.
    fn links(&self, group: Hid) -> Result<Vec<LinkInfo>>;

    fn unlink(&self, group: Hid, name: &str) -> Result<()>;

    /// Renames a link. The moved link becomes the most recently created one.
    fn move_link(&self, group: Hid, from: &str, to: &str) -> Result<()>;

    /// Commits a named user-defined type in a group.
    fn commit_type(&self, group: Hid, name: &str, dtype: &TypeDescriptor) -> Result<()>;

    /// Committed types of a group in commit order.
    fn committed_types(&self, group: Hid) -> Result<Vec<(String, TypeDescriptor)>>;

    fn create_dataset(
        &self, group: Hid, name: &str, dtype: &TypeDescriptor, extents: &Extents,
        dcpl: &DatasetCreate, dapl: &DatasetAccess,
    ) -> Result<Hid>;

    fn open_dataset(&self, group: Hid, name: &str, dapl: &DatasetAccess) -> Result<Hid>;

    fn close(&self, id: Hid) -> Result<()>;

    fn dataset_info(&self, dataset: Hid) -> Result<DatasetInfo>;

    /// Changes the current extent; new elements hold the dataset's fill value.
    fn set_extent(&self, dataset: Hid, dims: &[Ix]) -> Result<()>;

    /// Writes the selected elements, given in selection order in the dataset's type.
    fn write(&self, dataset: Hid, selection: &Selection, data: &Data, xfer: Transfer)
        -> Result<()>;

    fn read(&self, dataset: Hid, selection: &Selection, xfer: Transfer) -> Result<Data>;

    fn write_attr(&self, loc: Hid, name: &str, attr: &Attribute) -> Result<()>;

    fn read_attr(&self, loc: Hid, name: &str) -> Result<Option<Attribute>>;

    fn attr_names(&self, loc: Hid) -> Result<Vec<String>>;

    fn delete_attr(&self, loc: Hid, name: &str) -> Result<()>;

    /// Marks a dataset as a dimension scale.
    fn set_scale(&self, dataset: Hid, name: &str) -> Result<()>;

    /// Turns a dimension scale back into a plain dataset.
    fn unset_scale(&self, dataset: Hid) -> Result<()>;

    /// Scale name of a dimension scale, `None` for plain datasets.
    fn scale_name(&self, dataset: Hid) -> Result<Option<String>>;

    fn attach_scale(&self, dataset: Hid, scale: Hid, idx: usize) -> Result<()>;

    fn detach_scale(&self, dataset: Hid, scale: Hid, idx: usize) -> Result<()>;

    /// Link names of the scales attached to each axis of a dataset.
    fn attached_scales(&self, dataset: Hid) -> Result<Vec<(usize, String)>>;

    fn filter_available(&self, id: u32) -> bool;
}
