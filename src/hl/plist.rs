//! Property lists handed to the storage engine when datasets are created, opened or
//! transferred.

pub mod dataset_access;
pub mod dataset_create;
pub mod dataset_transfer;

pub use self::dataset_access::{ChunkCache, DatasetAccess, DatasetAccessBuilder};
pub use self::dataset_create::{
    DatasetCreate, DatasetCreateBuilder, Endianness, FillTime, Layout,
};
pub use self::dataset_transfer::Transfer;
