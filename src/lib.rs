//! netCDF-4 variables for Rust.
//!
//! This crate implements the variable layer of the netCDF-4 data model on top of an
//! HDF5-style storage engine. Some of the features include:
//!
//! - Definition of dimensions, groups, user-defined types and variables, with coordinate
//!   variables mapped onto dimension scales.
//! - Default chunk shapes for chunked variables, and per-variable chunk caches.
//! - Compression, checksum and third-party filter pipelines, fill values and byte order.
//! - Strided reads and writes with numeric conversion, growth along unlimited dimensions
//!   and collective transfers between cooperating processes.
//! - Whole-variable reading/writing via `ndarray`.
//!
//! Storage engines implement the `StorageEngine` trait; `MemEngine` keeps everything in
//! memory.

#![cfg_attr(feature = "cargo-clippy", warn(clippy::all))]
#![cfg_attr(feature = "cargo-clippy", allow(clippy::module_name_repetitions))]
#![cfg_attr(feature = "cargo-clippy", allow(clippy::cast_possible_truncation))]
#![cfg_attr(feature = "cargo-clippy", allow(clippy::cast_sign_loss))]
#![cfg_attr(feature = "cargo-clippy", allow(clippy::too_many_arguments))]
#![cfg_attr(not(test), allow(dead_code))]

mod export {
    pub use crate::{
        config::{chunk_cache, set_chunk_cache},
        engine::{MemEngine, StorageEngine},
        error::{Error, Result},
        hl::{Extent, Extents, Hyperslab, Selection},
        nc::{
            Att, Communicator, DimId, DimInfo, FileBuilder, GroupId, Mode, NcFile, SelfComm,
            TypeId, TypeInfo, VarId, VarInfo, VarSettings,
        },
    };

    pub mod types {
        pub use nc4_types::*;
    }

    pub mod plist {
        pub use crate::hl::plist::dataset_access::{ChunkCache, DatasetAccess, DatasetAccessBuilder};
        pub use crate::hl::plist::dataset_create::{
            DatasetCreate, DatasetCreateBuilder, Endianness, FillTime, Layout,
        };
        pub use crate::hl::plist::dataset_transfer::Transfer;
    }

    pub mod filters {
        pub use crate::hl::filters::*;
    }
}

pub use crate::export::*;

#[macro_use]
mod macros;

pub mod config;
pub mod engine;
mod error;
pub mod hl;
pub mod nc;
