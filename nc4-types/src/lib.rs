#![cfg_attr(feature = "cargo-clippy", allow(clippy::module_name_repetitions))]

//! Types that can be stored in and retrieved from a netCDF-4 variable.
//!
//! This crate has no knowledge of files or storage; it describes element types
//! (`TypeDescriptor`, `NcType`), holds element buffers (`Data`), maps Rust values onto
//! them (`NcValue`) and converts buffers between atomic types with range checking.

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

mod convert;
mod data;
mod fill;
mod nctype;

pub use self::convert::{convert, ConversionError, Converted};
pub use self::data::Data;
pub use self::fill::default_fill;
pub use self::nctype::{
    CompoundField, CompoundType, EnumMember, EnumType, FloatSize, IntSize, NcType, NcValue,
    TypeClass, TypeDescriptor, STRING_HANDLE_SIZE, VARLEN_HANDLE_SIZE,
};
