//! Tunable constants and process-wide defaults.

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::hl::plist::dataset_access::ChunkCache;

/// Target size in bytes of a default chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;
/// Target size in bytes of a default chunk for 1-D variables along an unlimited dimension.
pub const DEFAULT_1D_UNLIM_SIZE: usize = 4096;

/// Default per-variable chunk cache size in bytes.
pub const CHUNK_CACHE_SIZE: usize = 16 * 1024 * 1024;
/// Default number of chunk cache slots.
pub const CHUNK_CACHE_NELEMS: usize = 4133;
/// Default chunk cache preemption policy.
pub const CHUNK_CACHE_PREEMPTION: f64 = 0.75;
/// Number of chunks the cache is grown to hold when a chunk outgrows the default cache.
pub const DEFAULT_CHUNKS_IN_CACHE: usize = 10;
/// Ceiling for automatically grown caches.
pub const MAX_DEFAULT_CACHE_SIZE: usize = 64 * 1024 * 1024;

/// Longest permitted object name, in bytes.
pub const MAX_NAME: usize = 256;
/// Most dimensions a variable may have through the netCDF API.
pub const MAX_VAR_DIMS: usize = 1024;
/// Most dimensions the storage engine supports.
pub const MAX_RANK: usize = 32;

/// Largest compact dataset, in bytes.
pub const MAX_COMPACT_SIZE: usize = 64 * 1024;

pub const MIN_DEFLATE_LEVEL: u8 = 0;
pub const MAX_DEFLATE_LEVEL: u8 = 9;
pub const MAX_SZIP_PIXELS_PER_BLOCK: u8 = 32;

/// Prefix of the storage name given to a variable that shares its name with a dimension
/// it is not the coordinate variable of.
pub const NON_COORD_PREPEND: &str = "_nc4_non_coord_";
/// Link name variables are cycled through when creation order has to be restored.
pub const TEMP_NAME: &str = "_netcdf4_temporary_variable_name_for_rename";
/// Scale name of a dataset that only stands for a dimension.
pub const DIM_WITHOUT_VARIABLE: &str = "This is a netCDF dimension but not a netCDF variable.";

pub const ATT_FILL_VALUE: &str = "_FillValue";
pub const ATT_DIMID: &str = "_Netcdf4Dimid";
pub const ATT_COORDINATES: &str = "_Netcdf4Coordinates";
pub const ATT_NC3_STRICT: &str = "_nc3_strict";

/// Attribute names reserved for internal bookkeeping.
pub const RESERVED_ATT_NAMES: &[&str] = &[
    ATT_DIMID,
    ATT_COORDINATES,
    ATT_NC3_STRICT,
    "_NCProperties",
    "CLASS",
    "NAME",
    "DIMENSION_LIST",
    "REFERENCE_LIST",
];

lazy_static! {
    static ref CHUNK_CACHE: RwLock<ChunkCache> = RwLock::new(ChunkCache::default());
}

/// Sets the chunk cache every variable defined or opened from now on starts with.
pub fn set_chunk_cache(size: usize, nelems: usize, preemption: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&preemption),
        Error::InvalidArgument(format!("preemption must be within [0, 1]: {}", preemption))
    );
    *CHUNK_CACHE.write() = ChunkCache { nbytes: size, nslots: nelems, w0: preemption };
    log::debug!("default chunk cache set to {:?}", *CHUNK_CACHE.read());
    Ok(())
}

/// The chunk cache new variables start with.
pub fn chunk_cache() -> ChunkCache {
    *CHUNK_CACHE.read()
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_chunk_cache_defaults() {
        let cache = ChunkCache::default();
        assert_eq!(cache.nbytes, CHUNK_CACHE_SIZE);
        assert_eq!(cache.nslots, CHUNK_CACHE_NELEMS);
        assert_eq!(cache.w0, CHUNK_CACHE_PREEMPTION);
    }

    #[test]
    pub fn test_set_chunk_cache_rejects_preemption() {
        assert!(matches!(set_chunk_cache(1024, 10, 1.5), Err(Error::InvalidArgument(_))));
        assert!(matches!(set_chunk_cache(1024, 10, -0.1), Err(Error::InvalidArgument(_))));
    }
}
