//! Dataset access properties.

use crate::config::{CHUNK_CACHE_NELEMS, CHUNK_CACHE_PREEMPTION, CHUNK_CACHE_SIZE};

/// Raw data chunk cache parameters, bound to a dataset when it is opened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkCache {
    pub nslots: usize,
    pub nbytes: usize,
    pub w0: f64,
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self { nslots: CHUNK_CACHE_NELEMS, nbytes: CHUNK_CACHE_SIZE, w0: CHUNK_CACHE_PREEMPTION }
    }
}

impl Eq for ChunkCache {}

/// Dataset access properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetAccess {
    chunk_cache: ChunkCache,
}

/// Builder used to create dataset access properties.
#[derive(Clone, Debug, Default)]
pub struct DatasetAccessBuilder {
    chunk_cache: Option<ChunkCache>,
}

impl DatasetAccessBuilder {
    /// Creates a new dataset access properties builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new builder from existing properties.
    pub fn from_plist(plist: &DatasetAccess) -> Self {
        let mut builder = Self::default();
        builder.chunk_cache(plist.chunk_cache.nslots, plist.chunk_cache.nbytes, plist.chunk_cache.w0);
        builder
    }

    pub fn chunk_cache(&mut self, nslots: usize, nbytes: usize, w0: f64) -> &mut Self {
        self.chunk_cache = Some(ChunkCache { nslots, nbytes, w0 });
        self
    }

    pub fn finish(&self) -> DatasetAccess {
        DatasetAccess { chunk_cache: self.chunk_cache.unwrap_or_default() }
    }
}

impl DatasetAccess {
    pub fn build() -> DatasetAccessBuilder {
        DatasetAccessBuilder::new()
    }

    pub fn with_cache(cache: ChunkCache) -> Self {
        Self { chunk_cache: cache }
    }

    pub fn chunk_cache(&self) -> ChunkCache {
        self.chunk_cache
    }
}
