//! Default chunk shapes and the chunk cache policy.

use super::file::NcFile;
use super::{GroupId, VarId};
use crate::config::{
    CHUNK_CACHE_SIZE, DEFAULT_1D_UNLIM_SIZE, DEFAULT_CHUNKS_IN_CACHE, DEFAULT_CHUNK_SIZE,
    MAX_DEFAULT_CACHE_SIZE,
};
use crate::error::{Error, Result};
use crate::hl::plist::{ChunkCache, DatasetAccess, Layout};

/// Length and kind of one axis, as the estimator sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkDim {
    pub len: usize,
    pub unlimited: bool,
}

impl ChunkDim {
    pub fn fixed(len: usize) -> Self {
        Self { len, unlimited: false }
    }

    pub fn unlimited(len: usize) -> Self {
        Self { len, unlimited: true }
    }
}

/// Fails with `BadChunk` if one chunk would hold more than `u32::MAX` bytes.
pub fn check_chunksizes(elem_size: usize, chunksizes: &[usize]) -> Result<()> {
    let bytes = chunksizes.iter().fold(elem_size as f64, |acc, &c| acc * c as f64);
    ensure!(
        bytes <= f64::from(u32::MAX),
        Error::BadChunk(format!("chunk of {} bytes exceeds {} bytes", bytes, u32::MAX))
    );
    Ok(())
}

/// Picks a chunk shape of roughly `DEFAULT_CHUNK_SIZE` bytes.
///
/// Unlimited axes get one element per chunk, except for one-dimensional record variables
/// (a small fixed budget) and variables with only unlimited axes (a cube of the default
/// size). The shape is then shrunk to fit the chunk size ceiling, and each axis is
/// trimmed so the last chunk along it overhangs the axis as little as possible.
pub fn default_chunksizes(dims: &[ChunkDim], elem_size: usize) -> Vec<usize> {
    let ndims = dims.len();
    let elem_size = elem_size.max(1);
    let mut chunks = vec![0; ndims];

    let mut num_values = 1.0;
    let mut num_unlim = 0;
    for (chunk, dim) in chunks.iter_mut().zip(dims) {
        if dim.unlimited {
            num_unlim += 1;
            *chunk = 1;
        } else {
            num_values *= dim.len.max(1) as f64;
        }
    }

    if ndims == 1 && num_unlim == 1 {
        chunks[0] = (DEFAULT_CHUNK_SIZE.min(DEFAULT_1D_UNLIM_SIZE) / elem_size).max(1);
    } else if ndims > 1 && num_unlim == ndims {
        let side = (DEFAULT_CHUNK_SIZE as f64 / elem_size as f64).powf(1.0 / ndims as f64);
        chunks.iter_mut().for_each(|c| *c = (side as usize).max(1));
    }

    let fixed_axes = (ndims - num_unlim) as f64;
    for (chunk, dim) in chunks.iter_mut().zip(dims) {
        if *chunk == 0 {
            let ratio = DEFAULT_CHUNK_SIZE as f64 / (num_values * elem_size as f64);
            let suggested = (ratio.powf(1.0 / fixed_axes) * dim.len as f64 - 0.5).floor();
            let suggested = if suggested > 0.0 { suggested as usize } else { 0 };
            *chunk = suggested.min(dim.len).max(1);
        }
    }

    while check_chunksizes(elem_size, &chunks).is_err() && chunks.iter().any(|&c| c > 1) {
        chunks.iter_mut().for_each(|c| *c = (*c / 2).max(1));
    }

    for (chunk, dim) in chunks.iter_mut().zip(dims) {
        let num_chunks = (dim.len + *chunk - 1) / *chunk;
        if num_chunks > 0 {
            let overhang = num_chunks * *chunk - dim.len;
            *chunk -= overhang / num_chunks;
        }
    }
    chunks
}

/// A larger cache for chunks that do not fit the default one, `None` if no change is due.
///
/// Caches that were explicitly sized are left alone.
pub fn adjusted_cache(cache: ChunkCache, chunk_bytes: usize) -> Option<ChunkCache> {
    if cache.nbytes == CHUNK_CACHE_SIZE && chunk_bytes > cache.nbytes {
        let nbytes = chunk_bytes.saturating_mul(DEFAULT_CHUNKS_IN_CACHE).min(MAX_DEFAULT_CACHE_SIZE);
        Some(ChunkCache { nbytes, ..cache })
    } else {
        None
    }
}

impl NcFile {
    /// Size of one element of a variable as far as chunking is concerned.
    pub(crate) fn chunk_element_size(&self, grp: GroupId, varid: VarId) -> Result<usize> {
        let var = self.var(grp, varid)?;
        Ok(self.types.get(var.type_id)?.size())
    }

    pub(crate) fn chunk_dims(&self, grp: GroupId, varid: VarId) -> Result<Vec<ChunkDim>> {
        let var = self.var(grp, varid)?;
        var.dimids
            .iter()
            .map(|&d| self.dim(d).map(|dim| ChunkDim { len: dim.len, unlimited: dim.unlimited }))
            .collect()
    }

    /// Gives a variable the default chunk shape for its dimensions.
    pub(crate) fn find_default_chunksizes(&mut self, grp: GroupId, varid: VarId) -> Result<()> {
        let dims = self.chunk_dims(grp, varid)?;
        let elem_size = self.chunk_element_size(grp, varid)?;
        let chunks = default_chunksizes(&dims, elem_size);
        log::trace!("default chunk sizes for {} in {}: {:?}", varid, grp, chunks);
        self.var_mut(grp, varid)?.chunksizes = chunks;
        Ok(())
    }

    /// Grows the chunk cache of a chunked variable whose chunks would not fit in it.
    pub(crate) fn adjust_var_cache(&mut self, grp: GroupId, varid: VarId) -> Result<()> {
        let var = self.var(grp, varid)?;
        if var.storage != Layout::Chunked || self.is_parallel() {
            return Ok(());
        }
        let elem_size = self.chunk_element_size(grp, varid)?;
        let chunk_bytes = var.chunksizes.iter().fold(elem_size, |acc, &c| acc.saturating_mul(c));
        if let Some(cache) = adjusted_cache(var.cache, chunk_bytes) {
            log::debug!("chunk cache of {} in {} grown to {} bytes", varid, grp, cache.nbytes);
            self.var_mut(grp, varid)?.cache = cache;
            self.reopen_dataset(grp, varid)?;
        }
        Ok(())
    }

    /// Reopens a variable's dataset so that its access properties take effect.
    pub(crate) fn reopen_dataset(&mut self, grp: GroupId, varid: VarId) -> Result<()> {
        let hid = self.group(grp)?.handle;
        let var = self.var(grp, varid)?;
        if let (Some(ds), Some(hid)) = (var.dataset, hid) {
            let dapl = DatasetAccess::with_cache(var.cache);
            let key = var.storage_key.clone();
            self.engine.close(ds)?;
            let ds = self.engine.open_dataset(hid, &key, &dapl)?;
            self.var_mut(grp, varid)?.dataset = Some(ds);
            log::debug!("reopened dataset {:?} with {:?}", key, dapl.chunk_cache());
        }
        Ok(())
    }
}
