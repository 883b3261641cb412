//! Storage properties of variables that are not yet created.

use nc4_types::{Data, NcType, NcValue};

use super::chunking::check_chunksizes;
use super::file::NcFile;
use super::{GroupId, VarId};
use crate::config::{ATT_FILL_VALUE, MAX_COMPACT_SIZE, MAX_DEFLATE_LEVEL, MIN_DEFLATE_LEVEL};
use crate::error::{Error, Result};
use crate::hl::filters::{Filter, SZip, FILTER_DEFLATE, FILTER_FLETCHER32, FILTER_SHUFFLE};
use crate::hl::plist::{ChunkCache, Endianness, Layout};

/// A set of storage property changes, applied together by `def_var_extra`.
///
/// Fields left `None` are not changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VarSettings {
    pub shuffle: Option<bool>,
    /// Must be given together with `deflate_level`.
    pub deflate: Option<bool>,
    pub deflate_level: Option<i32>,
    pub fletcher32: Option<bool>,
    pub storage: Option<Layout>,
    /// Only used with `Layout::Chunked`; estimated if not given.
    pub chunksizes: Option<Vec<usize>>,
    pub no_fill: Option<bool>,
    pub fill_value: Option<Data>,
    pub endianness: Option<Endianness>,
}

fn set_filter(filters: &mut Vec<Filter>, id: u32, filter: Option<Filter>) {
    filters.retain(|f| f.id() != id);
    if let Some(filter) = filter {
        filters.push(filter);
    }
}

impl NcFile {
    /// Changes storage properties of a variable whose dataset has not been created yet.
    ///
    /// Either every change is applied or, on error, none is.
    pub fn def_var_extra(
        &mut self, grp: GroupId, varid: VarId, settings: &VarSettings,
    ) -> Result<()> {
        self.check_writable()?;
        let var = self.var(grp, varid)?;
        ensure!(!var.created, Error::LateDefine);
        let ty = self.types.get(var.type_id)?;

        let filtering = [settings.shuffle, settings.deflate, settings.fletcher32]
            .iter()
            .any(|s| *s == Some(true));
        ensure!(
            !(self.is_parallel() && filtering),
            Error::InvalidArgument("filters are not supported for parallel files".into())
        );

        ensure!(
            settings.deflate.is_some() == settings.deflate_level.is_some(),
            Error::InvalidArgument("deflate and deflate level must be given together".into())
        );
        let min = i32::from(MIN_DEFLATE_LEVEL);
        let max = i32::from(MAX_DEFLATE_LEVEL);
        let level = match (settings.deflate, settings.deflate_level) {
            (Some(true), Some(level)) => {
                ensure!(
                    (min..=max).contains(&level),
                    Error::InvalidArgument(format!("deflate level {} not in {}..={}", level, min, max))
                );
                Some(level as u8)
            }
            _ => None,
        };

        let mut next = var.clone();
        let dims = var.dimids.iter().map(|&d| self.dims[d.0].clone()).collect::<Vec<_>>();
        let any_unlimited = dims.iter().any(|d| d.unlimited);

        if !next.is_scalar() {
            if let Some(deflate) = settings.deflate {
                let filter = level.filter(|_| deflate).map(Filter::Deflate);
                set_filter(&mut next.filters, FILTER_DEFLATE, filter);
                next.storage = Layout::Chunked;
            }
            if let Some(shuffle) = settings.shuffle {
                let filter = Some(Filter::Shuffle).filter(|_| shuffle);
                set_filter(&mut next.filters, FILTER_SHUFFLE, filter);
                next.storage = Layout::Chunked;
            }
            if let Some(fletcher32) = settings.fletcher32 {
                let filter = Some(Filter::Fletcher32).filter(|_| fletcher32);
                set_filter(&mut next.filters, FILTER_FLETCHER32, filter);
                next.storage = Layout::Chunked;
            }
        }

        let mut chunking_changed = next.storage != var.storage || next.filters != var.filters;
        match settings.storage {
            Some(Layout::Contiguous) => {
                ensure!(
                    next.filters.is_empty(),
                    Error::InvalidArgument("contiguous storage cannot use filters".into())
                );
                ensure!(
                    !any_unlimited,
                    Error::InvalidArgument("contiguous storage cannot have unlimited dims".into())
                );
                next.storage = Layout::Contiguous;
            }
            Some(Layout::Compact) => {
                let size = dims
                    .iter()
                    .try_fold(ty.size(), |acc, d| acc.checked_mul(d.len))
                    .ok_or(Error::VarSize)?;
                ensure!(size <= MAX_COMPACT_SIZE, Error::VarSize);
                ensure!(
                    !any_unlimited,
                    Error::InvalidArgument("compact storage cannot have unlimited dims".into())
                );
                ensure!(
                    next.filters.is_empty(),
                    Error::InvalidArgument("compact storage cannot use filters".into())
                );
                next.storage = Layout::Compact;
            }
            Some(Layout::Chunked) => {
                ensure!(
                    !next.is_scalar(),
                    Error::InvalidArgument("scalar variables cannot be chunked".into())
                );
                if let Some(ref chunks) = settings.chunksizes {
                    ensure!(
                        chunks.len() == next.ndims(),
                        Error::InvalidArgument(format!(
                            "{} chunk sizes for {} dims",
                            chunks.len(),
                            next.ndims()
                        ))
                    );
                    check_chunksizes(ty.size(), chunks)?;
                    for (&c, dim) in chunks.iter().zip(&dims) {
                        ensure!(c > 0, Error::BadChunk("chunk size of zero".into()));
                        ensure!(
                            dim.unlimited || dim.len == 0 || c <= dim.len,
                            Error::BadChunk(format!(
                                "chunk size {} exceeds length {} of {:?}",
                                c, dim.len, dim.name
                            ))
                        );
                    }
                    next.chunksizes = chunks.clone();
                }
                next.storage = Layout::Chunked;
                chunking_changed = true;
            }
            None => {}
        }

        if let Some(true) = settings.no_fill {
            ensure!(
                ty.atomic_type() != Some(NcType::String),
                Error::InvalidArgument("string variables must be filled".into())
            );
        }
        if let Some(no_fill) = settings.no_fill {
            next.no_fill = no_fill;
        }
        let put_fill = match settings.fill_value {
            Some(ref value) if !next.no_fill => {
                ensure!(
                    value.len() == 1,
                    Error::InvalidArgument(format!("{} must hold one value", ATT_FILL_VALUE))
                );
                ensure!(value.element_size() == ty.element_size(), Error::BadType);
                Some(value.clone())
            }
            _ => None,
        };

        if let Some(endianness) = settings.endianness {
            ensure!(
                ty.is_numeric(),
                Error::InvalidArgument(format!("{} has no byte order", ty.name))
            );
            next.endianness = endianness;
        }

        // validated; commit
        let type_id = next.type_id;
        let needs_chunks = next.storage == Layout::Chunked && next.chunksizes.is_empty();
        *self.var_mut(grp, varid)? = next;
        if needs_chunks {
            self.find_default_chunksizes(grp, varid)?;
        }
        if chunking_changed {
            self.adjust_var_cache(grp, varid)?;
        }
        if let Some(value) = put_fill {
            match self.del_att(grp, Some(varid), ATT_FILL_VALUE) {
                Ok(()) | Err(Error::NotAtt) => {}
                Err(err) => return Err(err),
            }
            self.put_att(grp, Some(varid), ATT_FILL_VALUE, type_id, &value)?;
        }
        log::debug!("storage settings of {} in {} updated: {:?}", varid, grp, settings);
        Ok(())
    }

    /// Turns the shuffle and deflate filters on or off.
    pub fn def_var_deflate(
        &mut self, grp: GroupId, varid: VarId, shuffle: bool, deflate: bool, level: i32,
    ) -> Result<()> {
        let settings = VarSettings {
            shuffle: Some(shuffle),
            deflate: Some(deflate),
            deflate_level: Some(level),
            ..VarSettings::default()
        };
        self.def_var_extra(grp, varid, &settings)
    }

    pub fn def_var_fletcher32(&mut self, grp: GroupId, varid: VarId, on: bool) -> Result<()> {
        let settings = VarSettings { fletcher32: Some(on), ..VarSettings::default() };
        self.def_var_extra(grp, varid, &settings)
    }

    pub fn def_var_chunking(
        &mut self, grp: GroupId, varid: VarId, storage: Layout, chunksizes: Option<&[usize]>,
    ) -> Result<()> {
        let settings = VarSettings {
            storage: Some(storage),
            chunksizes: chunksizes.map(<[usize]>::to_vec),
            ..VarSettings::default()
        };
        self.def_var_extra(grp, varid, &settings)
    }

    /// Sets the fill mode and, when filling, the fill value.
    pub fn def_var_fill(
        &mut self, grp: GroupId, varid: VarId, no_fill: bool, fill_value: Option<&Data>,
    ) -> Result<()> {
        let settings = VarSettings {
            no_fill: Some(no_fill),
            fill_value: fill_value.cloned(),
            ..VarSettings::default()
        };
        self.def_var_extra(grp, varid, &settings)
    }

    pub fn def_var_fill_value<T: NcValue>(
        &mut self, grp: GroupId, varid: VarId, value: T,
    ) -> Result<()> {
        ensure!(self.var(grp, varid)?.type_id == T::NC_TYPE.into(), Error::BadType);
        self.def_var_fill(grp, varid, false, Some(&T::encode(&[value])))
    }

    pub fn def_var_endian(
        &mut self, grp: GroupId, varid: VarId, endianness: Endianness,
    ) -> Result<()> {
        let settings = VarSettings { endianness: Some(endianness), ..VarSettings::default() };
        self.def_var_extra(grp, varid, &settings)
    }

    /// Adds a filter to a variable's pipeline, replacing any filter with the same id.
    pub fn def_var_filter(
        &mut self, grp: GroupId, varid: VarId, id: u32, params: &[u32],
    ) -> Result<()> {
        self.check_writable()?;
        let var = self.var(grp, varid)?;
        ensure!(!var.created, Error::LateDefine);
        ensure!(
            !self.is_parallel(),
            Error::InvalidArgument("filters are not supported for parallel files".into())
        );
        ensure!(
            !var.is_scalar(),
            Error::InvalidArgument("scalar variables cannot be filtered".into())
        );
        ensure!(self.engine.filter_available(id), Error::NoFilter(id));
        let filter = Filter::from_raw(id, params)?;

        let var = self.var_mut(grp, varid)?;
        set_filter(&mut var.filters, id, Some(filter.clone()));
        var.storage = Layout::Chunked;
        if var.chunksizes.is_empty() {
            self.find_default_chunksizes(grp, varid)?;
        }
        self.adjust_var_cache(grp, varid)?;
        log::debug!("filter {:?} added to {} in {}", filter, varid, grp);
        Ok(())
    }

    pub fn def_var_szip(
        &mut self, grp: GroupId, varid: VarId, coding: SZip, px_per_block: u8,
    ) -> Result<()> {
        let filter = Filter::szip(coding, px_per_block);
        self.def_var_filter(grp, varid, filter.id(), &filter.params())
    }

    /// Sets the chunk cache of one variable, reopening its dataset if it exists.
    pub fn set_var_chunk_cache(
        &mut self, grp: GroupId, varid: VarId, size: usize, nelems: usize, preemption: f64,
    ) -> Result<()> {
        self.var(grp, varid)?;
        ensure!(
            (0.0..=1.0).contains(&preemption),
            Error::InvalidArgument(format!("preemption must be within [0, 1]: {}", preemption))
        );
        self.var_mut(grp, varid)?.cache = ChunkCache { nbytes: size, nslots: nelems, w0: preemption };
        self.reopen_dataset(grp, varid)
    }

    /// Chunk cache size, slot count and preemption of a variable.
    pub fn get_var_chunk_cache(&self, grp: GroupId, varid: VarId) -> Result<(usize, usize, f64)> {
        let cache = self.var(grp, varid)?.cache;
        Ok((cache.nbytes, cache.nslots, cache.w0))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::engine::MemEngine;
    use crate::nc::{DimId, SelfComm};

    fn file_with_var(dims: &[usize]) -> (NcFile, VarId, Vec<DimId>) {
        let mut file = NcFile::create(MemEngine::new()).unwrap();
        let root = file.root();
        let dimids = dims
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let name = format!("d{}", i);
                if len == 0 {
                    file.def_unlimited_dim(root, &name).unwrap()
                } else {
                    file.def_dim(root, &name, len).unwrap()
                }
            })
            .collect::<Vec<_>>();
        let v = file.def_var(root, "v", NcType::Float.into(), &dimids).unwrap();
        (file, v, dimids)
    }

    #[test]
    pub fn test_deflate() {
        let (mut file, v, _) = file_with_var(&[100, 200]);
        let root = file.root();
        file.def_var_deflate(root, v, true, true, 4).unwrap();
        let info = file.inq_var(root, v).unwrap();
        assert_eq!(info.storage, Layout::Chunked);
        assert!(info.shuffle);
        assert_eq!(info.deflate, Some(4));
        assert_eq!(info.chunksizes, Some(vec![100, 200]));

        file.def_var_deflate(root, v, false, false, 0).unwrap();
        let info = file.inq_var(root, v).unwrap();
        assert!(info.filters.is_empty());
        assert_eq!(info.storage, Layout::Chunked);

        assert!(matches!(file.def_var_deflate(root, v, false, true, 10), Err(Error::InvalidArgument(_))));
        assert!(matches!(file.def_var_deflate(root, v, false, true, -1), Err(Error::InvalidArgument(_))));
        let half = VarSettings { deflate: Some(true), ..VarSettings::default() };
        assert!(matches!(file.def_var_extra(root, v, &half), Err(Error::InvalidArgument(_))));
    }

    #[test]
    pub fn test_scalar_ignores_filters() {
        let (mut file, v, _) = file_with_var(&[]);
        let root = file.root();
        file.def_var_deflate(root, v, true, true, 1).unwrap();
        file.def_var_fletcher32(root, v, true).unwrap();
        let info = file.inq_var(root, v).unwrap();
        assert!(info.filters.is_empty());
        assert_eq!(info.storage, Layout::Contiguous);
        assert!(matches!(
            file.def_var_chunking(root, v, Layout::Chunked, None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(file.def_var_filter(root, v, 2, &[]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    pub fn test_chunking() {
        let (mut file, v, _) = file_with_var(&[0, 10]);
        let root = file.root();
        assert!(matches!(
            file.def_var_chunking(root, v, Layout::Contiguous, None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            file.def_var_chunking(root, v, Layout::Chunked, Some(&[4, 11])),
            Err(Error::BadChunk(_))
        ));
        assert!(matches!(
            file.def_var_chunking(root, v, Layout::Chunked, Some(&[0, 5])),
            Err(Error::BadChunk(_))
        ));
        assert_eq!(file.inq_var(root, v).unwrap().chunksizes, Some(vec![1, 10]));
        file.def_var_chunking(root, v, Layout::Chunked, Some(&[100, 5])).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().chunksizes, Some(vec![100, 5]));
    }

    #[test]
    pub fn test_contiguous_and_compact() {
        let (mut file, v, _) = file_with_var(&[10, 10]);
        let root = file.root();
        file.def_var_fletcher32(root, v, true).unwrap();
        assert!(matches!(
            file.def_var_chunking(root, v, Layout::Contiguous, None),
            Err(Error::InvalidArgument(_))
        ));
        file.def_var_fletcher32(root, v, false).unwrap();
        file.def_var_chunking(root, v, Layout::Contiguous, None).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().chunksizes, None);
        file.def_var_chunking(root, v, Layout::Compact, None).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().storage, Layout::Compact);

        let (mut file, v, _) = file_with_var(&[200, 100]);
        assert_eq!(file.def_var_chunking(GroupId::ROOT, v, Layout::Compact, None), Err(Error::VarSize));
        let (mut file, v, _) = file_with_var(&[1 << 40, 1 << 40, 1 << 40]);
        assert_eq!(file.def_var_chunking(GroupId::ROOT, v, Layout::Compact, None), Err(Error::VarSize));
    }

    #[test]
    pub fn test_fill_and_endianness() {
        let (mut file, v, _) = file_with_var(&[3]);
        let root = file.root();
        file.def_var_fill_value(root, v, 1.5f32).unwrap();
        assert_eq!(file.get_att_values::<f32>(root, Some(v), ATT_FILL_VALUE).unwrap(), vec![1.5]);
        file.def_var_fill_value(root, v, 2.5f32).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().fill_value, f32::encode(&[2.5]));
        assert_eq!(file.def_var_fill_value(root, v, 1i32), Err(Error::BadType));
        file.def_var_fill(root, v, true, None).unwrap();
        assert!(file.inq_var(root, v).unwrap().no_fill);

        file.def_var_endian(root, v, Endianness::Big).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().endianness, Endianness::Big);

        let x = file.inq_dimid(root, "d0").unwrap();
        let s = file.def_var(root, "s", NcType::String.into(), &[x]).unwrap();
        assert!(matches!(file.def_var_fill(root, s, true, None), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            file.def_var_endian(root, s, Endianness::Little),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    pub fn test_late_define() {
        let (mut file, v, _) = file_with_var(&[3]);
        let root = file.root();
        file.enddef().unwrap();
        assert_eq!(file.def_var_deflate(root, v, false, true, 1), Err(Error::LateDefine));
        assert_eq!(file.def_var_chunking(root, v, Layout::Chunked, None), Err(Error::LateDefine));
        assert_eq!(file.def_var_endian(root, v, Endianness::Big), Err(Error::LateDefine));
        assert_eq!(file.def_var_filter(root, v, 2, &[]), Err(Error::LateDefine));
        assert_eq!(file.def_var_fletcher32(root, VarId(7), true), Err(Error::NotVar));
    }

    #[test]
    pub fn test_def_var_filter() {
        let (mut file, v, _) = file_with_var(&[30]);
        let root = file.root();
        assert_eq!(file.def_var_filter(root, v, 307, &[9]), Err(Error::NoFilter(307)));
        assert!(matches!(file.def_var_filter(root, v, 3, &[1, 2]), Err(Error::Filter(_))));
        file.def_var_filter(root, v, 1, &[5]).unwrap();
        file.def_var_filter(root, v, 1, &[6]).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().filters, vec![Filter::Deflate(6)]);
        assert!(matches!(
            file.def_var_szip(root, v, SZip::Entropy, 3),
            Err(Error::InvalidArgument(_))
        ));
        file.def_var_szip(root, v, SZip::NearestNeighbor, 8).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().filters.len(), 2);
    }

    #[test]
    pub fn test_parallel_rejects_filters() {
        let mut file = NcFile::with_options().parallel(SelfComm).create(MemEngine::new()).unwrap();
        let root = file.root();
        let x = file.def_dim(root, "x", 8).unwrap();
        let v = file.def_var(root, "v", NcType::Int.into(), &[x]).unwrap();
        assert!(matches!(file.def_var_deflate(root, v, false, true, 1), Err(Error::InvalidArgument(_))));
        assert!(matches!(file.def_var_filter(root, v, 1, &[1]), Err(Error::InvalidArgument(_))));
        file.def_var_deflate(root, v, false, false, 0).unwrap();
    }

    #[test]
    pub fn test_chunk_cache() {
        let (mut file, v, _) = file_with_var(&[3]);
        let root = file.root();
        file.set_var_chunk_cache(root, v, 1 << 20, 101, 0.5).unwrap();
        assert_eq!(file.get_var_chunk_cache(root, v).unwrap(), (1 << 20, 101, 0.5));
        assert!(matches!(
            file.set_var_chunk_cache(root, v, 1, 1, 1.5),
            Err(Error::InvalidArgument(_))
        ));
        file.enddef().unwrap();
        file.set_var_chunk_cache(root, v, 1 << 21, 7, 0.25).unwrap();
        assert_eq!(file.inq_var(root, v).unwrap().cache.nbytes, 1 << 21);
    }

    #[test]
    pub fn test_cache_grows_for_large_chunks() {
        let (mut file, v, _) = file_with_var(&[4096, 4096]);
        let root = file.root();
        file.def_var_chunking(root, v, Layout::Chunked, Some(&[4096, 4096])).unwrap();
        let cache = file.inq_var(root, v).unwrap().cache;
        assert_eq!(cache.nbytes, crate::config::MAX_DEFAULT_CACHE_SIZE);
    }
}
