//! Strided reads and writes: bounds checks, type conversion, extension along unlimited
//! dimensions and fill synthesis past the stored extent.

use std::borrow::Cow;

use ndarray::{ArrayD, ArrayView, IxDyn};
use nc4_types::{convert, Data, NcType, NcValue};

use super::file::NcFile;
use super::types::TypeId;
use super::{DimId, GroupId, VarId};
use crate::engine::Hid;
use crate::error::{Error, Result};
use crate::hl::plist::Transfer;
use crate::hl::selection::{Hyperslab, Selection};

/// A request with per-axis start, count and (positive) stride.
#[derive(Clone, Debug)]
struct Request {
    start: Vec<usize>,
    count: Vec<usize>,
    stride: Vec<usize>,
}

impl Request {
    fn new(ndims: usize, start: &[usize], count: &[usize], stride: Option<&[isize]>) -> Result<Self> {
        ensure!(
            start.len() == ndims && count.len() == ndims,
            Error::InvalidArgument(format!(
                "expected {} start and count entries, got {} and {}",
                ndims,
                start.len(),
                count.len()
            ))
        );
        let stride = match stride {
            Some(stride) => {
                ensure!(
                    stride.len() == ndims,
                    Error::InvalidArgument(format!(
                        "expected {} stride entries, got {}",
                        ndims,
                        stride.len()
                    ))
                );
                ensure!(stride.iter().all(|&s| s > 0), Error::Stride);
                stride.iter().map(|&s| s as usize).collect()
            }
            None => vec![1; ndims],
        };
        Ok(Self { start: start.to_vec(), count: count.to_vec(), stride })
    }

    /// Number of requested elements; 1 for scalars.
    fn len(&self) -> usize {
        self.count.iter().product()
    }

    /// One past the last index selected along axis `d`.
    fn end(&self, d: usize) -> usize {
        match self.count[d] {
            0 => self.start[d],
            n => self.start[d] + (n - 1) * self.stride[d] + 1,
        }
    }

    fn check_bounds(&self, d: usize, len: usize) -> Result<()> {
        let (start, count) = (self.start[d], self.count[d]);
        ensure!(start < len || (start == len && count == 0), Error::InvalidCoords);
        ensure!(count == 0 || self.end(d) <= len, Error::Edge);
        Ok(())
    }

    fn selection(&self, count: &[usize]) -> Selection {
        if self.start.is_empty() {
            Selection::All
        } else if count.iter().any(|&c| c == 0) {
            Selection::None
        } else {
            Hyperslab::new(&self.start, count, Some(&self.stride)).into()
        }
    }
}

impl NcFile {
    fn dataset(&self, grp: GroupId, varid: VarId) -> Result<Hid> {
        let var = self.var(grp, varid)?;
        var.dataset.ok_or_else(|| Error::from(format!("{} in {} has no dataset", varid, grp)))
    }

    /// Atomic types on both ends of a transfer, or `None` for user-defined types which
    /// are never converted.
    fn transfer_types(&self, var_type: TypeId, mem_type: TypeId) -> Result<Option<(NcType, NcType)>> {
        self.types.get(mem_type)?;
        match (var_type.atomic(), mem_type.atomic()) {
            (Some(file), Some(mem)) => {
                ensure!((file == NcType::Char) == (mem == NcType::Char), Error::Char);
                Ok(Some((file, mem)))
            }
            _ => {
                ensure!(var_type == mem_type, Error::BadType);
                Ok(None)
            }
        }
    }

    /// Classic model files do not report byte/unsigned byte wrap-around.
    fn range_exempt(&self, a: NcType, b: NcType) -> bool {
        let is_byte = |t| matches!(t, NcType::Byte | NcType::UByte);
        self.is_classic() && is_byte(a) && is_byte(b)
    }

    fn convert_data<'a>(
        &self, data: Cow<'a, Data>, from: NcType, to: NcType,
    ) -> Result<(Cow<'a, Data>, bool)> {
        if from == to {
            return Ok((data, false));
        }
        let converted = convert(&data, from, to)?;
        log::trace!("converted {} values from {} to {}", data.len(), from, to);
        let range_error = converted.range_error && !self.range_exempt(from, to);
        Ok((Cow::Owned(converted.data), range_error))
    }

    fn transfer_mode(&self, access: Transfer) -> Transfer {
        if self.is_parallel() && access.is_collective() {
            Transfer::Collective
        } else {
            Transfer::Independent
        }
    }

    /// Writes `data`, given in `mem_type`, to a strided selection of a variable.
    ///
    /// Unlimited dimensions grow to fit the selection. Values that do not fit the
    /// variable's type are still written, and `Error::Range` is returned afterwards.
    pub fn put_vars_raw(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize],
        stride: Option<&[isize]>, mem_type: TypeId, data: &Data,
    ) -> Result<()> {
        self.check_writable()?;
        let var = self.var(grp, varid)?;
        let req = Request::new(var.ndims(), start, count, stride)?;
        let (var_type, access, dimids) = (var.type_id, var.access, var.dimids.clone());
        let types = self.transfer_types(var_type, mem_type)?;
        ensure!(data.element_size() == self.types.get(mem_type)?.element_size(), Error::BadType);
        ensure!(
            data.len() == req.len(),
            Error::InvalidArgument(format!(
                "{} values given for {} elements",
                data.len(),
                req.len()
            ))
        );

        self.ensure_data_mode()?;
        let ds = self.dataset(grp, varid)?;
        let fdims = self.engine.dataset_info(ds)?.extents.dims();
        let unlimited = dimids.iter().map(|&d| self.dims[d.0].unlimited).collect::<Vec<_>>();
        for d in 0..dimids.len() {
            if !unlimited[d] {
                req.check_bounds(d, fdims[d])?;
            }
        }

        let (buf, range_error) = match types {
            Some((file, mem)) => self.convert_data(Cow::Borrowed(data), mem, file)?,
            None => (Cow::Borrowed(data), false),
        };

        let zero_count = req.len() == 0;
        let mut xtend = fdims.clone();
        let mut need = false;
        if !zero_count {
            for d in 0..dimids.len() {
                if unlimited[d] && req.end(d) > fdims[d] {
                    xtend[d] = req.end(d);
                    need = true;
                }
            }
            self.grow_dims(&dimids, &unlimited, &xtend);
        }

        let xfer = self.transfer_mode(access);
        if xfer.is_collective() {
            need = self.any_process(need)?;
        }
        if need {
            if self.is_parallel() {
                ensure!(access.is_collective(), Error::CantExtend);
                self.max_over_processes(&mut xtend)?;
                self.grow_dims(&dimids, &unlimited, &xtend);
            }
            self.engine.set_extent(ds, &xtend)?;
            log::debug!("extended {} in {} from {:?} to {:?}", varid, grp, fdims, xtend);
        }

        if zero_count {
            if xfer.is_collective() {
                self.engine.write(ds, &Selection::None, &buf, xfer)?;
            }
            return Ok(());
        }
        let selection = req.selection(&req.count);
        log::trace!("writing {} elements of {} in {} ({:?})", buf.len(), varid, grp, xfer);
        self.engine.write(ds, &selection, &buf, xfer)?;
        self.var_mut(grp, varid)?.written_to = true;
        ensure!(!range_error, Error::Range);
        Ok(())
    }

    /// Dimension lengths move ahead of the storage resize.
    fn grow_dims(&mut self, dimids: &[DimId], unlimited: &[bool], xtend: &[usize]) {
        for (d, &dimid) in dimids.iter().enumerate() {
            let dim = &mut self.dims[dimid.0];
            if unlimited[d] && xtend[d] > dim.len {
                dim.len = xtend[d];
            }
        }
    }

    /// Reads a strided selection of a variable into `out`, converted to `mem_type`.
    ///
    /// Indices past the stored extent of an unlimited dimension, but within the
    /// dimension's length, read as the variable's fill value. On `Error::Range` the
    /// values are still read into `out`.
    pub fn read_vars(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize],
        stride: Option<&[isize]>, mem_type: TypeId, out: &mut Data,
    ) -> Result<()> {
        let var = self.var(grp, varid)?;
        let req = Request::new(var.ndims(), start, count, stride)?;
        let (var_type, access, dimids) = (var.type_id, var.access, var.dimids.clone());
        let types = self.transfer_types(var_type, mem_type)?;

        self.ensure_data_mode()?;
        let ds = self.dataset(grp, varid)?;
        let fdims = self.engine.dataset_info(ds)?.extents.dims();
        let mut real = req.count.clone();
        for (d, &dimid) in dimids.iter().enumerate() {
            if self.dim(dimid)?.unlimited {
                req.check_bounds(d, self.dim_len(dimid)?)?;
                real[d] = if req.start[d] < fdims[d] {
                    let avail = (fdims[d] - req.start[d] + req.stride[d] - 1) / req.stride[d];
                    avail.min(req.count[d])
                } else {
                    0
                };
            } else {
                req.check_bounds(d, fdims[d])?;
            }
        }

        let xfer = self.transfer_mode(access);
        let nreal: usize = real.iter().product();
        let var_size = self.types.get(var_type)?.element_size();
        let stored = if nreal > 0 || xfer.is_collective() {
            let selection = req.selection(&real);
            log::trace!("reading {} elements of {} in {} ({:?})", nreal, varid, grp, xfer);
            self.engine.read(ds, &selection, xfer)?
        } else {
            Data::zeroed(var_size, 0)
        };
        let (values, mut range_error) = match types {
            Some((file, mem)) => {
                let (data, range_error) = self.convert_data(Cow::Owned(stored), file, mem)?;
                (data.into_owned(), range_error)
            }
            None => (stored, false),
        };

        let total = req.len();
        if nreal == total {
            *out = values;
        } else {
            let ty = self.types.get(var_type)?;
            let fill = self.var(grp, varid)?.fill(&ty);
            let fill = match types {
                Some((file, mem)) => {
                    let (fill, fill_range) = self.convert_data(Cow::Owned(fill), file, mem)?;
                    range_error |= fill_range;
                    fill.into_owned()
                }
                None => fill,
            };
            let mut buf = Data::repeat(&fill, total);
            let origin = vec![0; real.len()];
            let offsets = Hyperslab::new(&origin, &real, None).offsets(&req.count);
            for (i, offset) in offsets.into_iter().enumerate() {
                buf.copy_element(offset, &values, i);
            }
            log::trace!("{} of {} elements of {} read as fill", total - nreal, total, varid);
            *out = buf;
        }
        ensure!(!range_error, Error::Range);
        Ok(())
    }

    /// Writes `values` to a strided selection; `stride` defaults to 1 on every axis.
    pub fn put_vars<T: NcValue>(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize],
        stride: Option<&[isize]>, values: &[T],
    ) -> Result<()> {
        self.put_vars_raw(grp, varid, start, count, stride, T::NC_TYPE.into(), &T::encode(values))
    }

    pub fn put_vara<T: NcValue>(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize], values: &[T],
    ) -> Result<()> {
        self.put_vars(grp, varid, start, count, None, values)
    }

    /// Writes a whole variable at its current shape.
    pub fn put_var<T: NcValue>(&mut self, grp: GroupId, varid: VarId, values: &[T]) -> Result<()> {
        let shape = self.var_shape(grp, varid)?;
        self.put_vars(grp, varid, &vec![0; shape.len()], &shape, None, values)
    }

    pub fn put_var1<T: NcValue>(
        &mut self, grp: GroupId, varid: VarId, index: &[usize], value: T,
    ) -> Result<()> {
        self.put_vars(grp, varid, index, &vec![1; index.len()], None, &[value])
    }

    pub fn put_vara_text(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize], text: &[u8],
    ) -> Result<()> {
        let data = Data::fixed(1, text.to_vec());
        self.put_vars_raw(grp, varid, start, count, None, NcType::Char.into(), &data)
    }

    /// Reads a strided selection into `out`.
    ///
    /// Unlike `get_vars`, the values also land in `out` when `Error::Range` is returned.
    pub fn get_vars_into<T: NcValue>(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize],
        stride: Option<&[isize]>, out: &mut Vec<T>,
    ) -> Result<()> {
        let mut data = T::encode(&[]);
        let res = self.read_vars(grp, varid, start, count, stride, T::NC_TYPE.into(), &mut data);
        match res {
            Ok(()) | Err(Error::Range) => {
                *out = T::decode(&data)?;
                res
            }
            Err(err) => Err(err),
        }
    }

    pub fn get_vars<T: NcValue>(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize],
        stride: Option<&[isize]>,
    ) -> Result<Vec<T>> {
        let mut out = Vec::new();
        self.get_vars_into(grp, varid, start, count, stride, &mut out)?;
        Ok(out)
    }

    pub fn get_vara<T: NcValue>(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize],
    ) -> Result<Vec<T>> {
        self.get_vars(grp, varid, start, count, None)
    }

    pub fn get_var<T: NcValue>(&mut self, grp: GroupId, varid: VarId) -> Result<Vec<T>> {
        let shape = self.var_shape(grp, varid)?;
        self.get_vars(grp, varid, &vec![0; shape.len()], &shape, None)
    }

    pub fn get_var1<T: NcValue>(&mut self, grp: GroupId, varid: VarId, index: &[usize]) -> Result<T> {
        let mut values = self.get_vars(grp, varid, index, &vec![1; index.len()], None)?;
        values.pop().ok_or_else(|| "empty read of a single element".into())
    }

    pub fn get_vara_text(
        &mut self, grp: GroupId, varid: VarId, start: &[usize], count: &[usize],
    ) -> Result<Vec<u8>> {
        let mut data = Data::fixed(1, Vec::new());
        self.read_vars(grp, varid, start, count, None, NcType::Char.into(), &mut data)?;
        data.as_bytes().map(<[u8]>::to_vec).ok_or(Error::Char)
    }

    /// Reads a whole variable into an n-dimensional array.
    pub fn read_array<T: NcValue>(&mut self, grp: GroupId, varid: VarId) -> Result<ArrayD<T>> {
        let shape = self.var_shape(grp, varid)?;
        let vec = self.get_vars(grp, varid, &vec![0; shape.len()], &shape, None)?;
        Ok(ArrayD::from_shape_vec(IxDyn(&shape), vec)?)
    }

    /// Writes an array starting at the origin of a variable.
    ///
    /// The array may be longer than the variable along unlimited dimensions.
    pub fn write_array<'b, A, T, D>(&mut self, grp: GroupId, varid: VarId, arr: A) -> Result<()>
    where
        A: Into<ArrayView<'b, T, D>>,
        T: NcValue,
        D: ndarray::Dimension,
    {
        let view = arr.into();
        let ndims = self.var(grp, varid)?.ndims();
        ensure!(
            view.ndim() == ndims,
            Error::InvalidArgument(format!("ndim mismatch: expected {}, got {}", ndims, view.ndim()))
        );
        let values = match view.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(view.iter().cloned().collect::<Vec<_>>()),
        };
        self.put_vars(grp, varid, &vec![0; ndims], view.shape(), None, &values)
    }
}
