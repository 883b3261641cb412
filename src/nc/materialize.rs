//! Turning definitions into storage: groups, types, dimension datasets and variables.

use nc4_types::{NcType, NcValue};

use super::attr::Att;
use super::file::NcFile;
use super::{DimId, GroupId, VarId};
use crate::config::{ATT_COORDINATES, ATT_DIMID, DIM_WITHOUT_VARIABLE};
use crate::engine::{Attribute, Hid};
use crate::error::Result;
use crate::hl::extents::{Extent, Extents};
use crate::hl::plist::{DatasetAccess, DatasetCreate, FillTime, Layout};

pub(crate) fn int_attr(values: &[i32]) -> Attribute {
    Attribute { dtype: NcType::Int.descriptor(), data: i32::encode(values) }
}

pub(crate) fn dimid_attr(dimid: DimId) -> Attribute {
    int_attr(&[dimid.0 as i32])
}

impl NcFile {
    /// Creates everything defined so far that the storage engine does not hold yet.
    pub(crate) fn write_metadata(&mut self) -> Result<()> {
        for g in 0..self.groups.len() {
            self.write_group(GroupId(g))?;
        }
        Ok(())
    }

    fn write_group(&mut self, grp: GroupId) -> Result<()> {
        let hid = self.group_handle(grp)?;

        for ty in self.types.uncommitted(grp) {
            let info = self.types.get(ty)?;
            self.engine.commit_type(hid, &info.name, &info.descriptor)?;
            self.types.mark_committed(ty);
            log::debug!("committed type {:?}", info.name);
        }

        let mut atts = std::mem::take(&mut self.groups[grp.0].atts);
        let res = self.write_atts(hid, &mut atts);
        self.groups[grp.0].atts = atts;
        res?;

        for dimid in self.groups[grp.0].dims.clone() {
            let dim = &self.dims[dimid.0];
            if dim.coord_var.is_none() && dim.placeholder.is_none() {
                self.create_placeholder(dimid)?;
            }
        }

        for v in 0..self.groups[grp.0].vars.len() {
            let varid = VarId(v);
            let var = self.var(grp, varid)?;
            if var.created && var.fill_changed && !var.written_to {
                log::debug!("recreating dataset {:?} for its new fill value", var.storage_key);
                self.drop_dataset(grp, varid)?;
            }
            if !self.var(grp, varid)?.created {
                self.create_var_dataset(grp, varid)?;
            }
        }

        for v in 0..self.groups[grp.0].vars.len() {
            self.attach_scales(grp, VarId(v))?;
            self.write_var_atts(grp, VarId(v))?;
        }

        for dimid in self.groups[grp.0].dims.clone() {
            self.extend_placeholder(dimid)?;
        }
        Ok(())
    }

    /// Storage handle of a group, creating the group and its ancestors as needed.
    pub(crate) fn group_handle(&mut self, grp: GroupId) -> Result<Hid> {
        let group = self.group(grp)?;
        if let Some(hid) = group.handle {
            return Ok(hid);
        }
        let (parent, name) = match group.parent {
            Some(parent) => (parent, group.name.clone()),
            None => return Ok(self.engine.root()),
        };
        let parent = self.group_handle(parent)?;
        let hid = self.engine.create_group(parent, &name)?;
        self.groups[grp.0].handle = Some(hid);
        log::debug!("created group {:?}", name);
        Ok(hid)
    }

    fn write_atts(&self, loc: Hid, atts: &mut [Att]) -> Result<()> {
        for att in atts.iter_mut().filter(|a| a.dirty) {
            let dtype = self.types.get(att.type_id)?.descriptor;
            self.engine.write_attr(loc, &att.name, &Attribute { dtype, data: att.data.clone() })?;
            att.dirty = false;
            att.stored = true;
        }
        Ok(())
    }

    fn write_var_atts(&mut self, grp: GroupId, varid: VarId) -> Result<()> {
        let ds = match self.var(grp, varid)?.dataset {
            Some(ds) => ds,
            None => return Ok(()),
        };
        let mut atts = std::mem::take(&mut self.var_mut(grp, varid)?.atts);
        let res = self.write_atts(ds, &mut atts);
        self.var_mut(grp, varid)?.atts = atts;
        res
    }

    /// Creates the dataset standing for a dimension without a coordinate variable.
    pub(crate) fn create_placeholder(&mut self, dimid: DimId) -> Result<()> {
        let dim = self.dim(dimid)?.clone();
        if dim.placeholder.is_some() {
            return Ok(());
        }
        let hid = self.group_handle(dim.group)?;
        let (extent, dcpl) = if dim.unlimited {
            (Extent::resizable(dim.len), DatasetCreate::build().chunk(&[1]).finish()?)
        } else {
            (Extent::fixed(dim.len), DatasetCreate::default())
        };
        let dapl = DatasetAccess::with_cache(self.default_cache());
        let dtype = NcType::Float.descriptor();
        let ds = self.engine.create_dataset(
            hid,
            &dim.name,
            &dtype,
            &Extents::simple(vec![extent]),
            &dcpl,
            &dapl,
        )?;
        self.engine.set_scale(ds, &format!("{}{:10}", DIM_WITHOUT_VARIABLE, dim.len))?;
        self.engine.write_attr(ds, ATT_DIMID, &dimid_attr(dimid))?;
        let dim = &mut self.dims[dimid.0];
        dim.placeholder = Some(ds);
        dim.placeholder_len = dim.len;
        log::debug!("created dimension dataset {:?}", dim.name);
        Ok(())
    }

    /// Removes a dimension's placeholder dataset, detaching it from every variable first.
    pub(crate) fn delete_placeholder(&mut self, dimid: DimId) -> Result<()> {
        let dim = self.dim(dimid)?.clone();
        let ds = match dim.placeholder {
            Some(ds) => ds,
            None => return Ok(()),
        };
        self.detach_scale_everywhere(dimid, ds, None)?;
        let hid = self.group_handle(dim.group)?;
        self.engine.close(ds)?;
        self.engine.unlink(hid, &dim.name)?;
        let dim = &mut self.dims[dimid.0];
        dim.placeholder = None;
        dim.placeholder_len = 0;
        log::debug!("deleted dimension dataset {:?}", dim.name);
        Ok(())
    }

    fn extend_placeholder(&mut self, dimid: DimId) -> Result<()> {
        let dim = self.dim(dimid)?;
        if let Some(ds) = dim.placeholder {
            if dim.unlimited && dim.len > dim.placeholder_len {
                let len = dim.len;
                self.engine.set_extent(ds, &[len])?;
                self.dims[dimid.0].placeholder_len = len;
                log::debug!("extended dimension dataset {:?} to {}", self.dims[dimid.0].name, len);
            }
        }
        Ok(())
    }

    /// The dataset acting as the scale of a dimension, if there is one yet.
    pub(crate) fn scale_dataset(&self, dimid: DimId) -> Option<Hid> {
        let dim = self.dims.get(dimid.0)?;
        match dim.coord_var {
            Some(v) => self.groups[dim.group.0].vars.get(v.0).and_then(|var| var.dataset),
            None => dim.placeholder,
        }
    }

    /// Detaches `scale` from every variable it is attached to along `dimid`, except `skip`.
    pub(crate) fn detach_scale_everywhere(
        &mut self, dimid: DimId, scale: Hid, skip: Option<(GroupId, VarId)>,
    ) -> Result<()> {
        let engine = self.engine.clone();
        for group in self.groups.iter_mut() {
            let gid = group.id;
            for var in group.vars.iter_mut() {
                if skip == Some((gid, var.id)) {
                    continue;
                }
                let ds = match var.dataset {
                    Some(ds) => ds,
                    None => continue,
                };
                for (d, attached) in var.dimscale_attached.iter_mut().enumerate() {
                    if *attached && var.dimids[d] == dimid {
                        engine.detach_scale(ds, scale, d)?;
                        *attached = false;
                    }
                }
            }
        }
        Ok(())
    }

    fn attach_scales(&mut self, grp: GroupId, varid: VarId) -> Result<()> {
        let var = self.var(grp, varid)?;
        let ds = match var.dataset {
            Some(ds) => ds,
            None => return Ok(()),
        };
        let mut attached = var.dimscale_attached.clone();
        for (d, &dimid) in var.dimids.iter().enumerate() {
            if attached[d] || (d == 0 && var.dimscale) {
                continue;
            }
            if let Some(scale) = self.scale_dataset(dimid) {
                self.engine.attach_scale(ds, scale, d)?;
                attached[d] = true;
            }
        }
        self.var_mut(grp, varid)?.dimscale_attached = attached;
        Ok(())
    }

    /// Creation properties of a variable's dataset.
    pub(crate) fn var_dcpl(&mut self, grp: GroupId, varid: VarId) -> Result<DatasetCreate> {
        let var = self.var(grp, varid)?;
        if var.storage == Layout::Chunked && var.chunksizes.is_empty() && !var.is_scalar() {
            self.find_default_chunksizes(grp, varid)?;
        }
        let var = self.var(grp, varid)?;
        let ty = self.types.get(var.type_id)?;
        let mut builder = DatasetCreate::build();
        builder.layout(var.storage);
        if var.storage == Layout::Chunked {
            builder.chunk(&var.chunksizes).filters(&var.filters);
        }
        if var.no_fill {
            builder.fill_time(FillTime::Never);
        } else {
            builder.fill_value(var.fill(&ty));
        }
        if ty.is_numeric() {
            builder.endianness(var.endianness);
        }
        builder.finish()
    }

    fn create_var_dataset(&mut self, grp: GroupId, varid: VarId) -> Result<()> {
        let hid = self.group_handle(grp)?;
        let dcpl = self.var_dcpl(grp, varid)?;
        let var = self.var(grp, varid)?;
        let dtype = self.types.get(var.type_id)?.descriptor;
        let extents = if var.is_scalar() {
            Extents::scalar()
        } else {
            Extents::simple(
                var.dimids
                    .iter()
                    .map(|&d| {
                        let dim = &self.dims[d.0];
                        if dim.unlimited {
                            Extent::resizable(0)
                        } else {
                            Extent::fixed(dim.len)
                        }
                    })
                    .collect::<Vec<_>>(),
            )
        };
        let dapl = DatasetAccess::with_cache(var.cache);
        let ds = self.engine.create_dataset(hid, &var.storage_key, &dtype, &extents, &dcpl, &dapl)?;
        if var.dimscale {
            self.engine.set_scale(ds, &var.name)?;
            self.engine.write_attr(ds, ATT_DIMID, &dimid_attr(var.dimids[0]))?;
        }
        if !var.is_scalar() {
            let dimids = var.dimids.iter().map(|d| d.0 as i32).collect::<Vec<_>>();
            self.engine.write_attr(ds, ATT_COORDINATES, &int_attr(&dimids))?;
        }
        log::debug!("created dataset {:?} ({:?}, {})", var.storage_key, dcpl.layout(), extents);

        let var = self.var_mut(grp, varid)?;
        var.dataset = Some(ds);
        var.created = true;
        var.fill_changed = false;
        Ok(())
    }

    /// Unlinks a variable's dataset so that it is created afresh.
    fn drop_dataset(&mut self, grp: GroupId, varid: VarId) -> Result<()> {
        let hid = self.group_handle(grp)?;
        let var = self.var(grp, varid)?.clone();
        if let Some(ds) = var.dataset {
            if var.dimscale {
                self.detach_scale_everywhere(var.dimids[0], ds, Some((grp, varid)))?;
            }
            self.engine.close(ds)?;
        }
        self.engine.unlink(hid, &var.storage_key)?;
        let var = self.var_mut(grp, varid)?;
        var.dataset = None;
        var.created = false;
        var.dimscale_attached.iter_mut().for_each(|a| *a = false);
        for att in var.atts.iter_mut() {
            att.dirty = true;
            att.stored = false;
        }
        Ok(())
    }
}
