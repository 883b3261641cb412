use super::file::NcFile;
use super::group::check_name;
use super::{DimId, GroupId, VarId};
use crate::config::{MAX_NAME, NON_COORD_PREPEND};
use crate::engine::Hid;
use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub(crate) struct Dim {
    pub id: DimId,
    pub name: String,
    /// Current length; for unlimited dimensions, the longest length written so far.
    pub len: usize,
    pub unlimited: bool,
    pub group: GroupId,
    /// Coordinate variable of this dimension, in `group`.
    pub coord_var: Option<VarId>,
    /// Dataset standing for a dimension that has no coordinate variable.
    pub placeholder: Option<Hid>,
    /// Length the placeholder dataset was created or last extended with.
    pub placeholder_len: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimInfo {
    pub name: String,
    pub len: usize,
    pub unlimited: bool,
}

impl NcFile {
    pub(crate) fn dim(&self, dimid: DimId) -> Result<&Dim> {
        self.dims.get(dimid.0).ok_or(Error::BadDim)
    }

    /// Returns `true` if `dimid` is defined in `grp` or one of its ancestors.
    pub(crate) fn dim_visible(&self, grp: GroupId, dimid: DimId) -> bool {
        self.dims.get(dimid.0).map_or(false, |d| self.ancestry(grp).contains(&d.group))
    }

    /// Dimension of `grp` (not its ancestors) with this name.
    pub(crate) fn find_dim_in(&self, grp: GroupId, name: &str) -> Option<DimId> {
        let group = self.groups.get(grp.0)?;
        group.dims.iter().copied().find(|&d| self.dims[d.0].name == name)
    }

    pub fn def_dim(&mut self, grp: GroupId, name: &str, len: usize) -> Result<DimId> {
        self.define_dim(grp, name, len, false)
    }

    /// Defines a dimension that grows as data is written along it.
    pub fn def_unlimited_dim(&mut self, grp: GroupId, name: &str) -> Result<DimId> {
        self.define_dim(grp, name, 0, true)
    }

    fn define_dim(&mut self, grp: GroupId, name: &str, len: usize, unlimited: bool) -> Result<DimId> {
        self.group(grp)?;
        self.ensure_define_mode()?;
        let name = check_name(name)?;
        if self.is_classic() && unlimited {
            ensure!(
                !self.dims.iter().any(|d| d.unlimited),
                Error::InvalidArgument("classic model files allow one unlimited dimension".into())
            );
        }
        ensure!(self.find_dim_in(grp, &name).is_none(), Error::NameInUse(name));

        // a variable already holding this name must not take the dimension's storage link
        let group = self.group(grp)?;
        let clash = group.vars.iter().position(|v| v.name == name && v.storage_key == name);
        if let Some(idx) = clash {
            let key = format!("{}{}", NON_COORD_PREPEND, name);
            ensure!(key.len() <= MAX_NAME, Error::MaxName);
            let group = &self.groups[grp.0];
            if group.vars[idx].created {
                if let Some(hid) = group.handle {
                    self.engine.move_link(hid, &name, &key)?;
                }
            }
            self.groups[grp.0].vars[idx].storage_key = key;
        }

        let id = DimId(self.dims.len());
        self.dims.push(Dim {
            id,
            name: name.clone(),
            len,
            unlimited,
            group: grp,
            coord_var: None,
            placeholder: None,
            placeholder_len: 0,
        });
        self.groups[grp.0].dims.push(id);
        if unlimited {
            log::debug!("defined unlimited dimension {:?} in {}", name, grp);
        } else {
            log::debug!("defined dimension {:?} of length {} in {}", name, len, grp);
        }
        Ok(id)
    }

    /// Looks a dimension up by name in `grp` and then its ancestors.
    pub fn inq_dimid(&self, grp: GroupId, name: &str) -> Result<DimId> {
        self.group(grp)?;
        self.ancestry(grp).into_iter().find_map(|g| self.find_dim_in(g, name)).ok_or(Error::BadDim)
    }

    pub fn inq_dim(&self, dimid: DimId) -> Result<DimInfo> {
        let dim = self.dim(dimid)?;
        Ok(DimInfo { name: dim.name.clone(), len: self.dim_len(dimid)?, unlimited: dim.unlimited })
    }

    /// Unlimited dimensions defined in this group.
    pub fn inq_unlimdims(&self, grp: GroupId) -> Result<Vec<DimId>> {
        let group = self.group(grp)?;
        Ok(group.dims.iter().copied().filter(|&d| self.dims[d.0].unlimited).collect())
    }

    /// Current length of a dimension.
    ///
    /// Unlimited dimensions are as long as the longest dataset stored along them.
    pub fn dim_len(&self, dimid: DimId) -> Result<usize> {
        let dim = self.dim(dimid)?;
        if !dim.unlimited {
            return Ok(dim.len);
        }
        let mut len = dim.len;
        for g in self.subtree(dim.group) {
            for var in &self.groups[g.0].vars {
                let ds = match var.dataset {
                    Some(ds) if var.dimids.contains(&dimid) => ds,
                    _ => continue,
                };
                let extent = self.engine.dataset_info(ds)?.extents.dims();
                for (i, _) in var.dimids.iter().enumerate().filter(|(_, &d)| d == dimid) {
                    len = len.max(extent[i]);
                }
            }
        }
        Ok(len)
    }
}
