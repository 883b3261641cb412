//! Renaming variables, and the coordinate variable transitions a rename can cause.

use super::file::NcFile;
use super::group::check_name;
use super::materialize::dimid_attr;
use super::{GroupId, VarId};
use crate::config::{ATT_DIMID, MAX_NAME, NON_COORD_PREPEND, TEMP_NAME};
use crate::error::{Error, Result};

impl NcFile {
    /// Renames a variable.
    ///
    /// A variable whose new name matches its first dimension (defined in the same group)
    /// becomes that dimension's coordinate variable; a coordinate variable renamed away
    /// from its dimension's name stops being one.
    pub fn rename_var(&mut self, grp: GroupId, varid: VarId, name: &str) -> Result<()> {
        self.check_writable()?;
        let var = self.var(grp, varid)?;
        let (old_name, old_key) = (var.name.clone(), var.storage_key.clone());
        let dim0 = var.dimids.first().copied();
        let name = check_name(name)?;
        self.check_name_free(grp, &name)?;
        if self.is_classic() && !self.define_mode {
            ensure!(name.len() <= old_name.len(), Error::NotInDefineMode);
        }

        let dim0_name = dim0.map(|d| self.dims[d.0].name.clone());
        let key = match self.find_dim_in(grp, &name) {
            Some(other) if dim0 != Some(other) => {
                let key = format!("{}{}", NON_COORD_PREPEND, name);
                ensure!(key.len() <= MAX_NAME, Error::MaxName);
                self.create_placeholder(other)?;
                key
            }
            _ => name.clone(),
        };

        let created = self.var(grp, varid)?.created;
        if created {
            if let Some(d0) = dim0 {
                self.delete_placeholder(d0)?;
            }
            let hid = self.group_handle(grp)?;
            self.engine.move_link(hid, &old_key, &key)?;
            let later = self.groups[grp.0].vars[varid.0 + 1..]
                .iter()
                .filter(|v| v.created)
                .map(|v| v.storage_key.clone())
                .collect::<Vec<_>>();
            for other in &later {
                self.engine.move_link(hid, other, TEMP_NAME)?;
                self.engine.move_link(hid, TEMP_NAME, other)?;
            }
            log::debug!("moved dataset {:?} to {:?}, cycled {} later datasets", old_key, key, later.len());
        }

        let var = self.var_mut(grp, varid)?;
        var.name = name.clone();
        var.storage_key = key;
        let (dimscale, dataset) = (var.dimscale, var.dataset);

        if let Some(d0) = dim0 {
            let owns_dim0 = self.dims[d0.0].group == grp;
            if dimscale && dim0_name.as_deref() != Some(name.as_str()) {
                if let Some(ds) = dataset {
                    self.detach_scale_everywhere(d0, ds, Some((grp, varid)))?;
                    self.engine.unset_scale(ds)?;
                    self.engine.delete_attr(ds, ATT_DIMID)?;
                }
                self.dims[d0.0].coord_var = None;
                self.var_mut(grp, varid)?.dimscale = false;
                log::debug!("{:?} is no longer a coordinate variable", name);
            } else if !dimscale && owns_dim0 && dim0_name.as_deref() == Some(name.as_str()) {
                self.delete_placeholder(d0)?;
                if let Some(ds) = dataset {
                    self.engine.set_scale(ds, &name)?;
                    self.engine.write_attr(ds, ATT_DIMID, &dimid_attr(d0))?;
                }
                let var = self.var_mut(grp, varid)?;
                var.dimscale = true;
                var.dimscale_attached[0] = false;
                self.dims[d0.0].coord_var = Some(varid);
                log::debug!("{:?} became a coordinate variable", name);
            }
        }
        log::debug!("renamed {} in {} from {:?} to {:?}", varid, grp, old_name, name);
        Ok(())
    }
}
