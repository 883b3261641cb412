use nc4_types::{convert, Data, NcType, NcValue};

use super::file::NcFile;
use super::group::check_name;
use super::types::TypeId;
use super::{GroupId, VarId};
use crate::config::{ATT_FILL_VALUE, RESERVED_ATT_NAMES};
use crate::engine::Hid;
use crate::error::{Error, Result};

/// A named attribute of a group or variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Att {
    pub name: String,
    pub type_id: TypeId,
    pub data: Data,
    /// Not yet written to storage in its current form.
    pub(crate) dirty: bool,
    /// A version of the attribute exists in storage.
    pub(crate) stored: bool,
}

impl NcFile {
    fn atts(&self, grp: GroupId, varid: Option<VarId>) -> Result<&Vec<Att>> {
        Ok(match varid {
            Some(varid) => &self.var(grp, varid)?.atts,
            None => &self.group(grp)?.atts,
        })
    }

    fn atts_mut(&mut self, grp: GroupId, varid: Option<VarId>) -> Result<&mut Vec<Att>> {
        Ok(match varid {
            Some(varid) => &mut self.var_mut(grp, varid)?.atts,
            None => &mut self.group_mut(grp)?.atts,
        })
    }

    fn att_location(&self, grp: GroupId, varid: Option<VarId>) -> Result<Option<Hid>> {
        Ok(match varid {
            Some(varid) => self.var(grp, varid)?.dataset,
            None => self.group(grp)?.handle,
        })
    }

    /// Sets an attribute of a variable, or of the group itself if `varid` is `None`.
    ///
    /// `_FillValue` also sets the variable's fill value: it must hold exactly one value of
    /// the variable's type, and cannot change once data has been written.
    pub fn put_att(
        &mut self, grp: GroupId, varid: Option<VarId>, name: &str, type_id: TypeId, data: &Data,
    ) -> Result<()> {
        self.check_writable()?;
        let existing = self.atts(grp, varid)?.iter().find(|a| a.name == name).cloned();
        let name = check_name(name)?;
        ensure!(!RESERVED_ATT_NAMES.contains(&name.as_str()), Error::NameInUse(name));
        let ty = self.types.get(type_id)?;
        ensure!(data.element_size() == ty.element_size(), Error::BadType);
        if self.is_classic() {
            ensure!(
                type_id.atomic().map_or(false, is_classic_type),
                Error::InvalidArgument(format!("{} is not a classic model type", type_id))
            );
        }

        let is_fill = varid.is_some() && name == ATT_FILL_VALUE;
        match existing {
            Some(ref att) if !is_fill => {
                if !self.define_mode && self.is_classic() {
                    ensure!(data.len() <= att.data.len(), Error::NotInDefineMode);
                }
            }
            _ => self.ensure_define_mode()?,
        }

        if let (true, Some(varid)) = (is_fill, varid) {
            let var = self.var(grp, varid)?;
            ensure!(!var.written_to, Error::LateFill);
            ensure!(
                data.len() == 1,
                Error::InvalidArgument(format!("{} must hold one value", ATT_FILL_VALUE))
            );
            ensure!(var.type_id == type_id, Error::BadType);
            let var = self.var_mut(grp, varid)?;
            var.fill_value = Some(data.clone());
            if var.created {
                var.fill_changed = true;
            }
        }

        let atts = self.atts_mut(grp, varid)?;
        let att = Att { name, type_id, data: data.clone(), dirty: true, stored: false };
        match atts.iter().position(|a| a.name == att.name) {
            Some(i) => atts[i] = Att { stored: atts[i].stored, ..att },
            None => atts.push(att),
        }
        Ok(())
    }

    pub fn put_att_values<T: NcValue>(
        &mut self, grp: GroupId, varid: Option<VarId>, name: &str, values: &[T],
    ) -> Result<()> {
        self.put_att(grp, varid, name, T::NC_TYPE.into(), &T::encode(values))
    }

    pub fn put_att_text(
        &mut self, grp: GroupId, varid: Option<VarId>, name: &str, text: &str,
    ) -> Result<()> {
        let data = Data::fixed(1, text.as_bytes().to_vec());
        self.put_att(grp, varid, name, NcType::Char.into(), &data)
    }

    pub fn get_att(&self, grp: GroupId, varid: Option<VarId>, name: &str) -> Result<(TypeId, Data)> {
        let atts = self.atts(grp, varid)?;
        let att = atts.iter().find(|a| a.name == name).ok_or(Error::NotAtt)?;
        Ok((att.type_id, att.data.clone()))
    }

    /// Reads a numeric or string attribute, converting it to `T`.
    pub fn get_att_values<T: NcValue>(
        &self, grp: GroupId, varid: Option<VarId>, name: &str,
    ) -> Result<Vec<T>> {
        let (type_id, data) = self.get_att(grp, varid, name)?;
        let from = type_id.atomic().ok_or(Error::BadType)?;
        let converted = convert(&data, from, T::NC_TYPE)?;
        ensure!(!converted.range_error, Error::Range);
        Ok(T::decode(&converted.data)?)
    }

    pub fn get_att_text(&self, grp: GroupId, varid: Option<VarId>, name: &str) -> Result<String> {
        let (type_id, data) = self.get_att(grp, varid, name)?;
        ensure!(type_id == NcType::Char.into(), Error::Char);
        let bytes = data.as_bytes().ok_or(Error::Char)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| "attribute text is not valid UTF-8".into())
    }

    pub fn inq_attnames(&self, grp: GroupId, varid: Option<VarId>) -> Result<Vec<String>> {
        Ok(self.atts(grp, varid)?.iter().map(|a| a.name.clone()).collect())
    }

    pub fn del_att(&mut self, grp: GroupId, varid: Option<VarId>, name: &str) -> Result<()> {
        self.check_writable()?;
        let idx = self.atts(grp, varid)?.iter().position(|a| a.name == name).ok_or(Error::NotAtt)?;
        self.ensure_define_mode()?;
        if let (Some(varid), true) = (varid, name == ATT_FILL_VALUE) {
            let var = self.var_mut(grp, varid)?;
            ensure!(!var.written_to, Error::LateFill);
            var.fill_value = None;
            if var.created {
                var.fill_changed = true;
            }
        }
        let att = self.atts_mut(grp, varid)?.remove(idx);
        if att.stored {
            if let Some(loc) = self.att_location(grp, varid)? {
                self.engine.delete_attr(loc, name)?;
            }
        }
        Ok(())
    }
}

/// Types a classic model file can hold.
pub(crate) fn is_classic_type(ty: NcType) -> bool {
    matches!(
        ty,
        NcType::Byte | NcType::Char | NcType::Short | NcType::Int | NcType::Float | NcType::Double
    )
}
