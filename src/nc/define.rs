//! Defining variables and user-defined types.

use nc4_types::{CompoundType, EnumMember, EnumType, NcType, TypeDescriptor};

use super::attr::is_classic_type;
use super::file::NcFile;
use super::group::check_name;
use super::types::TypeId;
use super::var::Var;
use super::{DimId, GroupId, VarId};
use crate::config::{MAX_NAME, MAX_RANK, MAX_VAR_DIMS, NON_COORD_PREPEND};
use crate::error::{Error, Result};
use crate::hl::plist::Layout;

impl NcFile {
    /// Defines a variable of type `type_id` along `dimids` (outermost first).
    ///
    /// A variable named after its first dimension, defined in the dimension's group,
    /// becomes that dimension's coordinate variable.
    pub fn def_var(
        &mut self, grp: GroupId, name: &str, type_id: TypeId, dimids: &[DimId],
    ) -> Result<VarId> {
        self.group(grp)?;
        self.ensure_define_mode()?;
        let name = check_name(name)?;

        let ty = self.types.get(type_id)?;
        if self.is_classic() {
            ensure!(
                ty.atomic_type().map_or(false, is_classic_type),
                Error::InvalidArgument(format!("{} is not a classic model type", ty.name))
            );
        }
        let max = MAX_RANK.min(MAX_VAR_DIMS);
        ensure!(dimids.len() <= max, Error::MaxDims { ndims: dimids.len(), max });
        self.check_name_free(grp, &name)?;

        for (i, &d) in dimids.iter().enumerate() {
            ensure!(self.dim_visible(grp, d), Error::BadDim);
            if self.is_classic() && i > 0 {
                ensure!(!self.dims[d.0].unlimited, Error::UnlimitedPosition);
            }
        }

        let varid = VarId(self.group(grp)?.vars.len());
        let mut var = Var::new(varid, &name, type_id, dimids);
        var.storage = if dimids.iter().any(|&d| self.dims[d.0].unlimited) {
            Layout::Chunked
        } else {
            Layout::Contiguous
        };
        var.cache = self.default_cache();
        var.no_fill = self.default_no_fill();
        var.access = self.default_access;

        // secret storage name while a dimension of this group, other than our first, holds it
        if let Some(other) = self.find_dim_in(grp, &name) {
            if dimids.first() != Some(&other) {
                var.storage_key = format!("{}{}", NON_COORD_PREPEND, name);
                ensure!(var.storage_key.len() <= MAX_NAME, Error::MaxName);
            }
        }

        let coord_of = dimids.first().copied().filter(|&d0| {
            let dim = &self.dims[d0.0];
            dim.group == grp && dim.name == name
        });
        if let Some(d0) = coord_of {
            var.dimscale = true;
            self.delete_placeholder(d0)?;
            self.dims[d0.0].coord_var = Some(varid);
        }

        self.group_mut(grp)?.vars.push(var);
        if !dimids.is_empty() {
            self.find_default_chunksizes(grp, varid)?;
        }
        self.adjust_var_cache(grp, varid)?;
        log::debug!(
            "defined {} {:?} in {} ({}{} dims)",
            varid,
            name,
            grp,
            dimids.len(),
            if coord_of.is_some() { ", coordinate" } else { "" }
        );
        Ok(varid)
    }

    fn def_type(&mut self, grp: GroupId, name: &str, descriptor: TypeDescriptor) -> Result<TypeId> {
        self.group(grp)?;
        self.ensure_define_mode()?;
        ensure!(
            !self.is_classic(),
            Error::InvalidArgument("classic model files cannot hold user-defined types".into())
        );
        let name = check_name(name)?;
        self.check_name_free(grp, &name)?;
        let id = self.types.add(&name, descriptor, grp);
        self.group_mut(grp)?.types.push(id);
        log::debug!("defined type {:?} in {}", name, grp);
        Ok(id)
    }

    /// Defines a compound type with fields laid out back to back.
    pub fn def_compound(
        &mut self, grp: GroupId, name: &str, fields: &[(&str, TypeId)],
    ) -> Result<TypeId> {
        ensure!(!fields.is_empty(), Error::InvalidArgument("compound type without fields".into()));
        let mut members = Vec::with_capacity(fields.len());
        for &(field, ty) in fields {
            let field = check_name(field)?;
            ensure!(
                !members.iter().any(|(n, _)| n == &field),
                Error::NameInUse(field)
            );
            members.push((field, self.types.get(ty)?.descriptor));
        }
        self.def_type(grp, name, TypeDescriptor::Compound(CompoundType::packed(members)))
    }

    /// Defines an opaque type of `size` bytes.
    pub fn def_opaque(&mut self, grp: GroupId, name: &str, size: usize) -> Result<TypeId> {
        ensure!(size > 0, Error::InvalidArgument("opaque type of zero size".into()));
        self.def_type(grp, name, TypeDescriptor::Opaque(size))
    }

    /// Defines a variable-length sequence of `base` elements.
    pub fn def_vlen(&mut self, grp: GroupId, name: &str, base: TypeId) -> Result<TypeId> {
        let base = self.types.get(base)?.descriptor;
        self.def_type(grp, name, TypeDescriptor::VarLen(Box::new(base)))
    }

    /// Defines an enumeration over an integer type.
    pub fn def_enum(
        &mut self, grp: GroupId, name: &str, base: NcType, members: &[(&str, i64)],
    ) -> Result<TypeId> {
        ensure!(
            matches!(base.descriptor(), TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_)),
            Error::BadType
        );
        let mut out: Vec<EnumMember> = Vec::with_capacity(members.len());
        for &(member, value) in members {
            let member = check_name(member)?;
            ensure!(!out.iter().any(|m| m.name == member), Error::NameInUse(member));
            out.push(EnumMember { name: member, value });
        }
        self.def_type(grp, name, TypeDescriptor::Enum(EnumType { base, members: out }))
    }

    /// Looks up a type by id.
    pub fn inq_type(&self, type_id: TypeId) -> Result<super::TypeInfo> {
        self.types.get(type_id)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::engine::MemEngine;

    #[test]
    pub fn test_def_var() {
        let mut file = NcFile::create(MemEngine::new()).unwrap();
        let root = file.root();
        let t = file.def_unlimited_dim(root, "time").unwrap();
        let x = file.def_dim(root, "x", 10).unwrap();
        let v = file.def_var(root, "v", NcType::Float.into(), &[t, x]).unwrap();
        let s = file.def_var(root, "s", NcType::Int.into(), &[]).unwrap();
        assert_eq!((v, s), (VarId(0), VarId(1)));
        let info = file.inq_var(root, v).unwrap();
        assert_eq!(info.storage, Layout::Chunked);
        assert_eq!(info.chunksizes, Some(vec![1, 10]));
        assert!(!info.is_coord);
        assert_eq!(file.inq_var(root, s).unwrap().storage, Layout::Contiguous);
        assert_eq!(file.inq_varid(root, "s").unwrap(), s);

        assert_eq!(file.def_var(root, "v", NcType::Int.into(), &[]), Err(Error::NameInUse("v".into())));
        assert_eq!(file.def_var(root, "w", TypeId(99), &[]), Err(Error::BadType));
        assert_eq!(file.def_var(root, "w", NcType::Int.into(), &[DimId(5)]), Err(Error::BadDim));
        let many = vec![x; MAX_RANK + 1];
        assert_eq!(
            file.def_var(root, "w", NcType::Int.into(), &many),
            Err(Error::MaxDims { ndims: MAX_RANK + 1, max: MAX_RANK })
        );
    }

    #[test]
    pub fn test_coordinate_detection() {
        let mut file = NcFile::create(MemEngine::new()).unwrap();
        let root = file.root();
        let x = file.def_dim(root, "x", 4).unwrap();
        let y = file.def_dim(root, "y", 4).unwrap();
        let xv = file.def_var(root, "x", NcType::Double.into(), &[x]).unwrap();
        assert!(file.inq_var(root, xv).unwrap().is_coord);
        assert_eq!(file.dims[x.0].coord_var, Some(xv));
        assert_eq!(file.var(root, xv).unwrap().storage_key, "x");

        // same name as a dimension it does not start with
        let yv = file.def_var(root, "y", NcType::Double.into(), &[x]).unwrap();
        assert!(!file.inq_var(root, yv).unwrap().is_coord);
        assert_eq!(file.var(root, yv).unwrap().storage_key, "_nc4_non_coord_y");
        assert_eq!(file.dims[y.0].coord_var, None);

        // dimension of a parent group
        let child = file.def_grp(root, "child").unwrap();
        let cx = file.def_var(child, "x", NcType::Double.into(), &[x]).unwrap();
        assert!(!file.inq_var(child, cx).unwrap().is_coord);
    }

    #[test]
    pub fn test_classic_def_var() {
        let mut file = NcFile::with_options().classic_model(true).create(MemEngine::new()).unwrap();
        let root = file.root();
        let t = file.def_unlimited_dim(root, "t").unwrap();
        let x = file.def_dim(root, "x", 2).unwrap();
        assert_eq!(file.def_var(root, "v", NcType::Int.into(), &[x, t]), Err(Error::UnlimitedPosition));
        assert!(matches!(
            file.def_var(root, "v", NcType::UInt.into(), &[t]),
            Err(Error::InvalidArgument(_))
        ));
        file.def_var(root, "v", NcType::Int.into(), &[t, x]).unwrap();
        file.enddef().unwrap();
        assert_eq!(file.def_var(root, "w", NcType::Int.into(), &[]), Err(Error::NotInDefineMode));
    }

    #[test]
    pub fn test_user_types() {
        let mut file = NcFile::create(MemEngine::new()).unwrap();
        let root = file.root();
        let pair = file
            .def_compound(root, "pair", &[("a", NcType::Short.into()), ("b", NcType::Double.into())])
            .unwrap();
        assert_eq!(file.inq_type(pair).unwrap().size(), 10);
        let blob = file.def_opaque(root, "blob", 16).unwrap();
        let seq = file.def_vlen(root, "seq", NcType::Int.into()).unwrap();
        let color = file.def_enum(root, "color", NcType::UByte, &[("red", 0), ("blue", 1)]).unwrap();
        assert_eq!(file.inq_typeids(root).unwrap(), vec![pair, blob, seq, color]);
        assert_eq!(file.def_opaque(root, "blob", 4), Err(Error::NameInUse("blob".into())));
        assert_eq!(
            file.def_enum(root, "e", NcType::Float, &[("a", 0)]),
            Err(Error::BadType)
        );
        assert_eq!(
            file.def_compound(root, "c", &[("a", NcType::Int.into()), ("a", NcType::Int.into())]),
            Err(Error::NameInUse("a".into()))
        );
        assert_eq!(file.def_var(root, "pair", NcType::Int.into(), &[]), Err(Error::NameInUse("pair".into())));
    }
}
