use super::attr::Att;
use super::file::NcFile;
use super::types::TypeId;
use super::var::Var;
use super::{DimId, GroupId, VarId};
use crate::config::MAX_NAME;
use crate::engine::Hid;
use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub(crate) struct Group {
    pub id: GroupId,
    pub name: String,
    pub parent: Option<GroupId>,
    pub children: Vec<GroupId>,
    pub vars: Vec<Var>,
    pub dims: Vec<DimId>,
    pub types: Vec<TypeId>,
    pub atts: Vec<Att>,
    pub handle: Option<Hid>,
}

impl Group {
    pub fn new(id: GroupId, name: &str, parent: Option<GroupId>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            parent,
            children: Vec::new(),
            vars: Vec::new(),
            dims: Vec::new(),
            types: Vec::new(),
            atts: Vec::new(),
            handle: None,
        }
    }
}

/// Validates an object name, returning it normalized.
pub(crate) fn check_name(name: &str) -> Result<String> {
    ensure!(!name.is_empty(), Error::BadName(name.into()));
    ensure!(!name.contains('/'), Error::BadName(name.into()));
    ensure!(!name.chars().any(char::is_control), Error::BadName(name.into()));
    ensure!(!name.ends_with(' '), Error::BadName(name.into()));
    ensure!(name.len() <= MAX_NAME, Error::MaxName);
    Ok(name.to_owned())
}

impl NcFile {
    pub(crate) fn group(&self, grp: GroupId) -> Result<&Group> {
        self.groups.get(grp.0).ok_or(Error::BadId)
    }

    pub(crate) fn group_mut(&mut self, grp: GroupId) -> Result<&mut Group> {
        self.groups.get_mut(grp.0).ok_or(Error::BadId)
    }

    pub(crate) fn var(&self, grp: GroupId, varid: VarId) -> Result<&Var> {
        self.group(grp)?.vars.get(varid.0).ok_or(Error::NotVar)
    }

    pub(crate) fn var_mut(&mut self, grp: GroupId, varid: VarId) -> Result<&mut Var> {
        self.group_mut(grp)?.vars.get_mut(varid.0).ok_or(Error::NotVar)
    }

    /// Groups from `grp` up to the root.
    pub(crate) fn ancestry(&self, grp: GroupId) -> Vec<GroupId> {
        let mut out = vec![grp];
        let mut cur = grp;
        while let Some(parent) = self.groups.get(cur.0).and_then(|g| g.parent) {
            out.push(parent);
            cur = parent;
        }
        out
    }

    /// `grp` and all groups below it.
    pub(crate) fn subtree(&self, grp: GroupId) -> Vec<GroupId> {
        let mut out = vec![grp];
        let mut i = 0;
        while i < out.len() {
            if let Some(group) = self.groups.get(out[i].0) {
                out.extend(group.children.iter().copied());
            }
            i += 1;
        }
        out
    }

    /// Fails with `NameInUse` if a variable, child group or type in `grp` has this name.
    pub(crate) fn check_name_free(&self, grp: GroupId, name: &str) -> Result<()> {
        let group = self.group(grp)?;
        let taken = group.vars.iter().any(|v| v.name == name)
            || group.children.iter().any(|&g| self.groups[g.0].name == name)
            || group.types.iter().any(|&t| self.types.get(t).map_or(false, |t| t.name == name));
        ensure!(!taken, Error::NameInUse(name.into()));
        Ok(())
    }

    /// Defines a child group.
    pub fn def_grp(&mut self, parent: GroupId, name: &str) -> Result<GroupId> {
        self.group(parent)?;
        self.ensure_define_mode()?;
        ensure!(
            !self.is_classic(),
            Error::InvalidArgument("classic model files cannot hold groups".into())
        );
        let name = check_name(name)?;
        self.check_name_free(parent, &name)?;
        let id = GroupId(self.groups.len());
        self.groups.push(Group::new(id, &name, Some(parent)));
        self.groups[parent.0].children.push(id);
        log::debug!("defined group {:?} in {}", name, parent);
        Ok(id)
    }

    pub fn inq_grpname(&self, grp: GroupId) -> Result<String> {
        Ok(self.group(grp)?.name.clone())
    }

    pub fn inq_grp_parent(&self, grp: GroupId) -> Result<Option<GroupId>> {
        Ok(self.group(grp)?.parent)
    }

    pub fn inq_grps(&self, grp: GroupId) -> Result<Vec<GroupId>> {
        Ok(self.group(grp)?.children.clone())
    }

    /// Child group of `parent` with this name.
    pub fn inq_grp_ncid(&self, parent: GroupId, name: &str) -> Result<GroupId> {
        let group = self.group(parent)?;
        group.children.iter().copied().find(|&g| self.groups[g.0].name == name).ok_or(Error::BadId)
    }

    pub fn inq_varids(&self, grp: GroupId) -> Result<Vec<VarId>> {
        Ok(self.group(grp)?.vars.iter().map(|v| v.id).collect())
    }

    /// Dimensions defined in this group.
    pub fn inq_dimids(&self, grp: GroupId) -> Result<Vec<DimId>> {
        Ok(self.group(grp)?.dims.clone())
    }

    /// User-defined types defined in this group.
    pub fn inq_typeids(&self, grp: GroupId) -> Result<Vec<TypeId>> {
        Ok(self.group(grp)?.types.clone())
    }
}
