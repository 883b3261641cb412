//! The per-file type registry.

use std::fmt::{self, Display};

use nc4_types::{NcType, TypeClass, TypeDescriptor};

use super::GroupId;
use crate::error::{Error, Result};

/// Ids below this one name the atomic types.
pub const FIRST_USER_TYPE_ID: i32 = 32;

/// Identifies an atomic or user-defined type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub i32);

impl From<NcType> for TypeId {
    fn from(ty: NcType) -> Self {
        Self(ty.id())
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match NcType::from_id(self.0) {
            Some(ty) => write!(f, "{}", ty),
            None => write!(f, "type #{}", self.0),
        }
    }
}

impl TypeId {
    pub fn atomic(self) -> Option<NcType> {
        NcType::from_id(self.0)
    }

    pub fn is_user_defined(self) -> bool {
        self.0 >= FIRST_USER_TYPE_ID
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: String,
    pub descriptor: TypeDescriptor,
    /// Group a user-defined type was defined in.
    pub group: Option<GroupId>,
    pub(crate) committed: bool,
}

impl TypeInfo {
    fn atomic(ty: NcType) -> Self {
        Self {
            id: ty.into(),
            name: ty.name().to_owned(),
            descriptor: ty.descriptor(),
            group: None,
            committed: true,
        }
    }

    pub fn atomic_type(&self) -> Option<NcType> {
        self.id.atomic()
    }

    /// Size of one element in a transfer buffer; handle size for variable-length types.
    pub fn size(&self) -> usize {
        self.descriptor.size()
    }

    pub fn class(&self) -> TypeClass {
        self.descriptor.class()
    }

    /// Element size of buffers of this type, `None` if elements are individually owned.
    pub fn element_size(&self) -> Option<usize> {
        if self.descriptor.is_var_len() {
            None
        } else {
            Some(self.size())
        }
    }

    /// Integer and floating-point atomic types.
    pub fn is_numeric(&self) -> bool {
        self.atomic_type().map_or(false, NcType::is_numeric)
    }
}

#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    user: Vec<TypeInfo>,
}

impl TypeRegistry {
    pub fn get(&self, id: TypeId) -> Result<TypeInfo> {
        if let Some(ty) = id.atomic() {
            return Ok(TypeInfo::atomic(ty));
        }
        let idx = (id.0 - FIRST_USER_TYPE_ID) as usize;
        if id.is_user_defined() {
            if let Some(info) = self.user.get(idx) {
                return Ok(info.clone());
            }
        }
        Err(Error::BadType)
    }

    pub fn add(&mut self, name: &str, descriptor: TypeDescriptor, group: GroupId) -> TypeId {
        let id = TypeId(FIRST_USER_TYPE_ID + self.user.len() as i32);
        self.user.push(TypeInfo {
            id,
            name: name.to_owned(),
            descriptor,
            group: Some(group),
            committed: false,
        });
        id
    }

    /// The type a stored descriptor denotes: the atomic type, or the first user type
    /// laid out the same way.
    pub fn find(&self, descriptor: &TypeDescriptor) -> Option<TypeId> {
        NcType::from_descriptor(descriptor)
            .map(TypeId::from)
            .or_else(|| self.user.iter().find(|t| &t.descriptor == descriptor).map(|t| t.id))
    }

    pub(crate) fn uncommitted(&self, group: GroupId) -> Vec<TypeId> {
        self.user.iter().filter(|t| t.group == Some(group) && !t.committed).map(|t| t.id).collect()
    }

    pub(crate) fn mark_committed(&mut self, id: TypeId) {
        if let Some(info) = self.user.iter_mut().find(|t| t.id == id) {
            info.committed = true;
        }
    }
}
