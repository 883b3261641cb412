//! The netCDF-4 variable layer: an in-memory model of groups, dimensions, types and
//! variables that is materialized into a storage engine.

use std::fmt::{self, Display};

pub mod attr;
pub mod chunking;
pub mod define;
pub mod dim;
pub mod file;
pub mod group;
pub mod io;
pub mod materialize;
pub mod open;
pub mod parallel;
pub mod properties;
pub mod rename;
pub mod types;
pub mod var;

pub use self::attr::Att;
pub use self::dim::DimInfo;
pub use self::file::{FileBuilder, Mode, NcFile};
pub use self::parallel::{Communicator, SelfComm};
pub use self::properties::VarSettings;
pub use self::types::{TypeId, TypeInfo, TypeRegistry};
pub use self::var::VarInfo;

/// Identifies a group; the root group is always `GroupId::ROOT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

impl GroupId {
    pub const ROOT: Self = Self(0);
}

/// Identifies a variable within its group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Identifies a dimension; ids are unique across the whole file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimId(pub usize);

impl Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "group #{}", self.0)
    }
}

impl Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "var #{}", self.0)
    }
}

impl Display for DimId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "dim #{}", self.0)
    }
}
