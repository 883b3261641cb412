use nc4_types::{default_fill, Data};

use super::attr::Att;
use super::file::NcFile;
use super::types::{TypeId, TypeInfo};
use super::{DimId, GroupId, VarId};
use crate::engine::Hid;
use crate::error::{Error, Result};
use crate::hl::filters::{pipeline_order, Filter};
use crate::hl::plist::{ChunkCache, Endianness, Layout, Transfer};

#[derive(Clone, Debug)]
pub(crate) struct Var {
    pub id: VarId,
    pub name: String,
    /// Link name of the dataset; differs from `name` while a dimension of the group holds it.
    pub storage_key: String,
    pub type_id: TypeId,
    pub dimids: Vec<DimId>,
    /// Chunk shape; empty until chosen or estimated.
    pub chunksizes: Vec<usize>,
    pub storage: Layout,
    pub filters: Vec<Filter>,
    pub cache: ChunkCache,
    pub no_fill: bool,
    pub fill_value: Option<Data>,
    pub endianness: Endianness,
    /// The variable is the coordinate variable of its first dimension.
    pub dimscale: bool,
    /// Per axis: the dimension's scale is attached to the dataset.
    pub dimscale_attached: Vec<bool>,
    pub created: bool,
    pub written_to: bool,
    pub fill_changed: bool,
    pub access: Transfer,
    pub atts: Vec<Att>,
    pub dataset: Option<Hid>,
}

impl Var {
    pub fn new(id: VarId, name: &str, type_id: TypeId, dimids: &[DimId]) -> Self {
        Self {
            id,
            name: name.to_owned(),
            storage_key: name.to_owned(),
            type_id,
            dimids: dimids.to_vec(),
            chunksizes: Vec::new(),
            storage: Layout::Contiguous,
            filters: Vec::new(),
            cache: ChunkCache::default(),
            no_fill: false,
            fill_value: None,
            endianness: Endianness::Native,
            dimscale: false,
            dimscale_attached: vec![false; dimids.len()],
            created: false,
            written_to: false,
            fill_changed: false,
            access: Transfer::Independent,
            atts: Vec::new(),
            dataset: None,
        }
    }

    pub fn ndims(&self) -> usize {
        self.dimids.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.dimids.is_empty()
    }

    /// The value unwritten elements read as.
    pub fn fill(&self, ty: &TypeInfo) -> Data {
        if let Some(ref value) = self.fill_value {
            return value.clone();
        }
        match ty.atomic_type() {
            Some(atomic) => default_fill(atomic),
            None => Data::zeroed(ty.element_size(), 1),
        }
    }
}

/// Everything there is to know about a variable.
#[derive(Clone, Debug, PartialEq)]
pub struct VarInfo {
    pub name: String,
    pub type_id: TypeId,
    pub dimids: Vec<DimId>,
    pub storage: Layout,
    /// Chunk shape of chunked variables.
    pub chunksizes: Option<Vec<usize>>,
    pub shuffle: bool,
    pub deflate: Option<u8>,
    pub fletcher32: bool,
    /// The whole filter pipeline, in application order.
    pub filters: Vec<Filter>,
    pub no_fill: bool,
    pub fill_value: Data,
    pub endianness: Endianness,
    pub cache: ChunkCache,
    /// The variable is the coordinate variable of its first dimension.
    pub is_coord: bool,
    pub natts: usize,
}

impl NcFile {
    pub fn inq_varid(&self, grp: GroupId, name: &str) -> Result<VarId> {
        let group = self.group(grp)?;
        group.vars.iter().find(|v| v.name == name).map(|v| v.id).ok_or(Error::NotVar)
    }

    pub fn inq_var(&self, grp: GroupId, varid: VarId) -> Result<VarInfo> {
        let var = self.var(grp, varid)?;
        let ty = self.types.get(var.type_id)?;
        let deflate = var.filters.iter().find_map(|f| match f {
            Filter::Deflate(level) => Some(*level),
            _ => None,
        });
        Ok(VarInfo {
            name: var.name.clone(),
            type_id: var.type_id,
            dimids: var.dimids.clone(),
            storage: var.storage,
            chunksizes: match var.storage {
                Layout::Chunked => Some(var.chunksizes.clone()),
                _ => None,
            },
            shuffle: var.filters.contains(&Filter::Shuffle),
            deflate,
            fletcher32: var.filters.contains(&Filter::Fletcher32),
            filters: pipeline_order(&var.filters),
            no_fill: var.no_fill,
            fill_value: var.fill(&ty),
            endianness: var.endianness,
            cache: var.cache,
            is_coord: var.dimscale,
            natts: var.atts.len(),
        })
    }

    pub fn inq_varname(&self, grp: GroupId, varid: VarId) -> Result<String> {
        Ok(self.var(grp, varid)?.name.clone())
    }

    /// Current shape of a variable, from the lengths of its dimensions.
    pub fn var_shape(&self, grp: GroupId, varid: VarId) -> Result<Vec<usize>> {
        let var = self.var(grp, varid)?;
        var.dimids.iter().map(|&d| self.dim_len(d)).collect()
    }
}

#[cfg(test)]
pub mod tests {
    use nc4_types::{NcType, NcValue};

    use super::*;

    #[test]
    pub fn test_var_fill() {
        let types = crate::nc::TypeRegistry::default();
        let mut var = Var::new(VarId(0), "v", NcType::Short.into(), &[DimId(0)]);
        let ty = types.get(var.type_id).unwrap();
        assert_eq!(i16::decode(&var.fill(&ty)).unwrap(), vec![-32767]);
        var.fill_value = Some(i16::encode(&[7]));
        assert_eq!(i16::decode(&var.fill(&ty)).unwrap(), vec![7]);
        assert_eq!(var.storage_key, "v");
        assert_eq!(var.dimscale_attached, vec![false]);
        assert!(!var.is_scalar());
    }
}
