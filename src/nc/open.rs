//! Rebuilding the in-memory model of an existing file from its storage.

use nc4_types::NcValue;

use super::attr::Att;
use super::dim::Dim;
use super::file::{Mode, NcFile};
use super::group::Group;
use super::var::Var;
use super::{DimId, GroupId, VarId};
use crate::config::{
    ATT_COORDINATES, ATT_DIMID, ATT_NC3_STRICT, DIM_WITHOUT_VARIABLE, NON_COORD_PREPEND,
    RESERVED_ATT_NAMES,
};
use crate::engine::{Hid, LinkKind};
use crate::error::{Error, Result};
use crate::hl::plist::{DatasetAccess, FillTime};

impl NcFile {
    pub(crate) fn load(&mut self) -> Result<()> {
        let root = self.engine.root();
        if self.engine.read_attr(root, ATT_NC3_STRICT)?.is_some() {
            self.mode.insert(Mode::CLASSIC_MODEL);
        }
        let mut group = Group::new(GroupId::ROOT, "/", None);
        group.handle = Some(root);
        self.groups.push(group);

        let mut found = Vec::new();
        self.load_group(GroupId::ROOT, &mut found)?;
        self.place_dims(found)?;

        for d in 0..self.dims.len() {
            if self.dims[d].unlimited {
                self.dims[d].len = self.dim_len(DimId(d))?;
            }
        }
        for g in 0..self.groups.len() {
            for v in 0..self.groups[g].vars.len() {
                self.adjust_var_cache(GroupId(g), VarId(v))?;
            }
        }
        self.define_mode = false;
        log::debug!("opened {:?}", self);
        Ok(())
    }

    fn load_group(&mut self, grp: GroupId, found: &mut Vec<Dim>) -> Result<()> {
        let hid = self.group(grp)?.handle.ok_or_else(|| Error::from("group is not open"))?;
        for (name, descriptor) in self.engine.committed_types(hid)? {
            let id = self.types.add(&name, descriptor, grp);
            self.types.mark_committed(id);
            self.groups[grp.0].types.push(id);
        }
        self.groups[grp.0].atts = self.load_atts(hid)?;

        for link in self.engine.links(hid)? {
            match link.kind {
                LinkKind::Group => {
                    let child = GroupId(self.groups.len());
                    let mut group = Group::new(child, &link.name, Some(grp));
                    group.handle = Some(self.engine.open_group(hid, &link.name)?);
                    self.groups.push(group);
                    self.groups[grp.0].children.push(child);
                    self.load_group(child, found)?;
                }
                LinkKind::Dataset => self.load_dataset(grp, hid, &link.name, found)?,
            }
        }
        Ok(())
    }

    fn load_atts(&self, loc: Hid) -> Result<Vec<Att>> {
        let mut atts = Vec::new();
        for name in self.engine.attr_names(loc)? {
            if RESERVED_ATT_NAMES.contains(&name.as_str()) {
                continue;
            }
            let attr = match self.engine.read_attr(loc, &name)? {
                Some(attr) => attr,
                None => continue,
            };
            let type_id = self.types.find(&attr.dtype).ok_or(Error::BadType)?;
            atts.push(Att { name, type_id, data: attr.data, dirty: false, stored: true });
        }
        Ok(atts)
    }

    fn read_dimid(&self, ds: Hid, key: &str) -> Result<DimId> {
        let attr = self.engine.read_attr(ds, ATT_DIMID)?;
        let ids = match attr {
            Some(attr) => i32::decode(&attr.data)?,
            None => Vec::new(),
        };
        match ids.first() {
            Some(&id) if id >= 0 => Ok(DimId(id as usize)),
            _ => fail!("dimension dataset {:?} has no valid {}", key, ATT_DIMID),
        }
    }

    fn load_dataset(
        &mut self, grp: GroupId, hid: Hid, key: &str, found: &mut Vec<Dim>,
    ) -> Result<()> {
        let dapl = DatasetAccess::with_cache(self.default_cache());
        let ds = self.engine.open_dataset(hid, key, &dapl)?;
        let info = self.engine.dataset_info(ds)?;
        let extent = info.extents.dims();
        let varid = VarId(self.groups[grp.0].vars.len());

        let scale = self.engine.scale_name(ds)?;
        let own_dim = match scale {
            Some(ref scale) => {
                let id = self.read_dimid(ds, key)?;
                let mut dim = Dim {
                    id,
                    name: key.to_owned(),
                    len: extent.first().copied().unwrap_or(0),
                    unlimited: info.extents.is_unlimited(),
                    group: grp,
                    coord_var: Some(varid),
                    placeholder: None,
                    placeholder_len: 0,
                };
                self.groups[grp.0].dims.push(id);
                if scale.starts_with(DIM_WITHOUT_VARIABLE) {
                    dim.coord_var = None;
                    dim.placeholder = Some(ds);
                    dim.placeholder_len = dim.len;
                    log::trace!("found dimension {:?} without variable", key);
                    found.push(dim);
                    return Ok(());
                }
                found.push(dim);
                Some(id)
            }
            None => None,
        };

        let name = key.strip_prefix(NON_COORD_PREPEND).unwrap_or(key);
        let dimids = match (self.engine.read_attr(ds, ATT_COORDINATES)?, own_dim) {
            (Some(attr), _) => {
                i32::decode(&attr.data)?.into_iter().map(|d| DimId(d as usize)).collect()
            }
            (None, Some(id)) => vec![id],
            (None, None) if info.extents.is_scalar() => Vec::new(),
            (None, None) => fail!("dataset {:?} does not record its dimensions", key),
        };
        ensure!(
            dimids.len() == extent.len(),
            "dataset {:?} has {} axes but {} dimensions",
            key,
            extent.len(),
            dimids.len()
        );

        let type_id = self.types.find(&info.dtype).ok_or(Error::BadType)?;
        let mut var = Var::new(varid, name, type_id, &dimids);
        var.storage_key = key.to_owned();
        var.storage = info.create.layout();
        var.chunksizes = info.create.chunk().map(<[usize]>::to_vec).unwrap_or_default();
        var.filters = info.create.filters().to_vec();
        var.no_fill = info.create.fill_time() == FillTime::Never;
        var.fill_value = info.create.fill_value().cloned();
        var.endianness = info.create.endianness();
        var.cache = info.access.chunk_cache();
        var.dimscale = own_dim.is_some();
        for (idx, _) in self.engine.attached_scales(ds)? {
            if let Some(attached) = var.dimscale_attached.get_mut(idx) {
                *attached = true;
            }
        }
        var.created = true;
        var.written_to = true;
        var.access = self.default_access;
        var.atts = self.load_atts(ds)?;
        var.dataset = Some(ds);
        log::trace!("found {} {:?} ({} dims)", varid, name, dimids.len());
        self.groups[grp.0].vars.push(var);
        Ok(())
    }

    /// Puts the dimensions found in storage at the index their id names.
    fn place_dims(&mut self, found: Vec<Dim>) -> Result<()> {
        let n = found.iter().map(|d| d.id.0 + 1).max().unwrap_or(0);
        let mut slots: Vec<Option<Dim>> = vec![None; n];
        for dim in found {
            let idx = dim.id.0;
            ensure!(slots[idx].is_none(), "dimension id {} is stored twice", idx);
            slots[idx] = Some(dim);
        }
        self.dims = slots
            .into_iter()
            .enumerate()
            .map(|(i, dim)| dim.ok_or_else(|| Error::from(format!("dimension id {} is missing", i))))
            .collect::<Result<_>>()?;
        for group in self.groups.iter_mut() {
            group.dims.sort();
            for var in &group.vars {
                ensure!(
                    var.dimids.iter().all(|d| d.0 < n),
                    "variable {:?} refers to an unknown dimension",
                    var.name
                );
            }
        }
        Ok(())
    }
}
