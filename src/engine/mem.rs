//! An in-memory storage engine.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use nc4_types::{Data, TypeClass, TypeDescriptor};

use super::{Attribute, DatasetInfo, Hid, LinkInfo, LinkKind, StorageEngine};
use crate::config::MAX_COMPACT_SIZE;
use crate::error::{Error, Result};
use crate::hl::extents::{Extents, Ix};
use crate::hl::filters::Filter;
use crate::hl::plist::{DatasetAccess, DatasetCreate, FillTime, Layout, Transfer};
use crate::hl::selection::{Hyperslab, Selection};

macro_rules! storage_err {
    ($($arg:tt)*) => (Error::Storage(format!($($arg)*)))
}

/// Per-dataset transfer counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub reads: usize,
    pub writes: usize,
    pub collective_reads: usize,
    pub collective_writes: usize,
    /// Collective transfers that selected no elements.
    pub empty_collective: usize,
}

/// A copy of a stored dataset's state, for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSnapshot {
    pub dtype: TypeDescriptor,
    pub extents: Extents,
    pub create: DatasetCreate,
    pub scale: Option<String>,
    pub scales: Vec<(usize, String)>,
    pub attrs: Vec<String>,
    pub stats: TransferStats,
}

#[derive(Clone, Debug)]
struct Link {
    name: String,
    obj: usize,
    order: u64,
}

#[derive(Clone, Debug, Default)]
struct GroupNode {
    links: Vec<Link>,
    attrs: Vec<(String, Attribute)>,
    types: Vec<(String, TypeDescriptor)>,
}

#[derive(Clone, Debug)]
struct DatasetNode {
    name: String,
    dtype: TypeDescriptor,
    extents: Extents,
    create: DatasetCreate,
    data: Data,
    attrs: Vec<(String, Attribute)>,
    scale: Option<String>,
    attached: Vec<(usize, usize)>,
    stats: TransferStats,
}

#[derive(Clone, Debug)]
enum Node {
    Group(GroupNode),
    Dataset(DatasetNode),
}

#[derive(Clone, Debug)]
enum Handle {
    Group(usize),
    Dataset(usize, DatasetAccess),
}

#[derive(Debug)]
struct Store {
    shared: bool,
    objects: Vec<Option<Node>>,
    handles: BTreeMap<u64, Handle>,
    next_hid: u64,
    next_order: u64,
    filters: BTreeSet<u32>,
}

const ROOT: usize = 0;

/// Storage engine keeping every group and dataset in memory.
///
/// Clones share the same storage. In shared mode, structural calls that several
/// cooperating processes repeat with identical arguments resolve to the object the
/// first call created instead of failing.
#[derive(Clone, Debug)]
pub struct MemEngine {
    inner: Arc<Mutex<Store>>,
}

impl Default for MemEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn element_size(dtype: &TypeDescriptor) -> Option<usize> {
    if dtype.is_var_len() {
        None
    } else {
        Some(dtype.size())
    }
}

/// Word size to byte-swap elements of `dtype` by, if it is a numeric type.
fn swap_word(dtype: &TypeDescriptor) -> Option<usize> {
    match dtype.class() {
        TypeClass::Integer | TypeClass::Float | TypeClass::Enum => Some(dtype.size()),
        _ => None,
    }
}

impl DatasetNode {
    fn to_storage(&self, data: &Data) -> Data {
        let mut data = data.clone();
        if self.create.endianness().is_swapped() {
            if let Some(word) = swap_word(&self.dtype) {
                data.swap_bytes(word);
            }
        }
        data
    }

    fn from_storage(&self, data: Data) -> Data {
        self.to_storage(&data)
    }

    fn fill_element(&self) -> Data {
        match (self.create.fill_time(), self.create.fill_value()) {
            (FillTime::Never, _) | (_, None) => Data::zeroed(element_size(&self.dtype), 1),
            (_, Some(value)) => self.to_storage(value),
        }
    }
}

impl Store {
    fn node(&self, obj: usize) -> Result<&Node> {
        self.objects.get(obj).and_then(Option::as_ref).ok_or_else(|| storage_err!("stale object"))
    }

    fn node_mut(&mut self, obj: usize) -> Result<&mut Node> {
        self.objects
            .get_mut(obj)
            .and_then(Option::as_mut)
            .ok_or_else(|| storage_err!("stale object"))
    }

    fn group(&self, obj: usize) -> Result<&GroupNode> {
        match self.node(obj)? {
            Node::Group(g) => Ok(g),
            Node::Dataset(_) => Err(storage_err!("object is not a group")),
        }
    }

    fn group_mut(&mut self, obj: usize) -> Result<&mut GroupNode> {
        match self.node_mut(obj)? {
            Node::Group(g) => Ok(g),
            Node::Dataset(_) => Err(storage_err!("object is not a group")),
        }
    }

    fn dataset(&self, obj: usize) -> Result<&DatasetNode> {
        match self.node(obj)? {
            Node::Dataset(d) => Ok(d),
            Node::Group(_) => Err(storage_err!("object is not a dataset")),
        }
    }

    fn dataset_mut(&mut self, obj: usize) -> Result<&mut DatasetNode> {
        match self.node_mut(obj)? {
            Node::Dataset(d) => Ok(d),
            Node::Group(_) => Err(storage_err!("object is not a dataset")),
        }
    }

    fn handle(&self, id: Hid) -> Result<&Handle> {
        self.handles.get(&id.0).ok_or_else(|| storage_err!("invalid handle: {}", id))
    }

    fn group_obj(&self, id: Hid) -> Result<usize> {
        match self.handle(id)? {
            Handle::Group(obj) => Ok(*obj),
            Handle::Dataset(..) => Err(storage_err!("handle {} is not a group", id)),
        }
    }

    fn dataset_obj(&self, id: Hid) -> Result<usize> {
        match self.handle(id)? {
            Handle::Dataset(obj, _) => Ok(*obj),
            Handle::Group(_) => Err(storage_err!("handle {} is not a dataset", id)),
        }
    }

    fn any_obj(&self, id: Hid) -> Result<usize> {
        match self.handle(id)? {
            Handle::Group(obj) | Handle::Dataset(obj, _) => Ok(*obj),
        }
    }

    fn new_handle(&mut self, handle: Handle) -> Hid {
        let hid = self.next_hid;
        self.next_hid += 1;
        self.handles.insert(hid, handle);
        Hid(hid)
    }

    fn lookup(&self, group: usize, name: &str) -> Result<Option<usize>> {
        Ok(self.group(group)?.links.iter().find(|l| l.name == name).map(|l| l.obj))
    }

    fn add_link(&mut self, group: usize, name: &str, node: Node) -> Result<usize> {
        ensure!(!name.is_empty() && !name.contains('/'), storage_err!("invalid link name: {:?}", name));
        let obj = self.objects.len();
        self.objects.push(Some(node));
        let order = self.next_order;
        self.next_order += 1;
        self.group_mut(group)?.links.push(Link { name: name.to_owned(), obj, order });
        Ok(obj)
    }

    fn attrs_mut(&mut self, obj: usize) -> Result<&mut Vec<(String, Attribute)>> {
        Ok(match self.node_mut(obj)? {
            Node::Group(g) => &mut g.attrs,
            Node::Dataset(d) => &mut d.attrs,
        })
    }

    fn attrs(&self, obj: usize) -> Result<&Vec<(String, Attribute)>> {
        Ok(match self.node(obj)? {
            Node::Group(g) => &g.attrs,
            Node::Dataset(d) => &d.attrs,
        })
    }

    fn forget_references(&mut self, target: usize) {
        for node in self.objects.iter_mut().flatten() {
            if let Node::Dataset(d) = node {
                d.attached.retain(|&(_, scale)| scale != target);
            }
        }
    }

    fn scale_names(&self, d: &DatasetNode) -> Vec<(usize, String)> {
        d.attached
            .iter()
            .filter_map(|&(idx, scale)| Some((idx, self.dataset(scale).ok()?.name.clone())))
            .collect()
    }

    fn resolve(&self, path: &str) -> Option<usize> {
        let mut obj = ROOT;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            obj = self.lookup(obj, part).ok()??;
        }
        Some(obj)
    }
}

impl MemEngine {
    /// Creates an empty engine holding only the root group.
    pub fn new() -> Self {
        let mut handles = BTreeMap::new();
        handles.insert(0, Handle::Group(ROOT));
        let store = Store {
            shared: false,
            objects: vec![Some(Node::Group(GroupNode::default()))],
            handles,
            next_hid: 1,
            next_order: 0,
            filters: BTreeSet::new(),
        };
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    /// Creates an empty engine to be shared by cooperating processes.
    pub fn shared() -> Self {
        let engine = Self::new();
        engine.inner.lock().shared = true;
        engine
    }

    /// Makes a third-party filter available to datasets.
    pub fn register_filter(&self, id: u32) {
        self.inner.lock().filters.insert(id);
    }

    /// Link names of the group at `path`, in creation order.
    pub fn link_names(&self, path: &str) -> Option<Vec<String>> {
        let store = self.inner.lock();
        let group = store.group(store.resolve(path)?).ok()?;
        let mut links = group.links.clone();
        links.sort_by_key(|l| l.order);
        Some(links.into_iter().map(|l| l.name).collect())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.inner.lock().resolve(path).is_some()
    }

    /// State of the dataset at `path`.
    pub fn snapshot(&self, path: &str) -> Option<DatasetSnapshot> {
        let store = self.inner.lock();
        let d = store.dataset(store.resolve(path)?).ok()?;
        Some(DatasetSnapshot {
            dtype: d.dtype.clone(),
            extents: d.extents.clone(),
            create: d.create.clone(),
            scale: d.scale.clone(),
            scales: store.scale_names(d),
            attrs: d.attrs.iter().map(|(name, _)| name.clone()).collect(),
            stats: d.stats,
        })
    }

    pub fn transfer_stats(&self, path: &str) -> Option<TransferStats> {
        self.snapshot(path).map(|s| s.stats)
    }

    /// Number of handles currently open, the root group excluded.
    pub fn open_handles(&self) -> usize {
        self.inner.lock().handles.len() - 1
    }
}

impl StorageEngine for MemEngine {
    fn root(&self) -> Hid {
        Hid(0)
    }

    fn create_group(&self, parent: Hid, name: &str) -> Result<Hid> {
        let mut store = self.inner.lock();
        let parent = store.group_obj(parent)?;
        let obj = match store.lookup(parent, name)? {
            Some(obj) if store.shared && store.group(obj).is_ok() => obj,
            Some(_) => fail!(storage_err!("link already exists: {:?}", name)),
            None => store.add_link(parent, name, Node::Group(GroupNode::default()))?,
        };
        log::trace!("group {:?} created", name);
        Ok(store.new_handle(Handle::Group(obj)))
    }

    fn open_group(&self, parent: Hid, name: &str) -> Result<Hid> {
        let mut store = self.inner.lock();
        let parent = store.group_obj(parent)?;
        let obj = store.lookup(parent, name)?.ok_or_else(|| storage_err!("no such link: {:?}", name))?;
        store.group(obj)?;
        Ok(store.new_handle(Handle::Group(obj)))
    }

    fn links(&self, group: Hid) -> Result<Vec<LinkInfo>> {
        let store = self.inner.lock();
        let mut links = store.group(store.group_obj(group)?)?.links.clone();
        links.sort_by_key(|l| l.order);
        links
            .into_iter()
            .map(|l| -> Result<LinkInfo> {
                let kind = match store.node(l.obj)? {
                    Node::Group(_) => LinkKind::Group,
                    Node::Dataset(_) => LinkKind::Dataset,
                };
                Ok(LinkInfo { name: l.name, kind })
            })
            .collect()
    }

    fn unlink(&self, group: Hid, name: &str) -> Result<()> {
        let mut store = self.inner.lock();
        let group = store.group_obj(group)?;
        let shared = store.shared;
        let links = &mut store.group_mut(group)?.links;
        match links.iter().position(|l| l.name == name) {
            Some(pos) => {
                let obj = links.remove(pos).obj;
                store.objects[obj] = None;
                store.forget_references(obj);
                Ok(())
            }
            None if shared => Ok(()),
            None => Err(storage_err!("no such link: {:?}", name)),
        }
    }

    fn move_link(&self, group: Hid, from: &str, to: &str) -> Result<()> {
        let mut store = self.inner.lock();
        let group = store.group_obj(group)?;
        let from_obj = store.lookup(group, from)?;
        let to_obj = store.lookup(group, to)?;
        let obj = match (from_obj, to_obj) {
            (Some(_), Some(_)) if from != to => fail!(storage_err!("link already exists: {:?}", to)),
            (None, Some(_)) if store.shared => return Ok(()),
            (None, _) => fail!(storage_err!("no such link: {:?}", from)),
            (Some(obj), _) => obj,
        };
        let order = store.next_order;
        store.next_order += 1;
        let links = &mut store.group_mut(group)?.links;
        links.retain(|l| l.obj != obj);
        links.push(Link { name: to.to_owned(), obj, order });
        if let Ok(d) = store.dataset_mut(obj) {
            d.name = to.to_owned();
        }
        Ok(())
    }

    fn commit_type(&self, group: Hid, name: &str, dtype: &TypeDescriptor) -> Result<()> {
        let mut store = self.inner.lock();
        let shared = store.shared;
        let group = store.group_obj(group)?;
        let types = &mut store.group_mut(group)?.types;
        match types.iter().find(|(n, _)| n == name) {
            Some((_, existing)) if shared && existing == dtype => Ok(()),
            Some(_) => Err(storage_err!("type already committed: {:?}", name)),
            None => {
                types.push((name.to_owned(), dtype.clone()));
                Ok(())
            }
        }
    }

    fn committed_types(&self, group: Hid) -> Result<Vec<(String, TypeDescriptor)>> {
        let store = self.inner.lock();
        Ok(store.group(store.group_obj(group)?)?.types.clone())
    }

    fn create_dataset(
        &self, group: Hid, name: &str, dtype: &TypeDescriptor, extents: &Extents,
        dcpl: &DatasetCreate, dapl: &DatasetAccess,
    ) -> Result<Hid> {
        let mut store = self.inner.lock();
        let group = store.group_obj(group)?;
        if let Some(obj) = store.lookup(group, name)? {
            let reuse = match store.dataset(obj) {
                Ok(d) => store.shared && &d.dtype == dtype && d.extents.ndim() == extents.ndim(),
                Err(_) => false,
            };
            ensure!(reuse, storage_err!("link already exists: {:?}", name));
            return Ok(store.new_handle(Handle::Dataset(obj, dapl.clone())));
        }
        ensure!(extents.is_valid(), storage_err!("invalid extents: {}", extents));
        match dcpl.layout() {
            Layout::Chunked => {
                ensure!(!extents.is_scalar(), storage_err!("scalar datasets cannot be chunked"));
                let chunk = dcpl.chunk().unwrap_or_default();
                ensure!(
                    chunk.len() == extents.ndim(),
                    storage_err!("chunk rank {} does not match dataset rank {}", chunk.len(), extents.ndim())
                );
            }
            layout => {
                ensure!(
                    !extents.is_unlimited(),
                    storage_err!("{:?} layout cannot have unlimited dimensions", layout)
                );
            }
        }
        if dcpl.layout() == Layout::Compact {
            let size = extents.size() * dtype.size();
            ensure!(size <= MAX_COMPACT_SIZE, storage_err!("compact dataset too large: {} bytes", size));
        }
        for filter in dcpl.filters() {
            let id = filter.id();
            ensure!(
                Filter::is_builtin(id) || store.filters.contains(&id),
                storage_err!("filter not available: {}", id)
            );
        }
        if let Some(value) = dcpl.fill_value() {
            ensure!(
                value.element_size() == element_size(dtype),
                storage_err!("fill value does not match type {}", dtype)
            );
        }
        let mut node = DatasetNode {
            name: name.to_owned(),
            dtype: dtype.clone(),
            extents: extents.clone(),
            create: dcpl.clone(),
            data: Data::zeroed(element_size(dtype), 0),
            attrs: Vec::new(),
            scale: None,
            attached: Vec::new(),
            stats: TransferStats::default(),
        };
        node.data = Data::repeat(&node.fill_element(), extents.size());
        let obj = store.add_link(group, name, Node::Dataset(node))?;
        log::trace!("dataset {:?} created with extents {}", name, extents);
        Ok(store.new_handle(Handle::Dataset(obj, dapl.clone())))
    }

    fn open_dataset(&self, group: Hid, name: &str, dapl: &DatasetAccess) -> Result<Hid> {
        let mut store = self.inner.lock();
        let group = store.group_obj(group)?;
        let obj = store.lookup(group, name)?.ok_or_else(|| storage_err!("no such link: {:?}", name))?;
        store.dataset(obj)?;
        Ok(store.new_handle(Handle::Dataset(obj, dapl.clone())))
    }

    fn close(&self, id: Hid) -> Result<()> {
        ensure!(id != self.root(), storage_err!("the root group cannot be closed"));
        let mut store = self.inner.lock();
        store.handles.remove(&id.0).map(|_| ()).ok_or_else(|| storage_err!("invalid handle: {}", id))
    }

    fn dataset_info(&self, dataset: Hid) -> Result<DatasetInfo> {
        let store = self.inner.lock();
        let (obj, access) = match store.handle(dataset)? {
            Handle::Dataset(obj, access) => (*obj, access.clone()),
            Handle::Group(_) => fail!(storage_err!("handle {} is not a dataset", dataset)),
        };
        let d = store.dataset(obj)?;
        Ok(DatasetInfo {
            dtype: d.dtype.clone(),
            extents: d.extents.clone(),
            create: d.create.clone(),
            access,
        })
    }

    fn set_extent(&self, dataset: Hid, dims: &[Ix]) -> Result<()> {
        let mut store = self.inner.lock();
        let obj = store.dataset_obj(dataset)?;
        let d = store.dataset_mut(obj)?;
        let old = match &d.extents {
            Extents::Simple(extents) => extents.clone(),
            Extents::Scalar => fail!(storage_err!("cannot resize a scalar dataset")),
        };
        ensure!(d.create.layout() == Layout::Chunked, storage_err!("only chunked datasets can be resized"));
        let new = old
            .resized(dims)
            .ok_or_else(|| storage_err!("cannot resize {} to {:?}", old, dims))?;
        if new == old {
            return Ok(());
        }
        let mut data = Data::repeat(&d.fill_element(), new.size());
        let common: Vec<Ix> = old.dims().iter().zip(dims).map(|(&a, &b)| a.min(b)).collect();
        let keep = Hyperslab::new(&vec![0; common.len()], &common, None);
        for (src, dst) in keep.offsets(&old.dims()).into_iter().zip(keep.offsets(dims)) {
            data.copy_element(dst, &d.data, src);
        }
        log::trace!("dataset {:?} resized from {} to {}", d.name, old, new);
        d.data = data;
        d.extents = Extents::Simple(new);
        Ok(())
    }

    fn write(
        &self, dataset: Hid, selection: &Selection, data: &Data, xfer: Transfer,
    ) -> Result<()> {
        let mut store = self.inner.lock();
        let obj = store.dataset_obj(dataset)?;
        let d = store.dataset_mut(obj)?;
        let dims = d.extents.dims();
        if let Selection::Hyperslab(hyper) = selection {
            ensure!(hyper.is_within(&dims), storage_err!("selection {} outside {}", hyper, d.extents));
        }
        let offsets = selection.offsets(&dims);
        ensure!(
            offsets.len() == data.len(),
            storage_err!("selection of {} elements, buffer of {}", offsets.len(), data.len())
        );
        ensure!(
            offsets.is_empty() || data.element_size() == element_size(&d.dtype),
            storage_err!("buffer does not hold {} elements", d.dtype)
        );
        let data = d.to_storage(data);
        for (i, offset) in offsets.into_iter().enumerate() {
            d.data.copy_element(offset, &data, i);
        }
        d.stats.writes += 1;
        if xfer.is_collective() {
            d.stats.collective_writes += 1;
            if data.is_empty() {
                d.stats.empty_collective += 1;
            }
        }
        Ok(())
    }

    fn read(&self, dataset: Hid, selection: &Selection, xfer: Transfer) -> Result<Data> {
        let mut store = self.inner.lock();
        let obj = store.dataset_obj(dataset)?;
        let d = store.dataset_mut(obj)?;
        let dims = d.extents.dims();
        if let Selection::Hyperslab(hyper) = selection {
            ensure!(hyper.is_within(&dims), storage_err!("selection {} outside {}", hyper, d.extents));
        }
        let offsets = selection.offsets(&dims);
        let mut out = Data::zeroed(element_size(&d.dtype), offsets.len());
        for (i, &offset) in offsets.iter().enumerate() {
            out.copy_element(i, &d.data, offset);
        }
        d.stats.reads += 1;
        if xfer.is_collective() {
            d.stats.collective_reads += 1;
            if offsets.is_empty() {
                d.stats.empty_collective += 1;
            }
        }
        Ok(d.from_storage(out))
    }

    fn write_attr(&self, loc: Hid, name: &str, attr: &Attribute) -> Result<()> {
        let mut store = self.inner.lock();
        let obj = store.any_obj(loc)?;
        let attrs = store.attrs_mut(obj)?;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = attr.clone(),
            None => attrs.push((name.to_owned(), attr.clone())),
        }
        Ok(())
    }

    fn read_attr(&self, loc: Hid, name: &str) -> Result<Option<Attribute>> {
        let store = self.inner.lock();
        let obj = store.any_obj(loc)?;
        Ok(store.attrs(obj)?.iter().find(|(n, _)| n == name).map(|(_, a)| a.clone()))
    }

    fn attr_names(&self, loc: Hid) -> Result<Vec<String>> {
        let store = self.inner.lock();
        let obj = store.any_obj(loc)?;
        Ok(store.attrs(obj)?.iter().map(|(n, _)| n.clone()).collect())
    }

    fn delete_attr(&self, loc: Hid, name: &str) -> Result<()> {
        let mut store = self.inner.lock();
        let shared = store.shared;
        let obj = store.any_obj(loc)?;
        let attrs = store.attrs_mut(obj)?;
        let len = attrs.len();
        attrs.retain(|(n, _)| n != name);
        ensure!(attrs.len() < len || shared, storage_err!("no such attribute: {:?}", name));
        Ok(())
    }

    fn set_scale(&self, dataset: Hid, name: &str) -> Result<()> {
        let mut store = self.inner.lock();
        let obj = store.dataset_obj(dataset)?;
        let d = store.dataset_mut(obj)?;
        ensure!(d.attached.is_empty(), storage_err!("a dataset with attached scales cannot be a scale"));
        d.scale = Some(name.to_owned());
        Ok(())
    }

    fn unset_scale(&self, dataset: Hid) -> Result<()> {
        let mut store = self.inner.lock();
        let obj = store.dataset_obj(dataset)?;
        store.dataset_mut(obj)?.scale = None;
        store.forget_references(obj);
        Ok(())
    }

    fn scale_name(&self, dataset: Hid) -> Result<Option<String>> {
        let store = self.inner.lock();
        Ok(store.dataset(store.dataset_obj(dataset)?)?.scale.clone())
    }

    fn attach_scale(&self, dataset: Hid, scale: Hid, idx: usize) -> Result<()> {
        let mut store = self.inner.lock();
        let obj = store.dataset_obj(dataset)?;
        let scale = store.dataset_obj(scale)?;
        ensure!(obj != scale, storage_err!("a dataset cannot be its own scale"));
        ensure!(store.dataset(scale)?.scale.is_some(), storage_err!("dataset is not a scale"));
        let d = store.dataset_mut(obj)?;
        ensure!(idx < d.extents.ndim(), storage_err!("no axis {} to attach a scale to", idx));
        if !d.attached.contains(&(idx, scale)) {
            d.attached.push((idx, scale));
        }
        Ok(())
    }

    fn detach_scale(&self, dataset: Hid, scale: Hid, idx: usize) -> Result<()> {
        let mut store = self.inner.lock();
        let shared = store.shared;
        let obj = store.dataset_obj(dataset)?;
        let scale = store.dataset_obj(scale)?;
        let d = store.dataset_mut(obj)?;
        let len = d.attached.len();
        d.attached.retain(|&a| a != (idx, scale));
        ensure!(d.attached.len() < len || shared, storage_err!("scale not attached to axis {}", idx));
        Ok(())
    }

    fn attached_scales(&self, dataset: Hid) -> Result<Vec<(usize, String)>> {
        let store = self.inner.lock();
        let d = store.dataset(store.dataset_obj(dataset)?)?;
        Ok(store.scale_names(d))
    }

    fn filter_available(&self, id: u32) -> bool {
        Filter::is_builtin(id) || self.inner.lock().filters.contains(&id)
    }
}
