use std::fmt::{self, Debug};
use std::sync::Arc;

use bitflags::bitflags;

use super::dim::Dim;
use super::group::Group;
use super::parallel::Communicator;
use super::types::TypeRegistry;
use super::GroupId;
use crate::config::{self, ATT_NC3_STRICT};
use crate::engine::{Attribute, StorageEngine};
use crate::error::{Error, Result};
use crate::hl::plist::{ChunkCache, Transfer};

use nc4_types::{NcType, NcValue};

bitflags! {
    /// How a file was created or opened.
    pub struct Mode: u32 {
        const WRITE = 0x0001;
        /// Restrict the data model to what classic netCDF files can hold.
        const CLASSIC_MODEL = 0x0100;
        /// New variables are not prefilled.
        const NOFILL = 0x0200;
    }
}

/// An open netCDF-4 file.
pub struct NcFile {
    pub(crate) engine: Arc<dyn StorageEngine>,
    pub(crate) mode: Mode,
    pub(crate) define_mode: bool,
    pub(crate) comm: Option<Arc<dyn Communicator>>,
    pub(crate) default_access: Transfer,
    pub(crate) cache: Option<ChunkCache>,
    pub(crate) groups: Vec<Group>,
    pub(crate) dims: Vec<Dim>,
    pub(crate) types: TypeRegistry,
}

impl Debug for NcFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mode = if self.is_read_only() { "read-only" } else { "read/write" };
        write!(
            f,
            "<netCDF-4 file: {} groups, {} dims ({}{})>",
            self.groups.len(),
            self.dims.len(),
            mode,
            if self.is_classic() { ", classic model" } else { "" }
        )
    }
}

impl NcFile {
    /// Creates a new file on an empty storage engine, in define mode.
    pub fn create<E: StorageEngine + 'static>(engine: E) -> Result<Self> {
        FileBuilder::new().create(engine)
    }

    /// Opens an existing file read-only.
    pub fn open<E: StorageEngine + 'static>(engine: E) -> Result<Self> {
        FileBuilder::new().open(engine)
    }

    /// Opens an existing file for reading and writing.
    pub fn open_rw<E: StorageEngine + 'static>(engine: E) -> Result<Self> {
        FileBuilder::new().open_rw(engine)
    }

    pub fn with_options() -> FileBuilder {
        FileBuilder::new()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_read_only(&self) -> bool {
        !self.mode.contains(Mode::WRITE)
    }

    pub fn is_classic(&self) -> bool {
        self.mode.contains(Mode::CLASSIC_MODEL)
    }

    pub fn is_parallel(&self) -> bool {
        self.comm.is_some()
    }

    pub fn is_define_mode(&self) -> bool {
        self.define_mode
    }

    pub fn root(&self) -> GroupId {
        GroupId::ROOT
    }

    pub fn set_fill(&mut self, fill: bool) -> Result<Mode> {
        self.check_writable()?;
        let old = self.mode;
        self.mode.set(Mode::NOFILL, !fill);
        Ok(old)
    }

    /// Leaves define mode, creating everything defined since the last call.
    pub fn enddef(&mut self) -> Result<()> {
        ensure!(self.define_mode, Error::NotInDefineMode);
        self.write_metadata()?;
        self.define_mode = false;
        log::debug!("left define mode");
        Ok(())
    }

    pub fn redef(&mut self) -> Result<()> {
        self.check_writable()?;
        ensure!(!self.define_mode, Error::InDefineMode);
        self.define_mode = true;
        log::debug!("entered define mode");
        Ok(())
    }

    /// Brings the storage engine up to date with every pending definition.
    pub fn sync(&mut self) -> Result<()> {
        if self.is_read_only() {
            return Ok(());
        }
        if self.define_mode {
            ensure!(!self.is_classic(), Error::InDefineMode);
            return self.enddef();
        }
        self.write_metadata()
    }

    /// Writes out any pending definitions and releases every storage handle.
    pub fn close(mut self) -> Result<()> {
        if !self.is_read_only() {
            self.write_metadata()?;
            self.define_mode = false;
        }
        self.release()
    }

    /// Fails with `Permission` for files opened read-only.
    pub(crate) fn check_writable(&self) -> Result<()> {
        ensure!(!self.is_read_only(), Error::Permission);
        Ok(())
    }

    /// Makes sure the file is in define mode, entering it where the data model allows.
    pub(crate) fn ensure_define_mode(&mut self) -> Result<()> {
        self.check_writable()?;
        if !self.define_mode {
            ensure!(!self.is_classic(), Error::NotInDefineMode);
            self.redef()?;
        }
        Ok(())
    }

    /// Makes sure the file is in data mode, leaving define mode where the data model allows.
    pub(crate) fn ensure_data_mode(&mut self) -> Result<()> {
        if self.define_mode {
            ensure!(!self.is_classic(), Error::InDefineMode);
            self.enddef()?;
        }
        Ok(())
    }

    /// Chunk cache new variables start with.
    pub(crate) fn default_cache(&self) -> ChunkCache {
        self.cache.unwrap_or_else(config::chunk_cache)
    }

    pub(crate) fn default_no_fill(&self) -> bool {
        self.mode.contains(Mode::NOFILL)
    }

    fn release(&mut self) -> Result<()> {
        let mut result = Ok(());
        let mut keep = |res: Result<()>| {
            if result.is_ok() {
                result = res;
            }
        };
        for group in self.groups.iter_mut() {
            for var in group.vars.iter_mut() {
                if let Some(ds) = var.dataset.take() {
                    keep(self.engine.close(ds));
                }
            }
        }
        for dim in self.dims.iter_mut() {
            if let Some(ds) = dim.placeholder.take() {
                keep(self.engine.close(ds));
            }
        }
        let root = self.engine.root();
        for group in self.groups.iter_mut() {
            if let Some(hid) = group.handle.take() {
                if hid != root {
                    keep(self.engine.close(hid));
                }
            }
        }
        result
    }
}

impl Drop for NcFile {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::debug!("failed to release storage handles: {}", err);
        }
    }
}

/// Options for creating or opening a file.
#[derive(Clone)]
pub struct FileBuilder {
    classic: bool,
    fill: bool,
    comm: Option<Arc<dyn Communicator>>,
    access: Transfer,
    cache: Option<ChunkCache>,
}

impl Default for FileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for FileBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FileBuilder")
            .field("classic", &self.classic)
            .field("fill", &self.fill)
            .field("parallel", &self.comm.is_some())
            .field("access", &self.access)
            .field("cache", &self.cache)
            .finish()
    }
}

impl FileBuilder {
    pub fn new() -> Self {
        Self { classic: false, fill: true, comm: None, access: Transfer::default(), cache: None }
    }

    /// Restricts the file to the classic data model.
    pub fn classic_model(&mut self, classic: bool) -> &mut Self {
        self.classic = classic;
        self
    }

    /// Whether new variables are prefilled with their fill value.
    pub fn fill(&mut self, fill: bool) -> &mut Self {
        self.fill = fill;
        self
    }

    /// Opens the file for parallel access by every process in `comm`.
    pub fn parallel<C: Communicator + 'static>(&mut self, comm: C) -> &mut Self {
        self.comm = Some(Arc::new(comm));
        self
    }

    pub fn parallel_shared(&mut self, comm: Arc<dyn Communicator>) -> &mut Self {
        self.comm = Some(comm);
        self
    }

    /// Transfer mode new variables start with in parallel files.
    pub fn access(&mut self, access: Transfer) -> &mut Self {
        self.access = access;
        self
    }

    /// Chunk cache for this file's variables, instead of the process-wide default.
    pub fn chunk_cache(&mut self, size: usize, nelems: usize, preemption: f64) -> &mut Self {
        self.cache = Some(ChunkCache { nbytes: size, nslots: nelems, w0: preemption });
        self
    }

    fn check(&self) -> Result<()> {
        if let Some(cache) = self.cache {
            ensure!(
                (0.0..=1.0).contains(&cache.w0),
                Error::InvalidArgument(format!("preemption must be within [0, 1]: {}", cache.w0))
            );
        }
        Ok(())
    }

    fn file(&self, engine: Arc<dyn StorageEngine>, mode: Mode, define_mode: bool) -> NcFile {
        NcFile {
            engine,
            mode,
            define_mode,
            comm: self.comm.clone(),
            default_access: self.access,
            cache: self.cache,
            groups: Vec::new(),
            dims: Vec::new(),
            types: TypeRegistry::default(),
        }
    }

    pub fn create<E: StorageEngine + 'static>(&self, engine: E) -> Result<NcFile> {
        self.check()?;
        let mut mode = Mode::WRITE;
        mode.set(Mode::CLASSIC_MODEL, self.classic);
        mode.set(Mode::NOFILL, !self.fill);
        let engine: Arc<dyn StorageEngine> = Arc::new(engine);
        let root = engine.root();
        if self.classic {
            let attr = Attribute { dtype: NcType::Int.descriptor(), data: i32::encode(&[1]) };
            engine.write_attr(root, ATT_NC3_STRICT, &attr)?;
        }
        let mut file = self.file(engine, mode, true);
        file.groups.push(Group::new(GroupId::ROOT, "/", None));
        file.groups[0].handle = Some(root);
        log::debug!("created {:?}", file);
        Ok(file)
    }

    pub fn open<E: StorageEngine + 'static>(&self, engine: E) -> Result<NcFile> {
        self.check()?;
        let mut file = self.file(Arc::new(engine), Mode::empty(), false);
        file.load()?;
        Ok(file)
    }

    pub fn open_rw<E: StorageEngine + 'static>(&self, engine: E) -> Result<NcFile> {
        self.check()?;
        let mut file = self.file(Arc::new(engine), Mode::WRITE, false);
        file.load()?;
        Ok(file)
    }
}
