use nc4::config::{CHUNK_CACHE_NELEMS, CHUNK_CACHE_PREEMPTION, CHUNK_CACHE_SIZE, MAX_DEFAULT_CACHE_SIZE};
use nc4::plist::{ChunkCache, Layout};
use nc4::types::NcType;
use nc4::{chunk_cache, set_chunk_cache, MemEngine, NcFile};

#[macro_use]
mod common;

use self::common::util::new_file;

// The process-wide default is shared by every test in this binary, so it is all
// exercised from a single test.
#[test]
pub fn test_chunk_cache_settings() {
    let defaults = (CHUNK_CACHE_SIZE, CHUNK_CACHE_NELEMS, CHUNK_CACHE_PREEMPTION);
    let cache = chunk_cache();
    assert_eq!((cache.nbytes, cache.nslots, cache.w0), defaults);

    // large chunks grow a default-sized cache
    let (_, mut file) = new_file();
    let root = file.root();
    let y = file.def_dim(root, "y", 4096).unwrap();
    let x = file.def_dim(root, "x", 4096).unwrap();
    let small = file.def_var(root, "small", NcType::Double.into(), &[y, x]).unwrap();
    let big = file.def_var(root, "big", NcType::Double.into(), &[y, x]).unwrap();
    file.def_var_chunking(root, small, Layout::Chunked, Some(&[16, 16])).unwrap();
    file.def_var_chunking(root, big, Layout::Chunked, Some(&[2048, 2048])).unwrap();
    assert_eq!(file.get_var_chunk_cache(root, small).unwrap(), defaults);
    assert_eq!(file.get_var_chunk_cache(root, big).unwrap().0, MAX_DEFAULT_CACHE_SIZE);

    // explicit caches are kept as they are
    file.set_var_chunk_cache(root, small, 1 << 20, 101, 0.25).unwrap();
    file.enddef().unwrap();
    assert_eq!(file.get_var_chunk_cache(root, small).unwrap(), (1 << 20, 101, 0.25));
    assert_err!(file.set_var_chunk_cache(root, small, 1, 1, 1.5), "preemption");
    file.set_var_chunk_cache(root, big, 8 << 20, 11, 1.0).unwrap();
    assert_eq!(file.get_var_chunk_cache(root, big).unwrap(), (8 << 20, 11, 1.0));

    // the process-wide default applies to variables defined afterwards
    assert_err!(set_chunk_cache(1 << 10, 3, -0.1), "preemption");
    assert_eq!(chunk_cache(), ChunkCache { nbytes: defaults.0, nslots: defaults.1, w0: defaults.2 });
    set_chunk_cache(32 << 20, 1009, 0.5).unwrap();
    let later = file.def_var(root, "later", NcType::Int.into(), &[x]).unwrap();
    assert_eq!(file.get_var_chunk_cache(root, later).unwrap(), (32 << 20, 1009, 0.5));
    assert_eq!(file.get_var_chunk_cache(root, small).unwrap(), (1 << 20, 101, 0.25));

    // a per-file cache wins over the process-wide one
    let mut other = NcFile::with_options().chunk_cache(4 << 20, 7, 0.0).create(MemEngine::new()).unwrap();
    let root = other.root();
    let v = other.def_var(root, "v", NcType::Int.into(), &[]).unwrap();
    assert_eq!(other.get_var_chunk_cache(root, v).unwrap(), (4 << 20, 7, 0.0));
    assert_err!(NcFile::with_options().chunk_cache(1, 1, 2.0).create(MemEngine::new()), "preemption");

    // read-only files may still tune their caches
    let engine = MemEngine::new();
    let mut file = NcFile::create(engine.clone()).unwrap();
    let root = file.root();
    let x = file.def_dim(root, "x", 3).unwrap();
    file.def_var(root, "v", NcType::Int.into(), &[x]).unwrap();
    file.close().unwrap();
    let mut file = NcFile::open(engine).unwrap();
    let root = file.root();
    let v = file.inq_varid(root, "v").unwrap();
    assert_eq!(file.get_var_chunk_cache(root, v).unwrap(), (32 << 20, 1009, 0.5));
    file.set_var_chunk_cache(root, v, 1 << 16, 13, 0.9).unwrap();
    assert_eq!(file.get_var_chunk_cache(root, v).unwrap(), (1 << 16, 13, 0.9));

    set_chunk_cache(defaults.0, defaults.1, defaults.2).unwrap();
}
