use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;

use nc4::{Communicator, GroupId, MemEngine, NcFile, Result};

/// A process group made of threads, for exercising parallel files in one process.
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    shared: Arc<Shared>,
}

struct Shared {
    size: usize,
    barrier: Barrier,
    or: Mutex<bool>,
    max: Mutex<Vec<u64>>,
}

impl ThreadComm {
    pub fn group(size: usize) -> Vec<Self> {
        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            or: Mutex::new(false),
            max: Mutex::new(vec![]),
        });
        (0..size).map(|rank| Self { rank, shared: shared.clone() }).collect()
    }

    pub fn barrier(&self) {
        self.shared.barrier.wait();
    }

    /// Reset, contribute and read steps of one reduction, separated by barriers.
    fn reduce<T>(&self, reset: impl FnOnce(), contribute: impl FnOnce(), read: impl FnOnce() -> T) -> T {
        if self.shared.barrier.wait().is_leader() {
            reset();
        }
        self.shared.barrier.wait();
        contribute();
        self.shared.barrier.wait();
        read()
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn all_reduce_or(&self, value: bool) -> Result<bool> {
        let or = &self.shared.or;
        Ok(self.reduce(|| *or.lock() = false, || *or.lock() |= value, || *or.lock()))
    }

    fn all_reduce_max(&self, values: &mut [u64]) -> Result<()> {
        let max = &self.shared.max;
        let local = values.to_vec();
        let reduced = self.reduce(
            || max.lock().clear(),
            || {
                let mut max = max.lock();
                if max.is_empty() {
                    *max = local;
                } else {
                    for (m, v) in max.iter_mut().zip(local) {
                        *m = (*m).max(v);
                    }
                }
            },
            || max.lock().clone(),
        );
        values.copy_from_slice(&reduced);
        Ok(())
    }
}

/// Runs `f` on `size` threads, each with its own parallel file over the same shared engine.
pub fn run_parallel<F, T>(engine: &MemEngine, size: usize, f: F) -> Vec<T>
where
    F: Fn(&mut NcFile, GroupId, &ThreadComm) -> T + Send + Sync + 'static,
    T: Send + 'static,
{
    let f = Arc::new(f);
    let handles = ThreadComm::group(size)
        .into_iter()
        .map(|comm| {
            let (engine, f) = (engine.clone(), f.clone());
            thread::spawn(move || {
                let mut file =
                    NcFile::with_options().parallel(comm.clone()).create(engine).unwrap();
                let root = file.root();
                let out = f(&mut file, root, &comm);
                comm.barrier();
                file.close().unwrap();
                out
            })
        })
        .collect::<Vec<_>>();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

pub fn new_file() -> (MemEngine, NcFile) {
    let engine = MemEngine::new();
    let file = NcFile::create(engine.clone()).unwrap();
    (engine, file)
}
