//! Cooperation between processes sharing one file.

use super::file::NcFile;
use super::{GroupId, VarId};
use crate::error::{Error, Result};
use crate::hl::plist::Transfer;

/// The collective operations parallel files need from the process group.
///
/// Every process of the group must make the same sequence of collective calls.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Logical OR of `value` over all processes.
    fn all_reduce_or(&self, value: bool) -> Result<bool>;

    /// Element-wise maximum of `values` over all processes, in place.
    fn all_reduce_max(&self, values: &mut [u64]) -> Result<()>;
}

/// A group of one process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelfComm;

impl Communicator for SelfComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_or(&self, value: bool) -> Result<bool> {
        Ok(value)
    }

    fn all_reduce_max(&self, _values: &mut [u64]) -> Result<()> {
        Ok(())
    }
}

impl NcFile {
    /// Sets whether transfers on a variable are collective or independent.
    pub fn var_par_access(&mut self, grp: GroupId, varid: VarId, access: Transfer) -> Result<()> {
        self.var(grp, varid)?;
        ensure!(
            self.is_parallel(),
            Error::InvalidArgument("file is not opened for parallel access".into())
        );
        self.var_mut(grp, varid)?.access = access;
        log::debug!("{} in {} set to {:?} access", varid, grp, access);
        Ok(())
    }

    /// Reduces "some process needs this" over the process group of a parallel file.
    pub(crate) fn any_process(&self, value: bool) -> Result<bool> {
        match self.comm {
            Some(ref comm) => comm.all_reduce_or(value),
            None => Ok(value),
        }
    }

    pub(crate) fn max_over_processes(&self, values: &mut [usize]) -> Result<()> {
        if let Some(ref comm) = self.comm {
            let mut wide = values.iter().map(|&v| v as u64).collect::<Vec<_>>();
            comm.all_reduce_max(&mut wide)?;
            for (v, w) in values.iter_mut().zip(wide) {
                *v = w as usize;
            }
        }
        Ok(())
    }
}
