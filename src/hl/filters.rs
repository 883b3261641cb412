use crate::config::{MAX_DEFLATE_LEVEL, MAX_SZIP_PIXELS_PER_BLOCK};
use crate::error::{Error, Result};

pub const FILTER_DEFLATE: u32 = 1;
pub const FILTER_SHUFFLE: u32 = 2;
pub const FILTER_FLETCHER32: u32 = 3;
pub const FILTER_SZIP: u32 = 4;

pub const SZIP_EC_OPTION_MASK: u32 = 4;
pub const SZIP_NN_OPTION_MASK: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SZip {
    Entropy,
    NearestNeighbor,
}

/// A stage of a dataset's filter pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Deflate(u8),
    Shuffle,
    Fletcher32,
    SZip(SZip, u8),
    User(u32, Vec<u32>),
}

impl Filter {
    pub fn id(&self) -> u32 {
        match self {
            Self::Deflate(_) => FILTER_DEFLATE,
            Self::Shuffle => FILTER_SHUFFLE,
            Self::Fletcher32 => FILTER_FLETCHER32,
            Self::SZip(_, _) => FILTER_SZIP,
            Self::User(id, _) => *id,
        }
    }

    /// Filter parameters in their raw form.
    pub fn params(&self) -> Vec<u32> {
        match self {
            Self::Deflate(level) => vec![u32::from(*level)],
            Self::Shuffle | Self::Fletcher32 => vec![],
            Self::SZip(coding, px_per_block) => {
                let mask = match coding {
                    SZip::Entropy => SZIP_EC_OPTION_MASK,
                    SZip::NearestNeighbor => SZIP_NN_OPTION_MASK,
                };
                vec![mask, u32::from(*px_per_block)]
            }
            Self::User(_, params) => params.clone(),
        }
    }

    /// Returns `true` for the filters every storage engine provides.
    pub fn is_builtin(id: u32) -> bool {
        matches!(id, FILTER_DEFLATE | FILTER_SHUFFLE | FILTER_FLETCHER32 | FILTER_SZIP)
    }

    pub fn deflate(level: u8) -> Self {
        Self::Deflate(level)
    }

    pub fn szip(coding: SZip, px_per_block: u8) -> Self {
        Self::SZip(coding, px_per_block)
    }

    pub fn user(id: u32, params: &[u32]) -> Self {
        Self::User(id, params.to_vec())
    }

    fn parse_deflate(params: &[u32]) -> Result<Self> {
        ensure!(params.len() == 1, Error::Filter("deflate takes exactly 1 parameter".into()));
        ensure!(
            params[0] <= u32::from(MAX_DEFLATE_LEVEL),
            Error::InvalidArgument(format!("invalid deflate level: {}", params[0]))
        );
        Ok(Self::deflate(params[0] as _))
    }

    fn parse_shuffle(params: &[u32]) -> Result<Self> {
        ensure!(params.is_empty(), Error::Filter("shuffle takes no parameters".into()));
        Ok(Self::Shuffle)
    }

    fn parse_fletcher32(params: &[u32]) -> Result<Self> {
        ensure!(params.is_empty(), Error::Filter("fletcher32 takes no parameters".into()));
        Ok(Self::Fletcher32)
    }

    fn parse_szip(params: &[u32]) -> Result<Self> {
        ensure!(params.len() == 2, Error::Filter("szip takes exactly 2 parameters".into()));
        let m = params[0];
        ensure!(
            (m & SZIP_EC_OPTION_MASK != 0) != (m & SZIP_NN_OPTION_MASK != 0),
            Error::InvalidArgument(format!("invalid szip mask: {}: expected EC or NN to be set", m))
        );
        let coding =
            if m & SZIP_EC_OPTION_MASK != 0 { SZip::Entropy } else { SZip::NearestNeighbor };
        let px_per_block = params[1];
        ensure!(
            px_per_block > 0
                && px_per_block % 2 == 0
                && px_per_block <= u32::from(MAX_SZIP_PIXELS_PER_BLOCK),
            Error::InvalidArgument(format!("invalid pixels per block for szip: {}", px_per_block))
        );
        Ok(Self::szip(coding, px_per_block as _))
    }

    /// Validates raw parameters against the filter's arity and value ranges.
    pub fn from_raw(id: u32, params: &[u32]) -> Result<Self> {
        ensure!(id > 0, Error::Filter(format!("invalid filter id: {}", id)));
        match id {
            FILTER_DEFLATE => Self::parse_deflate(params),
            FILTER_SHUFFLE => Self::parse_shuffle(params),
            FILTER_FLETCHER32 => Self::parse_fletcher32(params),
            FILTER_SZIP => Self::parse_szip(params),
            _ => Ok(Self::user(id, params)),
        }
    }
}

/// Orders a pipeline the way it is applied on write: shuffle first, checksum last.
pub fn pipeline_order(filters: &[Filter]) -> Vec<Filter> {
    let mut out = Vec::with_capacity(filters.len());
    out.extend(filters.iter().filter(|f| **f == Filter::Shuffle).cloned());
    out.extend(
        filters.iter().filter(|f| !matches!(f, Filter::Shuffle | Filter::Fletcher32)).cloned(),
    );
    out.extend(filters.iter().filter(|f| **f == Filter::Fletcher32).cloned());
    out
}
