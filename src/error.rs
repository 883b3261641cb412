use std::error::Error as StdError;
use std::fmt;
use std::io;

use nc4_types::ConversionError;

/// The error type for netCDF-4 variable operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Unknown group, dimension or type id.
    BadId,
    /// No variable with this id in the group.
    NotVar,
    /// No attribute with this name.
    NotAtt,
    /// Attempt to modify a file opened read-only.
    Permission,
    /// The operation requires define mode and it cannot be entered.
    NotInDefineMode,
    /// The operation is not allowed in define mode (classic model files).
    InDefineMode,
    BadName(String),
    NameInUse(String),
    /// A name, after any internal prefix, exceeds the name length ceiling.
    MaxName,
    MaxDims { ndims: usize, max: usize },
    BadDim,
    /// Classic model files only allow the unlimited dimension first.
    UnlimitedPosition,
    BadType,
    /// Attempt to convert between text and numbers.
    Char,
    /// Storage properties can no longer change: the dataset already exists.
    LateDefine,
    /// The fill value can no longer change: data was already written.
    LateFill,
    InvalidArgument(String),
    BadChunk(String),
    InvalidCoords,
    Edge,
    Stride,
    CantExtend,
    /// Some values did not fit the destination type. The transfer itself completed.
    Range,
    Filter(String),
    NoFilter(u32),
    VarSize,
    /// The storage engine failed.
    Storage(String),
    /// The collective reduction between cooperating processes failed.
    Communication(String),
    Internal(String),
}

/// A type for results generated by netCDF-4 functions where the `Err` type is
/// set to `nc4::Error`.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

impl From<&str> for Error {
    fn from(desc: &str) -> Self {
        Self::Internal(desc.into())
    }
}

impl From<String> for Error {
    fn from(desc: String) -> Self {
        Self::Internal(desc)
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::Char { .. } => Self::Char,
            ConversionError::String { .. } | ConversionError::Layout(_) => Self::BadType,
            ConversionError::Utf8 => Self::Internal(err.to_string()),
        }
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BadId => f.write_str("not a valid id"),
            Self::NotVar => f.write_str("variable not found"),
            Self::NotAtt => f.write_str("attribute not found"),
            Self::Permission => f.write_str("write to read only file"),
            Self::NotInDefineMode => f.write_str("operation not allowed in data mode"),
            Self::InDefineMode => f.write_str("operation not allowed in define mode"),
            Self::BadName(name) => write!(f, "name contains illegal characters: {:?}", name),
            Self::NameInUse(name) => write!(f, "name is already in use: {:?}", name),
            Self::MaxName => f.write_str("name is too long"),
            Self::MaxDims { ndims, max } => {
                write!(f, "too many dimensions: {} (maximum is {})", ndims, max)
            }
            Self::BadDim => f.write_str("invalid dimension id or name"),
            Self::UnlimitedPosition => {
                f.write_str("unlimited dimension must come first in classic model files")
            }
            Self::BadType => f.write_str("not a valid data type or type mismatch"),
            Self::Char => f.write_str("attempt to convert between text and numbers"),
            Self::LateDefine => {
                f.write_str("attempt to define storage properties after the dataset was created")
            }
            Self::LateFill => f.write_str("attempt to define fill value when data already exists"),
            Self::InvalidArgument(desc) => write!(f, "invalid argument: {}", desc),
            Self::BadChunk(desc) => write!(f, "bad chunk sizes: {}", desc),
            Self::InvalidCoords => f.write_str("index exceeds dimension bound"),
            Self::Edge => f.write_str("start+count exceeds dimension bound"),
            Self::Stride => f.write_str("illegal stride"),
            Self::CantExtend => {
                f.write_str("cannot extend dataset with independent parallel access")
            }
            Self::Range => f.write_str("numeric conversion not representable"),
            Self::Filter(desc) => write!(f, "filter error: {}", desc),
            Self::NoFilter(id) => write!(f, "filter not available: {}", id),
            Self::VarSize => f.write_str("variable is too large for compact storage"),
            Self::Storage(desc) => write!(f, "storage engine error: {}", desc),
            Self::Communication(desc) => write!(f, "parallel communication error: {}", desc),
            Self::Internal(desc) => f.write_str(desc),
        }
    }
}

impl StdError for Error {}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        Self::new(io::ErrorKind::Other, err)
    }
}
