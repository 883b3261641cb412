use std::error::Error as StdError;
use std::fmt;

use num_traits::NumCast;

use crate::data::Data;
use crate::nctype::NcType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionError {
    /// Text can only be converted to and from text.
    Char { from: NcType, to: NcType },
    /// Strings can only be converted to and from strings.
    String { from: NcType, to: NcType },
    /// The buffer does not hold elements of the expected type.
    Layout(NcType),
    /// A string element is not valid UTF-8.
    Utf8,
}

impl StdError for ConversionError {}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Char { from, to } => {
                write!(f, "cannot convert between text and numbers ({} -> {})", from, to)
            }
            Self::String { from, to } => {
                write!(f, "cannot convert between strings and non-strings ({} -> {})", from, to)
            }
            Self::Layout(ty) => write!(f, "buffer does not hold {} elements", ty),
            Self::Utf8 => write!(f, "string element is not valid UTF-8"),
        }
    }
}

/// Result of a conversion pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Converted {
    pub data: Data,
    /// At least one value did not fit the destination type and was wrapped or truncated.
    pub range_error: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Scalar {
    Int(i64),
    UInt(u64),
    Float(f64),
}

macro_rules! read_ne {
    ($ty:ty, $bytes:expr) => {{
        let mut raw = [0u8; std::mem::size_of::<$ty>()];
        raw.copy_from_slice($bytes);
        <$ty>::from_ne_bytes(raw)
    }};
}

fn read_scalar(ty: NcType, bytes: &[u8]) -> Scalar {
    match ty {
        NcType::Byte => Scalar::Int(read_ne!(i8, bytes).into()),
        NcType::Short => Scalar::Int(read_ne!(i16, bytes).into()),
        NcType::Int => Scalar::Int(read_ne!(i32, bytes).into()),
        NcType::Int64 => Scalar::Int(read_ne!(i64, bytes)),
        NcType::UByte => Scalar::UInt(read_ne!(u8, bytes).into()),
        NcType::UShort => Scalar::UInt(read_ne!(u16, bytes).into()),
        NcType::UInt => Scalar::UInt(read_ne!(u32, bytes).into()),
        NcType::UInt64 => Scalar::UInt(read_ne!(u64, bytes)),
        NcType::Float => Scalar::Float(read_ne!(f32, bytes).into()),
        NcType::Double => Scalar::Float(read_ne!(f64, bytes)),
        NcType::Char | NcType::String => unreachable!("not a numeric type: {}", ty),
    }
}

/// Casts to an integer type, reporting whether the value was representable.
///
/// Out-of-range values follow `as` semantics: integers wrap, floats saturate.
macro_rules! cast_int {
    ($ty:ty, $value:expr) => {{
        match $value {
            Scalar::Int(v) => (<$ty as NumCast>::from(v), v as $ty),
            Scalar::UInt(v) => (<$ty as NumCast>::from(v), v as $ty),
            Scalar::Float(v) => (<$ty as NumCast>::from(v), v as $ty),
        }
    }};
}

fn write_scalar(ty: NcType, value: Scalar, out: &mut Vec<u8>) -> bool {
    macro_rules! put_int {
        ($ty:ty) => {{
            let (exact, lossy) = cast_int!($ty, value);
            out.extend_from_slice(&exact.unwrap_or(lossy).to_ne_bytes());
            exact.is_some()
        }};
    }

    match ty {
        NcType::Byte => put_int!(i8),
        NcType::Short => put_int!(i16),
        NcType::Int => put_int!(i32),
        NcType::Int64 => put_int!(i64),
        NcType::UByte => put_int!(u8),
        NcType::UShort => put_int!(u16),
        NcType::UInt => put_int!(u32),
        NcType::UInt64 => put_int!(u64),
        NcType::Float => {
            let (v, in_range) = match value {
                Scalar::Int(v) => (v as f32, true),
                Scalar::UInt(v) => (v as f32, true),
                Scalar::Float(v) => (v as f32, !v.is_finite() || v.abs() <= f32::MAX as f64),
            };
            out.extend_from_slice(&v.to_ne_bytes());
            in_range
        }
        NcType::Double => {
            let v = match value {
                Scalar::Int(v) => v as f64,
                Scalar::UInt(v) => v as f64,
                Scalar::Float(v) => v,
            };
            out.extend_from_slice(&v.to_ne_bytes());
            true
        }
        NcType::Char | NcType::String => unreachable!("not a numeric type: {}", ty),
    }
}

/// Converts a buffer of `from` elements into a buffer of `to` elements.
///
/// Numeric types convert freely; values that do not fit the destination are still
/// converted but flag `range_error`. Text and strings only convert to themselves.
pub fn convert(src: &Data, from: NcType, to: NcType) -> Result<Converted, ConversionError> {
    if from == to {
        return Ok(Converted { data: src.clone(), range_error: false });
    }
    if from == NcType::Char || to == NcType::Char {
        return Err(ConversionError::Char { from, to });
    }
    if from == NcType::String || to == NcType::String {
        return Err(ConversionError::String { from, to });
    }
    let bytes = match src.as_bytes() {
        Some(bytes) if src.element_size() == Some(from.size()) => bytes,
        _ => return Err(ConversionError::Layout(from)),
    };

    let mut out = Vec::with_capacity(src.len() * to.size());
    let mut range_error = false;
    for chunk in bytes.chunks_exact(from.size()) {
        if !write_scalar(to, read_scalar(from, chunk), &mut out) {
            range_error = true;
        }
    }
    Ok(Converted { data: Data::fixed(to.size(), out), range_error })
}
