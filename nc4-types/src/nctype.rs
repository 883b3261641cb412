use std::fmt::{self, Display};
use std::mem;

use crate::convert::ConversionError;
use crate::data::Data;

/// Size of the in-memory handle of a variable-length element (length + pointer).
pub const VARLEN_HANDLE_SIZE: usize = mem::size_of::<usize>() * 2;

/// Size of the in-memory handle of a variable-length string element.
pub const STRING_HANDLE_SIZE: usize = mem::size_of::<*const u8>();

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntSize {
    U1 = 1,
    U2 = 2,
    U4 = 4,
    U8 = 8,
}

impl IntSize {
    pub fn from_int(size: usize) -> Option<Self> {
        match size {
            1 => Some(Self::U1),
            2 => Some(Self::U2),
            4 => Some(Self::U4),
            8 => Some(Self::U8),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatSize {
    U4 = 4,
    U8 = 8,
}

impl FloatSize {
    pub fn from_int(size: usize) -> Option<Self> {
        match size {
            4 => Some(Self::U4),
            8 => Some(Self::U8),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumType {
    pub base: NcType,
    pub members: Vec<EnumMember>,
}

impl EnumType {
    #[inline]
    pub fn base_type(&self) -> TypeDescriptor {
        self.base.descriptor()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundField {
    pub name: String,
    pub ty: TypeDescriptor,
    pub offset: usize,
}

impl CompoundField {
    pub fn new(name: &str, ty: TypeDescriptor, offset: usize) -> Self {
        Self { name: name.to_owned(), ty, offset }
    }

    pub fn typed<T: NcValue>(name: &str, offset: usize) -> Self {
        Self::new(name, T::NC_TYPE.descriptor(), offset)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundType {
    pub fields: Vec<CompoundField>,
    pub size: usize,
}

impl CompoundType {
    /// Lays out the fields back to back, in declaration order.
    pub fn packed(fields: Vec<(String, TypeDescriptor)>) -> Self {
        let mut size = 0;
        let fields = fields
            .into_iter()
            .map(|(name, ty)| {
                let field = CompoundField { name, offset: size, ty };
                size += field.ty.size();
                field
            })
            .collect();
        Self { fields, size }
    }
}

/// Broad class of an element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Integer,
    Float,
    Char,
    String,
    Enum,
    Compound,
    Opaque,
    VarLen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDescriptor {
    Integer(IntSize),
    Unsigned(IntSize),
    Float(FloatSize),
    Char,
    String,
    Enum(EnumType),
    Compound(CompoundType),
    Opaque(usize),
    VarLen(Box<TypeDescriptor>),
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Integer(IntSize::U1) => write!(f, "int8"),
            Self::Integer(IntSize::U2) => write!(f, "int16"),
            Self::Integer(IntSize::U4) => write!(f, "int32"),
            Self::Integer(IntSize::U8) => write!(f, "int64"),
            Self::Unsigned(IntSize::U1) => write!(f, "uint8"),
            Self::Unsigned(IntSize::U2) => write!(f, "uint16"),
            Self::Unsigned(IntSize::U4) => write!(f, "uint32"),
            Self::Unsigned(IntSize::U8) => write!(f, "uint64"),
            Self::Float(FloatSize::U4) => write!(f, "float32"),
            Self::Float(FloatSize::U8) => write!(f, "float64"),
            Self::Char => write!(f, "char"),
            Self::String => write!(f, "string (var len)"),
            Self::Enum(ref tp) => write!(f, "enum ({})", tp.base_type()),
            Self::Compound(ref tp) => write!(f, "compound ({} fields)", tp.fields.len()),
            Self::Opaque(n) => write!(f, "opaque (len {})", n),
            Self::VarLen(ref tp) => write!(f, "[{}] (var len)", tp),
        }
    }
}

impl TypeDescriptor {
    /// Size of one element as laid out in a transfer buffer.
    ///
    /// Variable-length types report the size of their in-memory handle.
    pub fn size(&self) -> usize {
        match *self {
            Self::Integer(size) | Self::Unsigned(size) => size as _,
            Self::Float(size) => size as _,
            Self::Char => 1,
            Self::String => STRING_HANDLE_SIZE,
            Self::Enum(ref tp) => tp.base.size(),
            Self::Compound(ref tp) => tp.size,
            Self::Opaque(size) => size,
            Self::VarLen(_) => VARLEN_HANDLE_SIZE,
        }
    }

    pub fn class(&self) -> TypeClass {
        match *self {
            Self::Integer(_) | Self::Unsigned(_) => TypeClass::Integer,
            Self::Float(_) => TypeClass::Float,
            Self::Char => TypeClass::Char,
            Self::String => TypeClass::String,
            Self::Enum(_) => TypeClass::Enum,
            Self::Compound(_) => TypeClass::Compound,
            Self::Opaque(_) => TypeClass::Opaque,
            Self::VarLen(_) => TypeClass::VarLen,
        }
    }

    /// Returns `true` if elements of this type are held as individually owned buffers.
    pub fn is_var_len(&self) -> bool {
        matches!(*self, Self::String | Self::VarLen(_))
    }
}

/// The atomic netCDF-4 types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NcType {
    Byte = 1,
    Char = 2,
    Short = 3,
    Int = 4,
    Float = 5,
    Double = 6,
    UByte = 7,
    UShort = 8,
    UInt = 9,
    Int64 = 10,
    UInt64 = 11,
    String = 12,
}

impl NcType {
    pub const ALL: [Self; 12] = [
        Self::Byte,
        Self::Char,
        Self::Short,
        Self::Int,
        Self::Float,
        Self::Double,
        Self::UByte,
        Self::UShort,
        Self::UInt,
        Self::Int64,
        Self::UInt64,
        Self::String,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::UByte => "ubyte",
            Self::UShort => "ushort",
            Self::UInt => "uint",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::String => "string",
        }
    }

    pub fn descriptor(self) -> TypeDescriptor {
        use TypeDescriptor::{Float, Integer, Unsigned};
        match self {
            Self::Byte => Integer(IntSize::U1),
            Self::Char => TypeDescriptor::Char,
            Self::Short => Integer(IntSize::U2),
            Self::Int => Integer(IntSize::U4),
            Self::Float => Float(FloatSize::U4),
            Self::Double => Float(FloatSize::U8),
            Self::UByte => Unsigned(IntSize::U1),
            Self::UShort => Unsigned(IntSize::U2),
            Self::UInt => Unsigned(IntSize::U4),
            Self::Int64 => Integer(IntSize::U8),
            Self::UInt64 => Unsigned(IntSize::U8),
            Self::String => TypeDescriptor::String,
        }
    }

    /// Maps a descriptor back onto an atomic type, if it is one.
    pub fn from_descriptor(desc: &TypeDescriptor) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| &t.descriptor() == desc)
    }

    pub fn size(self) -> usize {
        self.descriptor().size()
    }

    /// Integer and floating-point types, i.e. those that take part in numeric conversion.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Char | Self::String)
    }
}

impl Display for NcType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust type that maps onto one of the atomic netCDF types.
pub trait NcValue: Sized + Clone + 'static {
    const NC_TYPE: NcType;

    fn encode(values: &[Self]) -> Data;

    fn decode(data: &Data) -> Result<Vec<Self>, ConversionError>;
}

macro_rules! impl_ncvalue {
    ($ty:ty, $variant:ident) => {
        impl NcValue for $ty {
            const NC_TYPE: NcType = NcType::$variant;

            fn encode(values: &[Self]) -> Data {
                let mut bytes = Vec::with_capacity(values.len() * mem::size_of::<$ty>());
                for value in values {
                    bytes.extend_from_slice(&value.to_ne_bytes());
                }
                Data::fixed(mem::size_of::<$ty>(), bytes)
            }

            fn decode(data: &Data) -> Result<Vec<Self>, ConversionError> {
                const SIZE: usize = mem::size_of::<$ty>();
                match data.as_bytes() {
                    Some(bytes) if data.element_size() == Some(SIZE) => Ok(bytes
                        .chunks_exact(SIZE)
                        .map(|chunk| {
                            let mut raw = [0u8; SIZE];
                            raw.copy_from_slice(chunk);
                            <$ty>::from_ne_bytes(raw)
                        })
                        .collect()),
                    _ => Err(ConversionError::Layout(NcType::$variant)),
                }
            }
        }
    };
}

impl_ncvalue!(i8, Byte);
impl_ncvalue!(i16, Short);
impl_ncvalue!(i32, Int);
impl_ncvalue!(i64, Int64);
impl_ncvalue!(u8, UByte);
impl_ncvalue!(u16, UShort);
impl_ncvalue!(u32, UInt);
impl_ncvalue!(u64, UInt64);
impl_ncvalue!(f32, Float);
impl_ncvalue!(f64, Double);

impl NcValue for String {
    const NC_TYPE: NcType = NcType::String;

    fn encode(values: &[Self]) -> Data {
        Data::VarLen(values.iter().map(|s| s.as_bytes().to_vec()).collect())
    }

    fn decode(data: &Data) -> Result<Vec<Self>, ConversionError> {
        match data {
            Data::VarLen(items) => items
                .iter()
                .map(|item| String::from_utf8(item.clone()).map_err(|_| ConversionError::Utf8))
                .collect(),
            Data::Fixed { .. } => Err(ConversionError::Layout(NcType::String)),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::TypeDescriptor as TD;
    use super::*;

    #[test]
    pub fn test_atomic_descriptors() {
        assert_eq!(NcType::Byte.descriptor(), TD::Integer(IntSize::U1));
        assert_eq!(NcType::UInt64.descriptor(), TD::Unsigned(IntSize::U8));
        assert_eq!(NcType::Double.descriptor(), TD::Float(FloatSize::U8));
        assert_eq!(NcType::Char.size(), 1);
        assert_eq!(NcType::Short.size(), 2);
        assert_eq!(NcType::Float.size(), 4);
        assert_eq!(NcType::String.size(), STRING_HANDLE_SIZE);
        for ty in NcType::ALL.iter() {
            assert_eq!(NcType::from_id(ty.id()), Some(*ty));
            assert_eq!(NcType::from_descriptor(&ty.descriptor()), Some(*ty));
        }
        assert_eq!(NcType::from_id(13), None);
    }

    #[test]
    pub fn test_user_descriptors() {
        let vlen = TD::VarLen(Box::new(NcType::Int.descriptor()));
        assert_eq!(vlen.size(), VARLEN_HANDLE_SIZE);
        assert!(vlen.is_var_len());
        assert_eq!(vlen.class(), TypeClass::VarLen);
        assert_eq!(vlen.to_string(), "[int32] (var len)");

        let compound = CompoundType::packed(vec![
            ("a".into(), NcType::Short.descriptor()),
            ("b".into(), NcType::Double.descriptor()),
        ]);
        assert_eq!(compound.size, 10);
        assert_eq!(compound.fields[1], CompoundField::typed::<f64>("b", 2));

        let en = EnumType { base: NcType::UByte, members: vec![] };
        assert_eq!(TD::Enum(en).size(), 1);
        assert_eq!(TD::Opaque(11).size(), 11);
    }

    #[test]
    pub fn test_value_codec() {
        let data = i16::encode(&[1, -2, 300]);
        assert_eq!(data.len(), 3);
        assert_eq!(data.element_size(), Some(2));
        assert_eq!(i16::decode(&data).unwrap(), vec![1, -2, 300]);
        assert!(i32::decode(&data).is_err());

        let data = String::encode(&["foo".to_owned(), String::new()]);
        assert_eq!(data, Data::VarLen(vec![b"foo".to_vec(), vec![]]));
        assert_eq!(String::decode(&data).unwrap(), vec!["foo".to_owned(), String::new()]);
    }
}
