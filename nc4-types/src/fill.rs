use crate::data::Data;
use crate::nctype::{NcType, NcValue};

const FILL_BYTE: i8 = -127;
const FILL_CHAR: u8 = 0;
const FILL_SHORT: i16 = -32767;
const FILL_INT: i32 = -2_147_483_647;
const FILL_FLOAT: f32 = 9.969_209_968_386_869e36;
const FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;
const FILL_UBYTE: u8 = 255;
const FILL_USHORT: u16 = 65535;
const FILL_UINT: u32 = 4_294_967_295;
const FILL_INT64: i64 = -9_223_372_036_854_775_806;
const FILL_UINT64: u64 = 18_446_744_073_709_551_614;

/// The value an atomic type is filled with when no fill value has been set.
pub fn default_fill(ty: NcType) -> Data {
    match ty {
        NcType::Byte => i8::encode(&[FILL_BYTE]),
        NcType::Char => Data::fixed(1, vec![FILL_CHAR]),
        NcType::Short => i16::encode(&[FILL_SHORT]),
        NcType::Int => i32::encode(&[FILL_INT]),
        NcType::Float => f32::encode(&[FILL_FLOAT]),
        NcType::Double => f64::encode(&[FILL_DOUBLE]),
        NcType::UByte => u8::encode(&[FILL_UBYTE]),
        NcType::UShort => u16::encode(&[FILL_USHORT]),
        NcType::UInt => u32::encode(&[FILL_UINT]),
        NcType::Int64 => i64::encode(&[FILL_INT64]),
        NcType::UInt64 => u64::encode(&[FILL_UINT64]),
        NcType::String => Data::VarLen(vec![Vec::new()]),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_default_fill() {
        assert_eq!(i8::decode(&default_fill(NcType::Byte)).unwrap(), vec![-127]);
        assert_eq!(i32::decode(&default_fill(NcType::Int)).unwrap(), vec![-2147483647]);
        assert_eq!(u16::decode(&default_fill(NcType::UShort)).unwrap(), vec![u16::MAX]);
        assert_eq!(f64::decode(&default_fill(NcType::Double)).unwrap(), vec![9.969_209_968_386_869e36]);
        assert_eq!(default_fill(NcType::Char), Data::fixed(1, vec![0]));
        assert_eq!(default_fill(NcType::String), Data::VarLen(vec![vec![]]));
        for ty in NcType::ALL.iter() {
            assert_eq!(default_fill(*ty).len(), 1);
        }
    }
}
