//! Element types and the values stored in them
#![allow(clippy::float_cmp)]

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};

use hashbrown::HashMap;
use lazy_static::lazy_static;
use serde::{Serialize, Serializer};

use crate::error::{ArrayError, Result};

/// Tag indicating the type of elements stored in an array
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayTag {
    /// Array contains single bytes (`'c'`)
    Char = 0,
    /// Array contains wide characters, stored as 32-bit code points (`'u'`)
    WideChar = 1,
    /// Array contains i8 values (`'b'`)
    I8 = 2,
    /// Array contains u8 values (`'B'`)
    U8 = 3,
    /// Array contains i16 values (`'h'`)
    I16 = 4,
    /// Array contains u16 values (`'H'`)
    U16 = 5,
    /// Array contains i32 values (`'i'`)
    I32 = 6,
    /// Array contains u32 values (`'I'`)
    U32 = 7,
    /// Array contains i64 values (`'l'` or `'q'`)
    I64 = 8,
    /// Array contains u64 values (`'L'` or `'Q'`)
    U64 = 9,
    /// Array contains f32 values (`'f'`)
    F32 = 10,
    /// Array contains f64 values (`'d'`)
    F64 = 11,
}

lazy_static! {
    static ref TYPECODES: HashMap<char, ArrayTag> = {
        use ArrayTag::*;
        let mut map = HashMap::new();
        for &tag in ArrayTag::ALL {
            map.insert(tag.typecode(), tag);
        }
        map.insert('q', I64);
        map.insert('Q', U64);
        map
    };
}

impl ArrayTag {
    /// Every supported element type
    pub const ALL: &'static [ArrayTag] = &[
        ArrayTag::Char,
        ArrayTag::WideChar,
        ArrayTag::I8,
        ArrayTag::U8,
        ArrayTag::I16,
        ArrayTag::U16,
        ArrayTag::I32,
        ArrayTag::U32,
        ArrayTag::I64,
        ArrayTag::U64,
        ArrayTag::F32,
        ArrayTag::F64,
    ];

    /// Looks up the element type for a single-character typecode
    pub fn from_typecode(code: char) -> Result<Self> {
        TYPECODES
            .get(&code)
            .copied()
            .ok_or(ArrayError::BadTypecode(code))
    }

    /// The canonical typecode for this element type
    #[must_use]
    pub fn typecode(self) -> char {
        use ArrayTag::*;
        match self {
            Char => 'c',
            WideChar => 'u',
            I8 => 'b',
            U8 => 'B',
            I16 => 'h',
            U16 => 'H',
            I32 => 'i',
            U32 => 'I',
            I64 => 'l',
            U64 => 'L',
            F32 => 'f',
            F64 => 'd',
        }
    }

    /// Width of one element in bytes
    #[must_use]
    pub fn itemsize(self) -> usize {
        use std::mem::size_of;
        use ArrayTag::*;
        match self {
            Char => size_of::<u8>(),
            WideChar => size_of::<u32>(),
            I8 => size_of::<i8>(),
            U8 => size_of::<u8>(),
            I16 => size_of::<i16>(),
            U16 => size_of::<u16>(),
            I32 => size_of::<i32>(),
            U32 => size_of::<u32>(),
            I64 => size_of::<i64>(),
            U64 => size_of::<u64>(),
            F32 => size_of::<f32>(),
            F64 => size_of::<f64>(),
        }
    }

    /// Required alignment of one element in bytes
    #[must_use]
    pub fn alignment(self) -> usize {
        use std::mem::align_of;
        use ArrayTag::*;
        match self {
            Char | U8 => align_of::<u8>(),
            I8 => align_of::<i8>(),
            I16 => align_of::<i16>(),
            U16 => align_of::<u16>(),
            I32 => align_of::<i32>(),
            WideChar | U32 => align_of::<u32>(),
            I64 => align_of::<i64>(),
            U64 => align_of::<u64>(),
            F32 => align_of::<f32>(),
            F64 => align_of::<f64>(),
        }
    }

    fn int_range(self) -> Option<(i128, i128)> {
        use ArrayTag::*;
        match self {
            I8 => Some((i8::MIN.into(), i8::MAX.into())),
            U8 => Some((0, u8::MAX.into())),
            I16 => Some((i16::MIN.into(), i16::MAX.into())),
            U16 => Some((0, u16::MAX.into())),
            I32 => Some((i32::MIN.into(), i32::MAX.into())),
            U32 => Some((0, u32::MAX.into())),
            I64 => Some((i64::MIN.into(), i64::MAX.into())),
            U64 => Some((0, u64::MAX.into())),
            _ => None,
        }
    }

    /// Validates `value` for this element type and encodes it in native byte order.
    ///
    /// Only the first [`ArrayTag::itemsize`] bytes of the result are meaningful.
    pub fn pack(self, value: &Value) -> Result<[u8; 8]> {
        use ArrayTag::*;
        let mut out = [0u8; 8];
        let wrong_kind = || ArrayError::WrongKind {
            tag: self,
            value: value.clone(),
        };

        if let Some((min, max)) = self.int_range() {
            let v: i128 = match *value {
                Value::Int(v) => v.into(),
                Value::UInt(v) => v.into(),
                _ => return Err(wrong_kind()),
            };
            if v < min || v > max {
                return Err(ArrayError::Overflow {
                    tag: self,
                    value: value.clone(),
                });
            }
            // Range checked above, so the narrowing casts are exact
            match self {
                I8 => out[..1].copy_from_slice(&(v as i8).to_ne_bytes()),
                U8 => out[..1].copy_from_slice(&(v as u8).to_ne_bytes()),
                I16 => out[..2].copy_from_slice(&(v as i16).to_ne_bytes()),
                U16 => out[..2].copy_from_slice(&(v as u16).to_ne_bytes()),
                I32 => out[..4].copy_from_slice(&(v as i32).to_ne_bytes()),
                U32 => out[..4].copy_from_slice(&(v as u32).to_ne_bytes()),
                I64 => out.copy_from_slice(&(v as i64).to_ne_bytes()),
                _ => out.copy_from_slice(&(v as u64).to_ne_bytes()),
            }
            return Ok(out);
        }

        match (self, value) {
            (Char, Value::Byte(b)) => out[0] = *b,
            (WideChar, Value::Char(c)) => out[..4].copy_from_slice(&u32::from(*c).to_ne_bytes()),
            (F32, v) | (F64, v) => {
                let f = match *v {
                    Value::Float(f) => f,
                    Value::Int(i) => i as f64,
                    Value::UInt(u) => u as f64,
                    _ => return Err(wrong_kind()),
                };
                if self == F32 {
                    out[..4].copy_from_slice(&(f as f32).to_ne_bytes());
                } else {
                    out.copy_from_slice(&f.to_ne_bytes());
                }
            }
            _ => return Err(wrong_kind()),
        }
        Ok(out)
    }

    /// Decodes one element from exactly [`ArrayTag::itemsize`] native-order bytes
    #[must_use]
    pub fn unpack(self, bytes: &[u8]) -> Value {
        use ArrayTag::*;
        match self {
            Char => Value::Byte(bytes[0]),
            WideChar => {
                let raw = u32::from_ne_bytes(array_of(bytes));
                Value::Char(char::from_u32(raw).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
            I8 => Value::Int(i8::from_ne_bytes(array_of(bytes)).into()),
            U8 => Value::UInt(u8::from_ne_bytes(array_of(bytes)).into()),
            I16 => Value::Int(i16::from_ne_bytes(array_of(bytes)).into()),
            U16 => Value::UInt(u16::from_ne_bytes(array_of(bytes)).into()),
            I32 => Value::Int(i32::from_ne_bytes(array_of(bytes)).into()),
            U32 => Value::UInt(u32::from_ne_bytes(array_of(bytes)).into()),
            I64 => Value::Int(i64::from_ne_bytes(array_of(bytes))),
            U64 => Value::UInt(u64::from_ne_bytes(array_of(bytes))),
            F32 => Value::Float(f32::from_ne_bytes(array_of(bytes)).into()),
            F64 => Value::Float(f64::from_ne_bytes(array_of(bytes))),
        }
    }
}

fn array_of<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// A single element as seen from outside the array.
///
/// Reads always produce the variant matching the array's element type: signed
/// integers as `Int`, unsigned as `UInt`, floats as `Float`, `'c'` arrays as
/// `Byte` and `'u'` arrays as `Char`. Numeric variants compare by value, so
/// `Int(2) == Float(2.0)`.
#[derive(Clone, Debug)]
pub enum Value {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// Single byte character
    Byte(u8),
    /// Unicode character
    Char(char),
}

fn can_represent_as_f64(x: u64) -> bool {
    x.leading_zeros() + x.trailing_zeros() >= 11
}

fn cmp_i64_to_f64(a: i64, b: f64) -> Option<Ordering> {
    if a < 0 {
        cmp_u64_to_f64(a.wrapping_neg() as u64, -b).map(Ordering::reverse)
    } else {
        cmp_u64_to_f64(a as u64, b)
    }
}

fn cmp_u64_to_f64(a: u64, b: f64) -> Option<Ordering> {
    if b.is_nan() {
        None
    } else if can_represent_as_f64(a) {
        (a as f64).partial_cmp(&b)
    } else if b <= (0x0020_0000_0000_0000_u64 as f64) {
        // Every integer that needs more than 53 bits is above this
        Some(Ordering::Greater)
    } else if b >= u64::MAX as f64 {
        Some(Ordering::Less)
    } else {
        // Remaining floats convert to u64 losslessly
        Some(a.cmp(&(b as u64)))
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (UInt(a), UInt(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Byte(a), Byte(b)) => Some(a.cmp(b)),
            (Char(a), Char(b)) => Some(a.cmp(b)),
            (Int(a), UInt(b)) => {
                if *a < 0 {
                    Some(Ordering::Less)
                } else {
                    Some((*a as u64).cmp(b))
                }
            }
            (Int(a), Float(b)) => cmp_i64_to_f64(*a, *b),
            (UInt(a), Float(b)) => cmp_u64_to_f64(*a, *b),
            (UInt(_), Int(_)) | (Float(_), Int(_)) | (Float(_), UInt(_)) => {
                other.partial_cmp(self).map(Ordering::reverse)
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => Display::fmt(v, f),
            Value::UInt(v) => Display::fmt(v, f),
            Value::Float(v) => Debug::fmt(v, f),
            Value::Byte(b) => write!(f, "b'{}'", std::ascii::escape_default(*b)),
            Value::Char(c) => write!(f, "{:?}", c),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Value::Int(v) => serializer.serialize_i64(v),
            Value::UInt(v) => serializer.serialize_u64(v),
            Value::Float(v) => serializer.serialize_f64(v),
            Value::Byte(v) => serializer.serialize_u8(v),
            Value::Char(v) => serializer.serialize_char(v),
        }
    }
}

macro_rules! from_impl {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(<$target>::from(v))
            }
        })*
    };
}

from_impl!(Int as i64: i8, i16, i32, i64);
from_impl!(UInt as u64: u8, u16, u32, u64);
from_impl!(Float as f64: f32, f64);

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}
