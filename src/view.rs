//! Typed slices over the live bytes of an array

use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};

use crate::element::{ArrayTag, Value};

/// Borrowed view of an array's contents as a slice of its element type
#[derive(Clone, PartialEq)]
pub enum ArrayView<'a> {
    /// Single byte characters
    Char(&'a [u8]),
    /// Wide characters as raw 32-bit code points
    WideChar(&'a [u32]),
    /// Typed array of i8 values
    I8(&'a [i8]),
    /// Typed array of u8 values
    U8(&'a [u8]),
    /// Typed array of i16 values
    I16(&'a [i16]),
    /// Typed array of u16 values
    U16(&'a [u16]),
    /// Typed array of i32 values
    I32(&'a [i32]),
    /// Typed array of u32 values
    U32(&'a [u32]),
    /// Typed array of i64 values
    I64(&'a [i64]),
    /// Typed array of u64 values
    U64(&'a [u64]),
    /// Typed array of f32 values
    F32(&'a [f32]),
    /// Typed array of f64 values
    F64(&'a [f64]),
}

macro_rules! with_slice {
    ($view:expr, $slice:ident => $body:expr) => {
        match $view {
            ArrayView::Char($slice) => $body,
            ArrayView::WideChar($slice) => $body,
            ArrayView::I8($slice) => $body,
            ArrayView::U8($slice) => $body,
            ArrayView::I16($slice) => $body,
            ArrayView::U16($slice) => $body,
            ArrayView::I32($slice) => $body,
            ArrayView::U32($slice) => $body,
            ArrayView::I64($slice) => $body,
            ArrayView::U64($slice) => $body,
            ArrayView::F32($slice) => $body,
            ArrayView::F64($slice) => $body,
        }
    };
}

// Reinterprets `bytes` as a slice of `T`, or `None` if it is misaligned or ragged.
//
// Only used with primitive integer and float types, for which every bit
// pattern is valid.
fn cast<T: Copy>(bytes: &[u8]) -> Option<&[T]> {
    // Safety: `T` is a plain primitive and `align_to` never splits a `T`
    let (head, body, tail) = unsafe { bytes.align_to::<T>() };
    if head.is_empty() && tail.is_empty() {
        Some(body)
    } else {
        None
    }
}

impl<'a> ArrayView<'a> {
    /// Views `bytes` as elements of type `tag`.
    ///
    /// Returns `None` if the bytes are not aligned for the element type or
    /// are not a whole number of elements.
    #[must_use]
    pub fn new(tag: ArrayTag, bytes: &'a [u8]) -> Option<Self> {
        use ArrayTag::*;
        Some(match tag {
            Char => ArrayView::Char(bytes),
            WideChar => ArrayView::WideChar(cast(bytes)?),
            I8 => ArrayView::I8(cast(bytes)?),
            U8 => ArrayView::U8(bytes),
            I16 => ArrayView::I16(cast(bytes)?),
            U16 => ArrayView::U16(cast(bytes)?),
            I32 => ArrayView::I32(cast(bytes)?),
            U32 => ArrayView::U32(cast(bytes)?),
            I64 => ArrayView::I64(cast(bytes)?),
            U64 => ArrayView::U64(cast(bytes)?),
            F32 => ArrayView::F32(cast(bytes)?),
            F64 => ArrayView::F64(cast(bytes)?),
        })
    }

    /// Returns the length of the slice regardless of type
    #[must_use]
    pub fn len(&self) -> usize {
        with_slice!(self, slice => slice.len())
    }

    /// Returns true if the slice is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the type tag of the view
    #[must_use]
    pub fn type_tag(&self) -> ArrayTag {
        use ArrayTag::*;
        match self {
            Self::Char(_) => Char,
            Self::WideChar(_) => WideChar,
            Self::I8(_) => I8,
            Self::U8(_) => U8,
            Self::I16(_) => I16,
            Self::U16(_) => U16,
            Self::I32(_) => I32,
            Self::U32(_) => U32,
            Self::I64(_) => I64,
            Self::U64(_) => U64,
            Self::F32(_) => F32,
            Self::F64(_) => F64,
        }
    }

    /// Reads the element at `index` as a [`Value`]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        use ArrayView::*;
        Some(match self {
            Char(s) => Value::Byte(*s.get(index)?),
            WideChar(s) => Value::Char(
                char::from_u32(*s.get(index)?).unwrap_or(char::REPLACEMENT_CHARACTER),
            ),
            I8(s) => Value::from(*s.get(index)?),
            U8(s) => Value::from(*s.get(index)?),
            I16(s) => Value::from(*s.get(index)?),
            U16(s) => Value::from(*s.get(index)?),
            I32(s) => Value::from(*s.get(index)?),
            U32(s) => Value::from(*s.get(index)?),
            I64(s) => Value::from(*s.get(index)?),
            U64(s) => Value::from(*s.get(index)?),
            F32(s) => Value::from(*s.get(index)?),
            F64(s) => Value::from(*s.get(index)?),
        })
    }
}

impl PartialOrd for ArrayView<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use ArrayView::*;
        match (self, other) {
            (Char(a), Char(b)) => a.partial_cmp(b),
            (WideChar(a), WideChar(b)) => a.partial_cmp(b),
            (I8(a), I8(b)) => a.partial_cmp(b),
            (U8(a), U8(b)) => a.partial_cmp(b),
            (I16(a), I16(b)) => a.partial_cmp(b),
            (U16(a), U16(b)) => a.partial_cmp(b),
            (I32(a), I32(b)) => a.partial_cmp(b),
            (U32(a), U32(b)) => a.partial_cmp(b),
            (I64(a), I64(b)) => a.partial_cmp(b),
            (U64(a), U64(b)) => a.partial_cmp(b),
            (F32(a), F32(b)) => a.partial_cmp(b),
            (F64(a), F64(b)) => a.partial_cmp(b),
            _ => None, // Different types are not comparable
        }
    }
}

macro_rules! from_impl {
    ($(($ty:ty, $variant:ident)),*) => {
        $(impl<'a> From<&'a [$ty]> for ArrayView<'a> {
            fn from(slice: &'a [$ty]) -> Self {
                ArrayView::$variant(slice)
            }
        })*
    };
}

from_impl!(
    (i8, I8),
    (u8, U8),
    (i16, I16),
    (u16, U16),
    (i32, I32),
    (u32, U32),
    (i64, I64),
    (u64, U64),
    (f32, F32),
    (f64, F64)
);

impl Debug for ArrayView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        with_slice!(self, slice => Debug::fmt(slice, f))
    }
}
