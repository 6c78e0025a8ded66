//! A growable typed array stored in a memory mapping.
//!
//! [`MmapArray`] behaves like a sequence of fixed-width numbers or characters
//! whose bytes live in a resizable mapping: anonymous shared memory by
//! default, or any other [`Mapping`] such as a file. Elements are stored back
//! to back in native byte order with no header.
//!
//! ```
//! use mmap_array::{ArrayTag, MmapArray, SliceSpec, Value};
//!
//! # fn main() -> mmap_array::Result<()> {
//! let mut arr = MmapArray::new(ArrayTag::I32)?;
//! arr.extend_values(vec![1, 2, 3, 4, 5])?;
//! arr.insert(0, 0)?;
//! let odd = arr.get_slice(SliceSpec::new(Some(1), None, Some(2)))?;
//! assert_eq!(odd.to_list(), vec![Value::Int(1), Value::Int(3), Value::Int(5)]);
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs, missing_debug_implementations)]

pub mod array;
pub mod buffer;
pub mod element;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod slice;
pub mod view;

pub use array::{ConstructionInput, Iter, MmapArray};
pub use buffer::MappedBuffer;
pub use element::{ArrayTag, Value};
pub use error::{ArrayError, ErrorKind, Result};
pub use geometry::Geometry;
#[cfg(unix)]
pub use mapping::SharedMemory;
pub use mapping::{FileMapping, HeapMapping, Mapping};
pub use slice::{
    resolve, resolve_index, resolve_simple, resolve_slice, IndexSpec, Resolution, ResolvedSlice,
    SliceSpec,
};
pub use view::ArrayView;

#[cfg(test)]
#[global_allocator]
static ALLOC: mockalloc::Mockalloc<std::alloc::System> =
    mockalloc::Mockalloc(std::alloc::System);
