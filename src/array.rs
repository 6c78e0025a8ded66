//! Functionality relating to the mapped array type

use std::borrow::Cow;
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt::{self, Debug, Formatter};
use std::io::{Read, Write};
use std::iter::FusedIterator;
use std::ops::Range;

use serde::ser::{Serialize, SerializeSeq, Serializer};
use tracing::{debug, warn};

use crate::buffer::MappedBuffer;
use crate::element::{ArrayTag, Value};
use crate::error::{ArrayError, Result};
use crate::geometry::Geometry;
#[cfg(unix)]
use crate::mapping::SharedMemory;
use crate::mapping::{HeapMapping, Mapping};
use crate::slice::{self, ResolvedSlice, SliceSpec};
use crate::view::ArrayView;

/// Initial contents for [`MmapArray::with_input`]
#[derive(Debug)]
pub enum ConstructionInput<'a> {
    /// Raw element bytes in native order; must be a whole number of elements
    Bytes(&'a [u8]),
    /// Text for a wide character array
    Text(&'a str),
    /// Another array of the same element type
    Array(&'a MmapArray),
    /// Values validated and packed one by one
    Values(Vec<Value>),
}

#[cfg(unix)]
fn anonymous(data: &[u8]) -> Result<Box<dyn Mapping>> {
    Ok(Box::new(SharedMemory::new(data)?))
}

#[cfg(not(unix))]
fn anonymous(data: &[u8]) -> Result<Box<dyn Mapping>> {
    Ok(Box::new(HeapMapping::from_bytes(data)))
}

fn pack_all(tag: ArrayTag, values: &[Value]) -> Result<Vec<u8>> {
    let itemsize = tag.itemsize();
    let mut out = Vec::with_capacity(values.len() * itemsize);
    for value in values {
        out.extend_from_slice(&tag.pack(value)?[..itemsize]);
    }
    Ok(out)
}

fn encode_text(tag: ArrayTag, text: &str) -> Result<Vec<u8>> {
    if tag != ArrayTag::WideChar {
        return Err(ArrayError::NotText(tag));
    }
    Ok(text
        .chars()
        .flat_map(|c| u32::from(c).to_ne_bytes())
        .collect())
}

/// A growable typed array whose elements live in a memory mapping.
///
/// The elements are stored back to back in native byte order with no header,
/// so the element type has to be supplied again by whoever reopens a mapping.
/// Every mutation either completes or leaves the array as it was, except for
/// [`MmapArray::extend_values`] and [`MmapArray::from_reader`], which keep
/// whatever they appended before failing.
pub struct MmapArray {
    tag: ArrayTag,
    geometry: Geometry,
    buffer: MappedBuffer,
}

impl MmapArray {
    fn from_parts(tag: ArrayTag, mapping: Box<dyn Mapping>, byte_len: usize) -> Result<Self> {
        Ok(Self {
            tag,
            geometry: Geometry::new(tag.itemsize()),
            buffer: MappedBuffer::new(mapping, byte_len)?,
        })
    }

    fn detached(tag: ArrayTag, bytes: &[u8]) -> Result<Self> {
        Self::from_parts(tag, Box::new(HeapMapping::from_bytes(bytes)), bytes.len())
    }

    /// Constructs a new empty array backed by anonymous shared memory.
    pub fn new(tag: ArrayTag) -> Result<Self> {
        Self::from_parts(tag, anonymous(&[])?, 0)
    }

    /// Constructs a new empty array from a typecode such as `'i'` or `'d'`.
    pub fn from_typecode(code: char) -> Result<Self> {
        Self::new(ArrayTag::from_typecode(code)?)
    }

    /// Adopts an existing mapping, treating its contents as elements.
    ///
    /// A trailing partial element is ignored.
    pub fn new_in(tag: ArrayTag, mapping: Box<dyn Mapping>) -> Result<Self> {
        let geometry = Geometry::new(tag.itemsize());
        let mapped = mapping.len();
        let byte_len = geometry.truncate(mapped);
        if byte_len != mapped {
            warn!(
                typecode = %tag.typecode(),
                mapped,
                kept = byte_len,
                "ignoring trailing partial element"
            );
        }
        debug!(
            typecode = %tag.typecode(),
            len = byte_len / geometry.itemsize(),
            read_only = mapping.is_read_only(),
            "adopted mapping"
        );
        Self::from_parts(tag, mapping, byte_len)
    }

    /// Constructs an array holding `input`, optionally in an explicit mapping.
    ///
    /// The input is validated in full before anything is created, so a bad
    /// value leaves nothing behind. With an explicit mapping, the input is
    /// appended after the mapping's existing elements.
    pub fn with_input(
        tag: ArrayTag,
        input: ConstructionInput<'_>,
        mapping: Option<Box<dyn Mapping>>,
    ) -> Result<Self> {
        let geometry = Geometry::new(tag.itemsize());
        let data: Cow<'_, [u8]> = match input {
            ConstructionInput::Bytes(bytes) => {
                geometry.element_count(bytes.len())?;
                Cow::Borrowed(bytes)
            }
            ConstructionInput::Text(text) => Cow::Owned(encode_text(tag, text)?),
            ConstructionInput::Array(other) => {
                if other.tag != tag {
                    return Err(ArrayError::TagMismatch {
                        expected: tag,
                        found: other.tag,
                    });
                }
                Cow::Borrowed(other.buffer.bytes())
            }
            ConstructionInput::Values(values) => Cow::Owned(pack_all(tag, &values)?),
        };
        match mapping {
            Some(mapping) => {
                let mut res = Self::new_in(tag, mapping)?;
                res.append_bytes(&data)?;
                Ok(res)
            }
            None => Self::from_parts(tag, anonymous(&data)?, data.len()),
        }
    }

    /// Returns the number of elements in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len() / self.geometry.itemsize()
    }

    /// Returns `true` if the array is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the element type.
    #[must_use]
    pub fn element_type(&self) -> ArrayTag {
        self.tag
    }

    /// Returns the canonical typecode of the element type.
    #[must_use]
    pub fn typecode(&self) -> char {
        self.tag.typecode()
    }

    /// Returns the width of one element in bytes.
    #[must_use]
    pub fn itemsize(&self) -> usize {
        self.geometry.itemsize()
    }

    /// Returns the current address of the mapping and the byte length of the
    /// elements. The address is only meaningful until the next mutation.
    #[must_use]
    pub fn buffer_info(&self) -> (usize, usize) {
        (self.buffer.base_address() as usize, self.buffer.len())
    }

    /// Returns `true` if the underlying mapping rejects writes.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.buffer.is_read_only()
    }

    fn element(&self, index: usize) -> Value {
        let offset = self.geometry.byte_offset(index);
        self.tag
            .unpack(&self.buffer.bytes()[offset..offset + self.itemsize()])
    }

    fn store(&mut self, index: usize, packed: &[u8; 8]) -> Result<()> {
        let offset = self.geometry.byte_offset(index);
        let itemsize = self.itemsize();
        self.buffer.write(offset, &packed[..itemsize])
    }

    fn gather(&self, resolved: &ResolvedSlice) -> Vec<u8> {
        let bytes = self.buffer.bytes();
        let itemsize = self.itemsize();
        if resolved.step == 1 {
            let offset = self.geometry.byte_offset(resolved.start as usize);
            return bytes[offset..offset + self.geometry.byte_len(resolved.len)].to_vec();
        }
        let mut out = Vec::with_capacity(self.geometry.byte_len(resolved.len));
        for index in resolved.indices() {
            let offset = self.geometry.byte_offset(index);
            out.extend_from_slice(&bytes[offset..offset + itemsize]);
        }
        out
    }

    // Replaces elements `[start, stop)` with `data`, moving the tail as needed
    fn splice(&mut self, start: usize, stop: usize, data: &[u8]) -> Result<()> {
        let replacement = self.geometry.element_count(data.len())?;
        let delta = self
            .geometry
            .byte_delta(replacement as isize - (stop - start) as isize);
        let size = self.buffer.len();
        let pos = self.geometry.byte_offset(stop);
        let tail = size - pos;
        match delta.cmp(&0) {
            Ordering::Greater => {
                let grow = delta as usize;
                self.buffer.resize(size + grow)?;
                self.buffer.move_bytes(pos + grow, pos, tail)?;
            }
            Ordering::Less => {
                let shrink = delta.unsigned_abs();
                let dropped = self.buffer.read(pos - shrink, shrink)?.to_vec();
                self.buffer.move_bytes(pos - shrink, pos, tail)?;
                if let Err(e) = self.buffer.resize(size - shrink) {
                    // Put the tail and the dropped elements back
                    self.buffer.move_bytes(pos, pos - shrink, tail)?;
                    self.buffer.write(pos - shrink, &dropped)?;
                    return Err(e);
                }
            }
            Ordering::Equal => {}
        }
        self.buffer.write(self.geometry.byte_offset(start), data)
    }

    fn check_tag(&self, other: &MmapArray) -> Result<()> {
        if other.tag == self.tag {
            Ok(())
        } else {
            Err(ArrayError::TagMismatch {
                expected: self.tag,
                found: other.tag,
            })
        }
    }

    /// Returns the element at `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<Value> {
        let index = slice::resolve_index(index, self.len())?;
        Ok(self.element(index))
    }

    /// Overwrites the element at `index`; negative indices count from the end.
    pub fn set(&mut self, index: isize, value: impl Into<Value>) -> Result<()> {
        let index = slice::resolve_index(index, self.len())?;
        let packed = self.tag.pack(&value.into())?;
        self.store(index, &packed)
    }

    /// Copies the elements selected by `spec` into a new detached array.
    ///
    /// The copy lives on the heap and is unaffected by later changes to this
    /// array.
    pub fn get_slice(&self, spec: impl Into<SliceSpec>) -> Result<MmapArray> {
        let resolved = slice::resolve_slice(&spec.into(), self.len())?;
        Self::detached(self.tag, &self.gather(&resolved))
    }

    /// Assigns `value` to the elements selected by `spec`.
    ///
    /// A step of 1 replaces the run with `value` whatever its length, growing
    /// or shrinking the array. Any other step requires `value` to have exactly
    /// as many elements as the slice selects.
    pub fn set_slice(&mut self, spec: impl Into<SliceSpec>, value: &MmapArray) -> Result<()> {
        self.check_tag(value)?;
        let resolved = slice::resolve_slice(&spec.into(), self.len())?;
        if resolved.step == 1 {
            let start = resolved.start as usize;
            return self.splice(start, start + resolved.len, value.buffer.bytes());
        }
        if value.len() != resolved.len {
            return Err(ArrayError::LengthMismatch {
                expected: resolved.len,
                found: value.len(),
            });
        }
        let itemsize = self.itemsize();
        let source = value.buffer.bytes();
        for (k, index) in resolved.indices().enumerate() {
            let from = self.geometry.byte_offset(k);
            self.buffer.write(
                self.geometry.byte_offset(index),
                &source[from..from + itemsize],
            )?;
        }
        Ok(())
    }

    /// Copies elements `[i, j)` into a new detached array, clamping both
    /// bounds into range without wrapping negative values.
    pub fn get_simple_slice(&self, i: isize, j: isize) -> Result<MmapArray> {
        let (start, stop, _) = slice::resolve_simple(i, j, self.len());
        let range = self.geometry.byte_offset(start)..self.geometry.byte_offset(stop);
        Self::detached(self.tag, &self.buffer.bytes()[range])
    }

    /// Replaces elements `[i, j)` with `value`, clamping as
    /// [`MmapArray::get_simple_slice`] does.
    pub fn set_simple_slice(&mut self, i: isize, j: isize, value: &MmapArray) -> Result<()> {
        self.check_tag(value)?;
        let (start, stop, _) = slice::resolve_simple(i, j, self.len());
        self.splice(start, stop, value.buffer.bytes())
    }

    /// Appends an element to the end of the array.
    pub fn append(&mut self, value: impl Into<Value>) -> Result<()> {
        let packed = self.tag.pack(&value.into())?;
        let len = self.len();
        self.buffer.resize(self.geometry.byte_len(len + 1))?;
        if let Err(e) = self.store(len, &packed) {
            self.buffer.resize(self.geometry.byte_len(len))?;
            return Err(e);
        }
        Ok(())
    }

    /// Inserts an element before position `index`.
    ///
    /// Out of range positions are clamped to the start or end of the array
    /// instead of failing.
    pub fn insert(&mut self, index: isize, value: impl Into<Value>) -> Result<()> {
        let packed = self.tag.pack(&value.into())?;
        let len = self.len();
        let index = if index < 0 {
            index.saturating_add(isize::try_from(len).unwrap_or(isize::MAX)).max(0) as usize
        } else {
            (index as usize).min(len)
        };
        let size = self.buffer.len();
        let pos = self.geometry.byte_offset(index);
        self.buffer.resize(size + self.itemsize())?;
        self.buffer
            .move_bytes(pos + self.itemsize(), pos, size - pos)?;
        self.store(index, &packed)
    }

    /// Removes and returns the element at `index`; negative indices count from
    /// the end.
    pub fn pop(&mut self, index: isize) -> Result<Value> {
        let index = slice::resolve_index(index, self.len())?;
        let value = self.element(index);
        self.splice(index, index + 1, &[])?;
        Ok(value)
    }

    /// Removes and returns the last element.
    pub fn pop_last(&mut self) -> Result<Value> {
        self.pop(-1)
    }

    /// Removes the first element equal to `value`.
    pub fn remove(&mut self, value: impl Into<Value>) -> Result<()> {
        let index = self.index(value)?;
        self.pop(index as isize).map(|_| ())
    }

    /// Returns the position of the first element equal to `value`.
    pub fn index(&self, value: impl Into<Value>) -> Result<usize> {
        let value = value.into();
        self.iter()
            .position(|item| item == value)
            .ok_or(ArrayError::NotFound(value))
    }

    /// Counts the elements equal to `value`.
    #[must_use]
    pub fn count(&self, value: impl Into<Value>) -> usize {
        let value = value.into();
        self.iter().filter(|item| *item == value).count()
    }

    fn append_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.geometry.element_count(data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let pos = self.buffer.len();
        self.buffer.resize(pos + data.len())?;
        self.buffer.write(pos, data)
    }

    /// Appends every element of `other`, which must have the same element type.
    pub fn extend(&mut self, other: &MmapArray) -> Result<()> {
        self.check_tag(other)?;
        self.append_bytes(other.buffer.bytes())
    }

    /// Appends a copy of the elements of this array selected by `spec`.
    ///
    /// The selected elements are captured before the array grows, so
    /// `a.extend_from_within(..)` doubles `a`.
    pub fn extend_from_within(&mut self, spec: impl Into<SliceSpec>) -> Result<()> {
        let resolved = slice::resolve_slice(&spec.into(), self.len())?;
        let data = self.gather(&resolved);
        self.append_bytes(&data)
    }

    /// Appends values one by one.
    ///
    /// Values are packed until the first one that does not fit; those packed
    /// so far are kept and the failure is reported as
    /// [`ArrayError::PartiallyApplied`]. If the very first value fails, its
    /// error is returned unchanged and the array is untouched.
    pub fn extend_values<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let itemsize = self.itemsize();
        let mut data = Vec::new();
        let mut failure = None;
        for value in values {
            match self.tag.pack(&value.into()) {
                Ok(packed) => data.extend_from_slice(&packed[..itemsize]),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        self.append_bytes(&data)?;
        match failure {
            None => Ok(()),
            Some(cause) if data.is_empty() => Err(cause),
            Some(cause) => Err(ArrayError::PartiallyApplied {
                applied: data.len() / itemsize,
                cause: Box::new(cause),
            }),
        }
    }

    /// Appends the values of a list, as [`MmapArray::extend_values`] does.
    pub fn from_list(&mut self, values: &[Value]) -> Result<()> {
        self.extend_values(values.iter().cloned())
    }

    /// Appends raw native-order element bytes, which must be a whole number
    /// of elements.
    pub fn from_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.append_bytes(data)
    }

    /// Reads up to `n` elements from `reader` and appends them.
    ///
    /// If the stream ends early, the whole elements that were read are kept
    /// and [`ArrayError::Incomplete`] is returned.
    pub fn from_reader<R: Read>(&mut self, reader: R, n: usize) -> Result<()> {
        let wanted = n
            .checked_mul(self.itemsize())
            .ok_or(ArrayError::SizeTooLarge(n))?;
        let mut data = Vec::new();
        reader.take(wanted as u64).read_to_end(&mut data)?;
        if data.len() < wanted {
            let whole = self.geometry.truncate(data.len());
            self.append_bytes(&data[..whole])?;
            return Err(ArrayError::Incomplete {
                requested: n,
                read: whole / self.itemsize(),
            });
        }
        self.append_bytes(&data)
    }

    /// Copies the elements out as native-order bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.bytes().to_vec()
    }

    /// Copies the elements out as values.
    #[must_use]
    pub fn to_list(&self) -> Vec<Value> {
        self.iter().collect()
    }

    /// Writes the elements to `writer` as native-order bytes.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.buffer.bytes())?;
        Ok(())
    }

    /// Appends the characters of `text`. Only valid for wide character arrays.
    pub fn from_text(&mut self, text: &str) -> Result<()> {
        let data = encode_text(self.tag, text)?;
        self.append_bytes(&data)
    }

    /// Collects the characters of a wide character array into a string.
    pub fn to_text(&self) -> Result<String> {
        if self.tag != ArrayTag::WideChar {
            return Err(ArrayError::NotText(self.tag));
        }
        Ok(self
            .iter()
            .map(|value| match value {
                Value::Char(c) => c,
                _ => char::REPLACEMENT_CHARACTER,
            })
            .collect())
    }

    /// Copies the array into a new anonymous mapping.
    pub fn try_clone(&self) -> Result<MmapArray> {
        Self::from_parts(self.tag, anonymous(self.buffer.bytes())?, self.buffer.len())
    }

    /// Returns a new array holding this array followed by `other`.
    pub fn concat(&self, other: &MmapArray) -> Result<MmapArray> {
        self.check_tag(other)?;
        let mut res = self.try_clone()?;
        res.extend(other)?;
        Ok(res)
    }

    /// Returns a new array holding `n` copies of this one; empty if `n <= 0`.
    pub fn repeated(&self, n: isize) -> Result<MmapArray> {
        if n <= 0 {
            return Self::new(self.tag);
        }
        let mut res = self.try_clone()?;
        res.repeat_in_place(n)?;
        Ok(res)
    }

    /// Repeats the contents `n` times in place; `n <= 0` empties the array.
    ///
    /// The filled prefix is doubled on each pass, so this takes a logarithmic
    /// number of copies.
    pub fn repeat_in_place(&mut self, n: isize) -> Result<()> {
        if n <= 0 {
            return self.buffer.resize(0);
        }
        if n == 1 {
            return Ok(());
        }
        let size = self.buffer.len();
        let target = size
            .checked_mul(n as usize)
            .ok_or(ArrayError::SizeTooLarge(size))?;
        self.buffer.resize(target)?;
        let mut filled = size;
        while filled < target {
            let chunk = filled.min(target - filled);
            self.buffer.move_bytes(filled, 0, chunk)?;
            filled += chunk;
        }
        Ok(())
    }

    /// Reverses the order of the elements in place.
    pub fn reverse(&mut self) -> Result<()> {
        let itemsize = self.itemsize();
        let bytes = self.buffer.bytes_mut()?;
        // Reversing every byte flips the element order and each element's
        // bytes; the second pass puts the bytes of each element back.
        bytes.reverse();
        for element in bytes.chunks_exact_mut(itemsize) {
            element.reverse();
        }
        Ok(())
    }

    /// Reverses the byte order of every element in place.
    pub fn byteswap(&mut self) -> Result<()> {
        let itemsize = self.itemsize();
        match itemsize {
            1 => Ok(()),
            2 | 4 | 8 => {
                for element in self.buffer.bytes_mut()?.chunks_exact_mut(itemsize) {
                    element.reverse();
                }
                Ok(())
            }
            _ => Err(ArrayError::ByteswapWidth(itemsize)),
        }
    }

    /// Returns an iterator over the elements as values.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            array: self,
            range: 0..self.len(),
        }
    }

    /// Views the elements as a typed slice.
    ///
    /// Returns `None` only if the mapping is not aligned for the element type.
    #[must_use]
    pub fn as_view(&self) -> Option<ArrayView<'_>> {
        ArrayView::new(self.tag, self.buffer.bytes())
    }
}

/// Iterator over the elements of an [`MmapArray`]
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    array: &'a MmapArray,
    range: Range<usize>,
}

impl Iterator for Iter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        self.range.next().map(|i| self.array.element(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.range.next_back().map(|i| self.array.element(i))
    }
}

impl ExactSizeIterator for Iter<'_> {
    fn len(&self) -> usize {
        self.range.len()
    }
}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a MmapArray {
    type Item = Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for MmapArray {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl PartialOrd for MmapArray {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        for (a, b) in self.iter().zip(other.iter()) {
            match a.partial_cmp(&b) {
                Some(Ordering::Equal) => continue,
                res => return res,
            }
        }
        Some(self.len().cmp(&other.len()))
    }
}

impl Debug for MmapArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MmapArray({:?}", self.typecode())?;
        if !self.is_empty() {
            f.write_str(", [")?;
            for (i, value) in self.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", value)?;
            }
            f.write_str("]")?;
        }
        f.write_str(")")
    }
}

impl Serialize for MmapArray {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for value in self {
            seq.serialize_element(&value)?;
        }
        seq.end()
    }
}
