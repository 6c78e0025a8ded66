//! Resolution of indices and slices against a collection length
//!
//! Every resolution is computed fresh from the current length. Negative
//! positions count from the end; slice bounds are clamped rather than
//! rejected, while single indices are strict.

use std::convert::TryFrom;
use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

use crate::error::{ArrayError, Result};

/// A slice request: any of `start`, `stop` and `step` may be omitted
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SliceSpec {
    /// First position, or the natural start for the step direction
    pub start: Option<isize>,
    /// Position one past the end, or the natural end for the step direction
    pub stop: Option<isize>,
    /// Stride, defaults to 1; zero is rejected at resolution
    pub step: Option<isize>,
}

impl SliceSpec {
    /// Builds a slice request from its three optional parts
    #[must_use]
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// The slice covering everything
    #[must_use]
    pub fn full() -> Self {
        Self::default()
    }

    /// Replaces the step
    #[must_use]
    pub fn step_by(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }
}

impl From<Range<isize>> for SliceSpec {
    fn from(r: Range<isize>) -> Self {
        Self::new(Some(r.start), Some(r.end), None)
    }
}

impl From<RangeFrom<isize>> for SliceSpec {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::new(Some(r.start), None, None)
    }
}

impl From<RangeTo<isize>> for SliceSpec {
    fn from(r: RangeTo<isize>) -> Self {
        Self::new(None, Some(r.end), None)
    }
}

impl From<RangeInclusive<isize>> for SliceSpec {
    fn from(r: RangeInclusive<isize>) -> Self {
        let (start, end) = r.into_inner();
        // An inclusive end of -1 means "through the last element", which has no
        // exclusive negative spelling.
        let stop = if end == -1 { None } else { end.checked_add(1) };
        Self::new(Some(start), stop, None)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// Concrete iteration parameters for a slice.
///
/// Iterating `start, start + step, ...` for `len` terms stays in bounds.
/// `stop - start` is an exact multiple of `step` unless `stop` would pass
/// `isize::MAX`, in which case it saturates there; `len` is always exact.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSlice {
    /// First position visited
    pub start: isize,
    /// Position one step past the last visited
    pub stop: isize,
    /// Non-zero stride
    pub step: isize,
    /// Number of positions visited
    pub len: usize,
}

impl ResolvedSlice {
    /// Returns `true` if no positions are visited
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates the positions visited, in order
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let ResolvedSlice {
            start, step, len, ..
        } = *self;
        (0..len).map(move |k| (start + k as isize * step) as usize)
    }
}

/// Either a single position or a slice
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexSpec {
    /// One position, negative counting from the end
    Index(isize),
    /// A slice request
    Slice(SliceSpec),
}

impl From<isize> for IndexSpec {
    fn from(index: isize) -> Self {
        IndexSpec::Index(index)
    }
}

impl From<SliceSpec> for IndexSpec {
    fn from(spec: SliceSpec) -> Self {
        IndexSpec::Slice(spec)
    }
}

/// Result of [`resolve`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// A single in-bounds position
    Point(usize),
    /// A resolved slice
    Range(ResolvedSlice),
}

fn signed_size(size: usize) -> Result<isize> {
    isize::try_from(size).map_err(|_| ArrayError::SizeTooLarge(size))
}

// Remainder with the sign of the divisor
fn floor_mod(a: isize, b: isize) -> isize {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

/// Resolves a single index strictly: the result is in `[0, size)`.
pub fn resolve_index(index: isize, size: usize) -> Result<usize> {
    let len = signed_size(size)?;
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 || resolved >= len {
        return Err(ArrayError::IndexOutOfRange { index, len: size });
    }
    Ok(resolved as usize)
}

/// Resolves a slice request against `size` elements.
pub fn resolve_slice(spec: &SliceSpec, size: usize) -> Result<ResolvedSlice> {
    let size = signed_size(size)?;
    let step = spec.step.unwrap_or(1);
    if step == 0 {
        return Err(ArrayError::ZeroStep);
    }

    let (start, stop, len) = if step < 0 {
        let start = match spec.start {
            None => size - 1,
            Some(s) if s >= size => size - 1,
            Some(s) if s < 0 => {
                if s + size < 0 {
                    // Empty: any stop collapses onto this start below
                    step
                } else {
                    s + size
                }
            }
            Some(s) => s,
        };
        let stop = match spec.stop {
            None => -1,
            Some(s) if s < 0 => (s + size).max(-1),
            Some(s) => s,
        };
        let stop = if stop > start {
            start
        } else {
            stop + floor_mod(start - stop, step)
        };
        debug_assert!(size > start && start >= stop && stop >= step);
        (start, stop, (stop - start) / step)
    } else {
        let start = match spec.start {
            None => 0,
            Some(s) if s >= size => size,
            Some(s) if s < 0 => (s + size).max(0),
            Some(s) => s,
        };
        let stop = match spec.stop {
            None => size,
            Some(s) if s > size => size,
            Some(s) if s < 0 => {
                if s + size < 0 {
                    start
                } else {
                    s + size
                }
            }
            Some(s) => s,
        };
        if stop <= start {
            (start, start, 0)
        } else {
            let len = (stop - start - 1) / step + 1;
            let stop = len
                .checked_mul(step)
                .and_then(|span| start.checked_add(span))
                .unwrap_or(isize::MAX);
            debug_assert!(start < stop && stop.saturating_sub(step) < size);
            (start, stop, len)
        }
    };

    Ok(ResolvedSlice {
        start,
        stop,
        step,
        len: len as usize,
    })
}

/// Resolves either form: single indices strictly, slices by clamping.
pub fn resolve(spec: IndexSpec, size: usize) -> Result<Resolution> {
    match spec {
        IndexSpec::Index(index) => resolve_index(index, size).map(Resolution::Point),
        IndexSpec::Slice(slice) => resolve_slice(&slice, size).map(Resolution::Range),
    }
}

/// Decodes a two-index simple slice into `(start, stop, len)`.
///
/// Both bounds are clamped into `[0, size]` with `stop >= start`; negative
/// values are not wrapped around.
#[must_use]
pub fn resolve_simple(i: isize, j: isize, size: usize) -> (usize, usize, usize) {
    let size = isize::try_from(size).unwrap_or(isize::MAX);
    let start = i.max(0).min(size);
    let stop = j.max(start).min(size);
    (start as usize, stop as usize, (stop - start) as usize)
}
