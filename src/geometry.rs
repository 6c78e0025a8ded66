//! Conversions between element counts and byte lengths

use crate::error::{ArrayError, Result};

/// Element/byte arithmetic for one fixed item width
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    itemsize: usize,
}

impl Geometry {
    /// Geometry for elements of `itemsize` bytes
    ///
    /// # Panics
    ///
    /// Panics if `itemsize` is zero.
    #[must_use]
    pub fn new(itemsize: usize) -> Self {
        assert!(itemsize > 0, "item size must be non-zero");
        Self { itemsize }
    }

    /// Width of one element in bytes
    #[must_use]
    pub fn itemsize(&self) -> usize {
        self.itemsize
    }

    /// Byte offset of element `index`
    #[must_use]
    pub fn byte_offset(&self, index: usize) -> usize {
        index * self.itemsize
    }

    /// Byte length of `count` elements
    #[must_use]
    pub fn byte_len(&self, count: usize) -> usize {
        count * self.itemsize
    }

    /// Number of elements in `byte_len` bytes, which must divide evenly
    pub fn element_count(&self, byte_len: usize) -> Result<usize> {
        if byte_len % self.itemsize != 0 {
            return Err(ArrayError::NotMultiple {
                len: byte_len,
                itemsize: self.itemsize,
            });
        }
        Ok(byte_len / self.itemsize)
    }

    /// Largest whole-element byte length not exceeding `byte_len`
    #[must_use]
    pub fn truncate(&self, byte_len: usize) -> usize {
        byte_len - byte_len % self.itemsize
    }

    /// Byte delta for a signed change in element count
    #[must_use]
    pub fn byte_delta(&self, elements: isize) -> isize {
        elements * self.itemsize as isize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_offsets() {
        let g = Geometry::new(4);
        assert_eq!(g.byte_offset(3), 12);
        assert_eq!(g.byte_len(0), 0);
        assert_eq!(g.element_count(16).unwrap(), 4);
        assert_eq!(g.byte_delta(-2), -8);
        assert_eq!(g.truncate(11), 8);
    }

    #[test]
    fn ragged_lengths_fail() {
        let g = Geometry::new(8);
        assert!(matches!(
            g.element_count(12),
            Err(ArrayError::NotMultiple {
                len: 12,
                itemsize: 8
            })
        ));
    }

    #[test]
    #[should_panic(expected = "item size must be non-zero")]
    fn zero_width_panics() {
        let _ = Geometry::new(0);
    }
}
