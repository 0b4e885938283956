//! Bit-field helpers for codewords wider than a machine word

/// Trait for bit-level operations on integers
pub trait BitSlice {
    /// Get a range of bits [start..end) (0-based, LSB is 0)
    /// Panics if range is out of bounds or start > end
    fn bit_range(&self, range: std::ops::Range<usize>) -> u64;

    /// Set a single bit at position (0-based, LSB is 0)
    /// Panics if pos >= 64
    fn set_bit(&mut self, pos: usize, value: bool);
}

impl BitSlice for u64 {
    #[inline(always)]
    fn bit_range(&self, range: std::ops::Range<usize>) -> u64 {
        assert!(range.end <= 64, "Bit range end out of bounds");
        assert!(range.start <= range.end, "Invalid bit range");

        if range.start == range.end {
            return 0;
        }
        (self >> range.start) & low_mask(range.end - range.start)
    }

    #[inline(always)]
    fn set_bit(&mut self, pos: usize, value: bool) {
        assert!(pos < 64, "Bit position out of bounds");
        if value {
            *self |= 1 << pos;
        } else {
            *self &= !(1 << pos);
        }
    }
}

/// Parity of all bits in `value` (true when the number of ones is odd)
#[inline(always)]
pub fn xor_reduce(value: u32) -> bool {
    value.count_ones() & 1 == 1
}

#[inline(always)]
fn low_mask(width: usize) -> u64 {
    if width == 64 { u64::MAX } else { (1 << width) - 1 }
}

/// Fixed-width bit vector made of `N` little-endian 64-bit limbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideBits<const N: usize> {
    limbs: [u64; N],
}

impl<const N: usize> Default for WideBits<N> {
    fn default() -> Self {
        Self { limbs: [0; N] }
    }
}

impl<const N: usize> WideBits<N> {
    pub const BITS: usize = N * 64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` into bits [offset..offset + width)
    /// A field may straddle two limbs; width is at most 64
    pub fn set_field(&mut self, offset: usize, width: usize, value: u64) {
        assert!(width >= 1 && width <= 64, "Invalid field width");
        assert!(offset + width <= Self::BITS, "Bit range end out of bounds");
        assert!(value & !low_mask(width) == 0, "Value too large for bit range");

        let limb = offset / 64;
        let shift = offset % 64;
        let mask = low_mask(width);

        self.limbs[limb] = (self.limbs[limb] & !(mask << shift)) | (value << shift);
        if shift + width > 64 {
            let spill = 64 - shift;
            self.limbs[limb + 1] = (self.limbs[limb + 1] & !(mask >> spill)) | (value >> spill);
        }
    }

    /// Read bits [offset..offset + width)
    pub fn field(&self, offset: usize, width: usize) -> u64 {
        assert!(width >= 1 && width <= 64, "Invalid field width");
        assert!(offset + width <= Self::BITS, "Bit range end out of bounds");

        let limb = offset / 64;
        let shift = offset % 64;
        let mut value = self.limbs[limb] >> shift;
        if shift + width > 64 {
            value |= self.limbs[limb + 1] << (64 - shift);
        }
        value & low_mask(width)
    }
}
