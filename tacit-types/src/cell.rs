use crate::tag::Tag;
use core::fmt;

/// Quiet-NaN base pattern: sign=0, exponent=0xFF (all ones), mantissa's
/// top bit (the "quiet" bit) set, tag and value bits zeroed. Any cell
/// matching this pattern in its sign-agnostic exponent+quiet-bit bits is a
/// tagged value rather than an ordinary float.
const NAN_BASE: u32 = 0x7FC0_0000;

/// Mask covering the exponent (bits 30-23) and the quiet bit (bit 22).
const NAN_TEST_MASK: u32 = 0x7FC0_0000;

const TAG_SHIFT: u32 = 16;
const TAG_MASK: u32 = 0x3F;
const VALUE_MASK: u32 = 0xFFFF;

/// One 32-bit VM cell: either a finite, non-NaN IEEE-754 float, or a
/// NaN-boxed tagged value carrying a 6-bit tag and a 16-bit payload.
///
/// Bitwise, never arithmetic: cells are moved and compared as raw `u32`
/// bit patterns so that a quiet NaN's payload bits survive every store,
/// even on targets whose FPU might otherwise canonicalize a NaN on load.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cell(u32);

/// The decoded form of a [`Cell`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// An ordinary finite, non-NaN float.
    Number(f32),
    /// A NaN-boxed tagged value.
    Tagged {
        /// The 6-bit tag.
        tag: Tag,
        /// The 16-bit payload.
        value: u16,
    },
}

impl Cell {
    /// Construct a tagged cell from a 6-bit tag and a 16-bit value.
    ///
    /// Round-trips exactly for any `value in [0, 65535]` and any legal
    /// tag: `Cell::tagged(t, v).decode() == Decoded::Tagged { tag: t, value: v }`.
    pub fn tagged(tag: Tag, value: u16) -> Self {
        let bits = NAN_BASE | (((tag as u32) & TAG_MASK) << TAG_SHIFT) | (value as u32);
        Cell(bits)
    }

    /// Construct a cell from an ordinary finite float.
    ///
    /// The caller is responsible for only calling this with finite,
    /// non-NaN values; NaN/infinite inputs are stored bit-for-bit (they are
    /// never produced by this VM's own arithmetic contract except via
    /// `recip(0)`/division by zero, which intentionally yield `Infinity`).
    pub fn number(value: f32) -> Self {
        Cell(value.to_bits())
    }

    /// Construct a cell from its raw little-endian bit pattern.
    pub const fn from_bits(bits: u32) -> Self {
        Cell(bits)
    }

    /// The raw bit pattern, for storing into memory.
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Whether this cell's bits match the tagged-NaN pattern.
    pub const fn is_tagged(self) -> bool {
        (self.0 & NAN_TEST_MASK) == NAN_TEST_MASK
    }

    /// Decode this cell into a [`Decoded`] value.
    pub fn decode(self) -> Decoded {
        if (self.0 & NAN_TEST_MASK) == NAN_TEST_MASK {
            let tag_bits = ((self.0 >> TAG_SHIFT) & TAG_MASK) as u8;
            let value = (self.0 & VALUE_MASK) as u16;
            let tag = Tag::from_u8(tag_bits).unwrap_or(Tag::Number);
            Decoded::Tagged { tag, value }
        } else {
            Decoded::Number(f32::from_bits(self.0))
        }
    }

    /// The tag of this cell, treating ordinary floats as [`Tag::Number`].
    pub fn tag(self) -> Tag {
        match self.decode() {
            Decoded::Number(_) => Tag::Number,
            Decoded::Tagged { tag, .. } => tag,
        }
    }

    /// True if this cell is tagged with `tag`.
    pub fn is_tag(self, tag: Tag) -> bool {
        matches!(self.decode(), Decoded::Tagged { tag: t, .. } if t == tag)
    }

    /// True if this cell is the INTEGER-tagged NIL sentinel (value 0).
    pub fn is_nil(self) -> bool {
        matches!(self.decode(), Decoded::Tagged { tag: Tag::Integer, value: 0 })
    }

    /// The NIL sentinel cell.
    pub fn nil() -> Self {
        Cell::tagged(Tag::Integer, 0)
    }

    /// If this cell is a plain (unboxed) float, return it.
    pub fn as_number(self) -> Option<f32> {
        match self.decode() {
            Decoded::Number(n) => Some(n),
            Decoded::Tagged { .. } => None,
        }
    }

    /// If this cell is tagged `tag`, return its 16-bit payload.
    pub fn as_tagged_value(self, tag: Tag) -> Option<u16> {
        match self.decode() {
            Decoded::Tagged { tag: t, value } if t == tag => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Decoded::Number(n) => write!(f, "Cell::Number({n})"),
            Decoded::Tagged { tag, value } => write!(f, "Cell::Tagged({tag:?}, {value})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn number_round_trips() {
        for n in [0.0f32, 1.0, -1.0, 3.5, -3.5, 65535.0, 1e10, -1e-10] {
            let cell = Cell::number(n);
            assert_eq!(cell.decode(), Decoded::Number(n));
        }
    }

    #[test]
    fn tagged_round_trips_every_tag() {
        use strum::IntoEnumIterator;
        for tag in Tag::iter() {
            for value in [0u16, 1, 255, 256, 65535] {
                let cell = Cell::tagged(tag, value);
                assert_eq!(cell.decode(), Decoded::Tagged { tag, value });
            }
        }
    }

    #[test]
    fn nil_is_integer_zero() {
        assert!(Cell::nil().is_nil());
        assert!(!Cell::tagged(Tag::Integer, 1).is_nil());
        assert!(!Cell::tagged(Tag::List, 0).is_nil());
    }

    #[quickcheck]
    fn quickcheck_tagged_round_trip(raw_tag: u8, value: u16) -> bool {
        let Some(tag) = Tag::from_u8(raw_tag % Tag::COUNT) else {
            return true;
        };
        let cell = Cell::tagged(tag, value);
        cell.decode() == Decoded::Tagged { tag, value }
    }

    #[quickcheck]
    fn quickcheck_finite_number_round_trip(bits: u32) -> bool {
        let n = f32::from_bits(bits);
        if !n.is_finite() {
            return true;
        }
        Cell::number(n).decode() == Decoded::Number(n)
    }

    #[test]
    fn bytes_round_trip_identity() {
        let cell = Cell::tagged(Tag::List, 42);
        let bytes = cell.to_bits().to_le_bytes();
        let restored = Cell::from_bits(u32::from_le_bytes(bytes));
        assert_eq!(cell, restored);
    }
}
