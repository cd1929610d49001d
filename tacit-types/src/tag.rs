use core::fmt;

/// The closed set of NaN-box tags. Encoded in the low 6 bits of the tagged
/// cell's mantissa, so values above 63 can never occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[repr(u8)]
pub enum Tag {
    /// Reserved for unboxed floats; never written by `to_tagged`, only
    /// produced by `from_tagged` when the cell is an ordinary finite float.
    Number = 0,
    /// Small unsigned integer or sentinel (0 = NIL).
    Integer = 1,
    /// Absolute byte address in the code segment.
    Code = 2,
    /// Byte address in the string segment.
    String = 3,
    /// Payload slot count of an inline list.
    List = 4,
    /// Distance, in cells, back to the owning LIST header. Never emitted by
    /// this implementation, which traverses lists header-first instead, but
    /// retained in the tag space for completeness.
    Link = 5,
    /// Opcode index of a built-in function.
    Builtin = 6,
}

impl Tag {
    /// All tags whose numeric value fits the 6-bit tag field.
    pub const COUNT: u8 = 7;

    /// Reinterpret a 6-bit field as a `Tag`, if it names one of the closed
    /// set of variants.
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Tag::Number),
            1 => Some(Tag::Integer),
            2 => Some(Tag::Code),
            3 => Some(Tag::String),
            4 => Some(Tag::List),
            5 => Some(Tag::Link),
            6 => Some(Tag::Builtin),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
