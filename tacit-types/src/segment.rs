/// Total size of the VM's single linear memory buffer, in bytes.
pub const MEM_SIZE: usize = 65_536;

/// Size, in bytes, of the data stack segment.
pub const STACK_SIZE: usize = 256;
/// Size, in bytes, of the return stack segment.
pub const RSTACK_SIZE: usize = 256;
/// Size, in bytes, of the string digest segment.
pub const STRING_SIZE: usize = 2 * 1024;
/// Size, in bytes, of the code segment.
pub const CODE_SIZE: usize = 8 * 1024;

/// Width, in bytes, of one VM cell.
pub const CELL_SIZE: usize = 4;

/// The closed set of memory segments, in the fixed order their base
/// addresses are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Segment {
    /// Data stack cells.
    Stack,
    /// Return stack cells.
    RStack,
    /// Interned strings.
    String,
    /// Emitted bytecode.
    Code,
}

impl Segment {
    /// The base offset of this segment within the linear buffer.
    pub const fn base(self) -> usize {
        match self {
            Segment::Stack => 0,
            Segment::RStack => STACK_SIZE,
            Segment::String => STACK_SIZE + RSTACK_SIZE,
            Segment::Code => STACK_SIZE + RSTACK_SIZE + STRING_SIZE,
        }
    }

    /// The size, in bytes, of this segment.
    pub const fn size(self) -> usize {
        match self {
            Segment::Stack => STACK_SIZE,
            Segment::RStack => RSTACK_SIZE,
            Segment::String => STRING_SIZE,
            Segment::Code => CODE_SIZE,
        }
    }

    /// One past the last valid address in this segment.
    pub const fn end(self) -> usize {
        self.base() + self.size()
    }
}

static_assertions::const_assert!(
    STACK_SIZE + RSTACK_SIZE + STRING_SIZE + CODE_SIZE <= MEM_SIZE
);

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn segments_are_contiguous_and_in_bounds() {
        let mut expected_base = 0;
        for segment in Segment::iter() {
            assert_eq!(segment.base(), expected_base);
            expected_base += segment.size();
        }
        assert!(expected_base <= MEM_SIZE);
    }
}
