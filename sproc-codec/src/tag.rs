//! Single-byte type tags that prefix every encoded value.
//!
//! The numbering is fixed by the remote consumer and must not change.

/// Type tag of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Fixed-length sequence of values.
    Vector = 1,
    /// Text carried as one byte per character.
    ByteString = 5,
    /// Absent value.
    Null = 7,
    /// Variable list; followed by one extra marker byte after its items.
    List = 8,
    /// Non-negative integer magnitude follows.
    PositiveInteger = 9,
    /// End of the top-level stream. Decodes as `Null`.
    EndOfItems = 10,
    /// Magnitude of a negative integer follows.
    NegativeInteger = 11,
    /// Opaque byte vector.
    ByteVector = 15,
}

impl Tag {
    /// Maps a raw byte to its tag, if it names one.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Tag::Vector),
            5 => Some(Tag::ByteString),
            7 => Some(Tag::Null),
            8 => Some(Tag::List),
            9 => Some(Tag::PositiveInteger),
            10 => Some(Tag::EndOfItems),
            11 => Some(Tag::NegativeInteger),
            15 => Some(Tag::ByteVector),
            _ => None,
        }
    }

    /// Returns the wire byte of this tag.
    pub fn byte(self) -> u8 {
        self as u8
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> u8 {
        tag.byte()
    }
}
