/// Term tags understood by the codec.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tag {
    NewFloat = 70,
    SmallInteger = 97,
    Integer = 98,
    Atom = 100,
    Nil = 106,
    String = 107,
    List = 108,
    Binary = 109,
    SmallBig = 110,
    LargeBig = 111,
    SmallAtom = 115,
    Map = 116,
    AtomUtf8 = 118,
    SmallAtomUtf8 = 119,
}

impl Tag {
    /// Resolves a raw tag byte, `None` for tags this codec does not handle.
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            70 => Self::NewFloat,
            97 => Self::SmallInteger,
            98 => Self::Integer,
            100 => Self::Atom,
            106 => Self::Nil,
            107 => Self::String,
            108 => Self::List,
            109 => Self::Binary,
            110 => Self::SmallBig,
            111 => Self::LargeBig,
            115 => Self::SmallAtom,
            116 => Self::Map,
            118 => Self::AtomUtf8,
            119 => Self::SmallAtomUtf8,
            _ => return None,
        })
    }

    /// Returns `true` for the four atom encodings.
    pub const fn is_atom(self) -> bool {
        matches!(
            self,
            Self::Atom | Self::SmallAtom | Self::AtomUtf8 | Self::SmallAtomUtf8
        )
    }
}
