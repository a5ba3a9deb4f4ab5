use core::fmt;
use core::num::NonZeroU32;

/// Index of a cell or parallel group within one pack.
///
/// Stored as `index + 1` in a `NonZeroU32`, so `Option<Id>` costs nothing
/// (used for the optional next-in-series link of a cell).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(NonZeroU32);

impl Id {
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// 0-based position.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// 0-based position for slice access.
    pub fn idx(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

pub type CellId = Id;
pub type GroupId = Id;
