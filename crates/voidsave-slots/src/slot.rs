//! Session slot addressing

use crate::error::{Error, Result};
use std::fmt;
use voidsave_core::SESSION_SLOTS;

/// Index of a session slot, always below [`SESSION_SLOTS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u8);

impl SlotId {
    pub fn new(index: usize) -> Result<Self> {
        if index < SESSION_SLOTS {
            Ok(Self(index as u8))
        } else {
            Err(Error::SlotOutOfRange(index))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Every slot in ascending order
    pub fn all() -> impl Iterator<Item = SlotId> {
        (0..SESSION_SLOTS as u8).map(SlotId)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        assert_eq!(SlotId::new(4).unwrap().index(), 4);
        assert!(matches!(SlotId::new(5), Err(Error::SlotOutOfRange(5))));
        assert_eq!(SlotId::all().count(), SESSION_SLOTS);
    }
}
