// ============================================================
// Layer 3 — Bit Width Setting
// ============================================================
// The user picks 8, 16 or 32 bits before training. The value
// is stored in the model document and shown in the stats
// panel, but it never changes the numeric precision of the
// model: every backend computes in f32.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::UserInputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BitWidth {
    Eight,
    Sixteen,
    #[default]
    ThirtyTwo,
}

impl BitWidth {
    pub const ALL: [BitWidth; 3] = [BitWidth::Eight, BitWidth::Sixteen, BitWidth::ThirtyTwo];

    pub fn bits(self) -> u32 {
        match self {
            BitWidth::Eight     => 8,
            BitWidth::Sixteen   => 16,
            BitWidth::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<u32> for BitWidth {
    type Error = UserInputError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        BitWidth::ALL
            .into_iter()
            .find(|b| b.bits() == value)
            .ok_or(UserInputError::InvalidBits(value))
    }
}

impl From<BitWidth> for u32 {
    fn from(b: BitWidth) -> Self {
        b.bits()
    }
}

impl fmt::Display for BitWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_supported_widths() {
        assert_eq!(BitWidth::try_from(8),  Ok(BitWidth::Eight));
        assert_eq!(BitWidth::try_from(16), Ok(BitWidth::Sixteen));
        assert_eq!(BitWidth::try_from(32), Ok(BitWidth::ThirtyTwo));
    }

    #[test]
    fn test_rejects_other_widths() {
        assert_eq!(BitWidth::try_from(4), Err(UserInputError::InvalidBits(4)));
    }

    #[test]
    fn test_serialises_as_plain_integer() {
        let json = serde_json::to_string(&BitWidth::Sixteen).unwrap();
        assert_eq!(json, "16");
        let back: BitWidth = serde_json::from_str("8").unwrap();
        assert_eq!(back, BitWidth::Eight);
        assert!(serde_json::from_str::<BitWidth>("12").is_err());
    }
}
