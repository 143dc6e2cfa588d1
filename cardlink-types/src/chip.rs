//! Chip identification

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Kind of chip a reader reported
///
/// Plain value, carried by the command set and consulted when picking a
/// card service. Readers that cannot identify the medium report
/// [`ChipType::Unknown`] and still get the generic services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipType {
    /// MIFARE Classic, 1K EEPROM (16 sectors of 4 blocks)
    MifareClassic1K,

    /// MIFARE Classic, 4K EEPROM
    MifareClassic4K,

    /// MIFARE DESFire EV1
    DesfireEv1,

    /// Generic ISO 7816 smart card
    Iso7816,

    /// HID Prox 125 kHz tag
    ProxTag,

    /// ISO 14443 tag with no further identification
    GenericTag,

    /// Medium not identified
    Unknown,
}

impl ChipType {
    /// Canonical name, as reported by reader detection
    pub fn name(&self) -> &'static str {
        match self {
            Self::MifareClassic1K => "Mifare1K",
            Self::MifareClassic4K => "Mifare4K",
            Self::DesfireEv1 => "DESFireEV1",
            Self::Iso7816 => "ISO7816",
            Self::ProxTag => "Prox",
            Self::GenericTag => "GenericTag",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ChipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChipType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mifare1K" => Ok(Self::MifareClassic1K),
            "Mifare4K" => Ok(Self::MifareClassic4K),
            "DESFireEV1" => Ok(Self::DesfireEv1),
            "ISO7816" => Ok(Self::Iso7816),
            "Prox" => Ok(Self::ProxTag),
            "GenericTag" => Ok(Self::GenericTag),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(Error::Parse(format!("unknown chip type: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        let all = [
            ChipType::MifareClassic1K,
            ChipType::MifareClassic4K,
            ChipType::DesfireEv1,
            ChipType::Iso7816,
            ChipType::ProxTag,
            ChipType::GenericTag,
            ChipType::Unknown,
        ];
        for chip in all {
            assert_eq!(chip.name().parse::<ChipType>().unwrap(), chip);
        }
    }

    #[test]
    fn test_unknown_string_rejected() {
        assert!("NotAChip".parse::<ChipType>().is_err());
    }
}
