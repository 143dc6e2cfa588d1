//! Card service identification

use std::fmt;

/// Kind of high-level card service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    /// Block/sector storage on memory cards
    Storage,

    /// Access control credential read-out
    AccessControl,

    /// Challenge-response authentication
    ChallengeResponse,

    /// NDEF tag read/write
    NfcTag,

    /// UID rewriting on changeable-UID cards
    UidChanger,

    /// Card holder identity data
    Identity,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Storage => "Storage",
            Self::AccessControl => "AccessControl",
            Self::ChallengeResponse => "ChallengeResponse",
            Self::NfcTag => "NfcTag",
            Self::UidChanger => "UidChanger",
            Self::Identity => "Identity",
        };
        f.write_str(name)
    }
}
