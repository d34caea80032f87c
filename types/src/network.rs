//! Network identifier and its wire parameters.

use serde::{Deserialize, Serialize};

/// Identifies which lattice network a node participates in. The choice
/// selects the wire magic byte, the genesis record, and the proof-of-work
/// threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The production network.
    Live,
    /// The public beta network.
    Beta,
    /// Local/test network.
    Test,
}

impl Network {
    /// The second wire magic byte for this network.
    pub fn magic(&self) -> u8 {
        match self {
            Self::Live => b'C',
            Self::Beta => b'B',
            Self::Test => b'A',
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Beta => "beta",
            Self::Test => "test",
        }
    }

    /// Default UDP/TCP port.
    pub fn default_port(&self) -> u16 {
        7075
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::Live
    }
}
