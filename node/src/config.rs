//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use lattice_types::Network;

use crate::error::NodeError;

/// Configuration for a node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// UDP/TCP listen endpoint.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Initial peer endpoints (host:port).
    #[serde(default)]
    pub peers: Vec<String>,

    /// Which network to participate in.
    #[serde(default)]
    pub network: Network,

    /// Whether to accept IPv6 peers.
    #[serde(default)]
    pub enable_ipv6: bool,

    /// Maximum number of peers to track.
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,

    /// Data directory for the ledger store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_addr() -> String {
    "0.0.0.0:7075".to_string()
}

fn default_max_peers() -> usize {
    15
}

fn default_data_dir() -> PathBuf {
    // the embedding application normally overrides this with a
    // $HOME-derived location
    PathBuf::from("./lattice/db")
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            peers: Vec::new(),
            network: Network::Live,
            enable_ipv6: false,
            max_peers: default_max_peers(),
            data_dir: default_data_dir(),
        }
    }
}
