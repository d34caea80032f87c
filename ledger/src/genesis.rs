//! Genesis records — the first block of each network.

use lattice_blocks::{Block, BlockCommon, OpenBlock};
use lattice_types::{Address, Balance, Hash, Network, Signature};
use lattice_work::{threshold, LIVE_THRESHOLD};

/// The genesis open block of a network, the balance it mints, and the work
/// threshold every block must satisfy.
#[derive(Clone, Debug)]
pub struct Genesis {
    pub block: OpenBlock,
    pub balance: Balance,
    pub work_threshold: u64,
}

const LIVE_GENESIS_KEY: &str = "e89208dd038fbb269987689621d52292ae9c35941a7484756ecced92a65093ba";
const LIVE_GENESIS_WORK: u64 = 0x62f05417dd3fb691;
const LIVE_GENESIS_SIGNATURE: &str =
    "9f0c933c8ade004d808ea1985fa746a7e95ba2a38f867640f53ec8f180bdfe9e\
     2c1268dead7c2664f356e37aba362bc58e46dba03e523a7b5a19e4b6eb12bb02";

impl Genesis {
    /// The live network genesis: the well-known open block whose source,
    /// representative, and account are all the genesis public key, minting
    /// the full 2^128 − 1 raw supply.
    pub fn live() -> Self {
        let key = Address::from_hex(LIVE_GENESIS_KEY)
            .unwrap_or_else(|_| unreachable!("live genesis key constant is valid hex"));
        let signature = Signature::from_hex(LIVE_GENESIS_SIGNATURE)
            .unwrap_or_else(|_| unreachable!("live genesis signature constant is valid hex"));

        Self {
            block: OpenBlock {
                source: key.into_hash(),
                representative: key,
                address: key,
                common: BlockCommon {
                    signature,
                    work: LIVE_GENESIS_WORK,
                },
            },
            balance: Balance::MAX,
            work_threshold: LIVE_THRESHOLD,
        }
    }

    /// The genesis record for the given network. Beta and test currently
    /// share the live genesis block and differ only in work threshold.
    pub fn for_network(network: Network) -> Self {
        let mut genesis = Self::live();
        genesis.work_threshold = threshold(network);
        genesis
    }

    pub fn address(&self) -> Address {
        self.block.address
    }

    pub fn hash(&self) -> Hash {
        Block::Open(self.block).hash()
    }
}
