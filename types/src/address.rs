//! Account addresses and their base32 string codec.
//!
//! An address is a 32-byte Ed25519 public key. Its string form is
//! `nano_` + 52 base32 characters encoding the key + 8 base32 characters
//! encoding a 5-byte byte-reversed Blake2b-40 checksum of the key. The
//! legacy `xrb_` prefix is accepted on parse. The encoder prepends three
//! zero bytes so the 256-bit key falls on a 5-bit boundary, emits 56
//! characters and discards the leading four.

use blake2::digest::consts::U5;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AddressError, HexError};

/// The current address prefix.
pub const ADDRESS_PREFIX: &str = "nano_";
/// The legacy address prefix, still accepted on parse.
pub const ADDRESS_PREFIX_OLD: &str = "xrb_";

/// Base32 alphabet (avoids visually ambiguous 0/O, 2/Z, l, v).
const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const ALPHABET_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < 32 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Number of base32 characters encoding the public key.
const KEY_CHARS: usize = 52;
/// Number of base32 characters encoding the checksum.
const CHECKSUM_CHARS: usize = 8;
/// Encoded length without prefix.
const ENCODED_LEN: usize = KEY_CHARS + CHECKSUM_CHARS;

type Blake2b40 = Blake2b<U5>;

/// A 32-byte account address (an Ed25519 public key).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    pub const SIZE: usize = 32;
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Interpret this address' bytes as a block hash. State blocks use the
    /// account key as the work root for their open block.
    pub fn into_hash(self) -> crate::Hash {
        crate::Hash::new(self.0)
    }

    /// Parse a hash-shaped hex constant into an address.
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        crate::hex::decode_fixed::<32>(s).map(Self)
    }

    /// Parse an address string, accepting both `nano_` and `xrb_` prefixes.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let encoded = if let Some(rest) = s.strip_prefix(ADDRESS_PREFIX) {
            rest
        } else if let Some(rest) = s.strip_prefix(ADDRESS_PREFIX_OLD) {
            rest
        } else {
            // length check first so a short garbage string reports length
            if s.len() != ADDRESS_PREFIX.len() + ENCODED_LEN
                && s.len() != ADDRESS_PREFIX_OLD.len() + ENCODED_LEN
            {
                return Err(AddressError::BadLength);
            }
            return Err(AddressError::BadPrefix);
        };

        if encoded.len() != ENCODED_LEN {
            return Err(AddressError::BadLength);
        }

        // Prepend four zero-valued characters so the 52-character key part
        // decodes on a byte boundary: 56 chars → 35 bytes, key in [3..].
        let mut padded = [0u8; KEY_CHARS + 4];
        padded[..4].copy_from_slice(b"1111");
        padded[4..].copy_from_slice(&encoded.as_bytes()[..KEY_CHARS]);
        let wide: [u8; 35] = decode_base32(&padded).ok_or(AddressError::BadEncoding)?;

        let mut key = [0u8; 32];
        key.copy_from_slice(&wide[3..]);

        let checksum: [u8; 5] = decode_base32(&encoded.as_bytes()[KEY_CHARS..])
            .ok_or(AddressError::BadEncoding)?;
        if checksum != checksum_of(&key) {
            return Err(AddressError::BadChecksum);
        }

        Ok(Self(key))
    }

    /// Byte-reversed Blake2b-40 checksum of the raw key.
    fn checksum(&self) -> [u8; 5] {
        checksum_of(&self.0)
    }
}

fn checksum_of(key: &[u8; 32]) -> [u8; 5] {
    let mut hasher = Blake2b40::new();
    hasher.update(key);
    let digest = hasher.finalize();
    let mut checksum = [0u8; 5];
    for (i, b) in digest.iter().rev().enumerate() {
        checksum[i] = *b;
    }
    checksum
}

/// Encode bytes as base32; the input length must be a multiple of 5 bits
/// worth of output, which holds for the 35- and 5-byte inputs used here.
fn encode_base32(bytes: &[u8], out: &mut String) {
    let mut buffer: u64 = 0;
    let mut bits = 0u32;
    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
}

/// Decode base32 characters into a fixed-size byte array. Returns `None`
/// on invalid characters; the caller guarantees the length lines up.
fn decode_base32<const N: usize>(chars: &[u8]) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits = 0u32;
    let mut out = [0u8; N];
    let mut pos = 0;

    for &c in chars {
        if c >= 128 {
            return None;
        }
        let val = ALPHABET_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            if pos == N {
                return None;
            }
            out[pos] = (buffer >> bits) as u8;
            pos += 1;
        }
    }

    if pos != N {
        return None;
    }
    Some(out)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wide = [0u8; 35];
        wide[3..].copy_from_slice(&self.0);

        let mut encoded = String::with_capacity(56 + CHECKSUM_CHARS);
        encode_base32(&wide, &mut encoded);

        f.write_str(ADDRESS_PREFIX)?;
        f.write_str(&encoded[4..])?;

        let mut checksum = String::with_capacity(CHECKSUM_CHARS);
        encode_base32(&self.checksum(), &mut checksum);
        f.write_str(&checksum)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
