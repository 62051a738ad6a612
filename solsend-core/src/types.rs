//! Keys, hashes, and request types shared between CLI and core.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::Lamports;

pub const PUBKEY_BYTES: usize = 32;
pub const HASH_BYTES: usize = 32;
pub const SIGNATURE_BYTES: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("{kind} is empty")]
    Empty { kind: &'static str },
    #[error("{kind} is not valid base58")]
    InvalidBase58 { kind: &'static str },
    #[error("{kind} must decode to {expected} bytes (got {actual})")]
    WrongLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

fn decode_base58<const N: usize>(input: &str, kind: &'static str) -> Result<[u8; N], KeyError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(KeyError::Empty { kind });
    }
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|_| KeyError::InvalidBase58 { kind })?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| KeyError::WrongLength {
        kind,
        expected: N,
        actual: bytes.len(),
    })
}

macro_rules! base58_bytes {
    ($name:ident, $len:expr, $kind:literal) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(&self) -> [u8; $len] {
                self.0
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_base58::<$len>(s, $kind).map(Self)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&bs58::encode(self.0).into_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

base58_bytes!(Pubkey, PUBKEY_BYTES, "public key");
base58_bytes!(Hash, HASH_BYTES, "blockhash");
base58_bytes!(Signature, SIGNATURE_BYTES, "signature");

impl Signature {
    /// All-zero placeholder occupying a signature slot before signing.
    pub const fn placeholder() -> Self {
        Self([0; SIGNATURE_BYTES])
    }
}

/// Native System Program id (`11111111111111111111111111111111`).
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new([0; PUBKEY_BYTES]);

/// Supported cluster selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
}

impl Cluster {
    /// Stable string identifier used in JSON output and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
        }
    }

    /// Public RPC endpoint for the cluster.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }
}

impl Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger commitment level a transaction must reach to count as settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

/// Recent blockhash plus the last block height at which it is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessToken {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// User intent for one transfer. The sender is read from the signer when the
/// attempt starts, so it is not part of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: Pubkey,
    pub amount: Lamports,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_program_id_encodes_as_ones() {
        assert_eq!(
            SYSTEM_PROGRAM_ID.to_string(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn pubkey_parses_default_recipient() {
        let key: Pubkey = "5e1g9YW3XpsXddudcTiu5XdXN6uYstb3fnpJJrRUZ33t"
            .parse()
            .unwrap();
        assert_eq!(
            key.to_string(),
            "5e1g9YW3XpsXddudcTiu5XdXN6uYstb3fnpJJrRUZ33t"
        );
    }

    #[test]
    fn pubkey_rejects_bad_input() {
        assert!(matches!(
            "".parse::<Pubkey>(),
            Err(KeyError::Empty { .. })
        ));
        assert!(matches!(
            "0OIl".parse::<Pubkey>(),
            Err(KeyError::InvalidBase58 { .. })
        ));
        assert!(matches!(
            "3yZe7d".parse::<Pubkey>(),
            Err(KeyError::WrongLength { expected: 32, .. })
        ));
    }

    #[test]
    fn signature_roundtrips_through_serde() {
        let sig = Signature::new([7; SIGNATURE_BYTES]);
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn cluster_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Cluster::MainnetBeta).unwrap(),
            "\"mainnet-beta\""
        );
        assert_eq!(Cluster::default(), Cluster::Devnet);
    }

    #[test]
    fn commitment_orders_by_strength() {
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
    }
}
