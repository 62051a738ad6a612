//! External capabilities consumed by the transfer workflow.
//!
//! The workflow never holds key material or talks to the network itself.
//! A wallet supplies [`Signer`], a chain client supplies [`LedgerQuery`] and
//! [`LedgerSubmit`]. Implementations live in [`crate::keypair`],
//! [`crate::rpc`], and [`crate::testing`].

use async_trait::async_trait;
use thiserror::Error;

use crate::message::{SignedTransaction, UnsignedTransaction};
use crate::types::{FreshnessToken, Pubkey, Signature};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signing was declined by the user")]
    Rejected,
    #[error("signer is not connected")]
    NotConnected,
    #[error("signer failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("rpc transport error: {0}")]
    Transport(String),
    #[error("rpc returned HTTP {0}")]
    Http(u16),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected rpc response: {0}")]
    InvalidResponse(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

/// What the ledger reports about a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Reached the configured commitment without error.
    Settled,
    /// Included, but execution failed on chain.
    Failed(String),
    /// The freshness token expired before the transaction was observed.
    Expired,
}

/// Wallet holding the sender's key.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Identity of the connected account, if any.
    fn current_identity(&self) -> Option<Pubkey>;

    /// Sign a transaction. May suspend on user interaction and may be declined.
    async fn sign(&self, transaction: UnsignedTransaction) -> Result<SignedTransaction, SignerError>;
}

#[async_trait]
pub trait LedgerQuery: Send + Sync {
    async fn latest_freshness_token(&self) -> Result<FreshnessToken, LedgerError>;

    /// Wait until the ledger settles `signature`, reports it failed, or the
    /// token expires. Implementations may impose their own timeout.
    async fn confirm(
        &self,
        signature: &Signature,
        token: &FreshnessToken,
    ) -> Result<ConfirmationOutcome, LedgerError>;
}

#[async_trait]
pub trait LedgerSubmit: Send + Sync {
    /// Broadcast once; returns the transaction id reported by the ledger.
    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<Signature, LedgerError>;
}
