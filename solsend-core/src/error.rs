use std::fmt::{self, Display};

use serde::Serialize;
use thiserror::Error;

use crate::amount::AmountError;
use crate::capability::{LedgerError, SignerError};
use crate::types::Signature;

/// External call that failed with a network error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStage {
    Freshness,
    Broadcast,
}

impl Display for NetworkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkStage::Freshness => "blockhash fetch",
            NetworkStage::Broadcast => "broadcast",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("no wallet connected; connect a signer first")]
    NoSignerConnected,

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("transaction was not signed: {0}")]
    SignerRejected(#[source] SignerError),

    #[error("network error during {stage}: {source}")]
    Network {
        stage: NetworkStage,
        #[source]
        source: LedgerError,
    },

    #[error("ledger rejected transaction {signature}: {reason}")]
    LedgerRejected { signature: Signature, reason: String },

    #[error("outcome of transaction {signature} is unknown: {reason}")]
    ConfirmationUnknown { signature: Signature, reason: String },
}

/// Failure classification surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NoSignerConnected,
    InvalidAmount,
    SignerRejected,
    NetworkError,
    ConfirmationUnknown,
}

impl ErrorKind {
    /// Stable machine-readable code for agent output.
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::NoSignerConnected => "E_NO_SIGNER",
            ErrorKind::InvalidAmount => "E_INVALID_AMOUNT",
            ErrorKind::SignerRejected => "E_SIGNER_REJECTED",
            ErrorKind::NetworkError => "E_NETWORK",
            ErrorKind::ConfirmationUnknown => "E_CONFIRMATION_UNKNOWN",
        }
    }

    /// Rejected before any external call; the user can fix input and retry.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::NoSignerConnected | ErrorKind::InvalidAmount)
    }
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::NoSignerConnected => ErrorKind::NoSignerConnected,
            TransferError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            TransferError::SignerRejected(_) => ErrorKind::SignerRejected,
            TransferError::Network { .. } | TransferError::LedgerRejected { .. } => {
                ErrorKind::NetworkError
            }
            TransferError::ConfirmationUnknown { .. } => ErrorKind::ConfirmationUnknown,
        }
    }

    /// Transaction id, when the failure happened after broadcast.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            TransferError::LedgerRejected { signature, .. }
            | TransferError::ConfirmationUnknown { signature, .. } => Some(*signature),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_stable_codes() {
        assert_eq!(TransferError::NoSignerConnected.kind().code(), "E_NO_SIGNER");
        assert_eq!(
            TransferError::InvalidAmount(AmountError::NotPositive).kind(),
            ErrorKind::InvalidAmount
        );
        assert_eq!(
            TransferError::LedgerRejected {
                signature: Signature::placeholder(),
                reason: "InstructionError".to_string(),
            }
            .kind(),
            ErrorKind::NetworkError
        );
    }

    #[test]
    fn only_pre_flight_failures_are_recoverable() {
        assert!(ErrorKind::NoSignerConnected.is_recoverable());
        assert!(ErrorKind::InvalidAmount.is_recoverable());
        assert!(!ErrorKind::SignerRejected.is_recoverable());
        assert!(!ErrorKind::NetworkError.is_recoverable());
        assert!(!ErrorKind::ConfirmationUnknown.is_recoverable());
    }

    #[test]
    fn network_error_names_the_stage() {
        let err = TransferError::Network {
            stage: NetworkStage::Broadcast,
            source: LedgerError::Http(503),
        };
        assert_eq!(
            err.to_string(),
            "network error during broadcast: rpc returned HTTP 503"
        );
    }
}
