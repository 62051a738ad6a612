//! Final outcome notifications for human and agent modes.

use serde::Serialize;

use crate::error::{ErrorKind, TransferError};
use crate::types::{Cluster, Signature};
use crate::workflow::SubmissionResult;

/// Human (TTY) vs Agent (non-interactive) output selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Approved,
    Failed,
    /// Broadcast happened but settlement was not observed.
    Unknown,
}

/// What the user is told once an attempt ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub status: NotificationStatus,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    /// Rejected before any external call; fixing the input is enough to retry.
    #[serde(skip)]
    pub recoverable: bool,
}

impl Notification {
    pub fn approved(signature: Signature, cluster: Cluster) -> Self {
        Self {
            status: NotificationStatus::Approved,
            title: "Transaction approved".to_string(),
            message: format!("Transaction approved! TXID: {signature}"),
            code: None,
            signature: Some(signature),
            explorer_url: Some(explorer_url(&signature, cluster)),
            recoverable: false,
        }
    }

    pub fn from_error(err: &TransferError, cluster: Cluster) -> Self {
        let kind = err.kind();
        let signature = err.signature();
        let (status, title) = match kind {
            ErrorKind::ConfirmationUnknown => {
                (NotificationStatus::Unknown, "Transaction outcome unknown")
            }
            ErrorKind::SignerRejected => (NotificationStatus::Failed, "Transaction canceled"),
            ErrorKind::NoSignerConnected => (NotificationStatus::Failed, "Wallet not connected"),
            ErrorKind::InvalidAmount => (NotificationStatus::Failed, "Invalid amount"),
            ErrorKind::NetworkError => (NotificationStatus::Failed, "Transaction failed"),
        };

        let mut message = err.to_string();
        if kind == ErrorKind::ConfirmationUnknown {
            message.push_str(
                ". It may still settle; check the explorer before sending again.",
            );
        }

        Self {
            status,
            title: title.to_string(),
            message,
            code: Some(kind.code()),
            signature,
            explorer_url: signature.map(|sig| explorer_url(&sig, cluster)),
            recoverable: kind.is_recoverable(),
        }
    }

    pub fn from_result(result: &SubmissionResult, cluster: Cluster) -> Self {
        match result {
            Ok(signature) => Self::approved(*signature, cluster),
            Err(err) => Self::from_error(err, cluster),
        }
    }

    /// Process exit code: 0 approved, 1 failed, 3 unknown.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            NotificationStatus::Approved => 0,
            NotificationStatus::Failed => 1,
            NotificationStatus::Unknown => 3,
        }
    }
}

/// Agent-mode error payload for failures outside a transfer attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AgentError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Block explorer link for a transaction.
pub fn explorer_url(signature: &Signature, cluster: Cluster) -> String {
    match cluster {
        Cluster::MainnetBeta => format!("https://explorer.solana.com/tx/{signature}"),
        other => format!(
            "https://explorer.solana.com/tx/{signature}?cluster={}",
            other.as_str()
        ),
    }
}

/// Truncate long addresses for human-readable tables.
pub fn truncate_address(addr: &str) -> String {
    let s = addr.trim();
    if s.chars().count() <= 14 {
        return s.to_string();
    }

    let start: String = s.chars().take(6).collect();
    let end: String = s
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    format!("{start}...{end}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::AmountError;
    use crate::capability::{LedgerError, SignerError};
    use crate::error::NetworkStage;
    use crate::types::SIGNATURE_BYTES;

    fn sig() -> Signature {
        Signature::new([1; SIGNATURE_BYTES])
    }

    #[test]
    fn approved_carries_signature_and_explorer_link() {
        let n = Notification::from_result(&Ok(sig()), Cluster::Devnet);
        assert_eq!(n.status, NotificationStatus::Approved);
        assert_eq!(n.exit_code(), 0);
        assert!(n.message.contains(&sig().to_string()));
        assert!(n.explorer_url.unwrap().ends_with("?cluster=devnet"));
    }

    #[test]
    fn unknown_outcome_is_distinct_from_failure() {
        let err = TransferError::ConfirmationUnknown {
            signature: sig(),
            reason: "timed out".to_string(),
        };
        let n = Notification::from_error(&err, Cluster::MainnetBeta);
        assert_eq!(n.status, NotificationStatus::Unknown);
        assert_eq!(n.exit_code(), 3);
        assert_eq!(n.code, Some("E_CONFIRMATION_UNKNOWN"));
        assert_eq!(
            n.explorer_url.as_deref(),
            Some(format!("https://explorer.solana.com/tx/{}", sig()).as_str())
        );
    }

    #[test]
    fn failures_map_to_titles() {
        let rejected = Notification::from_error(
            &TransferError::SignerRejected(SignerError::Rejected),
            Cluster::Devnet,
        );
        assert_eq!(rejected.title, "Transaction canceled");
        assert_eq!(rejected.exit_code(), 1);
        assert!(rejected.signature.is_none());

        let network = Notification::from_error(
            &TransferError::Network {
                stage: NetworkStage::Freshness,
                source: LedgerError::Timeout(30_000),
            },
            Cluster::Devnet,
        );
        assert_eq!(network.code, Some("E_NETWORK"));

        let amount = Notification::from_error(
            &TransferError::InvalidAmount(AmountError::NotPositive),
            Cluster::Devnet,
        );
        assert_eq!(amount.title, "Invalid amount");
        assert!(amount.recoverable);
        assert!(!rejected.recoverable);
        assert!(!network.recoverable);
    }

    #[test]
    fn notification_serializes_without_empty_fields() {
        let n = Notification::from_error(&TransferError::NoSignerConnected, Cluster::Devnet);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["code"], "E_NO_SIGNER");
        assert!(json.get("signature").is_none());
        assert!(json.get("recoverable").is_none());
    }

    #[test]
    fn truncate_short_address_is_unchanged() {
        assert_eq!(truncate_address("5e1g9Y"), "5e1g9Y");
    }

    #[test]
    fn truncate_long_address() {
        assert_eq!(
            truncate_address("5e1g9YW3XpsXddudcTiu5XdXN6uYstb3fnpJJrRUZ33t"),
            "5e1g9Y...Z33t"
        );
    }
}
