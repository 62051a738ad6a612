//! Keypair-file signer.
//!
//! Reads the Solana CLI keypair format (a JSON array of 64 bytes: secret
//! seed followed by public key) and signs with Ed25519. Every signature is
//! gated by an [`Approver`], the stand-in for a wallet's approval prompt.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use thiserror::Error;
use tracing::info;

use crate::capability::{Signer, SignerError};
use crate::message::{SignedTransaction, UnsignedTransaction};
use crate::types::{Pubkey, Signature};

const KEYPAIR_BYTES: usize = 64;

#[derive(Debug, Error)]
pub enum KeypairError {
    #[error("failed to read keypair file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("keypair file is not a JSON byte array: {0}")]
    Format(#[from] serde_json::Error),
    #[error("keypair must be 64 bytes (got {0})")]
    Length(usize),
    #[error("public half of the keypair does not match its secret")]
    Mismatch,
}

/// Decides whether a presented transaction may be signed.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, transaction: &UnsignedTransaction) -> bool;
}

/// Approves everything; for non-interactive use where consent was given up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn approve(&self, _transaction: &UnsignedTransaction) -> bool {
        true
    }
}

pub struct KeypairSigner {
    key: Option<SigningKey>,
    approver: Arc<dyn Approver>,
}

impl KeypairSigner {
    pub fn new(key: SigningKey, approver: Arc<dyn Approver>) -> Self {
        Self {
            key: Some(key),
            approver,
        }
    }

    /// A signer with no account loaded; reports no identity.
    pub fn disconnected(approver: Arc<dyn Approver>) -> Self {
        Self {
            key: None,
            approver,
        }
    }

    pub fn from_bytes(bytes: &[u8], approver: Arc<dyn Approver>) -> Result<Self, KeypairError> {
        let bytes: [u8; KEYPAIR_BYTES] = bytes
            .try_into()
            .map_err(|_| KeypairError::Length(bytes.len()))?;
        let key = SigningKey::from_keypair_bytes(&bytes).map_err(|_| KeypairError::Mismatch)?;
        Ok(Self::new(key, approver))
    }

    pub fn from_json(json: &str, approver: Arc<dyn Approver>) -> Result<Self, KeypairError> {
        let bytes: Vec<u8> = serde_json::from_str(json)?;
        Self::from_bytes(&bytes, approver)
    }

    pub fn from_file(path: &Path, approver: Arc<dyn Approver>) -> Result<Self, KeypairError> {
        let json = std::fs::read_to_string(path).map_err(|source| KeypairError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json, approver)
    }
}

#[async_trait]
impl Signer for KeypairSigner {
    fn current_identity(&self) -> Option<Pubkey> {
        self.key
            .as_ref()
            .map(|key| Pubkey::new(key.verifying_key().to_bytes()))
    }

    async fn sign(&self, transaction: UnsignedTransaction) -> Result<SignedTransaction, SignerError> {
        let key = self.key.as_ref().ok_or(SignerError::NotConnected)?;
        let identity = Pubkey::new(key.verifying_key().to_bytes());
        if transaction.fee_payer != identity {
            return Err(SignerError::Failed(format!(
                "fee payer {} is not the connected account {identity}",
                transaction.fee_payer
            )));
        }

        if !self.approver.approve(&transaction).await {
            info!("signing declined");
            return Err(SignerError::Rejected);
        }

        let signature = key.sign(&transaction.message_bytes());
        Ok(SignedTransaction::new(
            transaction,
            Signature::new(signature.to_bytes()),
        ))
    }
}

/// Check the fee payer's signature over the serialized message.
pub fn verify_signed(transaction: &SignedTransaction) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(&transaction.unsigned().fee_payer.to_bytes()) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&transaction.signature().to_bytes());
    key.verify(&transaction.unsigned().message_bytes(), &signature)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Lamports;
    use crate::types::{FreshnessToken, Hash};

    struct Decline;

    #[async_trait]
    impl Approver for Decline {
        async fn approve(&self, _transaction: &UnsignedTransaction) -> bool {
            false
        }
    }

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[42; 32])
    }

    fn keypair_json() -> String {
        serde_json::to_string(&signing_key().to_keypair_bytes().to_vec()).unwrap()
    }

    fn unsigned(fee_payer: Pubkey) -> UnsignedTransaction {
        UnsignedTransaction::new(
            fee_payer,
            Pubkey::new([2; 32]),
            Lamports::new(1_000),
            FreshnessToken {
                blockhash: Hash::new([3; 32]),
                last_valid_block_height: 9,
            },
        )
    }

    #[test]
    fn loads_cli_keypair_json() {
        let signer = KeypairSigner::from_json(&keypair_json(), Arc::new(AutoApprove)).unwrap();
        assert_eq!(
            signer.current_identity(),
            Some(Pubkey::new(signing_key().verifying_key().to_bytes()))
        );
    }

    #[test]
    fn rejects_malformed_keypairs() {
        assert!(matches!(
            KeypairSigner::from_json("[1,2,3]", Arc::new(AutoApprove)),
            Err(KeypairError::Length(3))
        ));
        assert!(matches!(
            KeypairSigner::from_json("{\"secret\": 1}", Arc::new(AutoApprove)),
            Err(KeypairError::Format(_))
        ));

        let mut bytes = signing_key().to_keypair_bytes();
        bytes[40] ^= 0xff;
        assert!(matches!(
            KeypairSigner::from_bytes(&bytes, Arc::new(AutoApprove)),
            Err(KeypairError::Mismatch)
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        std::fs::write(&path, keypair_json()).unwrap();
        assert!(KeypairSigner::from_file(&path, Arc::new(AutoApprove))
            .unwrap()
            .current_identity()
            .is_some());
    }

    #[tokio::test]
    async fn signs_verifiable_transactions() {
        let signer = KeypairSigner::new(signing_key(), Arc::new(AutoApprove));
        let identity = signer.current_identity().unwrap();

        let signed = signer.sign(unsigned(identity)).await.unwrap();
        assert!(verify_signed(&signed));

        let mut tampered = signed.unsigned().clone();
        tampered.instruction.lamports = Lamports::new(2_000);
        assert!(!verify_signed(&SignedTransaction::new(tampered, signed.signature())));
    }

    #[tokio::test]
    async fn declined_approval_is_a_rejection() {
        let signer = KeypairSigner::new(signing_key(), Arc::new(Decline));
        let identity = signer.current_identity().unwrap();
        assert_eq!(
            signer.sign(unsigned(identity)).await,
            Err(SignerError::Rejected)
        );
    }

    #[tokio::test]
    async fn refuses_foreign_fee_payer_and_missing_key() {
        let signer = KeypairSigner::new(signing_key(), Arc::new(AutoApprove));
        assert!(matches!(
            signer.sign(unsigned(Pubkey::new([9; 32]))).await,
            Err(SignerError::Failed(_))
        ));

        let disconnected = KeypairSigner::disconnected(Arc::new(AutoApprove));
        assert_eq!(disconnected.current_identity(), None);
        assert_eq!(
            disconnected.sign(unsigned(Pubkey::new([9; 32]))).await,
            Err(SignerError::NotConnected)
        );
    }
}
