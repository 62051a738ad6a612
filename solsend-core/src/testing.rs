//! Scripted capabilities for deterministic testing.
//!
//! These never touch the network or key material. Each one records its
//! calls so tests can assert which external interactions happened.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::capability::{
    ConfirmationOutcome, LedgerError, LedgerQuery, LedgerSubmit, Signer, SignerError,
};
use crate::message::{SignedTransaction, UnsignedTransaction};
use crate::types::{FreshnessToken, Pubkey, Signature, SIGNATURE_BYTES};
use crate::workflow::{TransferObserver, TransferState};

/// Signer whose identity and answer are fixed up front.
pub struct ScriptedSigner {
    identity: Option<Pubkey>,
    failure: Option<SignerError>,
    signature: Signature,
    signed: Mutex<Vec<UnsignedTransaction>>,
    sign_calls: AtomicUsize,
}

impl ScriptedSigner {
    pub fn connected(identity: Pubkey) -> Self {
        Self {
            identity: Some(identity),
            failure: None,
            signature: Signature::new([0xab; SIGNATURE_BYTES]),
            signed: Mutex::new(Vec::new()),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            identity: None,
            ..Self::connected(Pubkey::new([0; 32]))
        }
    }

    /// Every `sign` call is declined by the user.
    pub fn rejecting(self) -> Self {
        self.failing_with(SignerError::Rejected)
    }

    pub fn failing_with(mut self, error: SignerError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Transactions presented for signing, in call order.
    pub fn signed(&self) -> Vec<UnsignedTransaction> {
        self.signed.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Signer for ScriptedSigner {
    fn current_identity(&self) -> Option<Pubkey> {
        self.identity
    }

    async fn sign(&self, transaction: UnsignedTransaction) -> Result<SignedTransaction, SignerError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut signed) = self.signed.lock() {
            signed.push(transaction.clone());
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(SignedTransaction::new(transaction, self.signature)),
        }
    }
}

/// Ledger answering every query from a script.
pub struct ScriptedLedger {
    freshness: Result<FreshnessToken, LedgerError>,
    broadcast: Result<Option<Signature>, LedgerError>,
    confirmation: Result<ConfirmationOutcome, LedgerError>,
    confirm_delay: Option<Duration>,
    broadcasts: Mutex<Vec<SignedTransaction>>,
    confirmations: Mutex<Vec<(Signature, FreshnessToken)>>,
    freshness_calls: AtomicUsize,
    broadcast_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
}

impl ScriptedLedger {
    /// Hands out `token`, accepts every broadcast, settles every transaction.
    pub fn new(token: FreshnessToken) -> Self {
        Self {
            freshness: Ok(token),
            broadcast: Ok(None),
            confirmation: Ok(ConfirmationOutcome::Settled),
            confirm_delay: None,
            broadcasts: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
            freshness_calls: AtomicUsize::new(0),
            broadcast_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_freshness(mut self, error: LedgerError) -> Self {
        self.freshness = Err(error);
        self
    }

    pub fn fail_broadcast(mut self, error: LedgerError) -> Self {
        self.broadcast = Err(error);
        self
    }

    /// Report `signature` as the transaction id instead of the signed one.
    pub fn broadcast_returns(mut self, signature: Signature) -> Self {
        self.broadcast = Ok(Some(signature));
        self
    }

    pub fn confirm_with(mut self, outcome: Result<ConfirmationOutcome, LedgerError>) -> Self {
        self.confirmation = outcome;
        self
    }

    /// Sleep this long inside `confirm` before answering.
    pub fn confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = Some(delay);
        self
    }

    pub fn freshness_calls(&self) -> usize {
        self.freshness_calls.load(Ordering::SeqCst)
    }

    pub fn broadcast_calls(&self) -> usize {
        self.broadcast_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.freshness_calls() + self.broadcast_calls() + self.confirm_calls()
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn confirmations(&self) -> Vec<(Signature, FreshnessToken)> {
        self.confirmations.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LedgerQuery for ScriptedLedger {
    async fn latest_freshness_token(&self) -> Result<FreshnessToken, LedgerError> {
        self.freshness_calls.fetch_add(1, Ordering::SeqCst);
        self.freshness.clone()
    }

    async fn confirm(
        &self,
        signature: &Signature,
        token: &FreshnessToken,
    ) -> Result<ConfirmationOutcome, LedgerError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut confirmations) = self.confirmations.lock() {
            confirmations.push((*signature, *token));
        }
        if let Some(delay) = self.confirm_delay {
            tokio::time::sleep(delay).await;
        }
        self.confirmation.clone()
    }
}

#[async_trait]
impl LedgerSubmit for ScriptedLedger {
    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<Signature, LedgerError> {
        self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut broadcasts) = self.broadcasts.lock() {
            broadcasts.push(transaction.clone());
        }
        match &self.broadcast {
            Ok(Some(signature)) => Ok(*signature),
            Ok(None) => Ok(transaction.signature()),
            Err(error) => Err(error.clone()),
        }
    }
}

/// Observer that keeps every state it is moved into.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    states: Mutex<Vec<TransferState>>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<TransferState> {
        self.states.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl TransferObserver for RecordingObserver {
    fn on_transition(&self, _from: TransferState, to: TransferState) {
        if let Ok(mut states) = self.states.lock() {
            states.push(to);
        }
    }
}
