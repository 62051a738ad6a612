//! The transfer workflow: validate, assemble, sign, broadcast, confirm.
//!
//! Each call to [`TransferWorkflow::submit_transfer`] runs one attempt
//! through a forward-only state machine:
//!
//! ```text
//! Idle -> ValidatingInput -> FetchingFreshnessToken -> AwaitingSignature
//!      -> Broadcasting -> AwaitingConfirmation -> Succeeded | Failed(kind)
//! ```
//!
//! Nothing is retried. Every failure ends the attempt and is returned to the
//! caller as a [`TransferError`]; a new attempt needs a new user action.

use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capability::{ConfirmationOutcome, LedgerQuery, LedgerSubmit, Signer};
use crate::config::TransferConfig;
use crate::error::{ErrorKind, NetworkStage, Result, TransferError};
use crate::message::UnsignedTransaction;
use crate::types::{Pubkey, Signature, TransferRequest};

/// Transaction id on success, classified failure otherwise.
pub type SubmissionResult = Result<Signature>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "kind", rename_all = "snake_case")]
pub enum TransferState {
    Idle,
    ValidatingInput,
    FetchingFreshnessToken,
    AwaitingSignature,
    Broadcasting,
    AwaitingConfirmation,
    Succeeded,
    Failed(ErrorKind),
}

impl TransferState {
    fn rank(&self) -> u8 {
        match self {
            TransferState::Idle => 0,
            TransferState::ValidatingInput => 1,
            TransferState::FetchingFreshnessToken => 2,
            TransferState::AwaitingSignature => 3,
            TransferState::Broadcasting => 4,
            TransferState::AwaitingConfirmation => 5,
            TransferState::Succeeded | TransferState::Failed(_) => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Succeeded | TransferState::Failed(_))
    }
}

impl Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferState::Idle => f.write_str("idle"),
            TransferState::ValidatingInput => f.write_str("validating input"),
            TransferState::FetchingFreshnessToken => f.write_str("fetching recent blockhash"),
            TransferState::AwaitingSignature => f.write_str("awaiting signature"),
            TransferState::Broadcasting => f.write_str("broadcasting"),
            TransferState::AwaitingConfirmation => f.write_str("awaiting confirmation"),
            TransferState::Succeeded => f.write_str("succeeded"),
            TransferState::Failed(kind) => write!(f, "failed ({})", kind.code()),
        }
    }
}

/// Receives every state transition of an attempt.
///
/// Called synchronously before the next suspension point, so a surface can
/// stop a spinner before the signer shows its own prompt.
pub trait TransferObserver: Send + Sync {
    fn on_transition(&self, from: TransferState, to: TransferState);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransferObserver for NoopObserver {
    fn on_transition(&self, _from: TransferState, _to: TransferState) {}
}

/// One run of the state machine.
pub struct TransferAttempt<'a> {
    state: TransferState,
    observer: &'a dyn TransferObserver,
}

impl<'a> TransferAttempt<'a> {
    pub fn new(observer: &'a dyn TransferObserver) -> Self {
        Self {
            state: TransferState::Idle,
            observer,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    fn advance(&mut self, next: TransferState) {
        let legal = !self.state.is_terminal() && next.rank() > self.state.rank();
        debug_assert!(legal, "illegal transition {} -> {}", self.state, next);
        if !legal {
            return;
        }
        let from = std::mem::replace(&mut self.state, next);
        debug!(%from, to = %next, "transfer state");
        self.observer.on_transition(from, next);
    }
}

/// Orchestrates one transfer per call against the injected capabilities.
#[derive(Clone)]
pub struct TransferWorkflow {
    signer: Arc<dyn Signer>,
    query: Arc<dyn LedgerQuery>,
    submit: Arc<dyn LedgerSubmit>,
    confirm_timeout: Option<Duration>,
}

impl TransferWorkflow {
    pub fn new(
        signer: Arc<dyn Signer>,
        query: Arc<dyn LedgerQuery>,
        submit: Arc<dyn LedgerSubmit>,
    ) -> Self {
        Self {
            signer,
            query,
            submit,
            confirm_timeout: None,
        }
    }

    /// Treat confirmation waits longer than `timeout` as an unknown outcome.
    pub fn with_confirm_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    pub fn with_config(self, config: &TransferConfig) -> Self {
        self.with_confirm_timeout(config.confirm_timeout())
    }

    pub fn signer_identity(&self) -> Option<Pubkey> {
        self.signer.current_identity()
    }

    pub async fn submit_transfer(&self, request: &TransferRequest) -> SubmissionResult {
        self.submit_transfer_with(request, &NoopObserver).await
    }

    #[tracing::instrument(
        name = "transfer",
        skip_all,
        fields(recipient = %request.recipient, lamports = request.amount.as_u64())
    )]
    pub async fn submit_transfer_with(
        &self,
        request: &TransferRequest,
        observer: &dyn TransferObserver,
    ) -> SubmissionResult {
        let mut attempt = TransferAttempt::new(observer);
        let result = self.run(request, &mut attempt).await;

        match &result {
            Ok(signature) => {
                info!(%signature, "transfer confirmed");
                attempt.advance(TransferState::Succeeded);
            }
            Err(err @ TransferError::SignerRejected(_)) => {
                info!(error = %err, "transfer canceled at signing");
                attempt.advance(TransferState::Failed(err.kind()));
            }
            Err(err) => {
                warn!(kind = err.kind().code(), error = %err, "transfer failed");
                attempt.advance(TransferState::Failed(err.kind()));
            }
        }

        result
    }

    async fn run(
        &self,
        request: &TransferRequest,
        attempt: &mut TransferAttempt<'_>,
    ) -> SubmissionResult {
        attempt.advance(TransferState::ValidatingInput);
        let sender = self
            .signer
            .current_identity()
            .ok_or(TransferError::NoSignerConnected)?;
        let lamports = request.amount.require_positive()?;

        attempt.advance(TransferState::FetchingFreshnessToken);
        let token = self
            .query
            .latest_freshness_token()
            .await
            .map_err(|source| TransferError::Network {
                stage: NetworkStage::Freshness,
                source,
            })?;
        debug!(blockhash = %token.blockhash, last_valid_block_height = token.last_valid_block_height, "freshness token");

        let unsigned = UnsignedTransaction::new(sender, request.recipient, lamports, token);

        attempt.advance(TransferState::AwaitingSignature);
        let signed = self
            .signer
            .sign(unsigned)
            .await
            .map_err(TransferError::SignerRejected)?;

        attempt.advance(TransferState::Broadcasting);
        let signature = self
            .submit
            .broadcast(&signed)
            .await
            .map_err(|source| TransferError::Network {
                stage: NetworkStage::Broadcast,
                source,
            })?;
        if signature != signed.signature() {
            warn!(
                reported = %signature,
                signed = %signed.signature(),
                "ledger reported a different transaction id"
            );
        }
        info!(%signature, "transaction broadcast");

        attempt.advance(TransferState::AwaitingConfirmation);
        let confirmation = match self.confirm_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.query.confirm(&signature, &token)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        return Err(TransferError::ConfirmationUnknown {
                            signature,
                            reason: format!(
                                "no confirmation within {} seconds",
                                limit.as_secs_f64()
                            ),
                        })
                    }
                }
            }
            None => self.query.confirm(&signature, &token).await,
        };

        match confirmation {
            Ok(ConfirmationOutcome::Settled) => Ok(signature),
            Ok(ConfirmationOutcome::Failed(reason)) => {
                Err(TransferError::LedgerRejected { signature, reason })
            }
            Ok(ConfirmationOutcome::Expired) => Err(TransferError::ConfirmationUnknown {
                signature,
                reason: "blockhash expired before the transaction was observed".to_string(),
            }),
            Err(err) => Err(TransferError::ConfirmationUnknown {
                signature,
                reason: err.to_string(),
            }),
        }
    }
}
