//! The amount input and the submit trigger that guards the workflow.
//!
//! The trigger is enabled only when a signer is connected, the amount text
//! parses to at least one lamport, and no attempt is already in flight.
//! Activating a disabled trigger never reaches the workflow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::amount::{parse_positive_sol, AmountError, Lamports};
use crate::error::TransferError;
use crate::types::{Pubkey, TransferRequest};
use crate::workflow::{SubmissionResult, TransferObserver, TransferWorkflow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisabledReason {
    NoSignerConnected,
    InvalidAmount(AmountError),
    InFlight,
}

impl DisabledReason {
    /// User-facing error for a disabled trigger; `None` when activation is
    /// simply ignored because an attempt is already running.
    pub fn as_error(&self) -> Option<TransferError> {
        match self {
            DisabledReason::NoSignerConnected => Some(TransferError::NoSignerConnected),
            DisabledReason::InvalidAmount(err) => Some(TransferError::InvalidAmount(err.clone())),
            DisabledReason::InFlight => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerState {
    Enabled(Lamports),
    Disabled(DisabledReason),
}

impl TriggerState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, TriggerState::Enabled(_))
    }
}

/// Outcome of pressing the trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Ignored(DisabledReason),
    Completed(SubmissionResult),
}

/// Held while an attempt runs; dropping it re-enables the trigger.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct TransferForm {
    amount_input: String,
    in_flight: Arc<AtomicBool>,
}

impl TransferForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(input: &str) -> Self {
        let mut form = Self::new();
        form.set_amount_input(input);
        form
    }

    pub fn set_amount_input(&mut self, input: &str) {
        self.amount_input = input.to_string();
    }

    pub fn amount_input(&self) -> &str {
        &self.amount_input
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn trigger_state(&self, signer_connected: bool) -> TriggerState {
        if self.is_in_flight() {
            return TriggerState::Disabled(DisabledReason::InFlight);
        }
        if !signer_connected {
            return TriggerState::Disabled(DisabledReason::NoSignerConnected);
        }
        match parse_positive_sol(&self.amount_input) {
            Ok(lamports) => TriggerState::Enabled(lamports),
            Err(err) => TriggerState::Disabled(DisabledReason::InvalidAmount(err)),
        }
    }

    /// Claim the trigger; `None` if another attempt already holds it.
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlightGuard {
                flag: Arc::clone(&self.in_flight),
            })
    }

    /// Press the trigger: run one attempt if enabled, otherwise report why not.
    pub async fn submit(
        &self,
        workflow: &TransferWorkflow,
        recipient: Pubkey,
        observer: &dyn TransferObserver,
    ) -> Activation {
        let amount = match self.trigger_state(workflow.signer_identity().is_some()) {
            TriggerState::Enabled(lamports) => lamports,
            TriggerState::Disabled(reason) => return Activation::Ignored(reason),
        };
        let Some(_guard) = self.try_begin() else {
            return Activation::Ignored(DisabledReason::InFlight);
        };

        let request = TransferRequest { recipient, amount };
        Activation::Completed(workflow.submit_transfer_with(&request, observer).await)
    }
}
