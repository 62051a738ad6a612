//! Core library for solsend: amounts, transaction assembly, external
//! capabilities, and the single-transfer workflow.

pub mod amount;
pub mod capability;
pub mod config;
pub mod error;
pub mod form;
pub mod keypair;
pub mod message;
pub mod notification;
pub mod rpc;
pub mod testing;
pub mod types;
pub mod workflow;

pub use amount::{
    format_lamports_as_sol, parse_positive_sol, parse_sol_to_lamports, AmountError, Lamports,
    LAMPORTS_PER_SOL,
};
pub use capability::{
    ConfirmationOutcome, LedgerError, LedgerQuery, LedgerSubmit, Signer, SignerError,
};
pub use config::{ConfigError, TransferConfig, DEFAULT_RECIPIENT, DEFAULT_RECIPIENT_KEY};
pub use error::{ErrorKind, NetworkStage, Result, TransferError};
pub use form::{Activation, DisabledReason, TransferForm, TriggerState};
pub use keypair::{Approver, AutoApprove, KeypairError, KeypairSigner};
pub use message::{SignedTransaction, UnsignedTransaction};
pub use notification::{truncate_address, AgentError, Notification, NotificationStatus, OutputMode};
pub use rpc::RpcLedger;
pub use types::{Cluster, Commitment, FreshnessToken, Hash, Pubkey, Signature, TransferRequest};
pub use workflow::{
    NoopObserver, SubmissionResult, TransferObserver, TransferState, TransferWorkflow,
};
