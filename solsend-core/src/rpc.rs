//! JSON-RPC ledger client implementing [`LedgerQuery`] and [`LedgerSubmit`].
//!
//! Wraps `reqwest::Client` with the cluster's RPC URL and provides exactly
//! the four calls the workflow needs: `getLatestBlockhash`,
//! `sendTransaction`, `getSignatureStatuses`, and `getBlockHeight`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::capability::{ConfirmationOutcome, LedgerError, LedgerQuery, LedgerSubmit};
use crate::config::TransferConfig;
use crate::message::SignedTransaction;
use crate::types::{Commitment, FreshnessToken, Hash, Signature};

/// Status of a signature as seen by one `getSignatureStatuses` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Unknown to the node, or below the requested commitment.
    Pending,
    Settled,
    Failed(String),
}

#[derive(Clone)]
pub struct RpcLedger {
    http: reqwest::Client,
    url: String,
    commitment: Commitment,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl RpcLedger {
    pub fn new(
        url: impl Into<String>,
        commitment: Commitment,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            commitment,
            poll_interval,
            request_timeout,
        })
    }

    pub fn from_config(config: &TransferConfig) -> Result<Self, LedgerError> {
        Self::new(
            config.rpc_endpoint(),
            config.commitment,
            config.poll_interval(),
            config.request_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC 2.0 request and return the `result` field.
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        trace!(method, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(LedgerError::Http(response.status().as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        extract_result(payload)
    }

    fn transport_error(&self, err: reqwest::Error) -> LedgerError {
        if err.is_timeout() {
            LedgerError::Timeout(self.request_timeout.as_millis() as u64)
        } else {
            LedgerError::Transport(err.to_string())
        }
    }

    pub async fn signature_status(&self, signature: &Signature) -> Result<SignatureStatus, LedgerError> {
        let result = self
            .rpc_call(
                "getSignatureStatuses",
                json!([[signature.to_string()], { "searchTransactionHistory": false }]),
            )
            .await?;
        parse_signature_status(&result, self.commitment)
    }

    pub async fn block_height(&self) -> Result<u64, LedgerError> {
        let result = self
            .rpc_call(
                "getBlockHeight",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;
        result
            .as_u64()
            .ok_or_else(|| LedgerError::InvalidResponse(format!("block height: {result}")))
    }
}

#[async_trait]
impl LedgerQuery for RpcLedger {
    async fn latest_freshness_token(&self) -> Result<FreshnessToken, LedgerError> {
        let result = self
            .rpc_call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;
        parse_latest_blockhash(&result)
    }

    async fn confirm(
        &self,
        signature: &Signature,
        token: &FreshnessToken,
    ) -> Result<ConfirmationOutcome, LedgerError> {
        loop {
            match self.signature_status(signature).await? {
                SignatureStatus::Settled => return Ok(ConfirmationOutcome::Settled),
                SignatureStatus::Failed(reason) => return Ok(ConfirmationOutcome::Failed(reason)),
                SignatureStatus::Pending => {}
            }

            let height = self.block_height().await?;
            debug!(%signature, height, last_valid = token.last_valid_block_height, "awaiting confirmation");
            if height > token.last_valid_block_height {
                // Look once more: the transaction may have landed in the last valid block.
                return Ok(match self.signature_status(signature).await? {
                    SignatureStatus::Settled => ConfirmationOutcome::Settled,
                    SignatureStatus::Failed(reason) => ConfirmationOutcome::Failed(reason),
                    SignatureStatus::Pending => ConfirmationOutcome::Expired,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl LedgerSubmit for RpcLedger {
    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<Signature, LedgerError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(transaction.to_wire_bytes());
        let result = self
            .rpc_call(
                "sendTransaction",
                json!([encoded, {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": self.commitment.as_str(),
                }]),
            )
            .await?;
        parse_signature(&result)
    }
}

fn extract_result(mut payload: Value) -> Result<Value, LedgerError> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(LedgerError::Rpc { code, message });
    }

    match payload.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(LedgerError::InvalidResponse(
            "response has neither result nor error".to_string(),
        )),
    }
}

fn parse_latest_blockhash(result: &Value) -> Result<FreshnessToken, LedgerError> {
    let value = result
        .get("value")
        .ok_or_else(|| LedgerError::InvalidResponse("getLatestBlockhash: missing value".to_string()))?;
    let blockhash = value
        .get("blockhash")
        .and_then(Value::as_str)
        .ok_or_else(|| LedgerError::InvalidResponse("getLatestBlockhash: missing blockhash".to_string()))?
        .parse::<Hash>()
        .map_err(|e| LedgerError::InvalidResponse(format!("getLatestBlockhash: {e}")))?;
    let last_valid_block_height = value
        .get("lastValidBlockHeight")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            LedgerError::InvalidResponse("getLatestBlockhash: missing lastValidBlockHeight".to_string())
        })?;

    Ok(FreshnessToken {
        blockhash,
        last_valid_block_height,
    })
}

fn parse_signature(result: &Value) -> Result<Signature, LedgerError> {
    result
        .as_str()
        .ok_or_else(|| LedgerError::InvalidResponse(format!("sendTransaction: {result}")))?
        .parse::<Signature>()
        .map_err(|e| LedgerError::InvalidResponse(format!("sendTransaction: {e}")))
}

fn parse_signature_status(result: &Value, commitment: Commitment) -> Result<SignatureStatus, LedgerError> {
    let entry = result
        .get("value")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
        .ok_or_else(|| LedgerError::InvalidResponse("getSignatureStatuses: missing value".to_string()))?;

    if entry.is_null() {
        return Ok(SignatureStatus::Pending);
    }

    if let Some(err) = entry.get("err").filter(|e| !e.is_null()) {
        return Ok(SignatureStatus::Failed(err.to_string()));
    }

    let reached = match entry.get("confirmationStatus").and_then(Value::as_str) {
        Some("processed") => Commitment::Processed,
        Some("confirmed") => Commitment::Confirmed,
        Some("finalized") => Commitment::Finalized,
        // Older nodes omit the field; `confirmations: null` means rooted.
        _ if entry.get("confirmations").is_some_and(Value::is_null) => Commitment::Finalized,
        _ => Commitment::Processed,
    };

    Ok(if reached >= commitment {
        SignatureStatus::Settled
    } else {
        SignatureStatus::Pending
    })
}
