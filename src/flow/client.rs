//! Flow blockchain collaborator.
//!
//! The ledger is an opaque external capability: submit a templated Cadence
//! transaction, or run a read-only script. Everything above this seam depends
//! only on the [`FlowClient`] trait, so the concrete binding can be swapped
//! for a real access-node client without touching the action layer.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::config::FlowConfig;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("access node request failed: {0}")]
    Network(String),
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Outcome of a sealed transaction submission.
#[derive(Debug, Clone)]
pub struct TransactionResult {
    pub transaction_id: String,
    pub status: String,
}

#[async_trait]
pub trait FlowClient: Send + Sync {
    /// Submit a templated transaction with positional arguments and wait for
    /// it to seal.
    async fn submit_transaction(
        &self,
        template: &str,
        args: Vec<Value>,
    ) -> Result<TransactionResult, FlowError>;

    /// Run a read-only Cadence script.
    async fn run_query(&self, script: &str, args: Vec<Value>) -> Result<Value, FlowError>;
}

/// Demo stand-in for a real FCL/access-node binding.
///
/// Transactions seal deterministically with a fresh id; queries return an
/// empty result set. The demo never holds signing keys, so this is the only
/// binding wired up at startup.
pub struct SimulatedFlowClient {
    network: String,
}

impl SimulatedFlowClient {
    pub fn new(config: &FlowConfig) -> Self {
        tracing::info!(
            "Flow collaborator in simulated mode (network: {}, access node: {})",
            config.network,
            config.access_node
        );
        Self {
            network: config.network.clone(),
        }
    }
}

#[async_trait]
impl FlowClient for SimulatedFlowClient {
    async fn submit_transaction(
        &self,
        _template: &str,
        args: Vec<Value>,
    ) -> Result<TransactionResult, FlowError> {
        let transaction_id = Uuid::new_v4().simple().to_string();
        tracing::info!(
            "Sealed simulated transaction {} on {} ({} args)",
            transaction_id,
            self.network,
            args.len()
        );
        Ok(TransactionResult {
            transaction_id,
            status: "SEALED".to_string(),
        })
    }

    async fn run_query(&self, _script: &str, _args: Vec<Value>) -> Result<Value, FlowError> {
        Ok(serde_json::json!({
            "moments": [],
            "queriedAt": Utc::now().to_rfc3339(),
        }))
    }
}
