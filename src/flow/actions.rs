//! Action Registry
//!
//! Fixed catalog of named Flow capabilities, populated once at startup.
//! Each entry dispatches at most one collaborator interaction (a templated
//! transaction or a read-only query) and normalizes the result into a
//! `{success, ...echoes, timestamp}` object.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::time::timeout;

use crate::error::ApiError;
use crate::flow::client::{FlowClient, FlowError};
use crate::flow::templates;

/// A named external capability with a fixed parameter schema.
#[derive(Debug, Clone, Serialize)]
pub struct FlowAction {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Parameter name -> expected primitive kind ("string" | "number")
    pub parameters: BTreeMap<String, String>,
    #[serde(skip)]
    kind: ActionKind,
}

#[derive(Debug, Clone, Copy)]
enum ActionKind {
    NftPurchase,
    NftSale,
    PortfolioCheck,
    DefiAction,
}

pub struct ActionRegistry {
    client: Arc<dyn FlowClient>,
    /// Collaborator call ceiling; a hung access node fails the request.
    request_timeout: Duration,
    actions: Vec<FlowAction>,
}

impl ActionRegistry {
    pub fn new(client: Arc<dyn FlowClient>, request_timeout: Duration) -> Self {
        let actions = vec![
            FlowAction {
                id: "nft_purchase".to_string(),
                name: "Purchase NFT".to_string(),
                description: "Purchase an NFT from a marketplace".to_string(),
                parameters: schema(&[
                    ("marketplaceAddress", "string"),
                    ("nftId", "string"),
                    ("price", "number"),
                ]),
                kind: ActionKind::NftPurchase,
            },
            FlowAction {
                id: "nft_sale".to_string(),
                name: "List NFT for Sale".to_string(),
                description: "List an NFT for sale on a marketplace".to_string(),
                parameters: schema(&[
                    ("nftId", "string"),
                    ("price", "number"),
                    ("marketplaceAddress", "string"),
                ]),
                kind: ActionKind::NftSale,
            },
            FlowAction {
                id: "portfolio_check".to_string(),
                name: "Check Portfolio".to_string(),
                description: "Check current portfolio holdings".to_string(),
                parameters: schema(&[
                    ("userAddress", "string"),
                    ("collectionAddress", "string"),
                ]),
                kind: ActionKind::PortfolioCheck,
            },
            FlowAction {
                id: "defi_action".to_string(),
                name: "Execute DeFi Strategy".to_string(),
                description: "Execute a DeFi trading strategy".to_string(),
                parameters: schema(&[
                    ("strategy", "string"),
                    ("amount", "number"),
                    ("tokenAddress", "string"),
                ]),
                kind: ActionKind::DefiAction,
            },
        ];

        Self {
            client,
            request_timeout,
            actions,
        }
    }

    pub fn get(&self, action_id: &str) -> Option<&FlowAction> {
        self.actions.iter().find(|a| a.id == action_id)
    }

    pub fn list(&self) -> &[FlowAction] {
        &self.actions
    }

    /// Execute a registered action. Unregistered ids fail with NotFound
    /// before any collaborator call.
    pub async fn execute(
        &self,
        action_id: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        let action = self
            .get(action_id)
            .ok_or_else(|| ApiError::NotFound(format!("Action {} not found", action_id)))?;

        tracing::info!("Executing Flow action {}", action.id);

        match action.kind {
            ActionKind::NftPurchase => {
                let args = vec![
                    param(params, "marketplaceAddress"),
                    param(params, "nftId"),
                    param(params, "price"),
                ];
                let result = self
                    .submit_bounded(templates::NFT_PURCHASE, args)
                    .await?;
                Ok(json!({
                    "success": true,
                    "transactionId": result.transaction_id,
                    "nftId": param(params, "nftId"),
                    "price": param(params, "price"),
                    "timestamp": Utc::now().to_rfc3339(),
                }))
            }
            ActionKind::NftSale => {
                let args = vec![
                    param(params, "marketplaceAddress"),
                    param(params, "nftId"),
                    param(params, "price"),
                ];
                let result = self.submit_bounded(templates::NFT_SALE, args).await?;
                Ok(json!({
                    "success": true,
                    "transactionId": result.transaction_id,
                    "nftId": param(params, "nftId"),
                    "price": param(params, "price"),
                    "timestamp": Utc::now().to_rfc3339(),
                }))
            }
            ActionKind::PortfolioCheck => {
                let args = vec![param(params, "userAddress")];
                let portfolio = self
                    .query_bounded(templates::PORTFOLIO_CHECK, args)
                    .await?;
                Ok(json!({
                    "success": true,
                    "portfolio": portfolio,
                    "userAddress": param(params, "userAddress"),
                    "timestamp": Utc::now().to_rfc3339(),
                }))
            }
            // Structural placeholder; no on-chain strategy contract exists yet.
            ActionKind::DefiAction => Ok(json!({
                "success": true,
                "strategy": param(params, "strategy"),
                "amount": param(params, "amount"),
                "tokenAddress": param(params, "tokenAddress"),
                "timestamp": Utc::now().to_rfc3339(),
                "message": "DeFi action executed successfully",
            })),
        }
    }

    async fn submit_bounded(
        &self,
        template: &str,
        args: Vec<Value>,
    ) -> Result<crate::flow::client::TransactionResult, ApiError> {
        timeout(self.request_timeout, self.client.submit_transaction(template, args))
            .await
            .map_err(|_| timeout_error(self.request_timeout))?
            .map_err(execution_error)
    }

    async fn query_bounded(&self, script: &str, args: Vec<Value>) -> Result<Value, ApiError> {
        timeout(self.request_timeout, self.client.run_query(script, args))
            .await
            .map_err(|_| timeout_error(self.request_timeout))?
            .map_err(execution_error)
    }
}

fn schema(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn param(params: &Map<String, Value>, key: &str) -> Value {
    params.get(key).cloned().unwrap_or(Value::Null)
}

fn timeout_error(limit: Duration) -> ApiError {
    ApiError::Execution(format!(
        "Flow collaborator call exceeded {}s timeout",
        limit.as_secs()
    ))
}

fn execution_error(err: FlowError) -> ApiError {
    ApiError::Execution(err.to_string())
}
