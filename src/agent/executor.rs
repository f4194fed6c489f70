//! Action Executor
//!
//! Drives one command through its lifecycle:
//! Received -> Validated -> Dispatched -> Completed | Failed.
//!
//! Validation parses the open parameter map into a tagged [`ValidatedParams`]
//! variant, so downstream code never reaches into a map hoping a key exists.
//! Policy checks (trade ceiling) run after validation and before any
//! collaborator call; failures on either side of the dispatch boundary are
//! distinguished because only dispatched attempts count as trades.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::agent::performance::PerformanceTracker;
use crate::agent::registry::{generate_id, AgentRegistry};
use crate::agent::types::{Agent, AgentCommand, CommandType};
use crate::error::ApiError;
use crate::flow::actions::ActionRegistry;

/// Default collection queried when an analyze command omits one (TopShot).
const DEFAULT_COLLECTION_ADDRESS: &str = "0x0ea2b1c0df6d07531";

/// Command parameters after exhaustive validation, one shape per type.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedParams {
    Buy {
        nft_id: String,
        price: f64,
        marketplace_address: String,
    },
    Sell {
        nft_id: String,
        price: f64,
        marketplace_address: String,
    },
    Analyze {
        user_address: String,
        collection_address: String,
    },
    Schedule {
        parameters: Map<String, Value>,
    },
    Stop,
}

impl ValidatedParams {
    /// Received -> Validated: every key the type requires must be present
    /// and well-shaped, or the command never dispatches.
    pub fn validate(kind: CommandType, params: &Map<String, Value>) -> Result<Self, ApiError> {
        match kind {
            CommandType::Buy => {
                let (nft_id, price, marketplace_address) = trade_params(params, "buy")?;
                Ok(ValidatedParams::Buy {
                    nft_id,
                    price,
                    marketplace_address,
                })
            }
            CommandType::Sell => {
                let (nft_id, price, marketplace_address) = trade_params(params, "sell")?;
                Ok(ValidatedParams::Sell {
                    nft_id,
                    price,
                    marketplace_address,
                })
            }
            CommandType::Analyze => {
                let user_address = string_param(params, "userAddress").ok_or_else(|| {
                    ApiError::Validation("Missing user address for analyze command".to_string())
                })?;
                let collection_address = string_param(params, "collectionAddress")
                    .unwrap_or_else(|| DEFAULT_COLLECTION_ADDRESS.to_string());
                Ok(ValidatedParams::Analyze {
                    user_address,
                    collection_address,
                })
            }
            CommandType::Schedule => Ok(ValidatedParams::Schedule {
                parameters: params.clone(),
            }),
            CommandType::Stop => Ok(ValidatedParams::Stop),
        }
    }
}

fn trade_params(
    params: &Map<String, Value>,
    command: &str,
) -> Result<(String, f64, String), ApiError> {
    let nft_id = string_param(params, "nftId");
    let price = params.get("price").and_then(Value::as_f64);
    let marketplace_address = string_param(params, "marketplaceAddress");

    match (nft_id, price, marketplace_address) {
        (Some(nft_id), Some(price), Some(marketplace_address)) => {
            Ok((nft_id, price, marketplace_address))
        }
        _ => Err(ApiError::Validation(format!(
            "Missing required parameters for {} command",
            command
        ))),
    }
}

// Ids arrive as strings from the interpreter but as raw numbers from some
// clients; accept both.
fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub struct ActionExecutor {
    agents: Arc<AgentRegistry>,
    actions: Arc<ActionRegistry>,
    tracker: PerformanceTracker,
}

impl ActionExecutor {
    pub fn new(
        agents: Arc<AgentRegistry>,
        actions: Arc<ActionRegistry>,
        tracker: PerformanceTracker,
    ) -> Self {
        Self {
            agents,
            actions,
            tracker,
        }
    }

    /// Execute one structured command on behalf of an agent.
    ///
    /// Validation and policy failures return before anything dispatches and
    /// leave the performance counters untouched. Once dispatched, the attempt
    /// is recorded whether the collaborator call succeeds or fails.
    pub async fn execute(&self, agent_id: &str, command: &AgentCommand) -> Result<Value, ApiError> {
        let agent = self
            .agents
            .get(agent_id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Agent {} not found", agent_id)))?;

        // Received -> Validated
        let kind = CommandType::parse(&command.command_type).ok_or_else(|| {
            ApiError::Validation(format!("Unknown command type: {}", command.command_type))
        })?;
        let params = ValidatedParams::validate(kind, &command.parameters)?;

        // Validated -> Dispatched: trade ceiling applies before any external call
        if let ValidatedParams::Buy { price, .. } = &params {
            if *price > agent.settings.max_trade_amount {
                return Err(ApiError::PolicyViolation(format!(
                    "Price {} exceeds max trade amount {}",
                    price, agent.settings.max_trade_amount
                )));
            }
        }

        info!(
            "Dispatching {} command for agent {}",
            command.command_type, agent_id
        );

        let result = self.dispatch(&agent, params).await;

        // Dispatched attempts are recorded, success or failure.
        match &result {
            Ok(value) => self.tracker.record(agent_id, value).await,
            Err(err) => {
                warn!("Command execution failed for agent {}: {}", agent_id, err);
                self.tracker
                    .record(agent_id, &json!({ "success": false }))
                    .await;
            }
        }

        result
    }

    async fn dispatch(&self, agent: &Agent, params: ValidatedParams) -> Result<Value, ApiError> {
        match params {
            ValidatedParams::Buy {
                nft_id,
                price,
                marketplace_address,
            } => {
                let action_params = object(&[
                    ("marketplaceAddress", json!(marketplace_address)),
                    ("nftId", json!(nft_id)),
                    ("price", json!(price)),
                ]);
                self.actions.execute("nft_purchase", &action_params).await
            }
            ValidatedParams::Sell {
                nft_id,
                price,
                marketplace_address,
            } => {
                let action_params = object(&[
                    ("nftId", json!(nft_id)),
                    ("price", json!(price)),
                    ("marketplaceAddress", json!(marketplace_address)),
                ]);
                self.actions.execute("nft_sale", &action_params).await
            }
            ValidatedParams::Analyze {
                user_address,
                collection_address,
            } => {
                let action_params = object(&[
                    ("userAddress", json!(user_address)),
                    ("collectionAddress", json!(collection_address)),
                ]);
                self.actions.execute("portfolio_check", &action_params).await
            }
            // No timer is registered; this is a structural placeholder.
            ValidatedParams::Schedule { parameters } => Ok(json!({
                "success": true,
                "message": "Scheduled transaction created",
                "scheduleId": generate_id("schedule"),
                "parameters": parameters,
            })),
            ValidatedParams::Stop => {
                self.agents.deactivate(&agent.id).await;
                Ok(json!({
                    "success": true,
                    "message": "Agent stopped successfully",
                }))
            }
        }
    }
}

fn object(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::client::{FlowClient, FlowError, TransactionResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct RecordingFlowClient {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl FlowClient for RecordingFlowClient {
        async fn submit_transaction(
            &self,
            _template: &str,
            _args: Vec<Value>,
        ) -> Result<TransactionResult, FlowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FlowError::Rejected("insufficient balance".into()));
            }
            Ok(TransactionResult {
                transaction_id: "tx_test".to_string(),
                status: "SEALED".to_string(),
            })
        }

        async fn run_query(&self, _script: &str, _args: Vec<Value>) -> Result<Value, FlowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FlowError::Network("timeout".into()));
            }
            Ok(json!({ "moments": [] }))
        }
    }

    struct Fixture {
        agents: Arc<AgentRegistry>,
        executor: ActionExecutor,
        client: Arc<RecordingFlowClient>,
    }

    async fn fixture(fail_chain: bool) -> (Fixture, String) {
        let agents = Arc::new(AgentRegistry::new());
        let client = Arc::new(RecordingFlowClient {
            calls: AtomicUsize::new(0),
            fail: fail_chain,
        });
        let actions = Arc::new(ActionRegistry::new(
            client.clone(),
            Duration::from_secs(5),
        ));
        let tracker = PerformanceTracker::new(agents.clone());
        let executor = ActionExecutor::new(agents.clone(), actions, tracker);

        let agent = agents
            .create("user_1", "Scout", "moment hunter", "buy dips", Default::default())
            .await;
        let id = agent.id.clone();

        (
            Fixture {
                agents,
                executor,
                client,
            },
            id,
        )
    }

    fn command(command_type: &str, params: Value) -> AgentCommand {
        AgentCommand {
            command_type: command_type.to_string(),
            parameters: params.as_object().cloned().unwrap_or_default(),
            confidence: 0.8,
            reasoning: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_buy_within_ceiling_dispatches_and_counts() {
        let (fx, agent_id) = fixture(false).await;
        let cmd = command(
            "buy",
            json!({ "nftId": "12345", "price": 45.5, "marketplaceAddress": "0x4bcadc785a64c7c8" }),
        );

        let result = fx.executor.execute(&agent_id, &cmd).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(fx.client.calls.load(Ordering::SeqCst), 1);

        let perf = fx.agents.get(&agent_id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 1);
        assert_eq!(perf.successful_trades, 1);
    }

    #[tokio::test]
    async fn test_buy_over_ceiling_is_policy_violation_without_dispatch() {
        let (fx, agent_id) = fixture(false).await;
        let cmd = command(
            "buy",
            json!({ "nftId": "12345", "price": 500.0, "marketplaceAddress": "0x4bcadc785a64c7c8" }),
        );

        let err = fx.executor.execute(&agent_id, &cmd).await.unwrap_err();
        assert!(matches!(err, ApiError::PolicyViolation(_)));
        // Collaborator never invoked, attempt never counted
        assert_eq!(fx.client.calls.load(Ordering::SeqCst), 0);
        let perf = fx.agents.get(&agent_id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 0);
    }

    #[tokio::test]
    async fn test_unknown_type_rejected_before_dispatch() {
        let (fx, agent_id) = fixture(false).await;
        let cmd = command("teleport", json!({}));

        let err = fx.executor.execute(&agent_id, &cmd).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(fx.client.calls.load(Ordering::SeqCst), 0);
        let perf = fx.agents.get(&agent_id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 0);
    }

    #[tokio::test]
    async fn test_missing_required_key_is_validation_error() {
        let (fx, agent_id) = fixture(false).await;
        // sell without marketplaceAddress
        let cmd = command("sell", json!({ "nftId": "67890", "price": 125.0 }));

        let err = fx.executor.execute(&agent_id, &cmd).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(fx.client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execution_failure_still_counts_the_attempt() {
        let (fx, agent_id) = fixture(true).await;
        let cmd = command(
            "buy",
            json!({ "nftId": "12345", "price": 45.5, "marketplaceAddress": "0x4bcadc785a64c7c8" }),
        );

        let err = fx.executor.execute(&agent_id, &cmd).await.unwrap_err();
        assert!(matches!(err, ApiError::Execution(_)));
        assert_eq!(fx.client.calls.load(Ordering::SeqCst), 1);

        let perf = fx.agents.get(&agent_id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 1);
        assert_eq!(perf.successful_trades, 0);
        assert_eq!(perf.win_rate, 0.0);
    }

    #[tokio::test]
    async fn test_analyze_defaults_collection_address() {
        let params = json!({ "userAddress": "0x1234567890abcdef" });
        let validated = ValidatedParams::validate(
            CommandType::Analyze,
            params.as_object().unwrap(),
        )
        .unwrap();

        assert_eq!(
            validated,
            ValidatedParams::Analyze {
                user_address: "0x1234567890abcdef".to_string(),
                collection_address: DEFAULT_COLLECTION_ADDRESS.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_stop_deactivates_without_external_call() {
        let (fx, agent_id) = fixture(false).await;
        let cmd = command("stop", json!({}));

        let result = fx.executor.execute(&agent_id, &cmd).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(fx.client.calls.load(Ordering::SeqCst), 0);
        assert!(!fx.agents.get(&agent_id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_schedule_synthesizes_id_and_echoes_params() {
        let (fx, agent_id) = fixture(false).await;
        let cmd = command("schedule", json!({ "interval": "0 9 * * *", "action": "buy" }));

        let result = fx.executor.execute(&agent_id, &cmd).await.unwrap();
        assert_eq!(result["success"], true);
        assert!(result["scheduleId"]
            .as_str()
            .unwrap()
            .starts_with("schedule_"));
        assert_eq!(result["parameters"]["interval"], "0 9 * * *");
        assert_eq!(fx.client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_agent_is_not_found() {
        let (fx, _) = fixture(false).await;
        let cmd = command("stop", json!({}));
        let err = fx.executor.execute("agent_missing", &cmd).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_numeric_nft_id_accepted() {
        let params = json!({ "nftId": 12345, "price": 10.0, "marketplaceAddress": "0xabc" });
        let validated =
            ValidatedParams::validate(CommandType::Buy, params.as_object().unwrap()).unwrap();
        assert_eq!(
            validated,
            ValidatedParams::Buy {
                nft_id: "12345".to_string(),
                price: 10.0,
                marketplace_address: "0xabc".to_string(),
            }
        );
    }
}
