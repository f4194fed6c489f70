//! Command Interpreter
//!
//! Maps a free-text command (plus optional market context) to structured
//! [`AgentCommand`] values. Callers depend only on the [`CommandInterpreter`]
//! trait; the deterministic keyword matcher is the default implementation and
//! the OpenAI-backed one is wired in when an API key is configured.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::types::{Agent, AgentCommand, CommandType, MarketData};
use crate::error::ApiError;
use crate::flow::actions::ActionRegistry;

pub const DEMO_MARKETPLACE_ADDRESS: &str = "0x4bcadc785a64c7c8";
pub const DEMO_USER_ADDRESS: &str = "0x1234567890abcdef";
pub const TOPSHOT_COLLECTION_ADDRESS: &str = "0x0ea2b1c0df6d07531";

#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    /// Produce a non-empty command list for the given agent and input text.
    async fn interpret(
        &self,
        agent: &Agent,
        command: &str,
        market_data: Option<&[MarketData]>,
        actions: &ActionRegistry,
    ) -> Result<Vec<AgentCommand>, ApiError>;
}

/// Deterministic keyword matcher standing in for a completion engine.
///
/// Case-insensitive substring rules evaluated in precedence order, first
/// match wins; the fallback is always an analyze command, so the output is
/// never empty.
pub struct KeywordInterpreter;

#[async_trait]
impl CommandInterpreter for KeywordInterpreter {
    async fn interpret(
        &self,
        agent: &Agent,
        command: &str,
        _market_data: Option<&[MarketData]>,
        _actions: &ActionRegistry,
    ) -> Result<Vec<AgentCommand>, ApiError> {
        let lower = command.to_lowercase();
        tracing::info!("Interpreting command for agent {}: {:?}", agent.id, command);

        if lower.contains("buy") && (lower.contains("nba") || lower.contains("topshot")) {
            return Ok(vec![AgentCommand {
                command_type: CommandType::Buy.as_str().to_string(),
                parameters: object(&[
                    ("nftId", json!("12345")),
                    ("price", json!(45.50)),
                    ("marketplaceAddress", json!(DEMO_MARKETPLACE_ADDRESS)),
                ]),
                confidence: 0.85,
                reasoning: "Found undervalued NBA Top Shot moment matching your criteria. \
                            Current market price is favorable."
                    .to_string(),
            }]);
        }

        if lower.contains("sell") && lower.contains("nft") {
            return Ok(vec![AgentCommand {
                command_type: CommandType::Sell.as_str().to_string(),
                parameters: object(&[
                    ("nftId", json!("67890")),
                    ("price", json!(125.00)),
                    ("marketplaceAddress", json!(DEMO_MARKETPLACE_ADDRESS)),
                ]),
                confidence: 0.75,
                reasoning: "Current market conditions suggest this is a good time to sell for profit."
                    .to_string(),
            }]);
        }

        if lower.contains("analyze") || lower.contains("portfolio") {
            return Ok(vec![AgentCommand {
                command_type: CommandType::Analyze.as_str().to_string(),
                parameters: object(&[
                    ("userAddress", json!(DEMO_USER_ADDRESS)),
                    ("collectionAddress", json!(TOPSHOT_COLLECTION_ADDRESS)),
                ]),
                confidence: 0.90,
                reasoning: "Analyzing your portfolio for optimization opportunities.".to_string(),
            }]);
        }

        if lower.contains("schedule") || lower.contains("recurring") {
            return Ok(vec![AgentCommand {
                command_type: CommandType::Schedule.as_str().to_string(),
                parameters: object(&[
                    // Daily at 9 AM
                    ("interval", json!("0 9 * * *")),
                    ("action", json!("buy")),
                    ("amount", json!(50)),
                ]),
                confidence: 0.80,
                reasoning: "Setting up automated recurring trades based on your preferences."
                    .to_string(),
            }]);
        }

        Ok(vec![AgentCommand {
            command_type: CommandType::Analyze.as_str().to_string(),
            parameters: object(&[
                ("userAddress", json!(DEMO_USER_ADDRESS)),
                ("collectionAddress", json!(TOPSHOT_COLLECTION_ADDRESS)),
            ]),
            confidence: 0.70,
            reasoning: "Analyzing market conditions and your portfolio to determine best course \
                        of action."
                .to_string(),
        }])
    }
}

/// Completion-engine-backed interpreter.
///
/// Builds a system context from the agent profile, the registered action
/// catalog, and any market data, then parses the model's JSON array reply.
pub struct OpenAiInterpreter {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiInterpreter {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            model: "gpt-4-turbo-preview".to_string(),
        }
    }

    fn build_system_prompt(
        &self,
        agent: &Agent,
        market_data: Option<&[MarketData]>,
        actions: &ActionRegistry,
    ) -> String {
        build_system_prompt(agent, market_data, actions)
    }

    async fn call_completion_api(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ApiError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "max_tokens": 1000,
            "temperature": 0.3,
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiError::Execution(format!("Completion API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Execution(format!(
                "Completion API error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Execution(format!("Completion API response: {}", e)))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| ApiError::Execution("No content in completion response".to_string()))
    }
}

#[async_trait]
impl CommandInterpreter for OpenAiInterpreter {
    async fn interpret(
        &self,
        agent: &Agent,
        command: &str,
        market_data: Option<&[MarketData]>,
        actions: &ActionRegistry,
    ) -> Result<Vec<AgentCommand>, ApiError> {
        let system_prompt = self.build_system_prompt(agent, market_data, actions);
        let response = self.call_completion_api(&system_prompt, command).await?;
        parse_command_response(&response)
    }
}

/// Descriptive system context: agent profile, registered action catalog, and
/// current market data. The keyword stub never sends it anywhere; the
/// completion-backed interpreter does.
pub fn build_system_prompt(
    agent: &Agent,
    market_data: Option<&[MarketData]>,
    actions: &ActionRegistry,
) -> String {
    let available_actions = actions
        .list()
        .iter()
        .map(|action| {
            format!(
                "- {}: {} (parameters: {})",
                action.id,
                action.description,
                serde_json::to_string(&action.parameters).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let market_context = match market_data {
        Some(items) if !items.is_empty() => format!(
            "Current market data:\n{}",
            items
                .iter()
                .map(|item| format!(
                    "- {} (ID: {}): ${} ({}, {})",
                    item.name, item.nft_id, item.price, item.rarity, item.series
                ))
                .collect::<Vec<_>>()
                .join("\n")
        ),
        _ => "No current market data available".to_string(),
    };

    format!(
        r#"You are FlowGenie, an AI agent for trading NFTs and managing portfolios on the Flow blockchain.

Agent Profile:
- Name: {}
- Description: {}
- Risk Tolerance: {}
- Max Trade Amount: ${}
- Custom Prompt: {}

Available Flow Actions:
{}

{}

Your task is to analyze user commands and generate appropriate trading actions. Always consider:
1. Risk management and position sizing
2. Market conditions and trends
3. Agent's performance history
4. User's risk tolerance

Respond with a JSON array of actions in this format:
[
  {{
    "type": "buy|sell|analyze|schedule|stop",
    "parameters": {{...}},
    "confidence": 0.0-1.0,
    "reasoning": "explanation of decision"
  }}
]

Be conservative with trades and always provide clear reasoning for your decisions."#,
        agent.name,
        agent.description,
        agent.settings.risk_tolerance.as_str(),
        agent.settings.max_trade_amount,
        agent.prompt,
        available_actions,
        market_context,
    )
}

/// Parse a completion-engine reply containing a JSON command array.
///
/// Extracts the first `[...]` span (models often wrap the array in prose),
/// clamps each confidence into [0,1], and defaults missing reasoning. Fails
/// with a validation error when no bracketed span is present or it does not
/// parse as an array.
pub fn parse_command_response(response: &str) -> Result<Vec<AgentCommand>, ApiError> {
    let start = response
        .find('[')
        .ok_or_else(|| ApiError::Validation("No valid JSON found in AI response".to_string()))?;
    let end = response
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| ApiError::Validation("No valid JSON found in AI response".to_string()))?;

    let raw: Vec<Value> = serde_json::from_str(&response[start..=end])
        .map_err(|_| ApiError::Validation("Invalid AI response format".to_string()))?;

    let commands = raw
        .into_iter()
        .map(|cmd| AgentCommand {
            command_type: cmd["type"].as_str().unwrap_or_default().to_string(),
            parameters: cmd["parameters"].as_object().cloned().unwrap_or_default(),
            confidence: cmd["confidence"].as_f64().unwrap_or(0.5).clamp(0.0, 1.0),
            reasoning: cmd["reasoning"]
                .as_str()
                .unwrap_or("No reasoning provided")
                .to_string(),
        })
        .collect();

    Ok(commands)
}

fn object(entries: &[(&str, Value)]) -> serde_json::Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::registry::AgentRegistry;
    use crate::flow::client::SimulatedFlowClient;
    use crate::config::FlowConfig;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_actions() -> ActionRegistry {
        let config = FlowConfig {
            network: "testnet".to_string(),
            access_node: "https://rest-testnet.onflow.org".to_string(),
            request_timeout: Duration::from_secs(5),
        };
        ActionRegistry::new(Arc::new(SimulatedFlowClient::new(&config)), config.request_timeout)
    }

    async fn test_agent() -> Agent {
        AgentRegistry::new()
            .create("user_1", "Scout", "moment hunter", "buy dips", Default::default())
            .await
    }

    #[tokio::test]
    async fn test_buy_keyword_match() {
        let agent = test_agent().await;
        let commands = KeywordInterpreter
            .interpret(&agent, "buy some NBA moments", None, &test_actions())
            .await
            .unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command_type, "buy");
        assert_eq!(commands[0].confidence, 0.85);
        assert_eq!(commands[0].parameters["nftId"], "12345");
        assert_eq!(commands[0].parameters["price"], 45.50);
        assert_eq!(
            commands[0].parameters["marketplaceAddress"],
            DEMO_MARKETPLACE_ADDRESS
        );
    }

    #[tokio::test]
    async fn test_sell_keyword_match() {
        let agent = test_agent().await;
        let commands = KeywordInterpreter
            .interpret(&agent, "please sell this nft", None, &test_actions())
            .await
            .unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command_type, "sell");
        assert_eq!(commands[0].confidence, 0.75);
    }

    #[tokio::test]
    async fn test_analyze_keyword_match() {
        let agent = test_agent().await;
        let commands = KeywordInterpreter
            .interpret(&agent, "Analyze my PORTFOLIO", None, &test_actions())
            .await
            .unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command_type, "analyze");
        assert_eq!(commands[0].confidence, 0.90);
    }

    #[tokio::test]
    async fn test_schedule_keyword_match() {
        let agent = test_agent().await;
        let commands = KeywordInterpreter
            .interpret(&agent, "set up recurring buys", None, &test_actions())
            .await
            .unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command_type, "schedule");
        assert_eq!(commands[0].confidence, 0.80);
        assert_eq!(commands[0].parameters["interval"], "0 9 * * *");
    }

    #[tokio::test]
    async fn test_unmatched_text_defaults_to_analyze() {
        let agent = test_agent().await;
        let commands = KeywordInterpreter
            .interpret(&agent, "what's up", None, &test_actions())
            .await
            .unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command_type, "analyze");
        assert_eq!(commands[0].confidence, 0.70);
    }

    #[tokio::test]
    async fn test_buy_requires_collection_keyword() {
        // "buy" alone does not satisfy the first rule
        let agent = test_agent().await;
        let commands = KeywordInterpreter
            .interpret(&agent, "buy something", None, &test_actions())
            .await
            .unwrap();
        assert_eq!(commands[0].command_type, "analyze");
        assert_eq!(commands[0].confidence, 0.70);
    }

    #[test]
    fn test_parse_response_extracts_span_and_clamps() {
        let response = r#"Here is my plan:
[
  { "type": "buy", "parameters": { "nftId": "1" }, "confidence": 1.7 },
  { "type": "sell", "parameters": {}, "confidence": -0.3, "reasoning": "take profit" }
]
Let me know."#;

        let commands = parse_command_response(response).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].confidence, 1.0);
        assert_eq!(commands[0].reasoning, "No reasoning provided");
        assert_eq!(commands[1].confidence, 0.0);
        assert_eq!(commands[1].reasoning, "take profit");
    }

    #[test]
    fn test_parse_response_rejects_missing_span() {
        let err = parse_command_response("no array here").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_parse_response_rejects_unparseable_span() {
        let err = parse_command_response("[{ not json }]").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_system_prompt_includes_profile_and_catalog() {
        let agent = test_agent().await;
        let prompt = build_system_prompt(&agent, None, &test_actions());

        assert!(prompt.contains("Name: Scout"));
        assert!(prompt.contains("Risk Tolerance: medium"));
        assert!(prompt.contains("Max Trade Amount: $100"));
        assert!(prompt.contains("nft_purchase"));
        assert!(prompt.contains("portfolio_check"));
        assert!(prompt.contains("No current market data available"));
    }
}
