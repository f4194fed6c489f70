//! Agent Data Model
//!
//! Core types for trading agents: identity and settings, rolling performance
//! counters, and the structured commands the interpreter produces. Wire
//! shapes are camelCase to match the frontend contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A configured, named trading persona owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub user_id: String,
    pub prompt: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub performance: AgentPerformance,
    pub settings: AgentSettings,
}

/// Rolling trade-count/profit/win-rate summary attached to an agent.
///
/// `win_rate` is serialized for the frontend but only ever written by
/// the registry, which recomputes it from the two counters on every update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub total_trades: u64,
    pub successful_trades: u64,
    pub total_profit: f64,
    pub win_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_trade_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    /// Trade price ceiling in USD
    pub max_trade_amount: f64,
    pub risk_tolerance: RiskTolerance,
    pub trading_pairs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<AgentSchedule>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_trade_amount: 100.0,
            risk_tolerance: RiskTolerance::Medium,
            trading_pairs: Vec::new(),
            schedule: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Low => "low",
            RiskTolerance::Medium => "medium",
            RiskTolerance::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSchedule {
    pub enabled: bool,
    /// cron expression
    pub interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_executed: Option<DateTime<Utc>>,
}

/// Caller-supplied settings overrides, merged over the documented defaults
/// at creation time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOverrides {
    pub max_trade_amount: Option<f64>,
    pub risk_tolerance: Option<RiskTolerance>,
    pub trading_pairs: Option<Vec<String>>,
    pub schedule: Option<AgentSchedule>,
}

/// Partial field overwrite for agent updates; absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub settings: Option<SettingsOverrides>,
    pub is_active: Option<bool>,
}

/// A single proposed or executed action derived from free text.
///
/// Ephemeral: lives only for the duration of interpret → execute, never
/// persisted. `command_type` stays a string on the wire; the executor parses
/// it into [`CommandType`] at its validation boundary and rejects anything
/// outside the closed set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCommand {
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    pub confidence: f64,
    pub reasoning: String,
}

/// Closed set of command types an agent can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Buy,
    Sell,
    Analyze,
    Schedule,
    Stop,
}

impl CommandType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(CommandType::Buy),
            "sell" => Some(CommandType::Sell),
            "analyze" => Some(CommandType::Analyze),
            "schedule" => Some(CommandType::Schedule),
            "stop" => Some(CommandType::Stop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Buy => "buy",
            CommandType::Sell => "sell",
            CommandType::Analyze => "analyze",
            CommandType::Schedule => "schedule",
            CommandType::Stop => "stop",
        }
    }
}

/// Priced marketplace item supplied as optional interpreter context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub nft_id: String,
    pub name: String,
    pub price: f64,
    pub rarity: String,
    pub series: String,
    pub set: String,
    pub marketplace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sale: Option<LastSale>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSale {
    pub price: f64,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_type_roundtrip() {
        for s in ["buy", "sell", "analyze", "schedule", "stop"] {
            assert_eq!(CommandType::parse(s).unwrap().as_str(), s);
        }
        assert!(CommandType::parse("teleport").is_none());
        assert!(CommandType::parse("BUY").is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = AgentSettings::default();
        assert_eq!(settings.max_trade_amount, 100.0);
        assert_eq!(settings.risk_tolerance, RiskTolerance::Medium);
        assert!(settings.trading_pairs.is_empty());
        assert!(settings.schedule.is_none());
    }

    #[test]
    fn test_agent_command_wire_shape() {
        let json = serde_json::json!({
            "type": "buy",
            "parameters": { "nftId": "12345", "price": 45.5 },
            "confidence": 0.85,
            "reasoning": "test"
        });
        let cmd: AgentCommand = serde_json::from_value(json).unwrap();
        assert_eq!(cmd.command_type, "buy");
        assert_eq!(cmd.parameters["price"], 45.5);
    }
}
