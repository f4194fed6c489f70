//! Agent Registry
//!
//! In-memory store of agent records. Constructed once at startup and shared
//! through `AppState`; handlers never reach for an ambient singleton. Demo
//! state is non-durable, so concurrent writers to the same agent are allowed
//! to race (last write wins) behind a single `RwLock`.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::agent::types::{Agent, AgentPerformance, AgentSettings, AgentUpdate, SettingsOverrides};

/// Redacted marketplace view of an agent. Prompt, owner id, and settings
/// must never appear here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAgent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub performance: AgentPerformance,
    pub created_at: chrono::DateTime<Utc>,
}

pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Create and store a new agent with zeroed performance and defaults
    /// merged under the caller's overrides.
    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        prompt: &str,
        overrides: SettingsOverrides,
    ) -> Agent {
        let now = Utc::now();
        let mut settings = AgentSettings::default();
        if let Some(max) = overrides.max_trade_amount {
            settings.max_trade_amount = max;
        }
        if let Some(risk) = overrides.risk_tolerance {
            settings.risk_tolerance = risk;
        }
        if let Some(pairs) = overrides.trading_pairs {
            settings.trading_pairs = pairs;
        }
        settings.schedule = overrides.schedule;

        let agent = Agent {
            id: generate_id("agent"),
            name: name.to_string(),
            description: description.to_string(),
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            performance: AgentPerformance::default(),
            settings,
        };

        self.agents
            .write()
            .await
            .insert(agent.id.clone(), agent.clone());
        tracing::info!("Created agent {} for user {}", agent.id, user_id);
        agent
    }

    pub async fn get(&self, agent_id: &str) -> Option<Agent> {
        self.agents.read().await.get(agent_id).cloned()
    }

    pub async fn list_by_owner(&self, user_id: &str) -> Vec<Agent> {
        self.agents
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn list_all(&self) -> Vec<Agent> {
        self.agents.read().await.values().cloned().collect()
    }

    /// Redacted public marketplace listing of all active agents.
    pub async fn list_public(&self) -> Vec<PublicAgent> {
        self.agents
            .read()
            .await
            .values()
            .filter(|a| a.is_active)
            .map(|a| PublicAgent {
                id: a.id.clone(),
                name: a.name.clone(),
                description: a.description.clone(),
                performance: a.performance.clone(),
                created_at: a.created_at,
            })
            .collect()
    }

    /// Overwrite only the provided fields and bump `updated_at`.
    ///
    /// Ownership is the caller's concern; the registry applies whatever it
    /// is handed.
    pub async fn update(&self, agent_id: &str, update: AgentUpdate) -> Option<Agent> {
        let mut agents = self.agents.write().await;
        let agent = agents.get_mut(agent_id)?;

        if let Some(name) = update.name {
            agent.name = name;
        }
        if let Some(description) = update.description {
            agent.description = description;
        }
        if let Some(prompt) = update.prompt {
            agent.prompt = prompt;
        }
        if let Some(overrides) = update.settings {
            if let Some(max) = overrides.max_trade_amount {
                agent.settings.max_trade_amount = max;
            }
            if let Some(risk) = overrides.risk_tolerance {
                agent.settings.risk_tolerance = risk;
            }
            if let Some(pairs) = overrides.trading_pairs {
                agent.settings.trading_pairs = pairs;
            }
            if let Some(schedule) = overrides.schedule {
                agent.settings.schedule = Some(schedule);
            }
        }
        if let Some(is_active) = update.is_active {
            agent.is_active = is_active;
        }

        agent.updated_at = Utc::now();
        Some(agent.clone())
    }

    /// Logical deletion: the record stays readable with `is_active = false`.
    pub async fn deactivate(&self, agent_id: &str) -> bool {
        let mut agents = self.agents.write().await;
        match agents.get_mut(agent_id) {
            Some(agent) => {
                agent.is_active = false;
                agent.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Record one dispatched trade attempt against the agent's counters.
    ///
    /// `win_rate` is recomputed from the counters every time; no code path
    /// assigns it directly.
    pub async fn record_trade(&self, agent_id: &str, success: bool, profit: Option<f64>) -> bool {
        let mut agents = self.agents.write().await;
        let Some(agent) = agents.get_mut(agent_id) else {
            return false;
        };

        let perf = &mut agent.performance;
        perf.total_trades += 1;
        perf.last_trade_at = Some(Utc::now());

        if success {
            perf.successful_trades += 1;
            if let Some(profit) = profit {
                perf.total_profit += profit;
            }
        }

        perf.win_rate = if perf.total_trades > 0 {
            perf.successful_trades as f64 / perf.total_trades as f64
        } else {
            0.0
        };

        agent.updated_at = Utc::now();
        true
    }
}

/// Generate an opaque prefixed id, e.g. `agent_1700000000000_1a2b3c4d5`.
pub fn generate_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        prefix,
        Utc::now().timestamp_millis(),
        &suffix[..9]
    )
}

/// Parse free-form settings JSON into typed overrides; unknown keys are
/// ignored, recognized keys must have the right shape.
pub fn overrides_from_value(value: Option<Value>) -> Result<SettingsOverrides, String> {
    match value {
        None | Some(Value::Null) => Ok(SettingsOverrides::default()),
        Some(v) => serde_json::from_value(v).map_err(|e| format!("Invalid settings: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::RiskTolerance;

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let registry = AgentRegistry::new();
        let agent = registry
            .create("user_1", "Hoops", "NBA moment sniper", "buy low", Default::default())
            .await;

        assert!(agent.is_active);
        assert_eq!(agent.settings.max_trade_amount, 100.0);
        assert_eq!(agent.settings.risk_tolerance, RiskTolerance::Medium);
        assert!(agent.settings.trading_pairs.is_empty());
        assert_eq!(agent.performance.total_trades, 0);
        assert_eq!(agent.performance.win_rate, 0.0);
    }

    #[tokio::test]
    async fn test_create_merges_overrides() {
        let registry = AgentRegistry::new();
        let overrides = SettingsOverrides {
            max_trade_amount: Some(250.0),
            risk_tolerance: Some(RiskTolerance::High),
            trading_pairs: None,
            schedule: None,
        };
        let agent = registry
            .create("user_1", "Whale", "big trades", "go big", overrides)
            .await;

        assert_eq!(agent.settings.max_trade_amount, 250.0);
        assert_eq!(agent.settings.risk_tolerance, RiskTolerance::High);
        // Unspecified fields keep their defaults
        assert!(agent.settings.trading_pairs.is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_is_logical() {
        let registry = AgentRegistry::new();
        let agent = registry
            .create("user_1", "A", "d", "p", Default::default())
            .await;

        assert!(registry.deactivate(&agent.id).await);

        let stored = registry.get(&agent.id).await.expect("record must survive");
        assert!(!stored.is_active);
        assert!(stored.updated_at >= agent.updated_at);
    }

    #[tokio::test]
    async fn test_public_listing_redacts_and_skips_inactive() {
        let registry = AgentRegistry::new();
        let a = registry
            .create("user_1", "Visible", "d", "secret prompt", Default::default())
            .await;
        let b = registry
            .create("user_2", "Hidden", "d", "p", Default::default())
            .await;
        registry.deactivate(&b.id).await;

        let listing = registry.list_public().await;
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, a.id);

        let json = serde_json::to_value(&listing[0]).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("prompt"));
        assert!(!obj.contains_key("userId"));
        assert!(!obj.contains_key("settings"));
    }

    #[tokio::test]
    async fn test_record_trade_recomputes_win_rate() {
        let registry = AgentRegistry::new();
        let agent = registry
            .create("user_1", "A", "d", "p", Default::default())
            .await;

        registry.record_trade(&agent.id, true, Some(10.0)).await;
        registry.record_trade(&agent.id, false, None).await;
        registry.record_trade(&agent.id, true, Some(-2.5)).await;

        let perf = registry.get(&agent.id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 3);
        assert_eq!(perf.successful_trades, 2);
        assert!((perf.win_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((perf.total_profit - 7.5).abs() < 1e-9);
        assert!(perf.last_trade_at.is_some());
        assert!(perf.successful_trades <= perf.total_trades);
        assert!((0.0..=1.0).contains(&perf.win_rate));
    }

    #[tokio::test]
    async fn test_record_trade_unknown_agent() {
        let registry = AgentRegistry::new();
        assert!(!registry.record_trade("agent_missing", true, None).await);
    }

    #[tokio::test]
    async fn test_list_by_owner_filters() {
        let registry = AgentRegistry::new();
        registry.create("alice", "A1", "d", "p", Default::default()).await;
        registry.create("alice", "A2", "d", "p", Default::default()).await;
        registry.create("bob", "B1", "d", "p", Default::default()).await;

        assert_eq!(registry.list_all().await.len(), 3);
        assert_eq!(registry.list_by_owner("alice").await.len(), 2);
        assert_eq!(registry.list_by_owner("bob").await.len(), 1);
        assert!(registry.list_by_owner("carol").await.is_empty());
    }
}
