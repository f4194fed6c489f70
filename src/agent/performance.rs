//! Performance Tracker
//!
//! Best-effort bookkeeping of dispatched trade attempts. The executor calls
//! `record` for every attempt that reached dispatch, success or failure;
//! validation and policy failures never get here.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::agent::registry::AgentRegistry;

#[derive(Clone)]
pub struct PerformanceTracker {
    agents: Arc<AgentRegistry>,
}

impl PerformanceTracker {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self { agents }
    }

    /// Record one dispatched attempt against the owning agent.
    ///
    /// Increments the trade counter unconditionally; successful results also
    /// bump the success counter and accumulate any reported profit. The win
    /// rate is recomputed from the counters inside the registry. A vanished
    /// agent is logged and ignored rather than propagated.
    pub async fn record(&self, agent_id: &str, result: &Value) {
        let success = result["success"].as_bool().unwrap_or(false);
        let profit = result["profit"].as_f64();

        if !self.agents.record_trade(agent_id, success, profit).await {
            warn!(
                "Skipping performance update: agent {} no longer exists",
                agent_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_success_with_profit() {
        let agents = Arc::new(AgentRegistry::new());
        let agent = agents
            .create("user_1", "A", "d", "p", Default::default())
            .await;
        let tracker = PerformanceTracker::new(agents.clone());

        tracker
            .record(&agent.id, &json!({ "success": true, "profit": 12.5 }))
            .await;

        let perf = agents.get(&agent.id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 1);
        assert_eq!(perf.successful_trades, 1);
        assert_eq!(perf.total_profit, 12.5);
        assert_eq!(perf.win_rate, 1.0);
    }

    #[tokio::test]
    async fn test_record_failure_counts_attempt_only() {
        let agents = Arc::new(AgentRegistry::new());
        let agent = agents
            .create("user_1", "A", "d", "p", Default::default())
            .await;
        let tracker = PerformanceTracker::new(agents.clone());

        tracker.record(&agent.id, &json!({ "success": false })).await;

        let perf = agents.get(&agent.id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 1);
        assert_eq!(perf.successful_trades, 0);
        assert_eq!(perf.total_profit, 0.0);
        assert_eq!(perf.win_rate, 0.0);
        assert!(perf.last_trade_at.is_some());
    }

    #[tokio::test]
    async fn test_win_rate_stays_in_unit_interval() {
        let agents = Arc::new(AgentRegistry::new());
        let agent = agents
            .create("user_1", "A", "d", "p", Default::default())
            .await;
        let tracker = PerformanceTracker::new(agents.clone());

        for i in 0..20 {
            let success = i % 3 == 0;
            tracker
                .record(&agent.id, &json!({ "success": success, "profit": 1.0 }))
                .await;

            let perf = agents.get(&agent.id).await.unwrap().performance;
            assert!(perf.successful_trades <= perf.total_trades);
            assert!((0.0..=1.0).contains(&perf.win_rate));
        }
    }

    #[tokio::test]
    async fn test_vanished_agent_is_ignored() {
        let agents = Arc::new(AgentRegistry::new());
        let tracker = PerformanceTracker::new(agents);
        // Must not panic or error
        tracker
            .record("agent_gone", &json!({ "success": true }))
            .await;
    }

    #[tokio::test]
    async fn test_result_without_success_field_is_a_failure() {
        let agents = Arc::new(AgentRegistry::new());
        let agent = agents
            .create("user_1", "A", "d", "p", Default::default())
            .await;
        let tracker = PerformanceTracker::new(agents.clone());

        tracker.record(&agent.id, &json!({})).await;

        let perf = agents.get(&agent.id).await.unwrap().performance;
        assert_eq!(perf.total_trades, 1);
        assert_eq!(perf.successful_trades, 0);
    }
}
