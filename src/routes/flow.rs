//! Flow Routes
//!
//! Blockchain-facing endpoints: the action catalog and direct action
//! execution, wallet connection, and demo network/transaction/balance
//! views. Network status is the only public endpoint here.

use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::auth::models::AuthUser;
use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteActionRequest {
    pub parameters: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectWalletRequest {
    pub flow_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Create Flow routes. `/network` stays open for status pages; the rest
/// requires a valid token.
pub fn create_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    let protected = Router::new()
        .route("/actions", get(list_actions))
        .route("/actions/{action_id}/execute", post(execute_action))
        .route("/account", get(get_account))
        .route("/connect", post(connect_wallet))
        .route("/transactions", get(get_transactions))
        .route("/balance", get(get_balance))
        .layer(middleware::from_fn_with_state(
            jwt_service,
            AuthMiddleware::validate_token,
        ));

    Router::new()
        .route("/network", get(get_network))
        .merge(protected)
}

/// GET /api/flow/actions
async fn list_actions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({
        "success": true,
        "actions": state.actions.list(),
    })))
}

/// POST /api/flow/actions/{action_id}/execute
async fn execute_action(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(action_id): Path<String>,
    Json(payload): Json<ExecuteActionRequest>,
) -> Result<Json<Value>, ApiError> {
    let parameters = payload
        .parameters
        .ok_or_else(|| ApiError::Validation("Parameters are required".to_string()))?;

    let result = state.actions.execute(&action_id, &parameters).await?;

    Ok(Json(json!({
        "success": true,
        "result": result,
        "executedBy": auth.id,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/flow/account
async fn get_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let flow_address = state
        .users
        .get(&auth.id)
        .await
        .and_then(|u| u.flow_address);

    Ok(Json(json!({
        "success": true,
        "account": {
            "userId": auth.id,
            "flowAddress": flow_address,
            "isConnected": flow_address.is_some(),
        },
    })))
}

/// POST /api/flow/connect
async fn connect_wallet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ConnectWalletRequest>,
) -> Result<Json<Value>, ApiError> {
    let flow_address = match payload.flow_address {
        Some(a) if !a.trim().is_empty() => a,
        _ => return Err(ApiError::Validation("Flow address is required".to_string())),
    };

    state
        .users
        .update_profile(&auth.id, None, Some(Some(flow_address.clone())))
        .await?;

    tracing::info!("User {} connected Flow wallet {}", auth.id, flow_address);

    Ok(Json(json!({
        "success": true,
        "message": "Flow wallet connected successfully",
        "flowAddress": flow_address,
        "userId": auth.id,
    })))
}

/// GET /api/flow/network (no auth)
async fn get_network(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "network": {
            "network": state.config.flow.network,
            "accessNode": state.config.flow.access_node,
            "status": "connected",
            "latestBlock": {
                "height": 12_345_678u64,
                "timestamp": Utc::now().to_rfc3339(),
            },
            "gasPrice": "0.00001",
            "supportedContracts": [
                "NonFungibleToken",
                "TopShot",
                "TopShotMarket",
                "FungibleToken",
                "FlowToken",
            ],
        },
    }))
}

/// GET /api/flow/transactions
///
/// Demo transaction history with offset/limit pagination.
async fn get_transactions(
    Extension(_auth): Extension<AuthUser>,
    Query(query): Query<PaginationQuery>,
) -> Json<Value> {
    let transactions = demo_transactions();

    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);
    let (start, end) = page_window(transactions.len(), limit, offset);
    let page = &transactions[start..end];

    Json(json!({
        "success": true,
        "transactions": page,
        "total": transactions.len(),
        "pagination": {
            "limit": limit,
            "offset": offset,
            "hasMore": end < transactions.len(),
        },
    }))
}

/// GET /api/flow/balance
async fn get_balance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let flow_address = state
        .users
        .get(&auth.id)
        .await
        .and_then(|u| u.flow_address)
        .unwrap_or_else(|| "Not connected".to_string());

    Ok(Json(json!({
        "success": true,
        "balance": {
            "flowAddress": flow_address,
            "flow": "1000.50",
            "usd": "1000.50",
            "nfts": {
                "nbaTopShot": 5,
                "nflAllDay": 2,
                "total": 7,
            },
        },
    })))
}

/// Clamp an offset/limit pair to a valid slice window. Saturates instead of
/// overflowing, so an absurd offset yields an empty page.
fn page_window(len: usize, limit: usize, offset: usize) -> (usize, usize) {
    let start = offset.min(len);
    let end = offset.saturating_add(limit).min(len);
    (start, end)
}

fn demo_transactions() -> Vec<Value> {
    vec![
        json!({
            "id": "tx_1",
            "type": "nft_purchase",
            "status": "completed",
            "amount": 45.50,
            "nftId": "1",
            "nftName": "LeBron James - The King Dunk",
            "timestamp": "2024-01-15T10:30:00Z",
            "blockHeight": 12_345_678u64,
        }),
        json!({
            "id": "tx_2",
            "type": "nft_sale",
            "status": "completed",
            "amount": 78.25,
            "nftId": "2",
            "nftName": "Stephen Curry - Deep Three",
            "timestamp": "2024-01-14T15:45:00Z",
            "blockHeight": 12_345_670u64,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_basic() {
        assert_eq!(page_window(2, 20, 0), (0, 2));
        assert_eq!(page_window(2, 1, 1), (1, 2));
        // Offset past the end yields an empty page
        assert_eq!(page_window(2, 20, 5), (2, 2));
    }

    #[test]
    fn test_page_window_saturates_on_huge_offset() {
        assert_eq!(page_window(2, 20, usize::MAX), (2, 2));
        assert_eq!(page_window(2, usize::MAX, 1), (1, 2));
    }

    #[tokio::test]
    async fn test_transactions_huge_offset_returns_empty_page() {
        let auth = AuthUser {
            id: "user_1".to_string(),
            email: "test@example.com".to_string(),
            flow_address: None,
        };
        let query = PaginationQuery {
            limit: Some(20),
            offset: Some(usize::MAX),
        };

        let Json(body) = get_transactions(Extension(auth), Query(query)).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["transactions"].as_array().unwrap().len(), 0);
        assert_eq!(body["total"], 2);
        assert_eq!(body["pagination"]["hasMore"], false);
    }
}
