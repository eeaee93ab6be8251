//! Social account handlers.
//!
//! OAuth flows live in the surrounding product; this API records the
//! resulting connection state so scheduling can validate targets.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use clipcast_models::{ConnectionStatus, Platform, SocialAccount};

use crate::company::CompanyId;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpsertAccountRequest {
    pub platform: Platform,
    pub status: ConnectionStatus,
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub platform: Platform,
    pub status: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// Record the connection state of a social account.
pub async fn upsert_account(
    State(state): State<AppState>,
    company: CompanyId,
    Json(req): Json<UpsertAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let mut account = SocialAccount::new(company.0.clone(), req.platform, req.status);
    account.handle = req.handle;

    state.store.upsert_account(account.clone()).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            id: account.id,
            platform: account.platform,
            status: account.status,
            handle: account.handle,
        }),
    ))
}
