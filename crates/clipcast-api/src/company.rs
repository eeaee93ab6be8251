//! Per-company request scoping.
//!
//! Authentication proper lives in front of this service; requests arrive with
//! the owning tenant already resolved into the `X-Company-Id` header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const COMPANY_HEADER: &str = "x-company-id";

/// The tenant a request acts on behalf of.
#[derive(Debug, Clone)]
pub struct CompanyId(pub String);

impl CompanyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CompanyId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(COMPANY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| CompanyId(s.to_string()))
            .ok_or_else(|| ApiError::bad_request("X-Company-Id header is required"))
    }
}
