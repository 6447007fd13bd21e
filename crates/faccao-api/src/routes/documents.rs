//! # Document Checks
//!
//! `POST /v1/documents/cnpj/validate` answers whether a CNPJ verifies,
//! without registering anything. Used by onboarding forms for inline
//! feedback.

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use faccao_core::{cnpj, Cnpj};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCnpjRequest {
    /// The number as typed, with or without punctuation.
    #[schema(example = "11.222.333/0001-81")]
    pub document: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateCnpjResponse {
    pub valid: bool,
    /// Digits only.
    pub normalized: String,
    /// `XX.XXX.XXX/XXXX-XX`, present when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// Form message, present when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/documents/cnpj/validate", post(validate_cnpj))
}

/// POST /v1/documents/cnpj/validate - Check a CNPJ.
#[utoipa::path(
    post,
    path = "/v1/documents/cnpj/validate",
    request_body = ValidateCnpjRequest,
    responses(
        (status = 200, description = "Check result", body = ValidateCnpjResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
    ),
    tag = "documents"
)]
async fn validate_cnpj(
    body: Result<Json<ValidateCnpjRequest>, JsonRejection>,
) -> Result<Json<ValidateCnpjResponse>, AppError> {
    let req = extract_json(body)?;
    let normalized = cnpj::normalize(&req.document);
    let response = match Cnpj::new(req.document) {
        Ok(valid) => ValidateCnpjResponse {
            valid: true,
            normalized,
            formatted: Some(valid.formatted()),
            message: None,
        },
        Err(err) => ValidateCnpjResponse {
            valid: false,
            normalized,
            formatted: None,
            message: Some(err.to_string()),
        },
    };
    Ok(Json(response))
}
