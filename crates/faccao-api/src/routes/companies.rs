//! # Company Onboarding
//!
//! Brands and suppliers register with their CNPJ. The number is checked
//! before anything is stored, and each CNPJ may be registered once.
//!
//! ## Endpoints
//!
//! - `POST /v1/companies` - register a company
//! - `GET /v1/companies` - list companies
//! - `GET /v1/companies/{id}` - get a company

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use faccao_core::{cnpj, Cnpj, CompanyId, Party};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, CompanyRecord};

/// Request to register a company.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    /// Registered legal name.
    pub legal_name: String,
    /// Public-facing name.
    #[serde(default)]
    pub trade_name: Option<String>,
    /// CNPJ, formatted or digits only.
    #[schema(example = "11.222.333/0001-81")]
    pub cnpj: String,
    /// `brand` or `supplier`.
    #[schema(example = "supplier")]
    pub party: String,
}

impl Validate for CreateCompanyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.legal_name.trim().is_empty() {
            return Err("legal_name must not be empty".to_string());
        }
        if self.cnpj.trim().is_empty() {
            return Err("cnpj must not be empty".to_string());
        }
        cnpj::validate_optional(Some(self.cnpj.as_str())).map_err(|e| e.to_string())?;
        self.party.parse::<Party>().map_err(|e| e.to_string())?;
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/companies", get(list_companies).post(create_company))
        .route("/v1/companies/{id}", get(get_company))
}

/// POST /v1/companies - Register a brand or supplier.
#[utoipa::path(
    post,
    path = "/v1/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company registered", body = CompanyRecord),
        (status = 409, description = "CNPJ already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn create_company(
    State(state): State<AppState>,
    body: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let party: Party = req.party.parse()?;
    let record = CompanyRecord {
        id: CompanyId::new(),
        legal_name: req.legal_name.trim().to_string(),
        trade_name: req
            .trade_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        cnpj: Cnpj::new(req.cnpj)?,
        party,
        created_at: Utc::now(),
    };

    state
        .companies
        .insert_unique(*record.id.as_uuid(), record.clone(), |a, b| a.cnpj == b.cnpj)
        .map_err(|existing| {
            AppError::Conflict(format!("CNPJ {} is already registered", existing.cnpj))
        })?;

    tracing::info!(company_id = %record.id, party = %record.party, "company registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/companies - List registered companies.
#[utoipa::path(
    get,
    path = "/v1/companies",
    responses((status = 200, description = "Registered companies", body = Vec<CompanyRecord>)),
    tag = "companies"
)]
async fn list_companies(State(state): State<AppState>) -> Json<Vec<CompanyRecord>> {
    let mut companies = state.companies.list();
    companies.sort_by_key(|c| c.created_at);
    Json(companies)
}

/// GET /v1/companies/{id} - Get a company.
#[utoipa::path(
    get,
    path = "/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company found", body = CompanyRecord),
        (status = 404, description = "Company not found", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyRecord>, AppError> {
    state
        .companies
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("company {id} not found")))
}
