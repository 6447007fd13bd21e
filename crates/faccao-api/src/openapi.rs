//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented handlers into one document served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Faccao Order API",
        version = "0.1.0",
        description = "Order workflow between apparel brands and sewing suppliers.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::companies::create_company,
        crate::routes::companies::list_companies,
        crate::routes::companies::get_company,
        crate::routes::documents::validate_cnpj,
        crate::routes::orders::create_order,
        crate::routes::orders::list_orders,
        crate::routes::orders::get_order,
        crate::routes::orders::get_transitions,
        crate::routes::orders::change_status,
        crate::routes::orders::request_rework,
    ),
    components(schemas(
        crate::state::CompanyRecord,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::companies::CreateCompanyRequest,
        crate::routes::documents::ValidateCnpjRequest,
        crate::routes::documents::ValidateCnpjResponse,
        crate::routes::orders::CreateOrderRequest,
        crate::routes::orders::ChangeStatusRequest,
        crate::routes::orders::ReworkRequest,
        crate::routes::orders::OrderView,
    )),
    tags(
        (name = "companies", description = "Brand and supplier onboarding"),
        (name = "documents", description = "Document checks"),
        (name = "orders", description = "Manufacturing order lifecycle"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json - Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
