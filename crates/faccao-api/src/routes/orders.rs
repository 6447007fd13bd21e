//! # Manufacturing Orders
//!
//! Order creation, lookup, transition evaluation and status changes. Every
//! decision about what may happen next is delegated to the
//! [`TransitionPolicy`](faccao_state::TransitionPolicy) held in state; the
//! handlers only resolve who is asking and apply the outcome.
//!
//! ## Endpoints
//!
//! - `POST /v1/orders` - brand places an order with a supplier
//! - `GET /v1/orders` - orders visible to the caller
//! - `GET /v1/orders/{id}` - order with its transition log
//! - `GET /v1/orders/{id}/transitions` - what can happen next, for the caller
//! - `POST /v1/orders/{id}/status` - move the order (compare-and-set)
//! - `POST /v1/orders/{id}/rework` - derive a child order for rejected pieces
//!
//! ## Concurrency
//!
//! Status changes carry the status the caller last saw. The check and the
//! write happen under one store lock via `Store::try_update`, so two callers
//! racing from the same status cannot both succeed; the loser gets 409.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use faccao_core::{CompanyId, Party};
use faccao_state::{
    reserve_rework, Order, OrderDraft, OrderStatus, OrderTransitionRecord, QualityReview,
    TransitionRequest, TransitionResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{CallerIdentity, Role};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::middleware::metrics::{record_rework, record_transition};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to place an order. The brand is the caller's company.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Registered supplier that will sew the order.
    pub supplier_id: Uuid,
    /// Brand-side reference (style code, collection).
    pub reference: String,
    /// Number of pieces.
    pub quantity: u32,
    /// Price per piece, in centavos.
    pub unit_price_cents: u64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reference.trim().is_empty() {
            return Err("reference must not be empty".to_string());
        }
        if self.quantity == 0 {
            return Err("quantity must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Request to move an order to another status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    /// The status the caller last saw.
    #[schema(value_type = String, example = "CREATED")]
    pub expected_status: OrderStatus,
    /// The status to move to.
    #[schema(value_type = String, example = "ACCEPTED")]
    pub target_status: OrderStatus,
    /// Explicit confirmation, required by most transitions.
    #[serde(default)]
    pub confirmed: bool,
    /// Justification, required for declines and cancellations.
    #[serde(default)]
    pub notes: Option<String>,
    /// Quality-review record, required when submitting a batch for review.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub review: Option<QualityReview>,
}

impl Validate for ChangeStatusRequest {
    fn validate(&self) -> Result<(), String> {
        if self.expected_status == self.target_status {
            return Err("target_status must differ from expected_status".to_string());
        }
        Ok(())
    }
}

/// Request to open a rework order for rejected pieces.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReworkRequest {
    /// Pieces to rework. Defaults to the rejected count of the review.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// What must be fixed.
    pub notes: String,
}

impl Validate for ReworkRequest {
    fn validate(&self) -> Result<(), String> {
        if self.notes.trim().is_empty() {
            return Err("notes must not be empty".to_string());
        }
        Ok(())
    }
}

/// API view of an order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub supplier_id: Uuid,
    pub reference: String,
    pub quantity: u32,
    pub unit_price_cents: u64,
    pub total_cents: u64,
    #[schema(value_type = String, example = "IN_PRODUCTION")]
    pub status: OrderStatus,
    /// 1-based position in the lifecycle.
    pub stage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub review: Option<QualityReview>,
    /// Pieces already sent to rework orders.
    pub reworked_quantity: u32,
    #[schema(value_type = Vec<Object>)]
    pub transitions: Vec<OrderTransitionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(o: Order) -> Self {
        Self {
            id: *o.id.as_uuid(),
            brand_id: *o.brand_id.as_uuid(),
            supplier_id: *o.supplier_id.as_uuid(),
            total_cents: o.total_cents(),
            stage: o.status.stage(),
            reference: o.reference,
            quantity: o.quantity,
            unit_price_cents: o.unit_price_cents,
            status: o.status,
            parent_order_id: o.parent_order_id.map(|p| *p.as_uuid()),
            notes: o.notes,
            review: o.review,
            reworked_quantity: o.reworked_quantity,
            transitions: o.transitions,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", get(list_orders).post(create_order))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/transitions", get(get_transitions))
        .route("/v1/orders/{id}/status", post(change_status))
        .route("/v1/orders/{id}/rework", post(request_rework))
}

fn load(state: &AppState, id: &Uuid) -> Result<Order, AppError> {
    state
        .orders
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}

fn registered_as(state: &AppState, id: CompanyId, party: Party) -> Result<(), AppError> {
    match state.companies.get(id.as_uuid()) {
        Some(c) if c.party == party => Ok(()),
        Some(_) => Err(AppError::Validation(format!(
            "company {id} is not registered as a {}",
            party.as_str().to_ascii_lowercase()
        ))),
        None => Err(AppError::Validation(format!("company {id} is not registered"))),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/orders - Place an order.
#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderView),
        (status = 403, description = "Caller is not a brand", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
    ),
    tag = "orders"
)]
async fn create_order(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let req = extract_validated_json(body)?;
    let brand_id = match (caller.role, caller.company_id) {
        (Role::Brand, Some(id)) => id,
        _ => return Err(AppError::Forbidden("only brands can place orders".into())),
    };
    let supplier_id = CompanyId::from_uuid(req.supplier_id);
    registered_as(&state, brand_id, Party::Brand)?;
    registered_as(&state, supplier_id, Party::Supplier)?;

    let order = Order::open(OrderDraft {
        brand_id,
        supplier_id,
        reference: req.reference.trim().to_string(),
        quantity: req.quantity,
        unit_price_cents: req.unit_price_cents,
        parent_order_id: None,
        notes: req.notes,
    })?;
    state.orders.insert(*order.id.as_uuid(), order.clone());

    tracing::info!(
        order_id = %order.id,
        brand_id = %brand_id,
        supplier_id = %supplier_id,
        "order created"
    );
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /v1/orders - Orders the caller is a party to (all for admins).
#[utoipa::path(
    get,
    path = "/v1/orders",
    responses((status = 200, description = "Visible orders", body = Vec<OrderView>)),
    tag = "orders"
)]
async fn list_orders(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<Vec<OrderView>> {
    let mut orders: Vec<Order> = state
        .orders
        .list()
        .into_iter()
        .filter(|o| caller.side_on(o).is_ok())
        .collect();
    orders.sort_by_key(|o| o.created_at);
    Json(orders.into_iter().map(OrderView::from).collect())
}

/// GET /v1/orders/{id} - Get an order with its transition log.
#[utoipa::path(
    get,
    path = "/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order found", body = OrderView),
        (status = 403, description = "Caller is not a party", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
    ),
    tag = "orders"
)]
async fn get_order(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    let order = load(&state, &id)?;
    caller.side_on(&order)?;
    Ok(Json(order.into()))
}

/// GET /v1/orders/{id}/transitions - What can happen next.
///
/// Parties get `viewerCanAct` and per-transition `availableToViewer`;
/// admins get the viewer-less evaluation.
#[utoipa::path(
    get,
    path = "/v1/orders/{id}/transitions",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Transition evaluation", body = serde_json::Value),
        (status = 403, description = "Caller is not a party", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
    ),
    tag = "orders"
)]
async fn get_transitions(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let order = load(&state, &id)?;
    let viewer = caller.side_on(&order)?;
    Ok(Json(state.policy.evaluate_raw(order.status.as_str(), viewer)))
}

/// POST /v1/orders/{id}/status - Move the order.
#[utoipa::path(
    post,
    path = "/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Transition applied", body = OrderView),
        (status = 403, description = "Wrong party for this transition", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 409, description = "Stale status or illegal transition", body = ErrorBody),
        (status = 422, description = "Missing confirmation, notes or review", body = ErrorBody),
    ),
    tag = "orders"
)]
async fn change_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<OrderView>, AppError> {
    let req = extract_validated_json(body)?;
    let actor = caller.actor_on(&load(&state, &id)?)?;
    let request = TransitionRequest {
        confirmed: req.confirmed,
        notes: req.notes,
        review: req.review,
    };

    let policy = state.policy;
    let outcome = state
        .orders
        .try_update(&id, |order| {
            order
                .transition_from(&policy, req.expected_status, req.target_status, actor, request)
                .map(|record| (record, order.clone()))
        })
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    match outcome {
        Ok((record, order)) => {
            record_transition(record.from, record.to);
            Ok(Json(order.into()))
        }
        Err(err) => {
            tracing::warn!(order_id = %id, actor = %actor, error = %err, "transition rejected");
            Err(err.into())
        }
    }
}

/// POST /v1/orders/{id}/rework - Open a rework order.
///
/// The parent order keeps its status and counts the pieces in
/// `reworked_quantity`; the new order starts in `CREATED` with
/// `parent_order_id` set. Later requests may only claim what is left.
#[utoipa::path(
    post,
    path = "/v1/orders/{id}/rework",
    params(("id" = Uuid, Path, description = "Parent order ID")),
    request_body = ReworkRequest,
    responses(
        (status = 201, description = "Rework order created", body = OrderView),
        (status = 403, description = "Caller is not a party", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 409, description = "Rework not available from this status", body = ErrorBody),
        (status = 422, description = "Quantity exceeds pieces left", body = ErrorBody),
    ),
    tag = "orders"
)]
async fn request_rework(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ReworkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let req = extract_validated_json(body)?;
    let actor = caller.actor_on(&load(&state, &id)?)?;

    let policy = state.policy;
    let draft = state
        .orders
        .try_update(&id, |parent| {
            reserve_rework(parent, &policy, actor, req.quantity, Some(req.notes.as_str()))
        })
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))??;

    let child = Order::open(draft)?;
    state.orders.insert(*child.id.as_uuid(), child.clone());
    if let Some(party) = actor.party() {
        record_rework(party);
    }

    tracing::info!(
        parent_order_id = %id,
        order_id = %child.id,
        quantity = child.quantity,
        "rework order created"
    );
    Ok((StatusCode::CREATED, Json(child.into())))
}
