//! # Authentication & Caller Identity
//!
//! Bearer token middleware that resolves who is calling and on behalf of
//! which company.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{company_id}:{secret}
//! ```
//!
//! `role` is `brand`, `supplier` or `admin`. The company id may be empty for
//! admins. The secret is compared in constant time.
//!
//! ## View As
//!
//! An admin may act as a specific party by sending `X-View-As: brand|supplier`
//! together with `X-View-As-Company: <uuid>`. The resolved identity is then
//! the impersonated party, flagged as such for logging. Other roles sending
//! the header are rejected.
//!
//! ## Open Mode
//!
//! With no token configured the service trusts `X-Party` and
//! `X-Company-Id` headers, falling back to an admin identity. Local
//! development only.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use faccao_core::{CompanyId, Party};
use faccao_state::{Actor, Order};
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Header naming the party an admin wants to act as.
pub const VIEW_AS_HEADER: &str = "x-view-as";
/// Header naming the company an admin wants to act as.
pub const VIEW_AS_COMPANY_HEADER: &str = "x-view-as-company";
/// Open-mode party header.
pub const PARTY_HEADER: &str = "x-party";
/// Open-mode company header.
pub const COMPANY_HEADER: &str = "x-company-id";

// ── Role ────────────────────────────────────────────────────────────────────

/// What the caller is allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A user of a brand company.
    Brand,
    /// A user of a supplier company.
    Supplier,
    /// Platform operator. Reads everything; acts only through view-as.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Supplier => "supplier",
            Self::Admin => "admin",
        }
    }

    /// The trading party behind this role.
    pub fn party(&self) -> Option<Party> {
        match self {
            Self::Brand => Some(Party::Brand),
            Self::Supplier => Some(Party::Supplier),
            Self::Admin => None,
        }
    }
}

impl From<Party> for Role {
    fn from(party: Party) -> Self {
        match party {
            Party::Brand => Self::Brand,
            Party::Supplier => Self::Supplier,
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the caller, injected into request extensions by
/// [`auth_middleware`] and extracted by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: Role,
    /// The company the caller acts for. `None` for a plain admin.
    pub company_id: Option<CompanyId>,
    /// Set when an admin is acting through view-as.
    pub impersonated: bool,
}

impl CallerIdentity {
    /// A plain admin identity.
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            company_id: None,
            impersonated: false,
        }
    }

    /// An identity acting for `company` on the given side.
    pub fn party(party: Party, company: CompanyId) -> Self {
        Self {
            role: party.into(),
            company_id: Some(company),
            impersonated: false,
        }
    }

    /// The caller's side on `order`.
    ///
    /// Admins get `None` (read-only viewer). Parties must belong to the
    /// order, on the side their role claims.
    ///
    /// # Errors
    ///
    /// [`AppError::Forbidden`] when the caller is not a party to the order.
    pub fn side_on(&self, order: &Order) -> Result<Option<Party>, AppError> {
        let Some(claimed) = self.role.party() else {
            return Ok(None);
        };
        match self.company_id.and_then(|c| order.party_of(c)) {
            Some(side) if side == claimed => Ok(Some(side)),
            _ => Err(AppError::Forbidden(format!(
                "caller is not the {} on order {}",
                claimed.as_str().to_ascii_lowercase(),
                order.id
            ))),
        }
    }

    /// The actor for a mutation on `order`.
    ///
    /// # Errors
    ///
    /// [`AppError::Forbidden`] for admins without view-as and for
    /// non-parties.
    pub fn actor_on(&self, order: &Order) -> Result<Actor, AppError> {
        self.side_on(order)?
            .map(Actor::from)
            .ok_or_else(|| AppError::Forbidden("admins must use view-as to act on an order".into()))
    }
}

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

fn parse_company(raw: &str) -> Result<CompanyId, String> {
    raw.trim()
        .parse::<CompanyId>()
        .map_err(|e| format!("invalid company id: {e}"))
}

/// Parse `{role}:{company_id}:{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();
    let [role_str, company_str, secret] = parts.as_slice() else {
        return Err("invalid token format, expected {role}:{company_id}:{secret}".into());
    };

    if !constant_time_token_eq(secret, expected_secret) {
        return Err("invalid bearer token".into());
    }

    let role = match *role_str {
        "brand" => Role::Brand,
        "supplier" => Role::Supplier,
        "admin" => Role::Admin,
        other => return Err(format!("unknown role: {other}")),
    };

    let company_id = if company_str.is_empty() {
        None
    } else {
        Some(parse_company(company_str)?)
    };
    if role != Role::Admin && company_id.is_none() {
        return Err(format!("role {} requires a company id", role.as_str()));
    }

    Ok(CallerIdentity {
        role,
        company_id,
        impersonated: false,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Apply the view-as override for admins.
///
/// Returns the identity unchanged when no view-as header is present.
pub fn apply_view_as(
    identity: CallerIdentity,
    headers: &HeaderMap,
) -> Result<CallerIdentity, AppError> {
    let Some(raw_party) = header_str(headers, VIEW_AS_HEADER) else {
        return Ok(identity);
    };
    if identity.role != Role::Admin {
        return Err(AppError::Forbidden("only admins may use view-as".into()));
    }
    let party: Party = raw_party
        .parse()
        .map_err(|e: faccao_core::ValidationError| AppError::BadRequest(e.to_string()))?;
    let company = header_str(headers, VIEW_AS_COMPANY_HEADER)
        .ok_or_else(|| {
            AppError::BadRequest(format!("{VIEW_AS_COMPANY_HEADER} is required with view-as"))
        })
        .and_then(|raw| parse_company(raw).map_err(AppError::BadRequest))?;

    tracing::info!(party = %party, company_id = %company, "admin acting through view-as");
    Ok(CallerIdentity {
        role: party.into(),
        company_id: Some(company),
        impersonated: true,
    })
}

/// Identity from open-mode headers, admin when absent.
fn open_mode_identity(headers: &HeaderMap) -> Result<CallerIdentity, AppError> {
    let Some(raw_party) = header_str(headers, PARTY_HEADER) else {
        return Ok(CallerIdentity::admin());
    };
    let party: Party = raw_party
        .parse()
        .map_err(|e: faccao_core::ValidationError| AppError::BadRequest(e.to_string()))?;
    let company = header_str(headers, COMPANY_HEADER)
        .ok_or_else(|| {
            AppError::BadRequest(format!("{COMPANY_HEADER} is required with {PARTY_HEADER}"))
        })
        .and_then(|raw| parse_company(raw).map_err(AppError::BadRequest))?;
    Ok(CallerIdentity::party(party, company))
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Resolve the caller and inject a [`CallerIdentity`] into the request.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let resolved = match expected_token {
        Some(expected) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(value) => match value.strip_prefix("Bearer ") {
                    Some(provided) => parse_bearer_token(provided, &expected).map_err(|msg| {
                        tracing::warn!(
                            reason = %msg,
                            "authentication failed: invalid bearer token"
                        );
                        AppError::Unauthorized(msg)
                    }),
                    None => {
                        tracing::warn!("authentication failed: non-Bearer authorization scheme");
                        Err(AppError::Unauthorized(
                            "authorization header must use Bearer scheme".into(),
                        ))
                    }
                },
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    Err(AppError::Unauthorized("missing authorization header".into()))
                }
            }
        }
        None => open_mode_identity(request.headers()),
    };

    match resolved.and_then(|identity| apply_view_as(identity, request.headers())) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(AppError::Unauthorized(msg)) => unauthorized_response(&msg),
        Err(other) => other.into_response(),
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
