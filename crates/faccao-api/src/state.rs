//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor: the company and order stores, the transition
//! policy, runtime configuration and the metrics handle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use faccao_core::{Cnpj, CompanyId, Party};
use faccao_state::{Order, TransitionPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` (non-poisoning) and is never held across an
/// `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert unless an existing record conflicts with the new one.
    ///
    /// The scan and the insert run under one write lock, so two concurrent
    /// inserts of conflicting records cannot both succeed. Returns the
    /// conflicting record on failure.
    pub fn insert_unique(
        &self,
        id: Uuid,
        value: T,
        conflicts: impl Fn(&T, &T) -> bool,
    ) -> Result<(), T> {
        let mut guard = self.data.write();
        if let Some(existing) = guard.values().find(|v| conflicts(v, &value)) {
            return Err(existing.clone());
        }
        guard.insert(id, value);
        Ok(())
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure may inspect the current value, check preconditions,
    /// mutate it and return `Ok(R)` or `Err(E)`; all of it runs under a
    /// single write lock. Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Records --------------------------------------------------------------------

/// A brand or supplier registered on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: CompanyId,
    /// Registered legal name (razão social).
    pub legal_name: String,
    /// Public-facing name, if different.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    /// Canonical 14-digit CNPJ.
    #[schema(value_type = String, example = "11222333000181")]
    pub cnpj: Cnpj,
    /// Which side of an order this company can take.
    #[schema(value_type = String, example = "SUPPLIER")]
    pub party: Party,
    pub created_at: DateTime<Utc>,
}

// -- Configuration --------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Invalid environment configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),

    #[error("LOG_FORMAT must be \"text\" or \"json\", got {0:?}")]
    InvalidLogFormat(String),
}

/// Application configuration.
///
/// Custom `Debug` redacts the auth token.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Read `PORT`, `AUTH_TOKEN` and `LOG_FORMAT` from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// As [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("PORT") {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?;
        }

        config.auth_token = lookup("AUTH_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(raw) = lookup("LOG_FORMAT") {
            config.log_format = match raw.trim().to_ascii_lowercase().as_str() {
                "" | "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::InvalidLogFormat(raw)),
            };
        }

        Ok(config)
    }
}

// -- AppState -------------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub companies: Store<CompanyRecord>,
    pub orders: Store<Order>,
    pub policy: TransitionPolicy,
    pub config: AppConfig,
    /// Prometheus renderer; `None` when no recorder was installed.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("companies", &self.companies.len())
            .field("orders", &self.orders.len())
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AppState {
    /// Empty state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Empty state with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            companies: Store::new(),
            orders: Store::new(),
            policy: TransitionPolicy::standard(),
            config,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn store_try_update_is_atomic_per_call() {
        let store: Store<u32> = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, 1);
        let r: Option<Result<u32, &str>> = store.try_update(&id, |v| {
            if *v == 1 {
                *v = 2;
                Ok(*v)
            } else {
                Err("stale")
            }
        });
        assert_eq!(r, Some(Ok(2)));
        let again: Option<Result<u32, &str>> =
            store.try_update(&id, |v| if *v == 1 { Ok(*v) } else { Err("stale") });
        assert_eq!(again, Some(Err("stale")));
        assert!(store.try_update::<(), ()>(&Uuid::new_v4(), |_| Ok(())).is_none());
    }

    #[test]
    fn store_insert_unique_rejects_conflicts() {
        let store: Store<String> = Store::new();
        assert!(store.insert_unique(Uuid::new_v4(), "a".into(), |x, y| x == y).is_ok());
        assert_eq!(
            store.insert_unique(Uuid::new_v4(), "a".into(), |x, y| x == y),
            Err("a".to_string())
        );
        assert!(store.insert_unique(Uuid::new_v4(), "b".into(), |x, y| x == y).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn config_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn config_reads_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn config_rejects_bad_port() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err(),
            ConfigError::InvalidPort("eighty".to_string())
        );
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "70000")])).is_err());
    }

    #[test]
    fn config_rejects_bad_log_format() {
        assert!(AppConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn blank_token_disables_auth() {
        let config = AppConfig::from_lookup(lookup(&[("AUTH_TOKEN", "  ")])).unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("s3cret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("REDACTED"));
    }
}
