//! ccx core - typed client for the MAD/RWF currency-exchange backend
//!
//! Hexagonal layout:
//!
//! - **domain**: backend DTOs, the session and form validation
//! - **ports**: traits for the backend API and session storage
//! - **services**: auth, admin dashboard, wallet, listing and export logic
//! - **adapters**: reqwest HTTP backend and on-disk session store

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::{FileSessionStore, HttpBackend};
use config::Config;
use ports::{BackendApi, SessionStore};
use services::{AdminService, AuthService, WalletService};

pub use domain::result::{Error, Result};
pub use domain::{
    AuditLog, AuditLogQuery, AuditLogStats, ConversionDirection, Currency, Role, Session,
    Transaction, TransactionStatus, TransactionType, User, UserSummary,
};

/// Main context for client operations
///
/// Holds the configuration and wires every service to one backend and one
/// session store.
pub struct ClientContext {
    pub config: Config,
    pub backend: Arc<dyn BackendApi>,
    pub session_store: Arc<dyn SessionStore>,
    pub auth_service: Arc<AuthService>,
    pub admin_service: AdminService,
    pub wallet_service: WalletService,
}

impl ClientContext {
    /// Create a context talking HTTP to the configured backend
    pub fn new(ccx_dir: &Path, config: Config) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(&config.api_url, config.timeout())?);
        let store = Arc::new(FileSessionStore::new(ccx_dir));
        Ok(Self::with_backend(config, backend, store))
    }

    /// Create a context over any backend and session store
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn BackendApi>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&backend),
            Arc::clone(&session_store),
        ));
        let admin_service = AdminService::new(Arc::clone(&backend), Arc::clone(&auth_service));
        let wallet_service = WalletService::new(Arc::clone(&backend), Arc::clone(&auth_service));

        Self {
            config,
            backend,
            session_store,
            auth_service,
            admin_service,
            wallet_service,
        }
    }
}
