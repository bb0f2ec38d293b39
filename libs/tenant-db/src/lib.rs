#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Tenant-scoped database access on top of `SeaORM`.
//!
//! Every query issued through this crate is routed through one decision
//! function (see [`secure::intercept`]) that attaches a tenant row filter to
//! each tenant-bound table occurrence in the statement. The filter is captured
//! by value into every loaded row, so relationship loads triggered later by
//! those rows apply the same filter.
//!
//! # Example
//! ```rust,ignore
//! use tenant_db::{DbConfig, connect};
//! use tenant_db::secure::TenantSession;
//! use tenant_security::TenantContext;
//!
//! let session = TenantSession::new(connect(&DbConfig::default()).await?);
//! let mut ctx = TenantContext::new();
//! ctx.set_current_tenant("acc1");
//!
//! let users = session
//!     .find::<user::Entity>()
//!     .scope_with(&ctx)
//!     .all_with_related::<address::Entity, _>(session.conn())
//!     .await?;
//! ```

pub mod config;
pub mod secure;

pub use config::{DbConfig, IsolationConfig};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for connection setup.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),
}

/// Returns true for `SQLite` DSNs that point at a private in-memory database.
#[must_use]
pub fn is_memory_dsn(dsn: &str) -> bool {
    dsn.starts_with("sqlite::memory:") || dsn.contains("mode=memory")
}

/// Open a connection pool described by `cfg`.
///
/// In-memory `SQLite` databases live inside a single connection, so the pool
/// is pinned to exactly one connection for them.
///
/// # Errors
/// Returns `DbError::InvalidConfig` for an empty DSN or inconsistent pool
/// bounds, `DbError::Sea` if the connection cannot be established.
pub async fn connect(cfg: &DbConfig) -> Result<DatabaseConnection> {
    if cfg.dsn.trim().is_empty() {
        return Err(DbError::InvalidConfig("database.dsn must not be empty".to_owned()));
    }
    if let (Some(min), Some(max)) = (cfg.min_conns, cfg.max_conns)
        && min > max
    {
        return Err(DbError::InvalidConfig(format!(
            "database.min_conns ({min}) exceeds database.max_conns ({max})"
        )));
    }

    let mut opts = ConnectOptions::new(cfg.dsn.clone());
    opts.sqlx_logging(cfg.sqlx_logging);

    if is_memory_dsn(&cfg.dsn) {
        if cfg.max_conns.is_some_and(|n| n != 1) {
            tracing::debug!(
                requested = ?cfg.max_conns,
                "in-memory sqlite database: pool pinned to one connection"
            );
        }
        opts.max_connections(1).min_connections(1);
    } else {
        if let Some(max) = cfg.max_conns {
            opts.max_connections(max);
        }
        if let Some(min) = cfg.min_conns {
            opts.min_connections(min);
        }
    }
    if let Some(timeout) = cfg.acquire_timeout {
        opts.acquire_timeout(timeout);
    }

    tracing::debug!(dsn = %redact_dsn(&cfg.dsn), "connecting to database");
    let conn = Database::connect(opts).await?;
    Ok(conn)
}

/// Hide the password part of a DSN for logging.
#[must_use]
pub fn redact_dsn(dsn: &str) -> String {
    let Some((scheme, rest)) = dsn.split_once("://") else {
        return dsn.to_owned();
    };
    let Some((userinfo, host)) = rest.split_once('@') else {
        return dsn.to_owned();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => dsn.to_owned(),
    }
}
