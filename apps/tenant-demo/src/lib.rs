#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Tenant isolation demo: three tables, a scenario that mixes tenants on
//! purpose, and the checks that nothing crosses over.

pub mod config;
pub mod entity;
pub mod logging;
pub mod migrations;
pub mod scenario;

use sea_orm_migration::MigratorTrait;
use tenant_db::secure::TenantSession;
use tenant_db::{DbConfig, IsolationConfig, connect};

use crate::migrations::Migrator;

/// Connect, apply migrations and wrap the connection in a session carrying
/// the configured missing-tenant policy.
///
/// # Errors
/// Returns `DbError` if the connection or a migration fails.
pub async fn open_session(
    database: &DbConfig,
    isolation: IsolationConfig,
) -> tenant_db::Result<TenantSession> {
    let conn = connect(database).await?;
    Migrator::up(&conn, None).await?;
    tracing::debug!(policy = ?isolation.missing_tenant, "schema ready");
    Ok(TenantSession::new(conn).with_policy(isolation.missing_tenant))
}
