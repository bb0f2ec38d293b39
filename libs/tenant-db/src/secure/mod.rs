//! Tenant-scoped query layer.
//!
//! This module wraps `SeaORM` queries in typestate builders that cannot be
//! executed until they have been routed through the tenant interceptor.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sea_orm::entity::prelude::*;
//! use tenant_db::secure::{TenantBound, TenantSession};
//! use tenant_security::TenantContext;
//!
//! // 1. Declare the tenant decision on each entity
//! #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantBound)]
//! #[sea_orm(table_name = "user")]
//! #[tenant(tenant_col = "account_id")]
//! pub struct Model {
//!     #[sea_orm(primary_key)]
//!     pub id: i32,
//!     pub name: String,
//!     pub account_id: String,
//! }
//!
//! // 2. Set the current tenant on the caller's context
//! let mut ctx = TenantContext::new();
//! ctx.set_current_tenant("acc1");
//!
//! // 3. Query through the session
//! let users = session.find::<Entity>().scope_with(&ctx).all(session.conn()).await?;
//! for user in &users {
//!     // lazy loads reuse the criteria captured above
//!     let addresses = user.related::<address::Entity, _>(session.conn()).await?;
//! }
//! ```
//!
//! # Policy
//!
//! | Statement | Behavior |
//! |-----------|----------|
//! | Relationship / column load | Inherit the parent's criteria |
//! | `include_all_tenants` option | No filter (logged) |
//! | Single-table select on the tenant table | No filter |
//! | Tenant set | `tenant_col = current tenant` on every tenant-bound occurrence |
//! | No tenant, `pass_through` | No filter (logged) |
//! | No tenant, `deny_all` | `WHERE false` on every tenant-bound occurrence |

mod criteria;
mod db_ops;
mod entity_traits;
mod error;
pub mod intercept;
mod loaded;
mod select;
mod session;

pub use criteria::{LoaderCriteria, Occurrence};
pub use entity_traits::TenantBound;
pub use error::ScopeError;
pub use intercept::{ExecuteState, Interception, MissingTenantPolicy, StatementKind, intercept};
pub use loaded::Loaded;
pub use select::{Scoped, SecureEntityExt, SecureSelect, Unscoped};
pub use session::TenantSession;

pub use db_ops::{
    SecureDeleteExt, SecureDeleteMany, SecureUpdateExt, SecureUpdateMany, secure_insert,
    validate_tenant,
};

pub use tenant_security::{CurrentTenant, ExecutionOptions, TenantContext, TenantId};

pub use tenant_db_macros::TenantBound;
