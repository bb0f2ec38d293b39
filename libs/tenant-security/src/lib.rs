#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Tenant identity types shared by the data-access layer.
//!
//! - [`TenantId`]: opaque string identifier of a tenant (account)
//! - [`TenantContext`]: the caller-owned "current tenant" holder
//! - [`ExecutionOptions`]: per-statement switches, including the
//!   administrative `include_all_tenants` escape hatch

pub mod context;
pub mod options;
pub mod tenant_id;

pub use context::{CurrentTenant, TenantContext};
pub use options::ExecutionOptions;
pub use tenant_id::TenantId;
