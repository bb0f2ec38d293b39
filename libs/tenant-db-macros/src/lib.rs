#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
// Proc-macro crate for tenant-db derives
//
//! # tenant-db-macros
//!
//! ## `#[derive(TenantBound)]`
//!
//! Implements `tenant_db::secure::TenantBound` for the `Entity` of a `SeaORM`
//! model. Exactly one tenant decision must be declared:
//!
//! - `tenant_col = "column_name"`: rows belong to the tenant stored in that column
//! - `no_tenant`: global entity, never filtered
//! - `tenant_table`: the tenant table itself, never filtered
//!
//! ```ignore
//! use sea_orm::entity::prelude::*;
//! use tenant_db::secure::TenantBound;
//!
//! #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantBound)]
//! #[sea_orm(table_name = "user")]
//! #[tenant(tenant_col = "account_id")]
//! pub struct Model {
//!     #[sea_orm(primary_key)]
//!     pub id: i32,
//!     pub name: String,
//!     pub account_id: String,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro_error2::proc_macro_error;
use syn::{DeriveInput, parse_macro_input};

mod tenant_bound;

/// Derive macro for implementing `TenantBound`.
///
/// Place it on the `SeaORM` `Model` struct next to `DeriveEntityModel`, with
/// one `#[tenant(...)]` attribute: `tenant_col = "..."`, `no_tenant` or
/// `tenant_table`.
#[proc_macro_derive(TenantBound, attributes(tenant))]
#[proc_macro_error]
pub fn derive_tenant_bound(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    tenant_bound::expand_derive_tenant_bound(&input).into()
}
