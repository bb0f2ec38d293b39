use sea_orm::EntityTrait;

/// Declares whether an entity's rows belong to a tenant.
///
/// Every entity queried through the secure layer implements this trait,
/// explicitly, so forgetting the tenant decision is a compile error rather
/// than a silent leak.
///
/// # Example (Manual Implementation)
/// ```rust,ignore
/// impl TenantBound for user::Entity {
///     fn tenant_col() -> Option<Self::Column> {
///         Some(user::Column::AccountId)
///     }
/// }
///
/// impl TenantBound for account::Entity {
///     const IS_TENANT_TABLE: bool = true;
///
///     fn tenant_col() -> Option<Self::Column> {
///         None
///     }
/// }
/// ```
///
/// # Example (Using Derive Macro)
/// ```rust,ignore
/// #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantBound)]
/// #[sea_orm(table_name = "address")]
/// #[tenant(tenant_col = "account_id")]
/// pub struct Model {
///     #[sea_orm(primary_key)]
///     pub id: i32,
///     pub email: String,
///     pub user_id: Option<i32>,
///     pub account_id: String,
/// }
/// ```
pub trait TenantBound: EntityTrait {
    /// True for the table that stores the tenants themselves.
    ///
    /// Single-table selects against it are never filtered, so resolving the
    /// current tenant cannot recurse into tenant filtering.
    const IS_TENANT_TABLE: bool = false;

    /// Column holding the owning tenant's id.
    ///
    /// - Tenant-bound entities: `Some(Column::AccountId)`
    /// - Global entities and the tenant table: `None`
    fn tenant_col() -> Option<Self::Column>;
}
