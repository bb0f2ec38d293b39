use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter};
use std::marker::PhantomData;

use crate::secure::error::ScopeError;
use crate::secure::intercept::{ExecuteState, MissingTenantPolicy, StatementKind, intercept};
use crate::secure::{
    ExecutionOptions, LoaderCriteria, Occurrence, Scoped, TenantBound, TenantContext, TenantId,
    Unscoped,
};

/// Plain insert wrapped in the secure error type.
///
/// Inserts are not tenant-scoped: the tenant column is whatever the caller
/// set on the `ActiveModel`, which may differ from the current tenant. Use
/// [`validate_tenant`] first when that is not wanted.
///
/// # Example
///
/// ```ignore
/// use tenant_db::secure::{secure_insert, validate_tenant};
///
/// validate_tenant(&tenant_id, &ctx)?;
/// let am = user::ActiveModel {
///     name: Set("u1".to_owned()),
///     account_id: Set(tenant_id.to_string()),
///     ..Default::default()
/// };
/// let user = secure_insert::<user::Entity>(am, conn).await?;
/// ```
///
/// # Errors
///
/// - Returns `ScopeError::Db` if the database insert fails.
pub async fn secure_insert<E>(
    am: E::ActiveModel,
    conn: &impl ConnectionTrait,
) -> Result<E::Model, ScopeError>
where
    E: TenantBound,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    Ok(am.insert(conn).await?)
}

/// Check that `tenant_id` is the context's current tenant.
///
/// # Errors
/// Returns `ScopeError::Invalid` if the context has no tenant and
/// `ScopeError::Denied` if it holds a different one.
pub fn validate_tenant(tenant_id: &TenantId, ctx: &TenantContext) -> Result<(), ScopeError> {
    match ctx.current_tenant_id() {
        Some(current) if current == tenant_id => Ok(()),
        Some(current) => Err(ScopeError::Denied(format!(
            "tenant {tenant_id} is not the current tenant {current}"
        ))),
        None => Err(ScopeError::Invalid("no current tenant in context")),
    }
}

/// Decide the criteria for a bulk statement on `E`'s table.
fn decide<E: TenantBound>(
    kind: StatementKind,
    options: ExecutionOptions,
    policy: MissingTenantPolicy,
    ctx: &TenantContext,
) -> (LoaderCriteria, [Occurrence; 1]) {
    let froms = [Occurrence::of::<E>()];
    let state = ExecuteState {
        kind,
        options: &options,
        froms: &froms,
        context: Some(ctx),
    };
    (intercept(&state, policy).into_criteria(None), froms)
}

/// A type-safe wrapper around `SeaORM`'s `UpdateMany` that enforces tenant filtering.
///
/// # Example
/// ```ignore
/// use tenant_db::secure::SecureUpdateExt;
///
/// let result = user::Entity::update_many()
///     .col_expr(user::Column::Name, Expr::value("renamed"))
///     .secure()           // Returns SecureUpdateMany<E, Unscoped>
///     .scope_with(&ctx)   // Returns SecureUpdateMany<E, Scoped>
///     .exec(conn)         // Now can execute
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct SecureUpdateMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::UpdateMany<E>,
    pub(crate) options: ExecutionOptions,
    pub(crate) policy: MissingTenantPolicy,
    pub(crate) _state: PhantomData<S>,
}

/// Extension trait to convert a regular `SeaORM` `UpdateMany` into a `SecureUpdateMany`.
pub trait SecureUpdateExt<E: EntityTrait>: Sized {
    /// Convert this update operation into a secure (unscoped) update.
    /// You must call `.scope_with()` before executing.
    fn secure(self) -> SecureUpdateMany<E, Unscoped>;
}

impl<E> SecureUpdateExt<E> for sea_orm::UpdateMany<E>
where
    E: TenantBound,
{
    fn secure(self) -> SecureUpdateMany<E, Unscoped> {
        SecureUpdateMany {
            inner: self,
            options: ExecutionOptions::default(),
            policy: MissingTenantPolicy::default(),
            _state: PhantomData,
        }
    }
}

// Methods available only on Unscoped updates
impl<E> SecureUpdateMany<E, Unscoped>
where
    E: TenantBound,
{
    /// Set a column to an expression.
    #[must_use]
    pub fn col_expr<T>(mut self, col: T, expr: sea_orm::sea_query::SimpleExpr) -> Self
    where
        T: sea_orm::sea_query::IntoIden,
    {
        self.inner = self.inner.col_expr(col, expr);
        self
    }

    /// Narrow the rows to update.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: sea_orm::sea_query::IntoCondition,
    {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    #[must_use]
    pub fn execution_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn missing_tenant(mut self, policy: MissingTenantPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Route the update through the interceptor, transitioning to the `Scoped` state.
    ///
    /// With a current tenant only that tenant's rows are updated.
    #[must_use]
    pub fn scope_with(self, ctx: &TenantContext) -> SecureUpdateMany<E, Scoped> {
        let (criteria, froms) =
            decide::<E>(StatementKind::Update, self.options, self.policy, ctx);
        SecureUpdateMany {
            inner: criteria.apply_to(self.inner, &froms),
            options: self.options,
            policy: self.policy,
            _state: PhantomData,
        }
    }
}

// Methods available only on Scoped updates
impl<E> SecureUpdateMany<E, Scoped>
where
    E: EntityTrait,
{
    /// Execute the update operation.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database operation fails.
    pub async fn exec<C: ConnectionTrait + Send + Sync>(
        self,
        conn: &C,
    ) -> Result<sea_orm::UpdateResult, ScopeError> {
        Ok(self.inner.exec(conn).await?)
    }

    /// Unwrap the inner `SeaORM` `UpdateMany` for advanced use cases.
    ///
    /// # Safety
    /// The caller must ensure they don't remove or bypass the tenant
    /// conditions that were applied during `.scope_with()`.
    #[must_use]
    pub fn into_inner(self) -> sea_orm::UpdateMany<E> {
        self.inner
    }
}

/// A type-safe wrapper around `SeaORM`'s `DeleteMany` that enforces tenant filtering.
///
/// # Example
/// ```ignore
/// use tenant_db::secure::SecureDeleteExt;
///
/// let result = address::Entity::delete_many()
///     .filter(address::Column::UserId.is_null())
///     .secure()           // Returns SecureDeleteMany<E, Unscoped>
///     .scope_with(&ctx)   // Returns SecureDeleteMany<E, Scoped>
///     .exec(conn)         // Now can execute
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct SecureDeleteMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::DeleteMany<E>,
    pub(crate) options: ExecutionOptions,
    pub(crate) policy: MissingTenantPolicy,
    pub(crate) _state: PhantomData<S>,
}

/// Extension trait to convert a regular `SeaORM` `DeleteMany` into a `SecureDeleteMany`.
pub trait SecureDeleteExt<E: EntityTrait>: Sized {
    /// Convert this delete operation into a secure (unscoped) delete.
    /// You must call `.scope_with()` before executing.
    fn secure(self) -> SecureDeleteMany<E, Unscoped>;
}

impl<E> SecureDeleteExt<E> for sea_orm::DeleteMany<E>
where
    E: TenantBound,
{
    fn secure(self) -> SecureDeleteMany<E, Unscoped> {
        SecureDeleteMany {
            inner: self,
            options: ExecutionOptions::default(),
            policy: MissingTenantPolicy::default(),
            _state: PhantomData,
        }
    }
}

// Methods available only on Unscoped deletes
impl<E> SecureDeleteMany<E, Unscoped>
where
    E: TenantBound,
{
    /// Narrow the rows to delete.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: sea_orm::sea_query::IntoCondition,
    {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    #[must_use]
    pub fn execution_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn missing_tenant(mut self, policy: MissingTenantPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Route the delete through the interceptor, transitioning to the `Scoped` state.
    ///
    /// With a current tenant only that tenant's rows are deleted.
    #[must_use]
    pub fn scope_with(self, ctx: &TenantContext) -> SecureDeleteMany<E, Scoped> {
        let (criteria, froms) =
            decide::<E>(StatementKind::Delete, self.options, self.policy, ctx);
        SecureDeleteMany {
            inner: criteria.apply_to(self.inner, &froms),
            options: self.options,
            policy: self.policy,
            _state: PhantomData,
        }
    }
}

// Methods available only on Scoped deletes
impl<E> SecureDeleteMany<E, Scoped>
where
    E: EntityTrait,
{
    /// Execute the delete operation.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database operation fails.
    pub async fn exec<C: ConnectionTrait + Send + Sync>(
        self,
        conn: &C,
    ) -> Result<sea_orm::DeleteResult, ScopeError> {
        Ok(self.inner.exec(conn).await?)
    }

    /// Unwrap the inner `SeaORM` `DeleteMany` for advanced use cases.
    ///
    /// # Safety
    /// The caller must ensure they don't remove or bypass the tenant
    /// conditions that were applied during `.scope_with()`.
    #[must_use]
    pub fn into_inner(self) -> sea_orm::DeleteMany<E> {
        self.inner
    }
}
