use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel};

use crate::secure::error::ScopeError;
use crate::secure::intercept::MissingTenantPolicy;
use crate::secure::{
    SecureDeleteExt, SecureDeleteMany, SecureEntityExt, SecureSelect, SecureUpdateExt,
    SecureUpdateMany, TenantBound, Unscoped, secure_insert,
};

/// Entry point for tenant-scoped data access.
///
/// Owns the connection and the missing-tenant policy, and hands out builders
/// that already carry that policy. The session never holds a tenant: the
/// caller passes its [`TenantContext`](crate::secure::TenantContext) to each
/// `scope_with`, so one session can serve many tenants concurrently.
#[derive(Clone, Debug)]
pub struct TenantSession {
    conn: DatabaseConnection,
    policy: MissingTenantPolicy,
}

impl TenantSession {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            policy: MissingTenantPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: MissingTenantPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Select every row of `E`, pending scoping.
    pub fn find<E: TenantBound>(&self) -> SecureSelect<E, Unscoped> {
        E::find().secure().missing_tenant(self.policy)
    }

    /// Bulk update of `E`, pending scoping.
    #[must_use]
    pub fn update_many<E: TenantBound>(&self) -> SecureUpdateMany<E, Unscoped> {
        E::update_many().secure().missing_tenant(self.policy)
    }

    /// Bulk delete of `E`, pending scoping.
    #[must_use]
    pub fn delete_many<E: TenantBound>(&self) -> SecureDeleteMany<E, Unscoped> {
        E::delete_many().secure().missing_tenant(self.policy)
    }

    /// Insert one row. Not tenant-scoped, see [`secure_insert`].
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database insert fails.
    pub async fn insert<E>(&self, am: E::ActiveModel) -> Result<E::Model, ScopeError>
    where
        E: TenantBound,
        E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        secure_insert::<E>(am, &self.conn).await
    }
}
