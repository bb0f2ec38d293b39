use sea_orm::{
    ConnectionTrait, EntityTrait, FromQueryResult, JoinType, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Related, sea_query::Alias,
};
use std::marker::PhantomData;

use crate::secure::error::ScopeError;
use crate::secure::intercept::{ExecuteState, MissingTenantPolicy, StatementKind, intercept};
use crate::secure::{
    ExecutionOptions, Loaded, LoaderCriteria, Occurrence, TenantBound, TenantContext,
};

/// Typestate marker: query has not yet been scoped.
/// Cannot execute queries in this state.
#[derive(Debug, Clone, Copy)]
pub struct Unscoped;

/// Typestate marker: query has been routed through the interceptor.
/// Can now execute queries safely.
#[derive(Debug, Clone, Copy)]
pub struct Scoped;

/// A type-safe wrapper around `SeaORM`'s `Select` that enforces tenant filtering.
///
/// Joins and execution options can only be added while `Unscoped`, so every
/// table occurrence is known when the interceptor runs. Only `Scoped` queries
/// execute, and every row they return carries the criteria they were scoped
/// with.
///
/// # Example
/// ```rust,ignore
/// use tenant_db::secure::{SecureEntityExt, TenantContext};
///
/// let ctx = TenantContext::for_tenant("acc1");
/// let users = user::Entity::find()
///     .secure()                        // SecureSelect<E, Unscoped>
///     .join_related::<account::Entity>()
///     .scope_with(&ctx)                // SecureSelect<E, Scoped>
///     .all(conn)                       // Vec<Loaded<user::Model>>
///     .await?;
/// ```
#[must_use]
#[derive(Clone, Debug)]
pub struct SecureSelect<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::Select<E>,
    pub(crate) froms: Vec<Occurrence>,
    pub(crate) options: ExecutionOptions,
    pub(crate) policy: MissingTenantPolicy,
    pub(crate) criteria: LoaderCriteria,
    pub(crate) _state: PhantomData<S>,
}

/// Extension trait to convert a regular `SeaORM` `Select` into a `SecureSelect`.
pub trait SecureEntityExt<E: EntityTrait>: Sized {
    /// Convert this select query into a secure (unscoped) select.
    /// You must call `.scope_with()` before executing the query.
    fn secure(self) -> SecureSelect<E, Unscoped>;
}

impl<E> SecureEntityExt<E> for sea_orm::Select<E>
where
    E: TenantBound,
{
    fn secure(self) -> SecureSelect<E, Unscoped> {
        SecureSelect {
            inner: self,
            froms: vec![Occurrence::of::<E>()],
            options: ExecutionOptions::default(),
            policy: MissingTenantPolicy::default(),
            criteria: LoaderCriteria::Unfiltered,
            _state: PhantomData,
        }
    }
}

// Methods available only on Unscoped queries
impl<E> SecureSelect<E, Unscoped>
where
    E: TenantBound,
{
    /// Inner join a related entity. Its table is filtered like the base table.
    ///
    /// A many-to-many relation is joined through its junction table, which is
    /// not filtered itself.
    pub fn join_related<R>(mut self) -> Self
    where
        R: TenantBound,
        E: Related<R>,
    {
        self = self.join_junction::<R>();
        self.inner = QuerySelect::join(self.inner, JoinType::InnerJoin, <E as Related<R>>::to());
        self.froms.push(Occurrence::of::<R>());
        self
    }

    /// Inner join a related entity under `alias`. The alias is filtered too.
    pub fn join_related_as<R>(mut self, alias: &str) -> Self
    where
        R: TenantBound,
        E: Related<R>,
    {
        self = self.join_junction::<R>();
        self.inner = QuerySelect::join_as(
            self.inner,
            JoinType::InnerJoin,
            <E as Related<R>>::to(),
            Alias::new(alias),
        );
        self.froms.push(Occurrence::aliased::<R>(alias));
        self
    }

    fn join_junction<R>(mut self) -> Self
    where
        R: TenantBound,
        E: Related<R>,
    {
        if let Some(via) = <E as Related<R>>::via() {
            self.inner = QuerySelect::join(self.inner, JoinType::InnerJoin, via);
        }
        self
    }

    /// Per-statement options, e.g. [`ExecutionOptions::include_all_tenants`].
    pub fn execution_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// What to do if the context carries no tenant. Defaults to pass-through.
    pub fn missing_tenant(mut self, policy: MissingTenantPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Route the query through the interceptor, transitioning to the `Scoped` state.
    ///
    /// The criteria are decided here, from the context as it is now, and
    /// captured by value into every row the query returns.
    pub fn scope_with(self, ctx: &TenantContext) -> SecureSelect<E, Scoped> {
        self.scope(StatementKind::Select, Some(ctx), None)
    }

    /// Scope a load derived from a parent row with the parent's criteria.
    pub(crate) fn inherit(
        self,
        kind: StatementKind,
        parent: &LoaderCriteria,
    ) -> SecureSelect<E, Scoped> {
        self.scope(kind, None, Some(parent))
    }

    fn scope(
        self,
        kind: StatementKind,
        ctx: Option<&TenantContext>,
        parent: Option<&LoaderCriteria>,
    ) -> SecureSelect<E, Scoped> {
        let state = ExecuteState {
            kind,
            options: &self.options,
            froms: &self.froms,
            context: ctx,
        };
        let criteria = intercept(&state, self.policy).into_criteria(parent);
        SecureSelect {
            inner: criteria.apply_to(self.inner, &self.froms),
            froms: self.froms,
            options: self.options,
            policy: self.policy,
            criteria,
            _state: PhantomData,
        }
    }
}

// Filters and ordering never widen the tenant predicate, so both states allow them.
impl<E, S> SecureSelect<E, S>
where
    E: EntityTrait,
{
    /// Add additional filters. The tenant conditions remain in place.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: sea_orm::sea_query::IntoCondition,
    {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    /// Add ordering.
    pub fn order_by<C>(mut self, col: C, order: sea_orm::Order) -> Self
    where
        C: sea_orm::IntoSimpleExpr,
    {
        self.inner = QueryOrder::order_by(self.inner, col, order);
        self
    }

    /// Add a limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.inner = QuerySelect::limit(self.inner, limit);
        self
    }

    /// Add an offset.
    pub fn offset(mut self, offset: u64) -> Self {
        self.inner = QuerySelect::offset(self.inner, offset);
        self
    }

    /// Table occurrences known to the interceptor, base table first.
    #[must_use]
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.froms
    }
}

// Methods available only on Scoped queries
impl<E> SecureSelect<E, Scoped>
where
    E: EntityTrait,
{
    /// Execute the query and return all matching rows.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database query fails.
    pub async fn all<C>(self, conn: &C) -> Result<Vec<Loaded<E::Model>>, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        let criteria = self.criteria;
        let rows = self.inner.all(conn).await?;
        Ok(rows
            .into_iter()
            .map(|model| Loaded::new(model, criteria.clone()))
            .collect())
    }

    /// Execute the query and return at most one row.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database query fails.
    pub async fn one<C>(self, conn: &C) -> Result<Option<Loaded<E::Model>>, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        let criteria = self.criteria;
        Ok(self
            .inner
            .one(conn)
            .await?
            .map(|model| Loaded::new(model, criteria)))
    }

    /// Execute the query and return the number of matching rows.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database query fails.
    pub async fn count<C>(self, conn: &C) -> Result<u64, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
        E::Model: FromQueryResult + Send + Sync,
    {
        Ok(self.inner.count(conn).await?)
    }

    /// Execute the query and eagerly load a one-to-many `R` for every row in
    /// one batch.
    ///
    /// The batch statement is a relationship load: it carries the criteria of
    /// this query, not whatever the caller's context holds later.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if either query fails.
    pub async fn all_with_related<R, C>(
        self,
        conn: &C,
    ) -> Result<Vec<(Loaded<E::Model>, Vec<Loaded<R::Model>>)>, ScopeError>
    where
        R: TenantBound,
        R::Model: Send + Sync,
        E: Related<R>,
        E::Model: Sync,
        C: ConnectionTrait + Send + Sync,
    {
        let criteria = self.criteria;
        let parents = self.inner.all(conn).await?;
        let related = R::find()
            .secure()
            .inherit(StatementKind::RelationshipLoad, &criteria)
            .into_inner();
        let children = parents.load_many(related, conn).await?;

        Ok(parents
            .into_iter()
            .zip(children)
            .map(|(parent, kids)| {
                let kids = kids
                    .into_iter()
                    .map(|kid| Loaded::new(kid, criteria.clone()))
                    .collect();
                (Loaded::new(parent, criteria.clone()), kids)
            })
            .collect())
    }

    /// Criteria this query was scoped with.
    #[must_use]
    pub fn criteria(&self) -> &LoaderCriteria {
        &self.criteria
    }

    /// Unwrap the inner `SeaORM` `Select` for advanced use cases.
    ///
    /// # Safety
    /// The caller must ensure they don't remove or bypass the tenant
    /// conditions that were applied during `.scope_with()`.
    #[must_use]
    pub fn into_inner(self) -> sea_orm::Select<E> {
        self.inner
    }
}
