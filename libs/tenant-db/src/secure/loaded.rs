use std::ops::Deref;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, Iterable, ModelTrait, PrimaryKeyToColumn,
    QueryFilter, QuerySelect, Related, TryGetableMany,
};

use crate::secure::error::ScopeError;
use crate::secure::intercept::StatementKind;
use crate::secure::{LoaderCriteria, SecureEntityExt, TenantBound};

/// A row returned by a scoped query, together with the criteria it was
/// loaded under.
///
/// Relationship and column loads started from the row reuse those criteria,
/// whatever the caller's context holds by then.
#[derive(Clone, Debug, PartialEq)]
pub struct Loaded<M> {
    model: M,
    criteria: LoaderCriteria,
}

impl<M> Loaded<M> {
    pub(crate) fn new(model: M, criteria: LoaderCriteria) -> Self {
        Self { model, criteria }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[must_use]
    pub fn criteria(&self) -> &LoaderCriteria {
        &self.criteria
    }
}

impl<M> Deref for Loaded<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.model
    }
}

impl<M> Loaded<M>
where
    M: ModelTrait,
{
    /// Lazily load the rows of `R` related to this one.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database query fails.
    pub async fn related<R, C>(&self, conn: &C) -> Result<Vec<Loaded<R::Model>>, ScopeError>
    where
        R: TenantBound,
        M::Entity: Related<R>,
        C: ConnectionTrait + Send + Sync,
    {
        self.model
            .find_related(R::default())
            .secure()
            .inherit(StatementKind::RelationshipLoad, &self.criteria)
            .all(conn)
            .await
    }

    /// Load a single column of this row from the database.
    ///
    /// Returns `None` when the row is no longer visible under the captured
    /// criteria.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the database query fails.
    pub async fn load_column<T, C>(
        &self,
        column: <M::Entity as EntityTrait>::Column,
        conn: &C,
    ) -> Result<Option<T>, ScopeError>
    where
        M::Entity: TenantBound,
        T: TryGetableMany,
        C: ConnectionTrait + Send + Sync,
    {
        let mut by_key = <M::Entity as EntityTrait>::find();
        for key in <<M::Entity as EntityTrait>::PrimaryKey as Iterable>::iter() {
            let col = key.into_column();
            by_key = by_key.filter(col.eq(self.model.get(col)));
        }

        Ok(by_key
            .secure()
            .inherit(StatementKind::ColumnLoad, &self.criteria)
            .into_inner()
            .select_only()
            .column(column)
            .into_tuple::<T>()
            .one(conn)
            .await?)
    }
}
