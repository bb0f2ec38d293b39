use sea_orm::{
    ColumnTrait, Condition, IdenStatic, QueryFilter,
    sea_query::{Alias, Expr},
};
use tenant_security::TenantId;

use crate::secure::TenantBound;

/// One appearance of an entity's table in a statement: the base table, a
/// joined table, or an aliased join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occurrence {
    table: String,
    alias: Option<String>,
    tenant_col: Option<String>,
    is_tenant_table: bool,
}

impl Occurrence {
    /// The entity's table under its own name.
    #[must_use]
    pub fn of<E>() -> Self
    where
        E: TenantBound,
    {
        Self {
            table: E::default().table_name().to_owned(),
            alias: None,
            tenant_col: E::tenant_col().map(|col| col.as_str().to_owned()),
            is_tenant_table: E::IS_TENANT_TABLE,
        }
    }

    /// The entity's table under `alias`.
    #[must_use]
    pub fn aliased<E>(alias: &str) -> Self
    where
        E: TenantBound,
    {
        Self {
            alias: Some(alias.to_owned()),
            ..Self::of::<E>()
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Name the occurrence is referenced by in SQL.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    #[must_use]
    pub fn tenant_col(&self) -> Option<&str> {
        self.tenant_col.as_deref()
    }

    #[must_use]
    pub fn is_tenant_bound(&self) -> bool {
        self.tenant_col.is_some()
    }

    #[must_use]
    pub fn is_tenant_table(&self) -> bool {
        self.is_tenant_table
    }
}

/// Global row filter attached to a statement and inherited by every
/// relationship or column load triggered by its results.
///
/// The tenant id is captured by value when the parent statement is scoped;
/// later changes to the caller's context do not affect it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoaderCriteria {
    /// No filtering.
    #[default]
    Unfiltered,
    /// `tenant_col = id` on every tenant-bound occurrence.
    Tenant(TenantId),
    /// No tenant-bound row is visible.
    DenyAll,
}

impl LoaderCriteria {
    #[must_use]
    pub fn tenant_id(&self) -> Option<&TenantId> {
        match self {
            Self::Tenant(id) => Some(id),
            Self::Unfiltered | Self::DenyAll => None,
        }
    }

    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        matches!(self, Self::Unfiltered)
    }

    /// Predicate for a single occurrence, `None` when it needs no filter.
    ///
    /// Entities without a tenant column are never filtered.
    #[must_use]
    pub fn condition_for(&self, occurrence: &Occurrence) -> Option<Condition> {
        let col = occurrence.tenant_col()?;
        match self {
            Self::Unfiltered => None,
            Self::Tenant(id) => Some(
                Condition::all().add(
                    Expr::col((Alias::new(occurrence.qualifier()), Alias::new(col)))
                        .eq(id.as_str()),
                ),
            ),
            Self::DenyAll => Some(Condition::all().add(Expr::value(false))),
        }
    }

    /// Predicate for the entity's own table.
    #[must_use]
    pub fn condition_for_entity<E>(&self) -> Option<Condition>
    where
        E: TenantBound,
        E::Column: ColumnTrait,
    {
        self.condition_for(&Occurrence::of::<E>())
    }

    /// Attach the predicate of every tenant-bound occurrence to `query`.
    #[must_use]
    pub fn apply_to<Q>(&self, query: Q, froms: &[Occurrence]) -> Q
    where
        Q: QueryFilter,
    {
        froms
            .iter()
            .filter_map(|occ| self.condition_for(occ))
            .fold(query, |q, cond| q.filter(cond))
    }
}
