//! The decision function consulted before any statement executes.
//!
//! The secure builders collect everything a decision needs into an
//! [`ExecuteState`] and call [`intercept`] exactly once when the statement is
//! scoped. Its [`Interception`] tells the builder whether to attach new
//! criteria, reuse the parent's, or leave the statement alone.

use serde::{Deserialize, Serialize};
use tenant_security::{ExecutionOptions, TenantContext};

use crate::secure::{LoaderCriteria, Occurrence};

/// What kind of statement is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Update,
    Delete,
    /// Related rows fetched for rows returned by a parent select, eagerly or lazily.
    RelationshipLoad,
    /// A deferred column fetched for a row returned by a parent select.
    ColumnLoad,
}

impl StatementKind {
    /// Loads triggered by a parent statement's results.
    #[must_use]
    pub fn is_derived_load(self) -> bool {
        matches!(self, Self::RelationshipLoad | Self::ColumnLoad)
    }
}

/// Behavior when a statement is scoped with no current tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTenantPolicy {
    /// Run unfiltered.
    #[default]
    PassThrough,
    /// Hide every tenant-bound row.
    DenyAll,
}

/// Everything the interceptor looks at for one statement.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteState<'a> {
    pub kind: StatementKind,
    pub options: &'a ExecutionOptions,
    /// Every table occurrence in the statement, base table first.
    pub froms: &'a [Occurrence],
    pub context: Option<&'a TenantContext>,
}

impl ExecuteState<'_> {
    /// A select whose only table is the tenant table.
    #[must_use]
    pub fn is_tenant_table_select(&self) -> bool {
        self.kind == StatementKind::Select
            && matches!(self.froms, [only] if only.is_tenant_table())
    }

    /// Occurrences that carry a tenant column.
    #[must_use]
    pub fn bound_occurrences(&self) -> usize {
        self.froms.iter().filter(|occ| occ.is_tenant_bound()).count()
    }

    fn base_table(&self) -> &str {
        self.froms.first().map_or("", Occurrence::table)
    }
}

/// Outcome of [`intercept`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Reuse the criteria captured by the parent statement.
    Inherit,
    /// The caller asked for all tenants.
    Bypass,
    /// Direct read of the tenant table. The statement itself gets no
    /// predicate; the carried criteria are captured by its rows so that
    /// relationship loads from a tenant stay scoped.
    TenantTable(LoaderCriteria),
    /// Attach these criteria to every tenant-bound occurrence.
    Apply(LoaderCriteria),
}

impl Interception {
    /// Criteria to attach, given what the parent statement captured.
    ///
    /// A statement with no parent inherits [`LoaderCriteria::Unfiltered`].
    #[must_use]
    pub fn into_criteria(self, parent: Option<&LoaderCriteria>) -> LoaderCriteria {
        match self {
            Self::Inherit => parent.cloned().unwrap_or_default(),
            Self::Bypass => LoaderCriteria::Unfiltered,
            Self::TenantTable(criteria) | Self::Apply(criteria) => criteria,
        }
    }
}

/// Decide how a statement is filtered.
///
/// Rules are evaluated in order:
/// 1. relationship and column loads inherit the parent's criteria;
/// 2. `include_all_tenants` bypasses filtering;
/// 3. a select on the tenant table alone is never filtered (the tenant table
///    has no tenant column, so its criteria only reach derived loads);
/// 4. the current tenant id, if any, becomes the criteria; otherwise the
///    `missing` policy decides.
#[must_use]
pub fn intercept(state: &ExecuteState<'_>, missing: MissingTenantPolicy) -> Interception {
    if state.kind.is_derived_load() {
        tracing::trace!(kind = ?state.kind, table = state.base_table(), "inheriting parent criteria");
        return Interception::Inherit;
    }

    if state.options.includes_all_tenants() {
        tracing::warn!(
            kind = ?state.kind,
            table = state.base_table(),
            "tenant filtering bypassed by include_all_tenants"
        );
        return Interception::Bypass;
    }

    if state.is_tenant_table_select() {
        tracing::debug!(table = state.base_table(), "tenant table read, not filtered");
        return Interception::TenantTable(resolve(state, missing));
    }

    let criteria = resolve(state, missing);
    match &criteria {
        LoaderCriteria::Tenant(id) => tracing::debug!(
            kind = ?state.kind,
            table = state.base_table(),
            tenant_id = %id,
            bound = state.bound_occurrences(),
            "applying tenant criteria"
        ),
        LoaderCriteria::Unfiltered => tracing::warn!(
            kind = ?state.kind,
            table = state.base_table(),
            "no current tenant, statement runs unfiltered"
        ),
        LoaderCriteria::DenyAll => tracing::debug!(
            kind = ?state.kind,
            table = state.base_table(),
            "no current tenant, denying tenant-bound rows"
        ),
    }
    Interception::Apply(criteria)
}

/// Criteria derived from the caller's context. Never touches the database.
fn resolve(state: &ExecuteState<'_>, missing: MissingTenantPolicy) -> LoaderCriteria {
    match state.context.and_then(TenantContext::current_tenant_id) {
        Some(id) => LoaderCriteria::Tenant(id.clone()),
        None => match missing {
            MissingTenantPolicy::PassThrough => LoaderCriteria::Unfiltered,
            MissingTenantPolicy::DenyAll => LoaderCriteria::DenyAll,
        },
    }
}
