//! The isolation smoke scenario.
//!
//! Two accounts, five users and ten addresses, some of them deliberately
//! assigned to a different account than their user. For each account in
//! turn, every user and every address reachable from a user, loaded eagerly
//! and lazily, must belong to the active account.

use std::fmt;

use sea_orm::{ColumnTrait, Order, Set};
use tenant_db::secure::{Loaded, ScopeError, TenantContext, TenantId, TenantSession};
use thiserror::Error;

use crate::entity::{account, address, user};

pub const ACCOUNTS: [(&str, &str); 2] = [("acc1", "test account 1"), ("acc2", "test account 2")];

/// `(user, account, [(address email, address account); 2])`
pub const USERS: [(&str, &str, [(&str, &str); 2]); 5] = [
    ("u1", "acc1", [("u1a1", "acc1"), ("u1a2", "acc1")]),
    ("u2", "acc1", [("u2a1", "acc2"), ("u2a2", "acc1")]),
    ("u3", "acc2", [("u3a1", "acc2"), ("u3a2", "acc2")]),
    ("u4", "acc2", [("u4a1", "acc2"), ("u4a2", "acc1")]),
    ("u5", "acc1", [("u5a1", "acc1"), ("u5a2", "acc2")]),
];

/// How a record was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPath {
    Query,
    Eager,
    Lazy,
}

impl fmt::Display for LoadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Eager => "eager load",
            Self::Lazy => "lazy load",
        })
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("account {0} not found")]
    MissingAccount(String),

    #[error("{entity} {id} has account_id {found}, expected {expected} (via {path})")]
    Leak {
        entity: &'static str,
        id: i32,
        found: String,
        expected: TenantId,
        path: LoadPath,
    },

    #[error("{path} returned {got} addresses for user {user}, eager load returned {expected}")]
    LoadMismatch {
        user: i32,
        path: LoadPath,
        got: usize,
        expected: usize,
    },
}

/// What one account could see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantReport {
    pub tenant: TenantId,
    pub users: usize,
    pub addresses: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    pub tenants: Vec<TenantReport>,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.tenants {
            writeln!(
                f,
                "{}: {} users, {} addresses, no cross-tenant rows",
                t.tenant, t.users, t.addresses
            )?;
        }
        Ok(())
    }
}

/// Insert the scenario data.
///
/// Inserts are not scoped, so mixed assignments persist as written.
///
/// # Errors
/// Returns `ScenarioError::Scope` if an insert fails.
pub async fn seed(session: &TenantSession) -> Result<(), ScenarioError> {
    for (id, name) in ACCOUNTS {
        session
            .insert::<account::Entity>(account::ActiveModel {
                id: Set(id.to_owned()),
                name: Set(Some(name.to_owned())),
            })
            .await?;
    }

    for (name, account_id, addresses) in USERS {
        let user = session
            .insert::<user::Entity>(user::ActiveModel {
                name: Set(name.to_owned()),
                account_id: Set(account_id.to_owned()),
                ..Default::default()
            })
            .await?;

        for (email, address_account) in addresses {
            session
                .insert::<address::Entity>(address::ActiveModel {
                    email: Set(email.to_owned()),
                    user_id: Set(Some(user.id)),
                    account_id: Set(address_account.to_owned()),
                    ..Default::default()
                })
                .await?;
        }
    }

    tracing::info!(
        accounts = ACCOUNTS.len(),
        users = USERS.len(),
        "scenario data inserted"
    );
    Ok(())
}

/// Seed the database and check every account in turn.
///
/// # Errors
/// Returns `ScenarioError::Leak` on the first record that belongs to another
/// account, or `ScenarioError::Scope` if a query fails.
pub async fn run(session: &TenantSession) -> Result<ScenarioReport, ScenarioError> {
    seed(session).await?;

    let mut ctx = TenantContext::new();
    let mut report = ScenarioReport::default();

    for (id, _) in ACCOUNTS {
        // a direct read of the tenant table: never filtered, never recursive
        let account = session
            .find::<account::Entity>()
            .scope_with(&ctx)
            .filter(account::Column::Id.eq(id))
            .one(session.conn())
            .await?
            .ok_or_else(|| ScenarioError::MissingAccount(id.to_owned()))?;

        ctx.set_current_tenant(account.model());
        tracing::info!(tenant = id, name = ?account.name, "current tenant switched");

        report.tenants.push(check_tenant(session, &ctx).await?);
    }

    Ok(report)
}

/// Load users with their addresses both ways and verify every record.
///
/// # Errors
/// Returns `ScenarioError::Leak` on the first foreign record.
pub async fn check_tenant(
    session: &TenantSession,
    ctx: &TenantContext,
) -> Result<TenantReport, ScenarioError> {
    let Some(expected) = ctx.current_tenant_id().cloned() else {
        return Err(ScenarioError::Scope(ScopeError::Invalid(
            "scenario check needs a current tenant",
        )));
    };

    let users = session
        .find::<user::Entity>()
        .scope_with(ctx)
        .order_by(user::Column::Id, Order::Asc)
        .all_with_related::<address::Entity, _>(session.conn())
        .await?;

    let mut addresses = 0;
    for (user, eager) in &users {
        expect_tenant("user", user.id, &user.account_id, &expected, LoadPath::Query)?;
        for addr in eager {
            expect_tenant("address", addr.id, &addr.account_id, &expected, LoadPath::Eager)?;
        }

        let lazy = user.related::<address::Entity, _>(session.conn()).await?;
        for addr in &lazy {
            expect_tenant("address", addr.id, &addr.account_id, &expected, LoadPath::Lazy)?;
        }
        if lazy.len() != eager.len() {
            return Err(ScenarioError::LoadMismatch {
                user: user.id,
                path: LoadPath::Lazy,
                got: lazy.len(),
                expected: eager.len(),
            });
        }
        addresses += eager.len();
    }

    tracing::info!(
        tenant = %expected,
        users = users.len(),
        addresses,
        "tenant isolation verified"
    );

    Ok(TenantReport {
        tenant: expected,
        users: users.len(),
        addresses,
    })
}

fn expect_tenant(
    entity: &'static str,
    id: i32,
    found: &str,
    expected: &TenantId,
    path: LoadPath,
) -> Result<(), ScenarioError> {
    if expected == found {
        return Ok(());
    }
    tracing::error!(entity, id, found, expected = %expected, %path, "cross-tenant record");
    Err(ScenarioError::Leak {
        entity,
        id,
        found: found.to_owned(),
        expected: expected.clone(),
        path,
    })
}

/// Names of the addresses in `rows`, sorted.
#[must_use]
pub fn emails(rows: &[Loaded<address::Model>]) -> Vec<String> {
    let mut out: Vec<String> = rows.iter().map(|a| a.email.clone()).collect();
    out.sort();
    out
}
