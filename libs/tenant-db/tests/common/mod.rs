#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema, Set};
use tenant_db::secure::TenantSession;
use tenant_db::{DbConfig, connect};

pub mod account {
    use sea_orm::entity::prelude::*;
    use tenant_db::secure::TenantBound;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantBound)]
    #[sea_orm(table_name = "account")]
    #[tenant(tenant_table)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub name: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::project::Entity")]
        Project,
    }

    impl Related<super::project::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Project.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod project {
    use sea_orm::entity::prelude::*;
    use tenant_db::secure::TenantBound;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantBound)]
    #[sea_orm(table_name = "project")]
    #[tenant(tenant_col = "account_id")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub account_id: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::account::Entity",
            from = "Column::AccountId",
            to = "super::account::Column::Id"
        )]
        Account,
        #[sea_orm(has_many = "super::task::Entity")]
        Task,
    }

    impl Related<super::account::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Account.def()
        }
    }

    impl Related<super::task::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Task.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod task {
    use sea_orm::entity::prelude::*;
    use tenant_db::secure::TenantBound;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantBound)]
    #[sea_orm(table_name = "task")]
    #[tenant(tenant_col = "account_id")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub project_id: i32,
        pub account_id: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::project::Entity",
            from = "Column::ProjectId",
            to = "super::project::Column::Id"
        )]
        Project,
    }

    impl Related<super::project::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Project.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod setting {
    use sea_orm::entity::prelude::*;
    use tenant_db::secure::TenantBound;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantBound)]
    #[sea_orm(table_name = "setting")]
    #[tenant(no_tenant)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub key: String,
        pub value: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

async fn create_table<E: EntityTrait>(conn: &DatabaseConnection, entity: E) {
    let backend = conn.get_database_backend();
    let stmt = Schema::new(backend).create_table_from_entity(entity);
    conn.execute(backend.build(&stmt)).await.unwrap();
}

/// Fresh in-memory database with the test schema and no rows.
pub async fn empty_session() -> TenantSession {
    let conn = connect(&DbConfig::default()).await.unwrap();
    create_table(&conn, account::Entity).await;
    create_table(&conn, project::Entity).await;
    create_table(&conn, task::Entity).await;
    create_table(&conn, setting::Entity).await;
    TenantSession::new(conn)
}

/// Seeded database:
///
/// | project | account | tasks (account)           |
/// |---------|---------|---------------------------|
/// | 1       | acc1    | 1 (acc1), 2 (acc2)        |
/// | 2       | acc2    | 3 (acc2), 4 (acc1)        |
/// | 3       | acc1    | 5 (acc1)                  |
///
/// plus two global settings.
pub async fn seeded_session() -> TenantSession {
    let session = empty_session().await;

    for (id, name) in [("acc1", "first"), ("acc2", "second")] {
        session
            .insert::<account::Entity>(account::ActiveModel {
                id: Set(id.to_owned()),
                name: Set(Some(name.to_owned())),
            })
            .await
            .unwrap();
    }

    for (id, acc) in [(1, "acc1"), (2, "acc2"), (3, "acc1")] {
        session
            .insert::<project::Entity>(project::ActiveModel {
                id: Set(id),
                name: Set(format!("p{id}")),
                account_id: Set(acc.to_owned()),
            })
            .await
            .unwrap();
    }

    for (id, project_id, acc) in [
        (1, 1, "acc1"),
        (2, 1, "acc2"),
        (3, 2, "acc2"),
        (4, 2, "acc1"),
        (5, 3, "acc1"),
    ] {
        session
            .insert::<task::Entity>(task::ActiveModel {
                id: Set(id),
                title: Set(format!("t{id}")),
                project_id: Set(project_id),
                account_id: Set(acc.to_owned()),
            })
            .await
            .unwrap();
    }

    for (key, value) in [("theme", "dark"), ("locale", "en")] {
        session
            .insert::<setting::Entity>(setting::ActiveModel {
                key: Set(key.to_owned()),
                value: Set(value.to_owned()),
            })
            .await
            .unwrap();
    }

    session
}

pub fn ids<M>(rows: &[tenant_db::secure::Loaded<M>], id: impl Fn(&M) -> i32) -> Vec<i32> {
    let mut out: Vec<i32> = rows.iter().map(|row| id(row.model())).collect();
    out.sort_unstable();
    out
}
