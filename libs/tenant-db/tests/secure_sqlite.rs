#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{account, ids, project, seeded_session, setting, task};
use sea_orm::{ColumnTrait, Order, sea_query::Expr};
use tenant_db::secure::{
    ExecutionOptions, LoaderCriteria, MissingTenantPolicy, TenantContext, TenantSession,
};

fn task_id(m: &task::Model) -> i32 {
    m.id
}

fn project_id(m: &project::Model) -> i32 {
    m.id
}

async fn visible_tasks(session: &TenantSession, ctx: &TenantContext) -> Vec<i32> {
    let rows = session
        .find::<task::Entity>()
        .scope_with(ctx)
        .all(session.conn())
        .await
        .unwrap();
    ids(&rows, task_id)
}

#[tokio::test]
async fn select_returns_only_current_tenant_rows() {
    let session = seeded_session().await;
    let ctx = TenantContext::for_tenant("acc1");

    let rows = session
        .find::<task::Entity>()
        .scope_with(&ctx)
        .all(session.conn())
        .await
        .unwrap();
    assert_eq!(ids(&rows, task_id), vec![1, 4, 5]);
    assert!(rows.iter().all(|t| t.account_id == "acc1"));
}

#[tokio::test]
async fn switching_tenant_changes_visible_rows() {
    let session = seeded_session().await;
    let mut ctx = TenantContext::new();

    ctx.set_current_tenant("acc1");
    assert_eq!(visible_tasks(&session, &ctx).await, vec![1, 4, 5]);

    ctx.set_current_tenant("acc2");
    assert_eq!(visible_tasks(&session, &ctx).await, vec![2, 3]);

    ctx.set_current_tenant("acc1");
    assert_eq!(visible_tasks(&session, &ctx).await, vec![1, 4, 5]);
}

#[tokio::test]
async fn tenant_table_is_never_filtered() {
    let session = seeded_session()
        .await
        .with_policy(MissingTenantPolicy::DenyAll);

    for ctx in [TenantContext::for_tenant("acc1"), TenantContext::new()] {
        let accounts = session
            .find::<account::Entity>()
            .scope_with(&ctx)
            .all(session.conn())
            .await
            .unwrap();
        assert_eq!(accounts.len(), 2);
    }
}

#[tokio::test]
async fn global_entities_are_never_filtered() {
    let session = seeded_session()
        .await
        .with_policy(MissingTenantPolicy::DenyAll);

    let count = session
        .find::<setting::Entity>()
        .scope_with(&TenantContext::new())
        .count(session.conn())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn eager_relationship_load_is_filtered() {
    let session = seeded_session().await;
    let ctx = TenantContext::for_tenant("acc1");

    let projects = session
        .find::<project::Entity>()
        .scope_with(&ctx)
        .order_by(project::Column::Id, Order::Asc)
        .all_with_related::<task::Entity, _>(session.conn())
        .await
        .unwrap();

    let shape: Vec<(i32, Vec<i32>)> = projects
        .iter()
        .map(|(p, tasks)| (p.id, ids(tasks, task_id)))
        .collect();
    assert_eq!(shape, vec![(1, vec![1]), (3, vec![5])]);
    for (_, tasks) in &projects {
        assert!(tasks.iter().all(|t| t.account_id == "acc1"));
    }
}

#[tokio::test]
async fn lazy_relationship_load_is_filtered() {
    let session = seeded_session().await;
    let ctx = TenantContext::for_tenant("acc2");

    let projects = session
        .find::<project::Entity>()
        .scope_with(&ctx)
        .all(session.conn())
        .await
        .unwrap();
    assert_eq!(ids(&projects, project_id), vec![2]);

    let tasks = projects[0]
        .related::<task::Entity, _>(session.conn())
        .await
        .unwrap();
    assert_eq!(ids(&tasks, task_id), vec![3]);

    // and back up the belongs-to side
    let parent = tasks[0]
        .related::<project::Entity, _>(session.conn())
        .await
        .unwrap();
    assert_eq!(ids(&parent, project_id), vec![2]);
}

#[tokio::test]
async fn lazy_load_keeps_criteria_captured_at_query_time() {
    let session = seeded_session().await;
    let mut ctx = TenantContext::for_tenant("acc1");

    let p1 = session
        .find::<project::Entity>()
        .scope_with(&ctx)
        .filter(project::Column::Id.eq(1))
        .one(session.conn())
        .await
        .unwrap()
        .unwrap();

    ctx.set_current_tenant("acc2");

    let tasks = p1.related::<task::Entity, _>(session.conn()).await.unwrap();
    assert_eq!(ids(&tasks, task_id), vec![1]);
    assert_eq!(
        tasks[0].criteria(),
        &LoaderCriteria::Tenant("acc1".into())
    );
}

#[tokio::test]
async fn traversal_from_tenant_row_stays_scoped() {
    let session = seeded_session().await;
    let ctx = TenantContext::for_tenant("acc1");

    let accounts = session
        .find::<account::Entity>()
        .scope_with(&ctx)
        .order_by(account::Column::Id, Order::Asc)
        .all(session.conn())
        .await
        .unwrap();

    let own = accounts[0]
        .related::<project::Entity, _>(session.conn())
        .await
        .unwrap();
    assert_eq!(ids(&own, project_id), vec![1, 3]);

    let other = accounts[1]
        .related::<project::Entity, _>(session.conn())
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn joined_tables_are_filtered() {
    let session = seeded_session().await;
    let ctx = TenantContext::for_tenant("acc1");

    let plain = session
        .find::<task::Entity>()
        .join_related::<project::Entity>()
        .scope_with(&ctx)
        .all(session.conn())
        .await
        .unwrap();
    // task 4 is acc1 but sits in an acc2 project
    assert_eq!(ids(&plain, task_id), vec![1, 5]);

    let aliased = session
        .find::<task::Entity>()
        .join_related_as::<project::Entity>("p")
        .scope_with(&ctx)
        .all(session.conn())
        .await
        .unwrap();
    assert_eq!(ids(&aliased, task_id), vec![1, 5]);
}

#[tokio::test]
async fn count_respects_tenant() {
    let session = seeded_session().await;
    let count = session
        .find::<task::Entity>()
        .scope_with(&TenantContext::for_tenant("acc2"))
        .count(session.conn())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn bypass_returns_all_rows() {
    let session = seeded_session()
        .await
        .with_policy(MissingTenantPolicy::DenyAll);
    let ctx = TenantContext::for_tenant("acc1");

    let rows = session
        .find::<task::Entity>()
        .execution_options(ExecutionOptions::include_all_tenants())
        .scope_with(&ctx)
        .all(session.conn())
        .await
        .unwrap();
    assert_eq!(ids(&rows, task_id), vec![1, 2, 3, 4, 5]);
    assert!(rows.iter().all(|t| t.criteria().is_unfiltered()));
}

#[tokio::test]
async fn missing_tenant_follows_session_policy() {
    let session = seeded_session().await;
    let nobody = TenantContext::new();

    assert_eq!(
        visible_tasks(&session, &nobody).await,
        vec![1, 2, 3, 4, 5]
    );

    let strict = session.clone().with_policy(MissingTenantPolicy::DenyAll);
    assert!(visible_tasks(&strict, &nobody).await.is_empty());
}

#[tokio::test]
async fn load_column_uses_captured_criteria() {
    let session = seeded_session().await;
    let ctx = TenantContext::for_tenant("acc1");

    let t4 = session
        .find::<task::Entity>()
        .scope_with(&ctx)
        .filter(task::Column::Id.eq(4))
        .one(session.conn())
        .await
        .unwrap()
        .unwrap();

    let title: Option<String> = t4
        .load_column(task::Column::Title, session.conn())
        .await
        .unwrap();
    assert_eq!(title.as_deref(), Some("t4"));

    // move the row to the other tenant behind the loaded copy's back
    session
        .update_many::<task::Entity>()
        .col_expr(task::Column::AccountId, Expr::value("acc2"))
        .filter(task::Column::Id.eq(4))
        .execution_options(ExecutionOptions::include_all_tenants())
        .scope_with(&ctx)
        .exec(session.conn())
        .await
        .unwrap();

    let title: Option<String> = t4
        .load_column(task::Column::Title, session.conn())
        .await
        .unwrap();
    assert_eq!(title, None);
}

#[tokio::test]
async fn bulk_update_touches_only_current_tenant() {
    let session = seeded_session().await;
    let ctx = TenantContext::for_tenant("acc1");

    let res = session
        .update_many::<task::Entity>()
        .col_expr(task::Column::Title, Expr::value("done"))
        .scope_with(&ctx)
        .exec(session.conn())
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 3);

    let untouched = session
        .find::<task::Entity>()
        .scope_with(&TenantContext::for_tenant("acc2"))
        .filter(task::Column::Title.eq("done"))
        .count(session.conn())
        .await
        .unwrap();
    assert_eq!(untouched, 0);
}

#[tokio::test]
async fn bulk_delete_touches_only_current_tenant() {
    let session = seeded_session().await;

    let res = session
        .delete_many::<task::Entity>()
        .scope_with(&TenantContext::for_tenant("acc2"))
        .exec(session.conn())
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 2);

    let left = session
        .find::<task::Entity>()
        .execution_options(ExecutionOptions::include_all_tenants())
        .scope_with(&TenantContext::new())
        .count(session.conn())
        .await
        .unwrap();
    assert_eq!(left, 3);
}

#[tokio::test]
async fn independent_contexts_run_side_by_side() {
    let session = seeded_session().await;
    let first = TenantContext::for_tenant("acc1");
    let second = TenantContext::for_tenant("acc2");

    let (a, b) = tokio::join!(
        visible_tasks(&session, &first),
        visible_tasks(&session, &second)
    );
    assert_eq!(a, vec![1, 4, 5]);
    assert_eq!(b, vec![2, 3]);
}
