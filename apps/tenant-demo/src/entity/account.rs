use sea_orm::entity::prelude::*;
use tenant_db::secure::TenantBound;
use tenant_security::CurrentTenant;

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
    #[sea_orm(has_many = "super::user::Entity")]
    User,
    #[sea_orm(has_many = "super::address::Entity")]
    Address,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for CurrentTenant {
    fn from(account: &Model) -> Self {
        let tenant = CurrentTenant::new(account.id.as_str());
        match &account.name {
            Some(name) => tenant.with_name(name.as_str()),
            None => tenant,
        }
    }
}
