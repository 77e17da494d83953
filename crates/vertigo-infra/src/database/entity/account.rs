//! Account entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub digest: String,
    #[sea_orm(nullable)]
    pub recovery: Option<String>,
    pub location: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for vertigo_core::domain::Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            digest: model.digest,
            recovery: model.recovery,
            location: model.location,
            created_at: model.created_at.into(),
        }
    }
}

impl From<vertigo_core::domain::Account> for ActiveModel {
    fn from(account: vertigo_core::domain::Account) -> Self {
        Self {
            id: Set(account.id),
            name: Set(account.name),
            email: Set(account.email),
            digest: Set(account.digest),
            recovery: Set(account.recovery),
            location: Set(account.location),
            created_at: Set(account.created_at.into()),
        }
    }
}
