use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity(timestamps = "created")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "hobbies")]
pub struct Model {
    #[sea_orm(unique)]
    pub name: String,
}

impl ActiveModelBehavior for ActiveModel {}
