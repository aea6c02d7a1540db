use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity(timestamps = "created")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(indexed)]
    pub sender_id: Uuid,
    #[sea_orm(indexed)]
    pub receiver_id: Uuid,
    pub body: String,
}

impl ActiveModelBehavior for ActiveModel {}
