use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

/// Directed edge: `follower_id` follows `followed_id`.
#[base_entity(timestamps = "created")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    #[sea_orm(indexed)]
    pub follower_id: Uuid,
    #[sea_orm(indexed)]
    pub followed_id: Uuid,
}

impl ActiveModelBehavior for ActiveModel {}
