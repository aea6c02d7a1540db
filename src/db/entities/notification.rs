use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

pub const KIND_FOLLOW: &str = "follow";
pub const KIND_UNFOLLOW: &str = "unfollow";

#[base_entity(timestamps = "created")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub read_at: Option<DateTimeWithTimeZone>,
}

impl ActiveModelBehavior for ActiveModel {}
