use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity(timestamps = "created")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    /// SHA-256 hex digest of the emailed token.
    #[sea_orm(unique)]
    pub token_hash: String,
    pub expires_at: DateTimeWithTimeZone,
    pub used_at: Option<DateTimeWithTimeZone>,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_valid_at(&self, now: DateTimeWithTimeZone) -> bool {
        self.used_at.is_none() && now <= self.expires_at
    }
}
