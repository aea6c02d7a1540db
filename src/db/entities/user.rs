use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

pub const PRIVACY_PUBLIC: &str = "public";
pub const PRIVACY_PRIVATE: &str = "private";

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub profile_picture_url: Option<String>,
    pub privacy: String,
    pub gender: Option<String>,
    pub age_group: Option<String>,
    pub date_of_birth: Option<Date>,
    pub is_admin: bool,
    pub is_active: bool,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display name when set, otherwise the username.
    pub fn public_name(&self) -> &str {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.username.as_str(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.privacy == PRIVACY_PRIVATE
    }
}
