pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod follow_dao;
pub mod hobby_dao;
pub mod message_dao;
pub mod notification_dao;
pub mod password_reset_dao;
pub mod session_dao;
pub mod user_dao;

pub use base::DaoBase;
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use follow_dao::FollowDao;
pub use hobby_dao::HobbyDao;
pub use message_dao::MessageDao;
pub use notification_dao::NotificationDao;
pub use password_reset_dao::PasswordResetDao;
pub use session_dao::SessionDao;
pub use user_dao::UserDao;
