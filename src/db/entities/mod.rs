#[allow(unused_imports)]
pub mod prelude {
    pub use super::follow::Entity as Follow;
    pub use super::hobby::Entity as Hobby;
    pub use super::message::Entity as Message;
    pub use super::notification::Entity as Notification;
    pub use super::password_reset_token::Entity as PasswordResetToken;
    pub use super::session::Entity as Session;
    pub use super::user::Entity as User;
    pub use super::user_hobby::Entity as UserHobby;
}

pub mod follow;
pub mod hobby;
pub mod message;
pub mod notification;
pub mod password_reset_token;
pub mod session;
pub mod user;
pub mod user_hobby;
