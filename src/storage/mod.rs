pub mod uploads;

pub use uploads::{DEFAULT_AVATAR, UploadError, UploadStorage};
