mod csrf;
mod guards;
mod panic;
pub mod redirect;
mod too_large;

pub use csrf::Csrf;
pub use guards::{CurrentUser, MaybeUser};
pub use panic::catch_panic_layer;
pub use too_large::payload_too_large_redirect;
