//! Server-side sessions keyed by an opaque cookie value.
//!
//! `session_middleware` loads the record before the handler runs and persists it afterwards
//! when it changed. Handlers reach it through the [`Session`] extractor.

mod handle;
mod layer;
pub mod store;

pub use handle::{Flash, FlashLevel, Session, SessionData};
pub use layer::session_middleware;
pub use store::{DatabaseSessionStore, MemorySessionStore, SessionError, SessionStore, build_store};
