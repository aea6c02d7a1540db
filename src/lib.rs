pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod forms;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
pub mod test_helpers;
