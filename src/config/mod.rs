pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AddressLookupConfig, AppConfig, DatabaseConfig, GeneralConfig, LoggingConfig, SessionConfig,
    UploadConfig,
};
pub use envconfig::EnvConfig;
