pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://instance/kampongkonek.db?mode=rwc";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 1;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "kampong_session";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24 * 7;
pub const DEFAULT_SESSION_COOKIE_SECURE: bool = false;
pub const DEFAULT_UPLOAD_DIR: &str = "instance/uploads";
pub const DEFAULT_UPLOAD_MAX_BYTES: i64 = 2 * 1024 * 1024;
pub const DEFAULT_ADDRESS_LOOKUP_URL: &str = "https://www.onemap.gov.sg/api/common/elastic/search";
pub const DEFAULT_ADDRESS_LOOKUP_TIMEOUT_SECS: i64 = 5;
