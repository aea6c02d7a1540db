use anyhow::{Result, bail};

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    let base_url = cfg.general.public_base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(format!(
            "general.public_base_url must start with http:// or https:// (got `{base_url}`)"
        ));
    }

    if cfg.database.url.trim().is_empty() {
        errors.push("database.url must not be empty".to_string());
    }

    if cfg.database.max_connections == 0 {
        errors.push("database.max_connections must be > 0".to_string());
    }

    if cfg.database.min_idle > cfg.database.max_connections {
        errors.push(format!(
            "database.min_idle ({}) must be <= database.max_connections ({})",
            cfg.database.min_idle, cfg.database.max_connections
        ));
    }

    if cfg.session.cookie_name.trim().is_empty() {
        errors.push("session.cookie_name must not be empty".to_string());
    }

    if cfg.session.ttl_minutes <= 0 {
        errors.push("session.ttl_minutes must be > 0".to_string());
    }

    if cfg.uploads.max_bytes == 0 {
        errors.push("uploads.max_bytes must be > 0".to_string());
    }

    if cfg.address_lookup.timeout_secs == 0 {
        errors.push("address_lookup.timeout_secs must be > 0".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
