use std::path::Path;

use ::config as config_rs;
use anyhow::{Context, Result};
use config_rs::{ConfigBuilder, builder::DefaultState};
use serde::de::DeserializeOwned;

/// Loads a config struct from `APP_`-prefixed environment variables, nested with `__`
/// (`APP_SESSION__STORE=memory` sets `session.store`).
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    fn load_dotenv() {
        // .env next to the manifest wins over one in the working directory
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let _ = dotenvy::from_filename(manifest_dir.join(".env")).or_else(|_| dotenvy::dotenv());
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn env_source() -> config_rs::Environment {
        config_rs::Environment::with_prefix(Self::PREFIX)
            .prefix_separator("_")
            .separator(Self::SEPARATOR)
            .try_parsing(true)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let cfg = builder
            .build()
            .context("failed to assemble config sources")?
            .try_deserialize::<Self>()
            .context("failed to deserialize config")?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn from_env() -> Result<Self> {
        Self::load_dotenv();
        Self::finish(config_rs::Config::builder().add_source(Self::env_source()))
    }

    /// Dotted-key overrides only (`("session.store", "memory")`), no environment lookup.
    fn from_overrides(pairs: &[(&str, &str)]) -> Result<Self> {
        let mut builder = config_rs::Config::builder();
        for (key, value) in pairs {
            builder = builder
                .set_override(*key, *value)
                .with_context(|| format!("invalid config override `{key}`"))?;
        }
        Self::finish(builder)
    }
}
