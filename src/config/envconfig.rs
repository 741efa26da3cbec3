use std::path::{Path, PathBuf};

use ::config as config_rs;
use anyhow::{Context, Result};
use config_rs::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::de::DeserializeOwned;

/// Config loaded from an optional file overlaid by `APP_`-prefixed env vars.
///
/// Nested keys use `__`, so `auth.jwt_secret` comes from `APP_AUTH__JWT_SECRET`.
/// `APP_CONFIG_FILE` may point at a toml/yaml/json file read before the env.
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";
    const FILE_VAR: &'static str = "APP_CONFIG_FILE";

    fn load_dotenv() {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let _ = dotenvy::from_filename(manifest_dir.join(".env")).or_else(|_| dotenvy::dotenv());
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn config_file() -> Option<PathBuf> {
        std::env::var_os(Self::FILE_VAR)
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
    }

    fn builder() -> ConfigBuilder<DefaultState> {
        let mut builder = Config::builder();
        if let Some(path) = Self::config_file() {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder.add_source(
            Environment::with_prefix(Self::PREFIX)
                .prefix_separator("_")
                .separator(Self::SEPARATOR)
                .try_parsing(true),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let cfg = builder
            .build()
            .context("failed to read config sources")?
            .try_deserialize::<Self>()
            .context("failed to deserialize config")?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn from_env() -> Result<Self> {
        Self::load_dotenv();
        Self::from_builder(Self::builder())
    }
}
