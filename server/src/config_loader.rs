use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use std::fs;
use std::path::Path;
use tollgate_application::error::{AppError, AppResult};
use tollgate_application::infrastructure_config::Config;
use tracing::info;

const LEGACY_STORE_VARS: [&str; 2] = ["ENDPOINT", "PORT"];

pub fn load_config() -> AppResult<Config> {
    generate_env_template_if_missing()?;

    let config: Config = figment().extract().map_err(|e| AppError::ConfigError {
        message: format!("Failed to load configuration: {e}"),
    })?;

    config.validate()?;
    Ok(config)
}

/// Defaults, then `config.toml`, `config.json`, the bare `ENDPOINT`/`PORT`
/// variables, and finally `TOLLGATE_*` variables (`__` separates sections).
pub fn figment() -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if Path::new("config.toml").exists() {
        figment = figment.merge(Toml::file("config.toml"));
    }

    if Path::new("config.json").exists() {
        figment = figment.merge(Json::file("config.json"));
    }

    figment
        .merge(
            Env::raw()
                .only(&LEGACY_STORE_VARS)
                .map(|key| format!("store.{}", key.as_str().to_ascii_lowercase()).into()),
        )
        .merge(Env::prefixed("TOLLGATE_").split("__"))
}

fn generate_env_template_if_missing() -> AppResult<()> {
    let env_file = ".env";
    let template_file = ".env.example";

    if Path::new(env_file).exists() {
        return Ok(());
    }

    if !Path::new(template_file).exists() {
        return Ok(());
    }

    fs::copy(template_file, env_file).map_err(|e| AppError::ConfigError {
        message: format!("Failed to generate .env file from template: {e}"),
    })?;

    info!("Generated .env from template. Please configure the store endpoint!");

    Ok(())
}
