//! Application configuration.
//!
//! Type-safe configuration loaded from environment variables via the
//! `config` and `dotenvy` crates. Variables use the `GOVASSIST` prefix
//! with `__` separating nested values:
//!
//! - `GOVASSIST__SERVER__PORT=8080` -> `server.port`
//! - `GOVASSIST__DATABASE__URL=postgres://...` -> `database.url`
//! - `GOVASSIST__COMPLETION__ENDPOINT=https://...` -> `completion.endpoint`

mod ai;
mod database;
mod engine;
mod error;
mod extraction;
mod server;

pub use ai::CompletionConfig;
pub use database::DatabaseConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use extraction::ExtractionServiceConfig;
pub use server::ServerConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, timeouts).
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL session store.
    pub database: DatabaseConfig,

    /// Completion gateway.
    pub completion: CompletionConfig,

    /// Document extraction service.
    pub extraction: ExtractionServiceConfig,

    /// Engine tunables (inactivity window, fees).
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Loads configuration from the environment.
    ///
    /// Reads a `.env` file if present, then environment variables with
    /// the `GOVASSIST` prefix and `__` separators.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GOVASSIST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates all configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.completion.validate()?;
        self.extraction.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var(
            "GOVASSIST__DATABASE__URL",
            "postgresql://test@localhost/test",
        );
        env::set_var(
            "GOVASSIST__COMPLETION__ENDPOINT",
            "https://gateway.example/complete",
        );
        env::set_var(
            "GOVASSIST__EXTRACTION__ENDPOINT",
            "https://extract.example/extract",
        );
    }

    fn clear_env() {
        env::remove_var("GOVASSIST__DATABASE__URL");
        env::remove_var("GOVASSIST__COMPLETION__ENDPOINT");
        env::remove_var("GOVASSIST__EXTRACTION__ENDPOINT");
        env::remove_var("GOVASSIST__SERVER__PORT");
        env::remove_var("GOVASSIST__ENGINE__TIMEOUT_MINUTES");
    }

    #[test]
    fn loads_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.engine.timeout_minutes, 30);
    }

    #[test]
    fn nested_overrides_apply() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("GOVASSIST__SERVER__PORT", "9090");
        env::set_var("GOVASSIST__ENGINE__TIMEOUT_MINUTES", "15");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.engine.timeout_minutes, 15);
    }

    #[test]
    fn missing_required_sections_fail() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }
}
