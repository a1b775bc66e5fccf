use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub directory: DirectoryConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_lifetime_minutes: i64,
    pub refresh_lifetime_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_lifetime_minutes", &self.access_lifetime_minutes)
            .field("refresh_lifetime_hours", &self.refresh_lifetime_hours)
            .finish()
    }
}

impl JwtConfig {
    /// Build the engine settings from configured minutes and hours.
    pub fn settings(&self) -> auth::JwtSettings {
        auth::JwtSettings::new(
            self.secret.clone(),
            chrono::Duration::minutes(self.access_lifetime_minutes),
            chrono::Duration::hours(self.refresh_lifetime_hours),
        )
    }
}

/// Where identities are stored.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,
    /// JSON users file loaded into the in-memory backend at startup.
    #[serde(default)]
    pub seed_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
            [server]
            http_port = 9000

            [jwt]
            secret = "s3cr3t"
            access_lifetime_minutes = 10
            refresh_lifetime_hours = 24

            [directory]
            backend = "memory"
            seed_file = "users.json"

            [database]
            url = "postgresql://localhost/auth"
            "#,
        );

        assert_eq!(config.server.http_port, 9000);
        assert_eq!(config.directory.backend, DirectoryBackend::Memory);
        assert_eq!(config.directory.seed_file.as_deref(), Some("users.json"));
        assert_eq!(config.database.max_connections, 5);

        let settings = config.jwt.settings();
        assert_eq!(settings.access_lifetime, chrono::Duration::minutes(10));
        assert_eq!(settings.refresh_lifetime, chrono::Duration::hours(24));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_jwt_secret() {
        let jwt = JwtConfig {
            secret: "s3cr3t".to_string(),
            access_lifetime_minutes: 1,
            refresh_lifetime_hours: 1,
        };

        assert!(!format!("{:?}", jwt).contains("s3cr3t"));
    }
}
