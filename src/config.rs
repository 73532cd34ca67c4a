use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub mpesa: MpesaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// Trusted identity provider that calls the sign-in procedure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    /// Signed-in with this open_id is promoted to admin
    #[serde(default)]
    pub owner_open_id: Option<String>,
    /// Expected value of the X-Identity-Secret header
    #[serde(default)]
    pub shared_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpesaConfig {
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
}

fn default_reference_prefix() -> String {
    "MPESA".to_string()
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            reference_prefix: default_reference_prefix(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            // No file: build everything from the environment
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_defaults()?,
            Err(e) => {
                return Err(format!("cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        toml::from_str(config_str).map_err(|e| format!("invalid config file: {e}").into())
    }

    fn from_env_defaults() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        fn get_env(name: &str) -> Option<String> {
            env::var(name).ok()
        }
        fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
            env::var(name)
                .ok()
                .and_then(|v| v.parse::<T>().ok())
                .unwrap_or(default)
        }

        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                refresh_token_expires_in: get_env_parse("JWT_REFRESH_EXPIRES_IN", 2_592_000i64),
            },
            identity: IdentityConfig {
                owner_open_id: get_env("OWNER_OPEN_ID"),
                shared_secret: get_env("IDENTITY_SHARED_SECRET").unwrap_or_default(),
            },
            mpesa: MpesaConfig {
                reference_prefix: get_env("MPESA_REFERENCE_PREFIX")
                    .unwrap_or_else(default_reference_prefix),
            },
        })
    }

    /// Environment variables win even when a config file exists.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("OWNER_OPEN_ID") {
            self.identity.owner_open_id = Some(v);
        }
        if let Ok(v) = env::var("IDENTITY_SHARED_SECRET") {
            self.identity.shared_secret = v;
        }
        if let Ok(v) = env::var("MPESA_REFERENCE_PREFIX") {
            self.mpesa.reference_prefix = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_file_fills_optional_sections() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/cashbucks"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 60
            refresh_token_expires_in = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.mpesa.reference_prefix, "MPESA");
        assert!(config.identity.owner_open_id.is_none());
        assert!(config.identity.shared_secret.is_empty());
    }

    #[test]
    fn test_parse_identity_and_mpesa_sections() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/cashbucks"
            max_connections = 10

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 7200
            refresh_token_expires_in = 2592000

            [identity]
            owner_open_id = "owner-1"
            shared_secret = "idp-secret"

            [mpesa]
            reference_prefix = "TEST"
            "#,
        )
        .unwrap();

        assert_eq!(config.identity.owner_open_id.as_deref(), Some("owner-1"));
        assert_eq!(config.identity.shared_secret, "idp-secret");
        assert_eq!(config.mpesa.reference_prefix, "TEST");
    }

    #[test]
    fn test_parse_rejects_missing_required_section() {
        assert!(Config::parse("[server]\nhost = \"x\"\nport = 1\n").is_err());
    }
}
