// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup (a `.env` file
//! is honoured through `dotenvy` in `main`) and carried in [`AppConfig`]
//! inside the application state. Nothing below the HTTP layer reads the
//! environment directly.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_ENV` | `development`, `production` or `test` | `development` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `DATA_DIR` | Root directory of the document store | `./data` |
//! | `PUBLIC_URL` | Base URL used in password reset links | `http://localhost:{PORT}` |
//! | `JWT_SECRET` | Token signing secret | Required in production |
//! | `JWT_EXPIRES_IN` | Token lifetime (`30d`, `12h`, `15m`, `45s`, seconds) | `30d` |
//! | `COOKIE_SECURE` | Mark the auth cookie `Secure` | `true` in production |
//! | `CORS_ORIGIN` | Extra allowed origins, comma separated | none |
//! | `RATE_LIMIT_MAX` | API requests per client per 15 minutes | `100` |
//! | `SMTP_HOST` | SMTP relay; unset means reset mails are only logged | none |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const APP_ENV_ENV: &str = "APP_ENV";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// Root of the JSON document store. Each collection is a subdirectory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const PUBLIC_URL_ENV: &str = "PUBLIC_URL";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const CORS_ORIGIN_ENV: &str = "CORS_ORIGIN";
pub const RATE_LIMIT_MAX_ENV: &str = "RATE_LIMIT_MAX";
pub const TRUST_PROXY_ENV: &str = "TRUST_PROXY";
pub const SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const SMTP_USERNAME_ENV: &str = "SMTP_USERNAME";
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";
pub const SMTP_FROM_ADDRESS_ENV: &str = "SMTP_FROM_ADDRESS";
pub const SMTP_FROM_NAME_ENV: &str = "SMTP_FROM_NAME";
pub const SMTP_USE_TLS_ENV: &str = "SMTP_USE_TLS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Secret used outside production when `JWT_SECRET` is not set.
const DEV_JWT_SECRET: &str = "dev_secret";

/// Origins always allowed by CORS, in addition to `CORS_ORIGIN`.
const DEFAULT_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Rate limit window for the API routes.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

/// Token and cookie settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub cookie_secure: bool,
}

/// Fixed-window limits applied to the API routes.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
    /// Key clients by `X-Forwarded-For` instead of the peer address
    pub trust_proxy: bool,
}

/// SMTP relay settings for password reset mail.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub use_tls: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_url: String,
    pub auth: AuthSettings,
    pub cors_origins: Vec<String>,
    pub rate_limit: RateLimitSettings,
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get(APP_ENV_ENV).as_deref().map(str::to_lowercase).as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some("test") => Environment::Test,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: APP_ENV_ENV,
                    value: other.to_string(),
                })
            }
        };

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                value: raw,
            })?,
            None => 5000,
        };

        let data_dir = get(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));
        let public_url = get(PUBLIC_URL_ENV)
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let jwt_secret = match get(JWT_SECRET_ENV) {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(ConfigError::Missing(JWT_SECRET_ENV))
            }
            None => DEV_JWT_SECRET.to_string(),
        };

        let token_ttl = match get(JWT_EXPIRES_IN_ENV) {
            Some(raw) => parse_ttl(&raw).ok_or(ConfigError::Invalid {
                var: JWT_EXPIRES_IN_ENV,
                value: raw,
            })?,
            None => Duration::from_secs(30 * 24 * 60 * 60),
        };

        let cookie_secure = match get(COOKIE_SECURE_ENV) {
            Some(raw) => parse_bool(&raw),
            None => environment.is_production(),
        };

        let mut cors_origins: Vec<String> = DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect();
        if let Some(extra) = get(CORS_ORIGIN_ENV) {
            for origin in extra.split(',').map(str::trim).filter(|o| !o.is_empty()) {
                if !cors_origins.iter().any(|o| o == origin) {
                    cors_origins.push(origin.to_string());
                }
            }
        }

        let max_requests = match get(RATE_LIMIT_MAX_ENV) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| ConfigError::Invalid {
                var: RATE_LIMIT_MAX_ENV,
                value: raw,
            })?,
            None => 100,
        };

        let smtp = match get(SMTP_HOST_ENV) {
            Some(host) => {
                let port = match get(SMTP_PORT_ENV) {
                    Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                        var: SMTP_PORT_ENV,
                        value: raw,
                    })?,
                    None => 587,
                };
                Some(SmtpSettings {
                    host,
                    port,
                    username: get(SMTP_USERNAME_ENV),
                    password: get(SMTP_PASSWORD_ENV),
                    from_address: get(SMTP_FROM_ADDRESS_ENV)
                        .ok_or(ConfigError::Missing(SMTP_FROM_ADDRESS_ENV))?,
                    from_name: get(SMTP_FROM_NAME_ENV).unwrap_or_else(|| "Newsroom".to_string()),
                    use_tls: get(SMTP_USE_TLS_ENV).map(|v| parse_bool(&v)).unwrap_or(true),
                })
            }
            None => None,
        };

        Ok(Self {
            environment,
            host,
            port,
            data_dir,
            public_url,
            auth: AuthSettings {
                jwt_secret,
                token_ttl,
                cookie_secure,
            },
            cors_origins,
            rate_limit: RateLimitSettings {
                max_requests,
                window: RATE_LIMIT_WINDOW,
                trust_proxy: get(TRUST_PROXY_ENV).map(|v| parse_bool(&v)).unwrap_or(false),
            },
            smtp,
        })
    }

    /// Configuration for unit and integration tests.
    pub fn for_tests(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            environment: Environment::Test,
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: data_dir.into(),
            public_url: "http://localhost".to_string(),
            auth: AuthSettings {
                jwt_secret: "test-secret".to_string(),
                token_ttl: Duration::from_secs(60 * 60),
                cookie_secure: false,
            },
            cors_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
            rate_limit: RateLimitSettings {
                max_requests: 10_000,
                window: RATE_LIMIT_WINDOW,
                trust_proxy: false,
            },
            smtp: None,
        }
    }
}

/// Parse a token lifetime such as `30d`, `12h`, `15m`, `45s` or `3600`.
///
/// Lifetimes that do not fit a signed Unix timestamp are rejected.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&raw[..idx], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let value: u64 = digits.trim().parse().ok()?;
    let seconds = match unit {
        'd' => value.checked_mul(24 * 60 * 60)?,
        'h' => value.checked_mul(60 * 60)?,
        'm' => value.checked_mul(60)?,
        's' => value,
        _ => return None,
    };
    if seconds == 0 || i64::try_from(seconds).is_err() {
        return None;
    }
    Some(Duration::from_secs(seconds))
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
