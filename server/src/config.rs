use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use platform_db::DatabaseSettings;
use products_hr::LeavePolicy;
use sha2::{Digest, Sha512};

const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_CONTENT_LENGTH: usize = 4 * 1024 * 1024;
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

#[derive(Clone)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub cookie_key: Key,
    /// False when no `SECRET_KEY` was configured and a random key is in use.
    pub stable_secret: bool,
    pub upload_dir: PathBuf,
    pub max_content_length: usize,
    pub session_ttl: chrono::Duration,
    pub cookie_secure: bool,
    pub default_admin_username: String,
    pub default_admin_password: String,
    pub leave_policy: LeavePolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database = DatabaseSettings::from_lookup(&lookup).context("database settings")?;

        let secret = var("SECRET_KEY");
        let stable_secret = secret.is_some();
        let cookie_key = match secret {
            Some(secret) => derive_cookie_key(&secret),
            None => Key::generate(),
        };

        let upload_dir = var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));
        let max_content_length =
            parse_number("MAX_CONTENT_LENGTH", var("MAX_CONTENT_LENGTH"))?
                .unwrap_or(DEFAULT_MAX_CONTENT_LENGTH);
        let ttl_hours = parse_number::<i64>("SESSION_TTL_HOURS", var("SESSION_TTL_HOURS"))?
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
        if ttl_hours <= 0 {
            return Err(anyhow!("SESSION_TTL_HOURS must be positive"));
        }

        Ok(Self {
            database,
            cookie_key,
            stable_secret,
            upload_dir,
            max_content_length,
            session_ttl: chrono::Duration::hours(ttl_hours),
            cookie_secure: flag(var("COOKIE_SECURE")),
            default_admin_username: var("DEFAULT_ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            default_admin_password: var("DEFAULT_ADMIN_PASSWORD").unwrap_or_else(|| "admin".into()),
            leave_policy: LeavePolicy {
                allow_redecide: flag(var("HR_LEAVE_ALLOW_REDECIDE")),
                enforce_date_order: flag(var("HR_LEAVE_ENFORCE_DATE_ORDER")),
            },
        })
    }
}

/// Any secret length works: the cookie key is its SHA-512 digest.
fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

fn flag(value: Option<String>) -> bool {
    value
        .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| anyhow!("invalid {key}: {raw}"))
        })
        .transpose()
}
