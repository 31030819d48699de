//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup. Required values that are missing make
//! [`Config::from_env`] fail so the binary can exit with a diagnostic.

use std::env;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Listen address used when `LISTEN_ADDR` is unset.
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000));

/// Default freshness window for Stripe signature timestamps, in seconds.
pub const DEFAULT_SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Authentication scheme for the ntfy endpoint.
#[derive(Clone, PartialEq, Eq)]
pub enum NtfyAuth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

impl NtfyAuth {
    /// Resolve the auth scheme from optional credentials.
    ///
    /// A token wins over basic credentials; basic needs both halves.
    pub fn from_parts(
        token: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        match (token, username, password) {
            (Some(token), _, _) => NtfyAuth::Bearer(token),
            (None, Some(username), Some(password)) => NtfyAuth::Basic { username, password },
            (None, Some(_), None) | (None, None, Some(_)) => {
                warn!("ntfy_basic_auth_incomplete");
                NtfyAuth::None
            }
            (None, None, None) => NtfyAuth::None,
        }
    }

    /// Short name used in logs.
    pub fn scheme(&self) -> &'static str {
        match self {
            NtfyAuth::None => "none",
            NtfyAuth::Bearer(_) => "bearer",
            NtfyAuth::Basic { .. } => "basic",
        }
    }
}

// Credentials never end up in logs.
impl fmt::Debug for NtfyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtfyAuth::None => f.write_str("None"),
            NtfyAuth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            NtfyAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Push endpoint settings.
#[derive(Debug, Clone)]
pub struct NtfyConfig {
    /// Topic URL notifications are POSTed to
    pub url: Url,

    /// Credentials attached to every publish
    pub auth: NtfyAuth,

    /// Optional ceiling on the outbound request. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Where notifications are delivered
    pub ntfy: NtfyConfig,

    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: String,

    /// Maximum age of a signed webhook timestamp
    pub signature_tolerance: Duration,

    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ntfy", &self.ntfy)
            .field("stripe_webhook_secret", &"<redacted>")
            .field("signature_tolerance", &self.signature_tolerance)
            .field("listen_addr", &self.listen_addr)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let raw_url = get("NTFY_URL").ok_or(ConfigError::Missing("NTFY_URL"))?;
        let url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: "NTFY_URL",
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;

        let auth = NtfyAuth::from_parts(
            get("NTFY_TOKEN"),
            get("NTFY_USERNAME"),
            get("NTFY_PASSWORD"),
        );

        let timeout = parse_optional::<u64>(get("NTFY_TIMEOUT_MS"), "NTFY_TIMEOUT_MS")?
            .map(Duration::from_millis);

        let stripe_webhook_secret =
            get("STRIPE_WEBHOOK_SECRET").ok_or(ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;

        let tolerance_secs = parse_optional::<u64>(
            get("STRIPE_SIGNATURE_TOLERANCE_SECS"),
            "STRIPE_SIGNATURE_TOLERANCE_SECS",
        )?
        .unwrap_or(DEFAULT_SIGNATURE_TOLERANCE_SECS);

        let listen_addr = parse_optional::<SocketAddr>(get("LISTEN_ADDR"), "LISTEN_ADDR")?
            .unwrap_or(DEFAULT_LISTEN_ADDR);

        Ok(Config {
            ntfy: NtfyConfig { url, auth, timeout },
            stripe_webhook_secret,
            signature_tolerance: Duration::from_secs(tolerance_secs),
            listen_addr,
        })
    }
}

/// Parse an optional raw value, naming the variable on failure.
fn parse_optional<T>(raw: Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.map(|value| {
        value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}
