use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use config::{Config, Environment, File};

use secrecy::Secret;

use serde::Deserialize;
use serde_aux::prelude::*;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use url::Url;

use crate::client::{EmailApi, SenderIdentity};
use crate::domain::EmailAddress;
use crate::notify::RecipientPolicy;

/// Runtime environment, either `Dev` for local development, or `Prod` for release
#[derive(Debug)]
pub enum Runtime {
    Dev,
    Prod,
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Dev => "dev",
            Runtime::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => anyhow::bail!("{} is not a valid runtime environment", other),
        }
    }
}

/// Application settings wrapper
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub database: DatabaseSettings,
    pub email: EmailSettings,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Load application settings from the settings directory
    pub fn load() -> anyhow::Result<Self> {
        // Get the path to the settings directory
        let path = env::current_dir()?.join("settings");
        // Get the current environment based on the `APP_ENV` environment variable, default to `Dev`
        let runtime: Runtime = env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".into())
            .try_into()?;

        Self::load_from(runtime, &path)
    }
    /// Load application settings from a specified path and runtime
    pub fn load_from(runtime: Runtime, base_path: &Path) -> anyhow::Result<Self> {
        Config::builder()
            // Include the base settings
            .add_source(File::from(base_path.join("base")).required(true))
            // Include the runtime settings
            .add_source(File::from(base_path.join(runtime.as_str())).required(true))
            // Override/include any settings from environment variables
            // NOTE: Should be used for any prod secrets. Takes the form `APP_<settings category>__<setting name>`.
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
            .context("Failed to load/deserialize settings")
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,

    /// Front-end bundle served for requests that match no API route
    #[serde(default)]
    static_dir: Option<PathBuf>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    store_timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    notify_timeout_milliseconds: u64,
}

impl ApplicationSettings {
    /// The application address to bind to
    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }
    /// Upper bound for any single store call
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_milliseconds)
    }
    /// Upper bound for the detached notification of a new booking
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_milliseconds)
    }
}

/// Where bookings are kept
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local, lost on restart
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    host: String,
    name: String,
    username: String,
    password: Secret<String>,
    require_ssl: bool,
}

impl DatabaseSettings {
    /// The database connection options, without specifying the database name
    pub fn without_db(&self) -> PgConnectOptions {
        use secrecy::ExposeSecret;

        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .port(self.port)
            .host(&self.host)
            .ssl_mode(ssl_mode)
            .username(&self.username)
            .password(self.password.expose_secret())
    }
    /// The database connection options, with the database name
    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.name)
    }
    /// The database connection options, with statements aborted server-side
    /// before `store_timeout` gives up on them client-side
    pub fn with_statement_timeout(&self, store_timeout: Duration) -> PgConnectOptions {
        let statement_timeout = statement_timeout(store_timeout);

        self.with_db().options([(
            "statement_timeout",
            statement_timeout.as_millis().to_string(),
        )])
    }
}

/// Server-side statement limit for a given store timeout.
/// Leaves a quarter of the budget (at most one second) for the round trip,
/// so a slow insert is rolled back rather than committed after the caller gave up.
/// NOTE: Postgres reads `0` as "no limit", hence the one millisecond floor
pub fn statement_timeout(store_timeout: Duration) -> Duration {
    let margin = (store_timeout / 4).min(Duration::from_secs(1));

    store_timeout
        .saturating_sub(margin)
        .max(Duration::from_millis(1))
}

#[derive(Debug, Deserialize)]
pub struct EmailSettings {
    sender: String,
    /// Display name shown next to the sender address
    #[serde(default)]
    sender_name: Option<String>,

    api_base_url: String,
    #[serde(default = "default_send_path")]
    api_send_path: String,
    #[serde(default = "default_token_header")]
    api_token_header: String,
    api_auth_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    api_timeout_milliseconds: u64,

    #[serde(default)]
    recipient: RecipientPolicy,
    #[serde(default)]
    owner: Option<String>,
}

// Postmark's API layout, the provider the defaults target
fn default_send_path() -> String {
    "email".into()
}

fn default_token_header() -> String {
    "X-Postmark-Server-Token".into()
}

impl EmailSettings {
    /// Who booking emails are sent from
    pub fn sender(&self) -> anyhow::Result<SenderIdentity> {
        let address = self
            .sender
            .parse::<EmailAddress>()
            .map_err(anyhow::Error::msg)
            .context("Failed to parse email sender address")?;

        Ok(SenderIdentity::new(address, self.sender_name.as_deref()))
    }
    /// The email REST API endpoint, credentials and timeout
    pub fn api(&self) -> anyhow::Result<EmailApi> {
        let base_url = Url::parse(&self.api_base_url).context("Failed to parse email base URL")?;

        Ok(EmailApi {
            base_url,
            send_path: self.api_send_path.clone(),
            token_header: self.api_token_header.clone(),
            token: self.api_auth_token.clone(),
            timeout: Duration::from_millis(self.api_timeout_milliseconds),
        })
    }
    /// Who is notified about new bookings
    pub fn recipient(&self) -> RecipientPolicy {
        self.recipient
    }
    /// The owner address, if one is configured
    pub fn owner(&self) -> anyhow::Result<Option<EmailAddress>> {
        match self.owner.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(owner) => owner
                .parse::<EmailAddress>()
                .map(Some)
                .map_err(anyhow::Error::msg)
                .context("Failed to parse owner email address"),
        }
    }
}

/// Log output format
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event, for log collectors
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Filter directives (`RUST_LOG` syntax), used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "info".into()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}
