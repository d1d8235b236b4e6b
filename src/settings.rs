//! Loading settings from files and environment
use std::{collections::HashSet, net::IpAddr, str::FromStr};

use color_eyre::eyre::Context;
use config::{Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use url::Url;

/// Config for PostgreSQL Connection
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DbConfig {
    /// Connect using a Database URL
    DatabaseUrl {
        /// The connection url for including password, username, db, etc.
        url: String,
    },
    /// Connect using different parameters
    #[allow(missing_docs)]
    Parameters {
        username: String,
        password: String,
        host: String,
        port: Option<u16>,
        db_name: Option<String>,
    },
}

impl TryFrom<&DbConfig> for PgConnectOptions {
    type Error = <PgConnectOptions as FromStr>::Err;

    fn try_from(config: &DbConfig) -> Result<PgConnectOptions, Self::Error> {
        match config {
            DbConfig::DatabaseUrl { url } => url.parse(),
            DbConfig::Parameters {
                username,
                password,
                host,
                port,
                db_name,
            } => {
                let mut options = PgConnectOptions::new()
                    .username(username)
                    .password(password)
                    .host(host);
                if let Some(port) = port {
                    options = options.port(*port);
                }
                if let Some(db_name) = db_name {
                    options = options.database(db_name);
                }
                Ok(options)
            }
        }
    }
}

fn default_port() -> u16 {
    8080
}

/// General app config
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Used by CORS middleware, should include all origins the app
    /// is supposed to run on - does not support any kind of regex at
    /// the moment
    #[serde(default)]
    pub allowed_origins: HashSet<Url>,
    /// If set all localhost origins are considered valid CORS origins
    /// Usefull for development, should be deactivated in production.
    #[serde(default = "false_default")]
    pub allow_localhost: bool,

    /// The IP the server is listening on
    pub listen_on: IpAddr,

    /// The port the server is going to listen to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base of all links sent by mail, e.g. `https://api.example.com`
    pub public_url: Url,
}

fn default_cookie() -> String {
    "access_token".to_owned()
}

fn default_access_ttl() -> u64 {
    24 * 60
}

fn default_reset_ttl() -> u64 {
    15
}

fn default_verify_ttl() -> u64 {
    24 * 60
}

/// Everything needed to issue and check tokens
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret all tokens are signed with
    pub secret: SecretString,
    /// Name of the cookie carrying the access token
    #[serde(default = "default_cookie")]
    pub cookie: String,
    /// Lifetime of an access token in minutes
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Lifetime of a password reset link in minutes
    #[serde(default = "default_reset_ttl")]
    pub reset_ttl_minutes: u64,
    /// Lifetime of an email verification link in minutes
    #[serde(default = "default_verify_ttl")]
    pub verify_ttl_minutes: u64,
}

/// SMTP relay used for transactional mails
///
/// If this section is missing, mails are only logged.
#[derive(Debug, Deserialize)]
pub struct MailConfig {
    /// Hostname of the relay, TLS is always used
    pub host: String,
    /// Defaults to the submission port of the relay
    pub port: Option<u16>,
    #[allow(missing_docs)]
    pub username: String,
    #[allow(missing_docs)]
    pub password: SecretString,
    /// Sender mailbox, e.g. `Spendwise <noreply@example.com>`
    pub from: String,
}

/// How log lines are rendered
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Indented span tree for humans
    #[default]
    Pretty,
    /// One JSON object per line for log collectors
    Json,
}

fn default_level() -> String {
    "info".to_owned()
}

/// Logging config, `RUST_LOG` takes precedence over `level`
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Any [EnvFilter](tracing_subscriber::EnvFilter) directive,
    /// usually one of `error`, `warn`, `info`, `debug`, `trace`
    #[serde(default = "default_level")]
    pub level: String,
    #[allow(missing_docs)]
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Collection of all config areas
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Config affecting the database connection
    pub database: DbConfig,
    /// General application config
    pub app: AppConfig,
    /// Token signing & lifetimes
    pub auth: AuthConfig,
    /// Outgoing mail, optional
    pub mail: Option<MailConfig>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub log: LogConfig,
}

/// Reads config from config.toml + environment
///
/// For a documentation of possible values see the docs of
/// [Config], env values require a prefix of `SPENDWISE` and nestings
/// are separated by `__`, e.g. `SPENDWISE_AUTH__SECRET`
pub fn read_config() -> color_eyre::Result<Config> {
    let conf = config::Config::builder()
        .add_source(File::with_name("config.toml").required(false))
        .add_source(
            Environment::with_prefix("SPENDWISE")
                .separator("__")
                .prefix_separator("_"),
        )
        .build()
        .wrap_err("Reading the config")?;

    conf.try_deserialize().wrap_err("Parsing the config")
}

/// Proxy for serde default
///
/// This is needed since Serde only supports paths right now as default
/// values, see:
/// <https://github.com/serde-rs/serde/issues/368>
fn false_default() -> bool {
    false
}
