use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use fallback_core::cooldown::DEFAULT_COOLDOWN_MS;
use fallback_core::FirebaseConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Command-line arguments. Every flag also reads from the environment
/// (and from `.env` when present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Firebase Realtime Database URL (required unless --memory-store)
    #[arg(long, env = "FIREBASE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Database secret or OAuth access token for REST calls
    #[arg(long, env = "FIREBASE_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Firebase project id (logged at startup)
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Deployment environment name (logged at startup)
    #[arg(long = "env", env = "APP_ENV", default_value = "development")]
    pub environment: String,

    /// Minimum milliseconds between two escalation replies to one user
    #[arg(long, env = "FALLBACK_COOLDOWN_MS", default_value_t = DEFAULT_COOLDOWN_MS)]
    pub cooldown_ms: i64,

    /// HTTP timeout for store requests, in seconds
    #[arg(long, env = "STORE_TIMEOUT_SECS", default_value_t = 10)]
    pub store_timeout_secs: u64,

    /// Keep fallback records in process memory instead of Firebase
    #[arg(long, default_value_t = false)]
    pub memory_store: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Where fallback records are kept
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Firebase(FirebaseConfig),
    Memory,
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub bind: SocketAddr,
    pub environment: String,
    pub project_id: Option<String>,
    pub store: StoreBackend,
    pub cooldown: chrono::Duration,
    pub log_format: LogFormat,
}

impl WebhookConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        if args.cooldown_ms <= 0 {
            bail!("FALLBACK_COOLDOWN_MS must be positive, got {}", args.cooldown_ms);
        }
        if args.store_timeout_secs == 0 {
            bail!("STORE_TIMEOUT_SECS must be positive");
        }

        let store = if args.memory_store {
            StoreBackend::Memory
        } else {
            let Some(url) = args.database_url.filter(|u| !u.trim().is_empty()) else {
                bail!("Missing required environment variable: FIREBASE_DATABASE_URL");
            };
            let mut firebase = FirebaseConfig::new(url)
                .with_timeout(Duration::from_secs(args.store_timeout_secs));
            if let Some(token) = args.auth_token {
                firebase = firebase.with_auth_token(token);
            }
            StoreBackend::Firebase(firebase)
        };

        Ok(Self {
            bind: SocketAddr::new(args.bind, args.port),
            environment: args.environment,
            project_id: args.project_id,
            store,
            cooldown: chrono::Duration::milliseconds(args.cooldown_ms),
            log_format: args.log_format,
        })
    }

    /// Database URL for logs, or `"memory"`
    pub fn store_location(&self) -> &str {
        match &self.store {
            StoreBackend::Firebase(firebase) => &firebase.database_url,
            StoreBackend::Memory => "memory",
        }
    }
}
