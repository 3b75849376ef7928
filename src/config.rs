//! Bot configuration.
//!
//! Loaded once at startup from a JSON file and shared read-only (behind an
//! `Arc`) by the poller and the webhook server. A missing or malformed file is
//! fatal.
//!
//! ```json
//! {
//!   "token": "ghp_...",
//!   "owner": "octocat",
//!   "repo": "hello-world",
//!   "voting_period": 24,
//!   "poll_interval": 5,
//!   "listen_address": "0.0.0.0:8080",
//!   "webhook_secret": "...",
//!   "blacklisted_files": [".github/workflows/ci.yml"],
//!   "whitelisted_file_extensions": [".md", ".txt"],
//!   "meta_assignees": ["maintainer"]
//! }
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::types::RepoId;
use crate::validation::ValidationRules;
use crate::voting::TiePolicy;

/// Environment variable naming the config file when no CLI argument is given.
pub const CONFIG_PATH_ENV: &str = "BALLOT_BOT_CONFIG";

/// Config file used when neither the CLI argument nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON or is missing required fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field parsed but has an unusable value.
    #[error("invalid config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Names of the labels the bot uses as workflow state.
///
/// Both labels must already exist in the repository; the bot refuses to start
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LabelNames {
    /// Marks PRs routed to maintainers instead of the vote.
    pub manual_review: String,
    /// Marks PRs that failed validation and wait for a `reverify` comment.
    pub pending_reverify: String,
}

impl Default for LabelNames {
    fn default() -> Self {
        LabelNames {
            manual_review: "meta".to_string(),
            pending_reverify: "pending-reverify".to_string(),
        }
    }
}

impl LabelNames {
    /// Returns both label names, in the order they are checked at startup.
    pub fn required(&self) -> [&str; 2] {
        [self.manual_review.as_str(), self.pending_reverify.as_str()]
    }
}

/// Process-wide configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Personal access token for the bot account.
    pub token: String,

    /// Owner of the governed repository.
    pub owner: String,

    /// Name of the governed repository.
    pub repo: String,

    /// How long a PR stays in voting, in hours.
    #[serde(rename = "voting_period")]
    pub voting_period_hours: u64,

    /// Sleep between poll cycles, in minutes.
    #[serde(rename = "poll_interval")]
    pub poll_interval_minutes: u64,

    /// Address the webhook server binds to, e.g. `0.0.0.0:8080`. A bare
    /// `:8080` binds every interface.
    pub listen_address: String,

    /// Shared secret for webhook HMAC signatures.
    pub webhook_secret: String,

    /// Blacklist, whitelist and extension policy for the PR validator.
    #[serde(flatten)]
    pub validation: ValidationRules,

    /// Logins assigned to PRs routed to manual review.
    #[serde(default)]
    pub meta_assignees: Vec<String>,

    /// Workflow label names.
    #[serde(default)]
    pub labels: LabelNames,

    /// What to do with a PR whose vote ends in a genuine tie.
    #[serde(default)]
    pub tie_policy: TiePolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("voting_period_hours", &self.voting_period_hours)
            .field("poll_interval_minutes", &self.poll_interval_minutes)
            .field("listen_address", &self.listen_address)
            .field("validation", &self.validation)
            .field("meta_assignees", &self.meta_assignees)
            .field("labels", &self.labels)
            .field("tie_policy", &self.tie_policy)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads and validates the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses and validates a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the config path: CLI argument, then `BALLOT_BOT_CONFIG`, then `config.json`.
    pub fn resolve_path(cli_arg: Option<String>) -> PathBuf {
        cli_arg
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_empty = [
            ("token", &self.token),
            ("owner", &self.owner),
            ("repo", &self.repo),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }

        if self.voting_period_hours == 0 {
            return Err(ConfigError::Invalid {
                field: "voting_period",
                reason: "must be at least one hour".to_string(),
            });
        }
        if self.poll_interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval",
                reason: "must be at least one minute".to_string(),
            });
        }
        self.socket_addr()?;
        if self.labels.manual_review == self.labels.pending_reverify {
            return Err(ConfigError::Invalid {
                field: "labels",
                reason: "manual_review and pending_reverify must differ".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the governed repository.
    pub fn repo_id(&self) -> RepoId {
        RepoId::new(&self.owner, &self.repo)
    }

    /// Returns the address to bind, with a bare `:port` meaning `0.0.0.0:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = self.listen_address.trim();
        let parsed = match address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port).parse(),
            None => address.parse(),
        };
        parsed.map_err(|e| ConfigError::Invalid {
            field: "listen_address",
            reason: format!("`{}` is not a socket address: {}", self.listen_address, e),
        })
    }

    /// Returns the voting period.
    pub fn voting_period(&self) -> chrono::Duration {
        i64::try_from(self.voting_period_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or_else(chrono::Duration::max_value)
    }

    /// Returns the sleep between poll cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes.saturating_mul(60))
    }
}
