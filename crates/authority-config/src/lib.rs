//! # authority-config: layered configuration
//!
//! Precedence, highest first:
//! 1. `AUTHORITY_*` environment variables
//! 2. `authority.local.toml` (gitignored, local overrides)
//! 3. `authority.toml` (project config)
//! 4. Built-in defaults

mod error;
mod exit_code;

pub use error::ConfigError;
pub use exit_code::ExitCode;

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies the coordinator implementation backing a highly-available
/// leadership source. The authority ships no coordinator client itself
/// (`FencedLeadershipClient` is a trait boundary only); this enum
/// exists so configuration can name one without the core depending on
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderElectionBackend {
    Coordinator,
}

/// Every configuration field the authority recognizes, named in
/// `snake_case` in files and environment variables alike so file keys,
/// env var segments, and Rust field names all agree without a rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Selects real leader election vs. single-process pseudo-leader.
    pub highly_available: bool,
    /// Identifies the coordinator implementation, when `highly_available`.
    pub leader_election_backend: LeaderElectionBackend,
    /// Persistence-operation timeout, in milliseconds.
    pub zk_timeout_ms: u64,
    /// Bounded input queue size; overflow fails the submission.
    pub command_queue_capacity: usize,
    /// Decline-filter duration used when no instance matches an offer.
    pub refuse_offer_seconds: f64,
    /// Minimum broker version accepted at registration. A mismatch
    /// triggers suicide without removing the framework id.
    pub min_broker_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            highly_available: false,
            leader_election_backend: LeaderElectionBackend::Coordinator,
            zk_timeout_ms: 10_000,
            command_queue_capacity: 1024,
            refuse_offer_seconds: 5.0,
            min_broker_version: "1.0.0".to_string(),
        }
    }
}

impl Config {
    /// Checks the invariants `ConfigLoader` can't express structurally
    /// (e.g. range limits `config`/`serde` don't validate on their own).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "command-queue-capacity must be positive".to_string(),
            ));
        }
        if self.refuse_offer_seconds < 0.0 {
            return Err(ConfigError::Invalid(
                "refuse-offer-seconds must not be negative".to_string(),
            ));
        }
        if self.zk_timeout_ms == 0 {
            return Err(ConfigError::Invalid("zk-timeout-ms must be positive".to_string()));
        }
        if semver::Version::parse(&self.min_broker_version).is_err() {
            return Err(ConfigError::Invalid(format!(
                "min-broker-version {:?} is not a valid semantic version",
                self.min_broker_version
            )));
        }
        Ok(())
    }
}

/// Builder-pattern loader merging defaults, project files, and
/// environment variables into a validated [`Config`].
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "AUTHORITY".to_string(),
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(self) -> Result<Config, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&Config::default())?);

        let project_file = self.project_dir.join("authority.toml");
        if project_file.exists() {
            builder = builder.add_source(
                config::File::from(project_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        let local_file = self.project_dir.join("authority.local.toml");
        if local_file.exists() {
            builder = builder.add_source(
                config::File::from(local_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let built = builder.build()?;
        let config: Config = built.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
