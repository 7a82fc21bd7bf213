//! Layered configuration: defaults, then `switchboard.toml`, then
//! `SWITCHBOARD_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use switchboard_controller::DispatchPolicy;
use switchboard_core::{OrganizationContext, UserContext};

/// File read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "switchboard.toml";

/// Effective CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logger settings.
    pub log: switchboard_log::Config,
    /// Who the console acts as.
    pub session: SessionConfig,
    /// Dispatch-time permission policy.
    pub dispatch: DispatchPolicy,
    /// Event bus buffer per subscriber.
    pub event_capacity: usize,
    /// Default cloud-function time limit.
    pub function_timeout_ms: u64,
    /// JSON seed loaded into the in-memory store.
    pub seed: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log: switchboard_log::Config::default().with_level("warn"),
            session: SessionConfig::default(),
            dispatch: DispatchPolicy::default(),
            event_capacity: switchboard_telemetry::DEFAULT_CAPACITY,
            function_timeout_ms: 30_000,
            seed: None,
        }
    }
}

/// The user and organization of a console session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// User id.
    pub user: String,
    /// Role names.
    pub roles: Vec<String>,
    /// Directly granted permissions.
    pub permissions: Vec<String>,
    /// Organization id; `None` runs without a tenant.
    pub organization: Option<String>,
    /// Organization display name.
    pub organization_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user: "admin".to_owned(),
            roles: vec!["OrgAdmin".to_owned()],
            permissions: Vec::new(),
            organization: Some("org-1".to_owned()),
            organization_name: "Default Organization".to_owned(),
        }
    }
}

impl SessionConfig {
    pub fn user_context(&self) -> UserContext {
        UserContext {
            id: self.user.clone(),
            roles: self.roles.clone(),
            permissions: self.permissions.clone(),
            organization_id: None,
        }
    }

    pub fn organization_context(&self) -> Option<OrganizationContext> {
        self.organization
            .as_ref()
            .filter(|id| !id.is_empty())
            .map(|id| OrganizationContext::new(id, &self.organization_name))
    }
}

/// Figment with every layer below the command line.
///
/// A missing default file is skipped; a missing explicit file is an error
/// reported by the caller.
pub fn figment(config_file: Option<&Path>) -> Figment {
    let file = config_file.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
    Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(file))
        .merge(
            Env::prefixed("SWITCHBOARD_")
                .ignore(&["log", "log_format"])
                .split("__"),
        )
}

/// Extract the configuration.
pub fn load(config_file: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = config_file {
        anyhow::ensure!(path.exists(), "config file not found: {}", path.display());
    }
    Ok(figment(config_file).extract()?)
}
