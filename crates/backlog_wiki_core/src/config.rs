use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::guard::ProjectGuard;
use crate::runtime::{CONFIG_FILENAME, InstallContext};

pub const DEFAULT_USER_AGENT: &str = "backlog-wiki/0.1";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Shipped config files carry these markers until an operator fills in the
/// real values. Both count as unset.
pub const DOMAIN_PLACEHOLDER: &str = "[DOMAIN]";
pub const PROJECT_ID_PLACEHOLDER: &str = "[PROJECT_ID]";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BacklogConfig {
    #[serde(default)]
    pub backlog: BacklogSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BacklogSection {
    pub domain: Option<String>,
    pub allowed_project_id: Option<String>,
    pub project_guard: Option<bool>,
    pub user_agent: Option<String>,
}

impl BacklogConfig {
    /// Resolve the account domain: env BACKLOG_DOMAIN > config > unset.
    pub fn domain(&self) -> Option<String> {
        self.domain_with_lookup(|key| env::var(key).ok())
    }

    fn domain_with_lookup<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        configured_value(lookup("BACKLOG_DOMAIN").as_deref(), DOMAIN_PLACEHOLDER)
            .or_else(|| configured_value(self.backlog.domain.as_deref(), DOMAIN_PLACEHOLDER))
    }

    /// Resolve the allowed project id: env BACKLOG_PROJECT_ID > config > unset.
    pub fn allowed_project_id(&self) -> Option<String> {
        self.allowed_project_id_with_lookup(|key| env::var(key).ok())
    }

    fn allowed_project_id_with_lookup<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        configured_value(
            lookup("BACKLOG_PROJECT_ID").as_deref(),
            PROJECT_ID_PLACEHOLDER,
        )
        .or_else(|| {
            configured_value(
                self.backlog.allowed_project_id.as_deref(),
                PROJECT_ID_PLACEHOLDER,
            )
        })
    }

    /// Resolve the guard switch: env BACKLOG_PROJECT_GUARD > config > enabled.
    pub fn guard_enabled(&self) -> bool {
        self.guard_enabled_with_lookup(|key| env::var(key).ok())
    }

    fn guard_enabled_with_lookup<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BACKLOG_PROJECT_GUARD")
            && let Some(parsed) = parse_bool(&value)
        {
            return parsed;
        }
        self.backlog.project_guard.unwrap_or(true)
    }

    pub fn project_guard(&self) -> ProjectGuard {
        ProjectGuard {
            enabled: self.guard_enabled(),
            allowed_project_id: self.allowed_project_id(),
        }
    }

    pub fn user_agent(&self) -> String {
        if let Ok(value) = env::var("BACKLOG_USER_AGENT") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        self.backlog
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn http_timeout_ms(&self) -> u64 {
        env::var("BACKLOG_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_MS)
    }

    /// Resolve the API base URL: env BACKLOG_BASE_URL wins, otherwise the
    /// URL is templated from the configured domain.
    pub fn base_url(&self) -> Result<String> {
        self.base_url_with_lookup(|key| env::var(key).ok())
    }

    fn base_url_with_lookup<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BACKLOG_BASE_URL") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }
        let Some(domain) = self.domain_with_lookup(lookup) else {
            bail!(
                "the Backlog domain is not configured.\nSet domain under [backlog] in {CONFIG_FILENAME} or export BACKLOG_DOMAIN.\nThe shipped {DOMAIN_PLACEHOLDER} placeholder counts as unset."
            );
        };
        Ok(format!("https://{domain}.backlog.jp/api/v2"))
    }
}

/// Treat blank strings and shipped placeholders as unset.
fn configured_value(raw: Option<&str>, placeholder: &str) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() || value == placeholder {
        return None;
    }
    Some(value.to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load and parse a BacklogConfig from a TOML file. Returns defaults if
/// the file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<BacklogConfig> {
    if !config_path.exists() {
        return Ok(BacklogConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: BacklogConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Locate and load the installed config, or defaults when none is present.
pub fn load_installed_config(context: &InstallContext) -> Result<BacklogConfig> {
    match context.locate_config_file() {
        Some(path) => load_config(&path),
        None => Ok(BacklogConfig::default()),
    }
}
