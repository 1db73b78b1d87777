use std::env;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::runtime::{ENV_FILENAME, InstallContext};

pub const API_KEY_ENV: &str = "BACKLOG_API_KEY";

/// Request credential for the Backlog API. The value is redacted from
/// `Debug` output and is only ever attached as a query parameter.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ApiKey(<redacted>)")
    }
}

/// Resolve the API key: the environment variable wins, then the first
/// existing `.env` file next to the executable or one directory above it.
/// Blank values count as unset.
pub fn resolve_api_key(context: &InstallContext) -> Result<ApiKey> {
    resolve_api_key_with_lookup(context, |key| env::var(key).ok())
}

fn resolve_api_key_with_lookup<F>(context: &InstallContext, lookup: F) -> Result<ApiKey>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(API_KEY_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(ApiKey::new(trimmed));
        }
    }

    let Some(env_file) = context.locate_env_file() else {
        let checked = context
            .candidates(ENV_FILENAME)
            .iter()
            .map(|path| format!("  - {}", path.display()))
            .collect::<Vec<_>>()
            .join("\n");
        if checked.is_empty() {
            bail!("{API_KEY_ENV} is not set and the executable location could not be resolved");
        }
        bail!(
            "{API_KEY_ENV} is not set and no {ENV_FILENAME} file was found.\nChecked:\n{checked}\nExport {API_KEY_ENV} or create a {ENV_FILENAME} file containing {API_KEY_ENV}=<key>."
        );
    };

    read_key_from_env_file(&env_file)
}

/// Scan the file for the first non-blank `BACKLOG_API_KEY` entry. A parse
/// failure is fatal; an absent or blank entry is reported as missing.
fn read_key_from_env_file(path: &Path) -> Result<ApiKey> {
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    for entry in entries {
        let (key, value) = entry.with_context(|| format!("failed to parse {}", path.display()))?;
        if key == API_KEY_ENV && !value.trim().is_empty() {
            return Ok(ApiKey::new(value.trim()));
        }
    }
    bail!(
        "{API_KEY_ENV} was not found in {}.\nAdd a line: {API_KEY_ENV}=<key>.",
        path.display()
    )
}
