use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "backlog.toml";
pub const ENV_FILENAME: &str = ".env";

/// Where the running binary was installed. Config and credential files are
/// looked up next to the executable and one directory above it.
#[derive(Debug, Clone, Default)]
pub struct InstallContext {
    pub executable_dir: Option<PathBuf>,
}

impl InstallContext {
    pub fn from_process() -> Self {
        let executable_dir = env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));
        Self { executable_dir }
    }

    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(exe_dir) = &self.executable_dir {
            dirs.push(exe_dir.clone());
            if let Some(parent) = exe_dir.parent() {
                dirs.push(parent.to_path_buf());
            }
        }
        dirs
    }

    pub fn candidates(&self, filename: &str) -> Vec<PathBuf> {
        self.search_dirs()
            .into_iter()
            .map(|dir| dir.join(filename))
            .collect()
    }

    /// First existing `backlog.toml` candidate. A `BACKLOG_CONFIG` path
    /// override takes precedence and is not checked for existence here.
    pub fn locate_config_file(&self) -> Option<PathBuf> {
        self.locate_config_file_with_lookup(|key| env::var(key).ok())
    }

    fn locate_config_file_with_lookup<F>(&self, lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BACKLOG_CONFIG") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        self.existing_candidate(CONFIG_FILENAME)
    }

    pub fn locate_env_file(&self) -> Option<PathBuf> {
        self.existing_candidate(ENV_FILENAME)
    }

    fn existing_candidate(&self, filename: &str) -> Option<PathBuf> {
        self.candidates(filename)
            .into_iter()
            .find(|path| path.exists())
    }
}
