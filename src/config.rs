//! Configuration management for faultline
//!
//! Settings live in `<config_dir>/faultline/config.json`. Secrets never do:
//! they come from the environment or the system keychain.

use crate::keyring;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_DEVOPS_BASE_URL: &str = "https://dev.azure.com";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;
pub const DEFAULT_MAX_FILES: usize = 40;
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

const LLM_KEY_ENV: &str = "OPENAI_KEY";
const DEVOPS_TOKEN_ENV: &str = "AZURE_DEVOPS_TOKEN";
const LLM_URL_ENV: &str = "FAULTLINE_LLM_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Full chat-completions endpoint, including deployment and api-version
    pub llm_url: Option<String>,
    /// Root of the source-control REST API
    pub devops_base_url: String,
    /// How far back to look for changed files
    pub lookback_days: u32,
    /// Upper bound on files handed to the analysis
    pub max_files: usize,
    /// Address the REST API binds to
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_url: None,
            devops_base_url: DEFAULT_DEVOPS_BASE_URL.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_files: DEFAULT_MAX_FILES,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("faultline"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load config from an explicit path. A corrupt file is moved aside.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted; a backup was saved and defaults were loaded"
                );
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        let dir = Self::config_dir()
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        self.save_to(&dir.join("config.json"))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!(error = %e, "failed to set config directory permissions");
                }
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        write_config_atomic(path, &content).map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Chat-completions endpoint; the environment wins over the file
    pub fn llm_url(&self) -> Option<String> {
        env_non_empty(LLM_URL_ENV).or_else(|| self.llm_url.clone())
    }

    /// Chat-completion API key (environment, then keychain)
    pub fn llm_api_key(&self) -> Option<String> {
        if let Some(key) = env_non_empty(LLM_KEY_ENV) {
            return Some(key);
        }
        match keyring::get_llm_api_key() {
            Ok(key) => key,
            Err(err) => {
                keyring::warn_keychain_error_once("LLM API key", &err);
                None
            }
        }
    }

    /// Source-control personal access token (environment, then keychain)
    pub fn devops_token(&self) -> Option<String> {
        if let Some(token) = env_non_empty(DEVOPS_TOKEN_ENV) {
            return Some(token);
        }
        match keyring::get_devops_token() {
            Ok(token) => token,
            Err(err) => {
                keyring::warn_keychain_error_once("source-control token", &err);
                None
            }
        }
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/faultline/config.json".to_string())
    }
}

/// Interactive prompt to store the endpoint and secrets
pub fn setup_interactive() -> Result<(), String> {
    use std::io::{self, BufRead};

    fn ask(label: &str) -> Result<String, String> {
        print!("  {}: ", label);
        io::stdout().flush().map_err(|e| e.to_string())?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| e.to_string())?;
        Ok(line.trim().to_string())
    }

    println!();
    println!("  ┌─────────────────────────────────────────────────────────┐");
    println!("  │  FAULTLINE SETUP                                        │");
    println!("  └─────────────────────────────────────────────────────────┘");
    println!();
    println!("  Leave a field empty to keep its current value.");
    println!();

    let mut config = Config::load();

    let url = ask("Chat-completions endpoint URL")?;
    if !url.is_empty() {
        url::Url::parse(&url).map_err(|e| format!("Invalid endpoint URL: {}", e))?;
        config.llm_url = Some(url);
    }

    let key = ask("Chat-completion API key")?;
    if !key.is_empty() {
        keyring::set_llm_api_key(&key).map_err(|e| {
            format!(
                "Failed to store API key in {}: {}. Set {} instead.",
                keyring::credentials_store_label(),
                e,
                LLM_KEY_ENV
            )
        })?;
    }

    let token = ask("Azure DevOps personal access token")?;
    if !token.is_empty() {
        keyring::set_devops_token(&token).map_err(|e| {
            format!(
                "Failed to store token in {}: {}. Set {} instead.",
                keyring::credentials_store_label(),
                e,
                DEVOPS_TOKEN_ENV
            )
        })?;
    }

    config.save()?;

    println!();
    println!("  + Settings saved to {}", Config::config_location());
    println!();
    Ok(())
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

fn write_config_atomic(path: &Path, content: &str) -> Result<(), String> {
    use std::fs::OpenOptions;

    let tmp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| e.to_string())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
            tracing::warn!(error = %e, "failed to set temp config file permissions");
        }
    }

    file.write_all(content.as_bytes())
        .map_err(|e| e.to_string())?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.llm_url.is_none());
        assert_eq!(config.devops_base_url, DEFAULT_DEVOPS_BASE_URL);
        assert_eq!(config.lookback_days, 14);
        assert_eq!(config.max_files, 40);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            llm_url: Some("https://llm.example/chat".to_string()),
            lookback_days: 7,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.llm_url.as_deref(), Some("https://llm.example/chat"));
        assert_eq!(loaded.lookback_days, 7);
        assert_eq!(loaded.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"max_files": 12}"#).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.max_files, 12);
        assert_eq!(loaded.lookback_days, DEFAULT_LOOKBACK_DAYS);
        assert_eq!(loaded.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_corrupt_config_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.max_files, DEFAULT_MAX_FILES);
        assert!(!path.exists());
        let backup = dir.path().join("config.json.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{not json");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json"));
        assert_eq!(loaded.bind, DEFAULT_BIND);
    }
}
