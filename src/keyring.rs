//! Unified keyring storage for faultline credentials
//!
//! Both secrets (chat-completion API key and source-control access token)
//! live in a single keychain entry, serialized as JSON.

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

const KEYRING_SERVICE: &str = "faultline-credentials";
const KEYRING_USERNAME: &str = "default";

/// All credentials stored in a single keychain entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    llm_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    devops_token: Option<String>,
}

type KeyringResult<T> = Result<T, String>;

static CREDENTIALS_CACHE: OnceLock<Mutex<Option<StoredCredentials>>> = OnceLock::new();
static KEYRING_ERROR_WARNED: AtomicBool = AtomicBool::new(false);

fn credentials_cache() -> &'static Mutex<Option<StoredCredentials>> {
    CREDENTIALS_CACHE.get_or_init(|| Mutex::new(None))
}

fn keyring_disabled() -> bool {
    if cfg!(test) {
        return true;
    }
    matches!(
        std::env::var("FAULTLINE_DISABLE_KEYRING")
            .unwrap_or_default()
            .to_lowercase()
            .as_str(),
        "1" | "true" | "yes"
    )
}

fn keyring_entry() -> Result<Entry, keyring::Error> {
    Entry::new(KEYRING_SERVICE, KEYRING_USERNAME)
}

/// Warn about keychain errors only once per process
pub fn warn_keychain_error_once(context: &str, err: &str) {
    if KEYRING_ERROR_WARNED.swap(true, Ordering::Relaxed) {
        return;
    }
    tracing::warn!(context, error = err, "couldn't access system keychain");
    eprintln!("  Tip: set OPENAI_KEY and AZURE_DEVOPS_TOKEN to bypass the keychain.");
}

fn read_credentials_uncached() -> KeyringResult<StoredCredentials> {
    if keyring_disabled() {
        return Ok(StoredCredentials::default());
    }
    let entry = keyring_entry().map_err(|e| e.to_string())?;
    match entry.get_password() {
        Ok(json) => {
            serde_json::from_str(&json).map_err(|e| format!("Failed to parse credentials: {}", e))
        }
        Err(keyring::Error::NoEntry) => Ok(StoredCredentials::default()),
        Err(err) => Err(err.to_string()),
    }
}

fn write_credentials(creds: &StoredCredentials) -> KeyringResult<()> {
    if keyring_disabled() {
        return Err("System keychain is disabled (FAULTLINE_DISABLE_KEYRING)".to_string());
    }
    let json = serde_json::to_string(creds).map_err(|e| e.to_string())?;
    let entry = keyring_entry().map_err(|e| e.to_string())?;
    entry.set_password(&json).map_err(|e| e.to_string())
}

fn read_credentials_cached() -> KeyringResult<StoredCredentials> {
    let mut guard = match credentials_cache().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(ref creds) = *guard {
        return Ok(creds.clone());
    }

    let creds = read_credentials_uncached()?;
    *guard = Some(creds.clone());
    Ok(creds)
}

fn update_cache(creds: StoredCredentials) {
    let mut guard = match credentials_cache().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(creds);
}

// ============================================================================
// Public API
// ============================================================================

/// Get the chat-completion API key from the keychain
pub fn get_llm_api_key() -> KeyringResult<Option<String>> {
    Ok(read_credentials_cached()?.llm_api_key)
}

/// Store the chat-completion API key in the keychain
pub fn set_llm_api_key(key: &str) -> KeyringResult<()> {
    let mut creds = read_credentials_cached().unwrap_or_default();
    creds.llm_api_key = Some(key.to_string());
    write_credentials(&creds)?;
    update_cache(creds);
    Ok(())
}

/// Get the source-control personal access token from the keychain
pub fn get_devops_token() -> KeyringResult<Option<String>> {
    Ok(read_credentials_cached()?.devops_token)
}

/// Store the source-control personal access token in the keychain
pub fn set_devops_token(token: &str) -> KeyringResult<()> {
    let mut creds = read_credentials_cached().unwrap_or_default();
    creds.devops_token = Some(token.to_string());
    write_credentials(&creds)?;
    update_cache(creds);
    Ok(())
}

/// Human-readable name of the credential store for messages
pub fn credentials_store_label() -> &'static str {
    if cfg!(target_os = "macos") {
        "macOS Keychain"
    } else if cfg!(target_os = "windows") {
        "Windows Credential Manager"
    } else {
        "system keyring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_credentials_partial_serialization() {
        let creds = StoredCredentials {
            llm_api_key: Some("key-test".to_string()),
            devops_token: None,
        };
        let json = serde_json::to_string(&creds).unwrap();
        assert!(json.contains("key-test"));
        assert!(!json.contains("devops_token"));
    }

    #[test]
    fn test_stored_credentials_deserialize_empty() {
        let parsed: StoredCredentials = serde_json::from_str("{}").unwrap();
        assert!(parsed.llm_api_key.is_none());
        assert!(parsed.devops_token.is_none());
    }

    #[test]
    fn test_keyring_disabled_under_test() {
        assert!(get_llm_api_key().unwrap().is_none());
        assert!(set_devops_token("pat").is_err());
    }
}
