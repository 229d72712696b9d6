//! Credentials for the external providers
//!
//! The repository provider token is mandatory; the service cannot publish
//! anything without it. The model key is optional and selects between the
//! model-backed and template generators.

use appforge_core::{AppforgeError, Result};
use std::env;

/// Get the hosted-repository provider token from `env_var`
pub fn provider_token(env_var: &str) -> Result<String> {
    match env::var(env_var) {
        Ok(token) if !token.trim().is_empty() => {
            tracing::info!("Using repository provider token from {}", env_var);
            Ok(token)
        }
        _ => Err(AppforgeError::Auth(format!(
            "{} environment variable is required",
            env_var
        ))),
    }
}

/// Get the model API key from `env_var`, if set
pub fn model_api_key(env_var: &str) -> Option<String> {
    env::var(env_var).ok().filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent concurrent env var modifications
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env_var<F, R>(key: &str, value: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var(key).ok();

        match value {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }

        let result = f();

        match original {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }

        result
    }

    #[test]
    fn test_provider_token_present() {
        with_env_var("APPFORGE_TEST_TOKEN", Some("ghp_test"), || {
            assert_eq!(provider_token("APPFORGE_TEST_TOKEN").unwrap(), "ghp_test");
        });
    }

    #[test]
    fn test_provider_token_missing() {
        with_env_var("APPFORGE_TEST_TOKEN", None, || {
            let err = provider_token("APPFORGE_TEST_TOKEN").unwrap_err();
            assert!(matches!(err, AppforgeError::Auth(_)));
        });
    }

    #[test]
    fn test_provider_token_blank_is_missing() {
        with_env_var("APPFORGE_TEST_TOKEN", Some("  "), || {
            assert!(provider_token("APPFORGE_TEST_TOKEN").is_err());
        });
    }

    #[test]
    fn test_model_key_optional() {
        with_env_var("APPFORGE_TEST_MODEL_KEY", None, || {
            assert!(model_api_key("APPFORGE_TEST_MODEL_KEY").is_none());
        });
        with_env_var("APPFORGE_TEST_MODEL_KEY", Some("sk-test"), || {
            assert_eq!(model_api_key("APPFORGE_TEST_MODEL_KEY").as_deref(), Some("sk-test"));
        });
    }
}
