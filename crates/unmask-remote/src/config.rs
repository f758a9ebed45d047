//! Remote store credentials loaded from environment variables.
//!
//! Every field defaults to the placeholder shipped in the project template.
//! A configuration is usable only once all of them have been replaced.

use thiserror::Error;

/// Credentials of the remote document store project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Web API key.
    /// Env: `UNMASK_FIREBASE_API_KEY`
    /// Default: `YOUR_API_KEY`
    pub api_key: String,

    /// Env: `UNMASK_FIREBASE_AUTH_DOMAIN`
    /// Default: `YOUR_PROJECT.firebaseapp.com`
    pub auth_domain: String,

    /// Project the documents live in.
    /// Env: `UNMASK_FIREBASE_PROJECT_ID`
    /// Default: `YOUR_PROJECT_ID`
    pub project_id: String,

    /// Env: `UNMASK_FIREBASE_STORAGE_BUCKET`
    /// Default: `YOUR_PROJECT.appspot.com`
    pub storage_bucket: String,

    /// Env: `UNMASK_FIREBASE_MESSAGING_SENDER_ID`
    /// Default: `YOUR_SENDER_ID`
    pub messaging_sender_id: String,

    /// Env: `UNMASK_FIREBASE_APP_ID`
    /// Default: `YOUR_APP_ID`
    pub app_id: String,
}

/// Template values that mean "not configured".
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";
pub const PLACEHOLDER_AUTH_DOMAIN: &str = "YOUR_PROJECT.firebaseapp.com";
pub const PLACEHOLDER_PROJECT_ID: &str = "YOUR_PROJECT_ID";
pub const PLACEHOLDER_STORAGE_BUCKET: &str = "YOUR_PROJECT.appspot.com";
pub const PLACEHOLDER_SENDER_ID: &str = "YOUR_SENDER_ID";
pub const PLACEHOLDER_APP_ID: &str = "YOUR_APP_ID";

/// Why a configuration cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("{0} is missing")]
    Missing(&'static str),

    #[error("{0} is still the template placeholder")]
    Placeholder(&'static str),
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            auth_domain: PLACEHOLDER_AUTH_DOMAIN.to_string(),
            project_id: PLACEHOLDER_PROJECT_ID.to_string(),
            storage_bucket: PLACEHOLDER_STORAGE_BUCKET.to_string(),
            messaging_sender_id: PLACEHOLDER_SENDER_ID.to_string(),
            app_id: PLACEHOLDER_APP_ID.to_string(),
        }
    }
}

impl RemoteConfig {
    /// Load credentials from environment variables, falling back to the
    /// placeholders.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let vars: [(&str, &mut String); 6] = [
            ("UNMASK_FIREBASE_API_KEY", &mut config.api_key),
            ("UNMASK_FIREBASE_AUTH_DOMAIN", &mut config.auth_domain),
            ("UNMASK_FIREBASE_PROJECT_ID", &mut config.project_id),
            ("UNMASK_FIREBASE_STORAGE_BUCKET", &mut config.storage_bucket),
            ("UNMASK_FIREBASE_MESSAGING_SENDER_ID", &mut config.messaging_sender_id),
            ("UNMASK_FIREBASE_APP_ID", &mut config.app_id),
        ];
        for (name, slot) in vars {
            if let Ok(value) = std::env::var(name) {
                *slot = value.trim().to_string();
            }
        }

        config
    }

    /// Check every credential field, reporting the first unusable one.
    pub fn validate(&self) -> Result<(), ConfigIssue> {
        let fields = [
            ("api_key", &self.api_key, PLACEHOLDER_API_KEY),
            ("auth_domain", &self.auth_domain, PLACEHOLDER_AUTH_DOMAIN),
            ("project_id", &self.project_id, PLACEHOLDER_PROJECT_ID),
            ("storage_bucket", &self.storage_bucket, PLACEHOLDER_STORAGE_BUCKET),
            ("messaging_sender_id", &self.messaging_sender_id, PLACEHOLDER_SENDER_ID),
            ("app_id", &self.app_id, PLACEHOLDER_APP_ID),
        ];

        for (name, value, placeholder) in fields {
            if value.trim().is_empty() {
                return Err(ConfigIssue::Missing(name));
            }
            if value == placeholder {
                return Err(ConfigIssue::Placeholder(name));
            }
        }
        Ok(())
    }

    pub fn is_usable(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RemoteConfig {
        RemoteConfig {
            api_key: "AIzaSy-test".into(),
            auth_domain: "unmask-dev.firebaseapp.com".into(),
            project_id: "unmask-dev".into(),
            storage_bucket: "unmask-dev.appspot.com".into(),
            messaging_sender_id: "1234567890".into(),
            app_id: "1:1234567890:web:abc".into(),
        }
    }

    #[test]
    fn test_default_config_is_placeholder() {
        let config = RemoteConfig::default();
        assert_eq!(
            config.validate(),
            Err(ConfigIssue::Placeholder("api_key"))
        );
        assert!(!config.is_usable());
    }

    #[test]
    fn test_filled_config_is_usable() {
        assert!(configured().is_usable());
    }

    #[test]
    fn test_any_placeholder_field_disqualifies() {
        let config = RemoteConfig {
            app_id: PLACEHOLDER_APP_ID.into(),
            ..configured()
        };
        assert_eq!(config.validate(), Err(ConfigIssue::Placeholder("app_id")));

        let config = RemoteConfig {
            project_id: PLACEHOLDER_PROJECT_ID.into(),
            ..configured()
        };
        assert!(!config.is_usable());
    }

    #[test]
    fn test_blank_field_is_missing() {
        let config = RemoteConfig {
            storage_bucket: "  ".into(),
            ..configured()
        };
        assert_eq!(config.validate(), Err(ConfigIssue::Missing("storage_bucket")));
    }

    #[test]
    fn test_issue_is_a_std_error() {
        let issue: Box<dyn std::error::Error> = Box::new(ConfigIssue::Missing("api_key"));
        assert_eq!(issue.to_string(), "api_key is missing");
        assert_eq!(
            ConfigIssue::Placeholder("app_id").to_string(),
            "app_id is still the template placeholder"
        );
    }
}
