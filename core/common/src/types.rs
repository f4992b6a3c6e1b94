//! Common types used throughout ODK Services.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Logical identifier of a configured ODK application on the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppName(String);

impl AppName {
    /// Default application name used by the ODK tools.
    pub const DEFAULT: &'static str = "default";

    /// Create a new AppName from a string.
    ///
    /// # Preconditions
    /// - `name` must be non-empty
    /// - `name` must not contain path separators or whitespace
    ///
    /// # Errors
    /// - Returns error if the name is empty or contains invalid characters
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "AppName cannot be empty".to_string(),
            ));
        }
        if name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(crate::Error::InvalidInput(format!(
                "AppName contains invalid characters: {:?}",
                name
            )));
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AppName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AppName {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(value)
    }
}

impl From<AppName> for String {
    fn from(name: AppName) -> Self {
        name.0
    }
}

/// Server password that zeroizes on drop.
#[derive(Clone, Default, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Wrap a password string.
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Get the password text.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password([REDACTED])")
    }
}

/// Server credentials configured for an application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Sync server URL.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Username; anonymous access when absent.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for `username`.
    #[serde(default)]
    pub password: Password,
}

impl ServerSettings {
    /// Create settings pointing at `server_url` with anonymous access.
    pub fn anonymous(server_url: impl Into<String>) -> Self {
        Self {
            server_url: Some(server_url.into()),
            username: None,
            password: Password::default(),
        }
    }

    /// Attach a username and password.
    pub fn with_credentials(mut self, username: impl Into<String>, password: Password) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Whether a server has been configured at all.
    ///
    /// Only the URL is required; an empty username means anonymous access.
    pub fn are_credentials_configured(&self) -> bool {
        self.server_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_app_name_creation() {
        let name = AppName::new("default").unwrap();
        assert_eq!(name.as_str(), "default");
        assert_eq!(AppName::default(), name);
    }

    #[test]
    fn test_app_name_empty_fails() {
        assert!(AppName::new("").is_err());
    }

    #[test]
    fn test_app_name_rejects_separators() {
        assert!(AppName::new("a/b").is_err());
        assert!(AppName::new("a b").is_err());
    }

    #[test]
    fn test_app_name_serde() {
        let name: AppName = serde_json::from_str("\"tables\"").unwrap();
        assert_eq!(name.as_str(), "tables");
        assert!(serde_json::from_str::<AppName>("\"\"").is_err());
    }

    #[test]
    fn test_password_debug_redacted() {
        let password = Password::new("hunter2");
        assert_eq!(format!("{:?}", password), "Password([REDACTED])");
        assert_eq!(password.expose(), "hunter2");
    }

    #[test]
    fn test_credentials_configured() {
        assert!(!ServerSettings::default().are_credentials_configured());
        assert!(!ServerSettings::anonymous("  ").are_credentials_configured());
        assert!(ServerSettings::anonymous("https://sync.example.org").are_credentials_configured());

        let settings = ServerSettings::anonymous("https://sync.example.org")
            .with_credentials("collector", Password::new("secret"));
        assert!(settings.are_credentials_configured());
        assert_eq!(settings.username.as_deref(), Some("collector"));
    }

    proptest! {
        #[test]
        fn prop_app_name_accepts_identifiers(name in "[A-Za-z0-9_.-]{1,32}") {
            let app = AppName::new(name.clone()).unwrap();
            prop_assert_eq!(app.as_str(), name.as_str());
        }
    }
}
