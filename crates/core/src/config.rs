//! Endpoint configuration shared by the client crates

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, CoreResult};

/// Client-side route the user is sent to when the session can't be renewed
pub const DEFAULT_LOGIN_ROUTE: &str = "/admin/login";

/// Environment prefix, e.g. `TETHER_API_URL`
const ENV_PREFIX: &str = "TETHER";

/// Base endpoints the request gateway talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// General API base
    pub api_url: String,

    /// File-transfer base; falls back to `api_url` when unset
    #[serde(default)]
    pub file_url: Option<String>,

    /// Route passed to the navigator after a failed token refresh
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

impl EndpointConfig {
    /// Create a configuration with only the API base set
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            file_url: None,
            login_route: default_login_route(),
        }
    }

    /// Set a distinct file-transfer base
    pub fn with_file_url(mut self, file_url: impl Into<String>) -> Self {
        self.file_url = Some(file_url.into());
        self
    }

    /// Override the login route
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Effective file-transfer base
    pub fn file_url(&self) -> &str {
        self.file_url.as_deref().unwrap_or(&self.api_url)
    }

    /// Load from `.env`, then `TETHER_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `TETHER_API_URL` is missing or either base is not a valid URL
    pub fn from_env() -> CoreResult<Self> {
        Self::from_env_with_file(None)
    }

    /// Like [`EndpointConfig::from_env`], with an optional config file underneath the environment
    ///
    /// # Errors
    ///
    /// See [`EndpointConfig::load`]
    pub fn from_env_with_file(path: Option<&Path>) -> CoreResult<Self> {
        // A missing .env file is the normal case
        dotenvy::dotenv().ok();
        Self::load(path)
    }

    /// Load from an optional file, with `TETHER_*` environment variables layered on top
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, `api_url` is missing, or a base is invalid
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder =
            ::config::Config::builder().set_default("login_route", DEFAULT_LOGIN_ROUTE)?;

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both bases parse as absolute URLs
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the offending field
    pub fn validate(&self) -> CoreResult<()> {
        Url::parse(&self.api_url)
            .map_err(|e| CoreError::invalid_config(format!("api_url '{}': {e}", self.api_url)))?;

        if let Some(file_url) = &self.file_url {
            Url::parse(file_url)
                .map_err(|e| CoreError::invalid_config(format!("file_url '{file_url}': {e}")))?;
        }

        if !self.login_route.starts_with('/') {
            return Err(CoreError::invalid_config(format!(
                "login_route '{}' must start with '/'",
                self.login_route
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_url_falls_back_to_api_url() {
        let config = EndpointConfig::new("https://api.example.com");
        assert_eq!(config.file_url(), "https://api.example.com");

        let config = config.with_file_url("https://files.example.com");
        assert_eq!(config.file_url(), "https://files.example.com");
    }

    #[test]
    fn load_reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "api_url = \"https://api.example.com\"\nfile_url = \"https://files.example.com\""
        )
        .unwrap();

        let config = EndpointConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.file_url(), "https://files.example.com");
        assert_eq!(config.login_route, DEFAULT_LOGIN_ROUTE);
    }

    #[test]
    fn from_env_with_file_layers_file_under_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_url = \"https://api.example.com\"\nlogin_route = \"/signin\"").unwrap();

        let config = EndpointConfig::from_env_with_file(Some(file.path())).unwrap();
        assert_eq!(config.login_route, "/signin");
        assert_eq!(config.file_url(), config.api_url);
    }

    #[test]
    fn validate_rejects_relative_base() {
        let err = EndpointConfig::new("api/v1").validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn validate_rejects_bare_login_route() {
        let err = EndpointConfig::new("https://api.example.com")
            .with_login_route("login")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("login_route"));
    }
}
