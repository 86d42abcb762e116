use std::fmt;
use std::path::{Path, PathBuf};

use crate::{FeatureBaseError, Result};

/// Host and port used when none is configured.
pub const DEFAULT_HOST_PORT: &str = "localhost:10101";

/// Where and how to reach a FeatureBase SQL endpoint.
///
/// A config is validated once, when a [`crate::FeatureBaseClient`] is built
/// from it, and is read-only afterwards.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    host_port: Option<String>,
    database: Option<String>,
    api_key: Option<String>,
    ca_file: Option<PathBuf>,
    ca_path: Option<PathBuf>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host_port", &self.host_port())
            .field("database", &self.database)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("ca_file", &self.ca_file)
            .field("ca_path", &self.ca_path)
            .finish()
    }
}

impl ConnectionConfig {
    /// Creates a config for `host:port`. A scheme may be included
    /// (`https://query.featurebase.com/v2`); otherwise one is derived.
    pub fn new(host_port: impl Into<String>) -> Self {
        Self {
            host_port: Some(host_port.into()),
            ..Self::default()
        }
    }

    /// Selects a cloud database by id.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the API key. Requires an explicit host and switches the derived
    /// scheme to `https`.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Trusts the PEM certificate(s) in `path`. Switches the derived scheme
    /// to `https`.
    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Trusts every PEM certificate (`*.pem`, `*.crt`, `*.cer`) in the
    /// directory `path`. Switches the derived scheme to `https`.
    pub fn with_ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(path.into());
        self
    }

    /// Creates a config from environment variables.
    ///
    /// Reads (all optional):
    /// - `FEATUREBASE_HOSTPORT`
    /// - `FEATUREBASE_DATABASE`
    /// - `FEATUREBASE_APIKEY`
    ///
    /// Unset or blank variables leave the corresponding setting empty.
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        }

        Self {
            host_port: var("FEATUREBASE_HOSTPORT"),
            database: var("FEATUREBASE_DATABASE"),
            api_key: var("FEATUREBASE_APIKEY"),
            ca_file: None,
            ca_path: None,
        }
    }

    pub fn host_port(&self) -> &str {
        self.host_port.as_deref().unwrap_or(DEFAULT_HOST_PORT)
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn ca_file(&self) -> Option<&Path> {
        self.ca_file.as_deref()
    }

    pub fn ca_path(&self) -> Option<&Path> {
        self.ca_path.as_deref()
    }

    /// Checks the invariants a client relies on.
    pub fn validate(&self) -> Result<()> {
        if let Some(host_port) = &self.host_port {
            if host_port.trim().is_empty() {
                return Err(FeatureBaseError::Config(
                    "host:port, if set, must not be empty".to_owned(),
                ));
            }
        } else if self.api_key.is_some() {
            return Err(FeatureBaseError::Config(
                "host:port is required when an API key is set".to_owned(),
            ));
        }
        if self.api_key.as_deref().is_some_and(str::is_empty) {
            return Err(FeatureBaseError::Config(
                "API key, if set, must not be empty".to_owned(),
            ));
        }
        if self.database.as_deref().is_some_and(|db| db.trim().is_empty()) {
            return Err(FeatureBaseError::Config(
                "database id, if set, must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// `https` when credentials or CA certificates are configured, `http`
    /// otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.api_key.is_some() || self.ca_file.is_some() || self.ca_path.is_some() {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL without trailing slash, e.g. `http://localhost:10101`.
    pub fn base_url(&self) -> String {
        let host_port = self.host_port().trim().trim_end_matches('/');
        if host_port.contains("://") {
            host_port.to_owned()
        } else {
            format!("{}://{host_port}", self.scheme())
        }
    }

    /// Path of the SQL submission endpoint.
    pub fn sql_path(&self) -> String {
        match self.database() {
            Some(database) => format!("/databases/{}/query/sql", database.trim()),
            None => "/sql".to_owned(),
        }
    }

    /// Full URL that statements are posted to.
    pub fn sql_url(&self) -> String {
        format!("{}{}", self.base_url(), self.sql_path())
    }
}
