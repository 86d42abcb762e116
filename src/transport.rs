use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::{ClientOptions, ConnectionConfig, FeatureBaseError, Result};

const X_API_KEY: &str = "x-api-key";
const X_REQUEST_ID: &str = "x-request-id";

/// Status and body of one SQL endpoint response, before decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Posts SQL text to the configured endpoint. One call, one request; no
/// retries.
#[derive(Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    sql_url: String,
    timeout: Duration,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("sql_url", &self.sql_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Transport {
    pub(crate) fn new(config: &ConnectionConfig, options: &ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers(config, options)?);

        if let Some(path) = config.ca_file() {
            builder = builder.add_root_certificate(load_certificate(path)?);
        }
        if let Some(dir) = config.ca_path() {
            for certificate in load_certificate_dir(dir)? {
                builder = builder.add_root_certificate(certificate);
            }
        }

        let http = builder
            .build()
            .map_err(|err| FeatureBaseError::Config(format!("could not build HTTP client: {err}")))?;

        Ok(Self {
            http,
            sql_url: config.sql_url(),
            timeout: Duration::from_millis(options.timeout_ms),
        })
    }

    pub(crate) fn sql_url(&self) -> &str {
        &self.sql_url
    }

    /// Sends `sql` verbatim as the request body, tagged with `request_id`.
    pub(crate) async fn post_sql(&self, sql: &str, request_id: u64) -> Result<RawResponse> {
        let response = self
            .http
            .post(&self.sql_url)
            .header(X_REQUEST_ID, request_id.to_string())
            .timeout(self.timeout)
            .body(sql.to_owned())
            .send()
            .await
            .map_err(FeatureBaseError::Transport)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(FeatureBaseError::Transport)?;
        Ok(RawResponse { status, body })
    }
}

fn load_certificate(path: &Path) -> Result<reqwest::Certificate> {
    let pem = std::fs::read(path).map_err(|err| {
        FeatureBaseError::Config(format!(
            "could not read CA file '{}': {err}",
            path.display()
        ))
    })?;
    reqwest::Certificate::from_pem(&pem).map_err(|err| {
        FeatureBaseError::Config(format!(
            "invalid CA certificate in '{}': {err}",
            path.display()
        ))
    })
}

/// Loads every `*.pem`, `*.crt` and `*.cer` file in `dir`. A directory
/// without any is a config error.
fn load_certificate_dir(dir: &Path) -> Result<Vec<reqwest::Certificate>> {
    let entries = std::fs::read_dir(dir).map_err(|err| {
        FeatureBaseError::Config(format!(
            "could not read CA directory '{}': {err}",
            dir.display()
        ))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| {
                FeatureBaseError::Config(format!(
                    "could not list CA directory '{}': {err}",
                    dir.display()
                ))
            })?
            .path();
        let is_certificate = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ["pem", "crt", "cer"].contains(&ext.to_ascii_lowercase().as_str()));
        if is_certificate && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(FeatureBaseError::Config(format!(
            "no PEM certificates found in CA directory '{}'",
            dir.display()
        )));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(count = paths.len(), dir = %dir.display(), "loading CA certificates");

    paths.iter().map(|path| load_certificate(path)).collect()
}

/// Headers sent with every statement.
pub(crate) fn default_headers(
    config: &ConnectionConfig,
    options: &ClientOptions,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(api_key) = config.api_key() {
        let mut key = header_value("API key", api_key)?;
        key.set_sensitive(true);
        let mut bearer = header_value("API key", &format!("Bearer {api_key}"))?;
        bearer.set_sensitive(true);
        headers.insert(X_API_KEY, key);
        headers.insert(header::AUTHORIZATION, bearer);
    }
    if let Some(origin) = &options.origin {
        headers.insert(header::ORIGIN, header_value("origin", origin)?);
    }
    Ok(headers)
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        FeatureBaseError::Config(format!("{what} contains characters not allowed in a header"))
    })
}
