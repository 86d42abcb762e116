use std::fmt;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::{
    batch::{self, BatchMode, BatchOptions},
    decode::decode_response,
    transport::Transport,
    ClientOptions, ConnectionConfig, QueryResult, Result,
};

#[derive(Clone)]
/// HTTP client for the FeatureBase SQL endpoint.
///
/// Cloning is cheap: clones share the underlying connection pool and the
/// request id sequence.
pub struct FeatureBaseClient {
    config: Arc<ConnectionConfig>,
    options: ClientOptions,
    transport: Transport,
    next_request_id: Arc<AtomicU64>,
}

impl fmt::Debug for FeatureBaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureBaseClient")
            .field("config", &self.config)
            .field("sql_url", &self.transport.sql_url())
            .field("options", &self.options)
            .finish()
    }
}

impl FeatureBaseClient {
    /// Creates a client with default [`ClientOptions`].
    ///
    /// Fails with [`crate::FeatureBaseError::Config`] when the config is
    /// invalid or its CA file cannot be loaded.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use featurebase_http::{ConnectionConfig, FeatureBaseClient};
    ///
    /// let db = FeatureBaseClient::new(ConnectionConfig::new("localhost:10101"))
    ///     .expect("valid config");
    /// ```
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        Self::with_options(config, ClientOptions::default())
    }

    /// Creates a client with explicit timeout and origin settings.
    pub fn with_options(config: ConnectionConfig, options: ClientOptions) -> Result<Self> {
        config.validate()?;
        let transport = Transport::new(&config, &options)?;
        Ok(Self {
            config: Arc::new(config),
            options,
            transport,
            next_request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Creates a client for the local community server (`localhost:10101`).
    pub fn local() -> Result<Self> {
        Self::new(ConnectionConfig::default())
    }

    /// Creates a client from `FEATUREBASE_*` environment variables.
    ///
    /// See [`ConnectionConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(ConnectionConfig::from_env())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// URL statements are posted to.
    pub fn sql_url(&self) -> &str {
        self.transport.sql_url()
    }

    /// Executes one statement.
    ///
    /// Never fails outright: transport, HTTP, decoding and SQL errors all
    /// come back as a result with `ok == false`.
    pub async fn query(&self, sql: &str) -> QueryResult {
        let request_id = self.next_request_id();
        execute(&self.transport, sql.to_owned(), request_id).await
    }

    /// Executes a list of statements and returns their results in input
    /// order.
    ///
    /// In [`BatchMode::Sequential`] the list is cut short after the first
    /// failure when `stop_on_error` is set. In [`BatchMode::Concurrent`]
    /// every statement runs and the result list always has one entry per
    /// statement.
    pub async fn query_batch<I, S>(&self, statements: I, options: BatchOptions) -> Vec<QueryResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let statements: Vec<String> = statements.into_iter().map(Into::into).collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            statements = statements.len(),
            mode = ?options.mode,
            stop_on_error = options.stop_on_error,
            "running batch"
        );

        let results = match options.mode {
            BatchMode::Sequential => {
                batch::run_sequential(statements, options.stop_on_error, |_, sql| {
                    let request_id = self.next_request_id();
                    execute(&self.transport, sql, request_id)
                })
                .await
            }
            BatchMode::Concurrent => {
                batch::run_concurrent(statements, options.max_concurrency, |_, sql| {
                    let transport = self.transport.clone();
                    let request_id = self.next_request_id();
                    async move { execute(&transport, sql, request_id).await }
                })
                .await
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            results = results.len(),
            failed = results.iter().filter(|result| !result.ok).count(),
            "batch finished"
        );

        results
    }

    fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Posts one statement and decodes the reply, folding every error into the
/// returned result.
async fn execute(transport: &Transport, sql: String, request_id: u64) -> QueryResult {
    #[cfg(feature = "tracing")]
    tracing::debug!(request_id, url = transport.sql_url(), "posting statement");

    let outcome = match transport.post_sql(&sql, request_id).await {
        Ok(response) => decode_response(&sql, response),
        Err(err) => Err(err),
    };

    match outcome {
        Ok(result) => result,
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(request_id, kind = ?err.kind(), error = %err, "statement failed");
            QueryResult::failure(sql, &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureBaseClient;
    use crate::{ClientOptions, ConnectionConfig, FeatureBaseError};

    #[test]
    fn local_client_targets_default_endpoint() {
        let client = FeatureBaseClient::local().expect("default config must be valid");
        assert_eq!(client.sql_url(), "http://localhost:10101/sql");
        assert_eq!(client.options(), &ClientOptions::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = FeatureBaseClient::new(ConnectionConfig::default().with_api_key("key"))
            .expect_err("must reject api key without host");
        assert!(matches!(err, FeatureBaseError::Config(_)));
    }

    #[test]
    fn request_ids_are_unique_across_clones() {
        let client = FeatureBaseClient::local().expect("default config must be valid");
        let clone = client.clone();
        let first = client.next_request_id();
        let second = clone.next_request_id();
        assert_ne!(first, second);
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = FeatureBaseClient::new(
            ConnectionConfig::new("featurebase.com:2020").with_api_key("secret-key"),
        )
        .expect("config must be valid");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-key"));
    }
}
