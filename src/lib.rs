//! `featurebase-http` is an async HTTP client for the FeatureBase SQL endpoint.
//!
//! Statements are posted as plain text to `/sql` (or
//! `/databases/<id>/query/sql` for cloud databases) and the JSON reply is
//! decoded into a [`QueryResult`]:
//! - [`FeatureBaseClient::query`] runs one statement
//! - [`FeatureBaseClient::query_batch`] runs a list, sequentially or
//!   concurrently, and returns results in input order
//!
//! Every failure, whether network, HTTP, decoding or SQL, is reported through
//! `QueryResult::ok` and `QueryResult::error_message`.

mod batch;
mod client;
mod config;
mod decode;
mod error;
mod options;
mod row_map;
mod transport;
mod types;
mod value;
mod wire;

pub use batch::{BatchMode, BatchOptions};
pub use client::FeatureBaseClient;
pub use config::{ConnectionConfig, DEFAULT_HOST_PORT};
pub use error::{FailureKind, FeatureBaseError};
pub use options::ClientOptions;
pub use row_map::RowRef;
pub use types::{Field, QueryResult};
pub use value::Value;

pub type Result<T> = std::result::Result<T, FeatureBaseError>;
