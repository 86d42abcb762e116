use crate::{row_map::RowRef, FailureKind, FeatureBaseError, Value};

/// Column descriptor from the response schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Declared SQL type, e.g. `id`, `int`, `string`, `decimal(2)`.
    pub data_type: String,
    pub base_type: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            base_type: None,
        }
    }
}

/// Outcome of one executed statement.
///
/// Every failure (network, HTTP status, decoding, SQL) lands here with
/// `ok == false`; check `ok` before reading `data`.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    /// The statement as submitted.
    pub sql: String,
    pub ok: bool,
    pub schema: Option<Vec<Field>>,
    pub data: Option<Vec<Vec<Value>>>,
    pub warnings: Vec<String>,
    /// Server-side execution time in microseconds.
    pub execution_time_us: u64,
    pub rows_affected: u64,
    pub error_message: Option<String>,
    pub failure: Option<FailureKind>,
}

impl QueryResult {
    pub(crate) fn success(
        sql: String,
        schema: Option<Vec<Field>>,
        data: Option<Vec<Vec<Value>>>,
    ) -> Self {
        Self {
            sql,
            ok: true,
            schema,
            data,
            warnings: Vec::new(),
            execution_time_us: 0,
            rows_affected: 0,
            error_message: None,
            failure: None,
        }
    }

    /// Builds a failed result for `sql` from `err`.
    pub fn failure(sql: impl Into<String>, err: &FeatureBaseError) -> Self {
        Self {
            sql: sql.into(),
            ok: false,
            schema: None,
            data: None,
            warnings: Vec::new(),
            execution_time_us: 0,
            rows_affected: 0,
            error_message: Some(err.to_string()),
            failure: Some(err.kind()),
        }
    }

    /// Number of data rows; zero for failures and statements without rows.
    pub fn row_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// Name-addressable view of row `index`.
    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        let values = self.data.as_ref()?.get(index)?;
        Some(RowRef {
            fields: self.schema.as_deref().unwrap_or(&[]),
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        let fields = self.schema.as_deref().unwrap_or(&[]);
        self.data
            .iter()
            .flatten()
            .map(move |values| RowRef { fields, values })
    }
}
