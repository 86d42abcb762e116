use crate::{
    transport::RawResponse, wire::ResponseEnvelope, FeatureBaseError, Field, QueryResult, Result,
    Value,
};

/// Decodes a raw SQL endpoint response for `sql`.
///
/// A service-reported `error` wins over the HTTP status; a non-2xx status
/// without one is an HTTP failure; anything else that is not a JSON object
/// of the expected shape is a decode failure.
pub(crate) fn decode_response(sql: &str, response: RawResponse) -> Result<QueryResult> {
    let RawResponse { status, body } = response;
    let success = (200..300).contains(&status);

    let json = match parse_object(&body) {
        Ok(json) => json,
        Err(_) if !success => return Err(FeatureBaseError::Http { status, body }),
        Err(err) => return Err(err),
    };

    if let Some(message) = json.get("error").and_then(serde_json::Value::as_str) {
        let message = message.trim();
        if !message.is_empty() {
            return Err(FeatureBaseError::Query(message.to_owned()));
        }
    }
    if !success {
        return Err(FeatureBaseError::Http { status, body });
    }

    let envelope: ResponseEnvelope = serde_json::from_value(json).map_err(|err| {
        FeatureBaseError::Decode(format!("unexpected response shape: {err}; body: {body}"))
    })?;
    decode_envelope(sql, envelope)
}

fn parse_object(body: &str) -> Result<serde_json::Value> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|err| {
        FeatureBaseError::Decode(format!("invalid response JSON: {err}; body: {body}"))
    })?;
    if !json.is_object() {
        return Err(FeatureBaseError::Decode(format!(
            "expected a JSON object, got: {body}"
        )));
    }
    Ok(json)
}

fn decode_envelope(sql: &str, envelope: ResponseEnvelope) -> Result<QueryResult> {
    let schema = envelope.schema.map(|schema| {
        schema
            .into_fields()
            .into_iter()
            .map(|field| Field {
                name: field.name,
                data_type: field.data_type,
                base_type: field.base_type,
            })
            .collect::<Vec<_>>()
    });
    let width = schema.as_ref().map_or(0, Vec::len);

    let data = envelope
        .data
        .map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(index, row)| {
                    if width > 0 && row.len() != width {
                        return Err(FeatureBaseError::Decode(format!(
                            "row {index} has {} values but schema has {width} fields",
                            row.len()
                        )));
                    }
                    row.into_iter()
                        .map(decode_value)
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let mut result = QueryResult::success(sql.to_owned(), schema, data);
    result.warnings = envelope.warnings.unwrap_or_default();
    result.execution_time_us = envelope.execution_time.unwrap_or_default();
    result.rows_affected = envelope.rows_affected.unwrap_or_default();
    Ok(result)
}

pub(crate) fn decode_value(value: serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(value) => Ok(Value::Bool(value)),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Value::Integer)
            .or_else(|| number.as_u64().map(Value::Unsigned))
            .or_else(|| number.as_f64().map(Value::Float))
            .ok_or_else(|| FeatureBaseError::Decode(format!("invalid number value '{number}'"))),
        serde_json::Value::String(value) => Ok(Value::Text(value)),
        serde_json::Value::Array(values) => values
            .into_iter()
            .map(decode_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        serde_json::Value::Object(_) => Err(FeatureBaseError::Decode(
            "unsupported object value in result row".to_owned(),
        )),
    }
}
