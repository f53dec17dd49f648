//! Typed-value construction from raw CSV fields.
//!
//! Rows are built as JSON values because that is the bulk-args shape the
//! CrateDB HTTP endpoint consumes: integers, floats, and text map directly,
//! and a geo_point travels as a two-element `[lon, lat]` array.

use csv::StringRecord;
use serde_json::Value;

/// One fully coerced row, positionally aligned with an insert template.
pub type TypedRow = Vec<Value>;

/// Failure to coerce a single raw field.
///
/// `index` is the position within the CSV line; table and line context are
/// added by the ingestion engine.
#[derive(Debug)]
pub struct FieldError {
    pub index: usize,
    pub value: String,
    pub expected: &'static str,
}

fn raw(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

/// Coerces the field at `index` to an integer.
pub fn int(record: &StringRecord, index: usize) -> Result<Value, FieldError> {
    let field = raw(record, index);
    field
        .trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| FieldError {
            index,
            value: field.to_string(),
            expected: "integer",
        })
}

/// Coerces the field at `index` to an integer, substituting `default` when
/// the field is empty.
pub fn int_or(record: &StringRecord, index: usize, default: i64) -> Result<Value, FieldError> {
    if raw(record, index).trim().is_empty() {
        Ok(Value::from(default))
    } else {
        int(record, index)
    }
}

/// Coerces the field at `index` to a finite float.
pub fn float(record: &StringRecord, index: usize) -> Result<Value, FieldError> {
    let field = raw(record, index);
    field
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| FieldError {
            index,
            value: field.to_string(),
            expected: "float",
        })
}

/// Passes the field at `index` through as text.
pub fn text(record: &StringRecord, index: usize) -> Value {
    Value::from(raw(record, index))
}

/// Packs two adjacent scalar fields into one `[lon, lat]` geo-point value.
///
/// The two raw inputs collapse into a single typed field, so rows carrying a
/// geo-point are one element shorter than their source line.
pub fn geo_point(
    record: &StringRecord,
    lon_index: usize,
    lat_index: usize,
) -> Result<Value, FieldError> {
    let lon = float(record, lon_index)?;
    let lat = float(record, lat_index)?;
    Ok(Value::Array(vec![lon, lat]))
}
