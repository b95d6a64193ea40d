//! Provider parameter preparation.
//!
//! Parameters are opaque and forwarded verbatim, with one exception: a
//! legacy `filters.size` value is expanded into the provider's native
//! `width` and `height` fields. The original `filters` key stays in place.

use serde_json::Value;

use crate::types::Parameters;

/// Key holding legacy filter options.
pub const FILTERS_KEY: &str = "filters";

/// Nested key inside `filters` carrying a square output size.
pub const SIZE_KEY: &str = "size";

/// Build the parameter map sent to the provider.
///
/// When `parameters.filters.size` is present and truthy, `width` and
/// `height` are set to that value, overriding any top-level values.
pub fn provider_parameters(parameters: &Parameters) -> Parameters {
    let mut prepared = parameters.clone();

    let size = parameters
        .get(FILTERS_KEY)
        .and_then(Value::as_object)
        .and_then(|filters| filters.get(SIZE_KEY))
        .filter(|size| is_truthy(size))
        .cloned();

    if let Some(size) = size {
        prepared.insert("width".to_string(), size.clone());
        prepared.insert("height".to_string(), size);
    }

    prepared
}

/// JSON truthiness: null, false, zero and empty containers are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
