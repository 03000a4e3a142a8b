//! Query parameters understood by the REST API.

use serde_json::Value;

/// A single query parameter appended to a request URL.
///
/// Filtering values are JSON-encoded, so `EqualTo("bob".into())` is sent as
/// `equalTo="bob"` and `StartAt(3.into())` as `startAt=3`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOption {
    /// Return only the keys at this location, with `true` for each value.
    Shallow,
    /// Ask the server to pretty-print the response.
    PrintPretty,
    /// Order children by a key, value, priority, or child path.
    OrderBy(String),
    EqualTo(Value),
    StartAt(Value),
    EndAt(Value),
    LimitToFirst(u32),
    LimitToLast(u32),
}

impl QueryOption {
    /// Order by a child path, e.g. `"height"` or `"$key"`.
    pub fn order_by(key: impl Into<String>) -> Self {
        QueryOption::OrderBy(key.into())
    }

    pub fn equal_to(value: impl Into<Value>) -> Self {
        QueryOption::EqualTo(value.into())
    }

    pub fn start_at(value: impl Into<Value>) -> Self {
        QueryOption::StartAt(value.into())
    }

    pub fn end_at(value: impl Into<Value>) -> Self {
        QueryOption::EndAt(value.into())
    }

    /// Name and encoded value of the URL parameter.
    pub fn pair(&self) -> (&'static str, String) {
        match self {
            QueryOption::Shallow => ("shallow", "true".to_string()),
            QueryOption::PrintPretty => ("print", "pretty".to_string()),
            QueryOption::OrderBy(key) => ("orderBy", Value::from(key.as_str()).to_string()),
            QueryOption::EqualTo(value) => ("equalTo", value.to_string()),
            QueryOption::StartAt(value) => ("startAt", value.to_string()),
            QueryOption::EndAt(value) => ("endAt", value.to_string()),
            QueryOption::LimitToFirst(n) => ("limitToFirst", n.to_string()),
            QueryOption::LimitToLast(n) => ("limitToLast", n.to_string()),
        }
    }
}
