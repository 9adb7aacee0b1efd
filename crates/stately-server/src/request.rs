use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{HeaderMap, Method, Uri};

/// Transport-neutral view of an inbound protocol request.
///
/// Hooks in [`crate::options::BackendOptions`] receive this to derive the
/// reference and the encrypt flag.
#[derive(Clone, Debug)]
pub struct StateRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    query: HashMap<String, String>,
}

impl StateRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let mut query = HashMap::new();
        if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(&uri) {
            // A repeated parameter resolves to its first value.
            for (name, value) in pairs {
                query.entry(name).or_insert(value);
            }
        }
        Self {
            method,
            uri,
            headers,
            body,
            query,
        }
    }

    /// Value of query parameter `name`, if present.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Caller-supplied lock id (`ID` query parameter), empty if absent.
    pub fn lock_id(&self) -> &str {
        self.query("ID").unwrap_or_default()
    }
}

/// Parse a boolean the way query strings usually spell one.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
