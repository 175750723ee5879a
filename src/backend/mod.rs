//! The `/query` backend contract.
//!
//! The backend is an external service that answers one query per call:
//!
//! ```text
//! POST /query
//! content-type: application/json
//!
//! {"query": "<trimmed user text>"}   ->   {"answer": "<string>"}
//! ```
//!
//! Any non-2xx status is a failure regardless of the body.

mod error;
mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::QueryError;
pub use http::HttpQueryClient;

/// Fixed path of the query endpoint, resolved against the backend origin.
pub const QUERY_PATH: &str = "/query";

/// Body of a query call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Body of a successful query call.
///
/// `answer` is optional and loosely typed; see [`QueryResponse::answer_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<Value>,
}

impl QueryResponse {
    pub fn with_answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(Value::String(answer.into())),
        }
    }

    /// Read a response body.
    ///
    /// Only a body that is not JSON at all is an error. Any JSON value is
    /// accepted; `answer` is taken from it only when it is an object, and a
    /// repeated `answer` key keeps the last value.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let answer = match serde_json::from_slice::<Value>(body)? {
            Value::Object(mut fields) => fields.remove("answer"),
            _ => None,
        };
        Ok(Self { answer })
    }

    /// Displayable answer, or `None` when the answer is missing or falsy
    /// (`null`, `""`, `false`, `0`).
    ///
    /// Other values are shown the way a browser stringifies them: arrays
    /// join their items with `,` and objects become `[object Object]`.
    #[must_use]
    pub fn answer_text(&self) -> Option<String> {
        match self.answer.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(display_text(other)),
        }
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                item => display_text(item),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Integral floats print without a fraction, as `1.0` does in a browser.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

/// Something that can answer a query.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> QueryResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_request_wire_shape() {
        let body = serde_json::to_value(QueryRequest::new("what is 6*7?")).unwrap();
        assert_eq!(body, json!({"query": "what is 6*7?"}));
    }

    #[test]
    fn test_answer_text_string() {
        assert_eq!(
            response(json!({"answer": "42"})).answer_text().as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_answer_text_missing_or_falsy() {
        assert_eq!(response(json!({})).answer_text(), None);
        assert_eq!(response(json!({"answer": null})).answer_text(), None);
        assert_eq!(response(json!({"answer": ""})).answer_text(), None);
        assert_eq!(response(json!({"answer": false})).answer_text(), None);
        assert_eq!(response(json!({"answer": 0})).answer_text(), None);
    }

    #[test]
    fn test_answer_text_other_values() {
        let text = |answer: Value| response(json!({ "answer": answer })).answer_text();

        assert_eq!(text(json!(42)).as_deref(), Some("42"));
        assert_eq!(text(json!(1.0)).as_deref(), Some("1"));
        assert_eq!(text(json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(text(json!(true)).as_deref(), Some("true"));
        assert_eq!(text(json!(["a", "b"])).as_deref(), Some("a,b"));
        assert_eq!(text(json!(["a", null, ["b", 1]])).as_deref(), Some("a,,b,1"));
        assert_eq!(text(json!([])).as_deref(), Some(""));
        assert_eq!(text(json!({"text": "hi"})).as_deref(), Some("[object Object]"));
    }

    #[test]
    fn test_from_slice_non_object_bodies_have_no_answer() {
        for body in [r#""hello""#, "[]", r#"["x"]"#, "42", "true", "null"] {
            let parsed = QueryResponse::from_slice(body.as_bytes()).unwrap();
            assert_eq!(parsed.answer, None, "body {body}");
            assert_eq!(parsed.answer_text(), None, "body {body}");
        }
    }

    #[test]
    fn test_from_slice_object_bodies() {
        let parsed = QueryResponse::from_slice(br#"{"answer": "ok", "sources": []}"#).unwrap();
        assert_eq!(parsed, QueryResponse::with_answer("ok"));

        let parsed = QueryResponse::from_slice(br#"{"answer": "a", "answer": "b"}"#).unwrap();
        assert_eq!(parsed.answer_text().as_deref(), Some("b"));

        assert_eq!(QueryResponse::from_slice(b"{}").unwrap(), QueryResponse::default());
    }

    #[test]
    fn test_from_slice_rejects_non_json() {
        assert!(QueryResponse::from_slice(b"<html>oops</html>").is_err());
        assert!(QueryResponse::from_slice(b"").is_err());
    }

    #[test]
    fn test_extra_fields_ignored() {
        let parsed = response(json!({"answer": "ok", "sources": ["a.pdf"]}));
        assert_eq!(parsed, QueryResponse::with_answer("ok"));
    }
}
