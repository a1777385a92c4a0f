//! API Models
//!
//! Request and response bodies for the HTTP surface, annotated with `utoipa`
//! for OpenAPI generation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A flight lookup request.
#[derive(Deserialize, ToSchema, Debug)]
pub struct Query {
    /// Free text naming a flight number and a date.
    #[schema(example = "AI201 2025-08-25")]
    pub q: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_deserialization() {
        let json = r#"{"q": "EK500 2025-08-25"}"#;
        let query: Query = serde_json::from_str(json).unwrap();

        assert_eq!(query.q, "EK500 2025-08-25");
    }

    #[test]
    fn test_query_missing_field() {
        let result: Result<Query, _> = serde_json::from_str(r#"{}"#);
        assert!(result.is_err()); // Should fail because q is required
    }

    #[test]
    fn test_query_rejects_non_string() {
        let result: Result<Query, _> = serde_json::from_str(r#"{"q": 42}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "An internal server error occurred.".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"An internal server error occurred."}"#);
    }
}
