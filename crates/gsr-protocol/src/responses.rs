//! GeoServices REST error response body.
//!
//! Errors are reported as
//!
//! ```json
//! { "error": { "code": 400, "message": "...", "details": ["..."] } }
//! ```

use serde::{Deserialize, Serialize};

/// Error response for a failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// The error payload.
    pub error: ErrorBody,
}

/// The `error` member of an [`ExceptionResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// HTTP status code.
    pub code: u16,

    /// Human-readable summary.
    pub message: String,

    /// Additional detail lines (offending parameter names and values).
    #[serde(default)]
    pub details: Vec<String>,
}

impl ExceptionResponse {
    /// Create a new error response.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
                details: Vec::new(),
            },
        }
    }

    /// Append a detail line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.error.details.push(detail.into());
        self
    }

    /// The status code carried by this response.
    pub fn code(&self) -> u16 {
        self.error.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_details() {
        let exc = ExceptionResponse::new(400, "Invalid geometry");
        assert_eq!(exc.code(), 400);
        assert_eq!(exc.error.message, "Invalid geometry");
        assert!(exc.error.details.is_empty());
    }

    #[test]
    fn test_with_detail() {
        let exc = ExceptionResponse::new(404, "Layer not found").with_detail("topp:states");
        assert_eq!(exc.code(), 404);
        assert_eq!(exc.error.details, vec!["topp:states".to_string()]);
    }

    #[test]
    fn test_serialization() {
        let exc = ExceptionResponse::new(500, "boom").with_detail("store offline");
        let json = serde_json::to_value(&exc).unwrap();

        assert_eq!(json["error"]["code"], 500);
        assert_eq!(json["error"]["message"], "boom");
        assert_eq!(json["error"]["details"][0], "store offline");
    }
}
