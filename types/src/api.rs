//! API response types.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// ============================================================================
// Version API Types
// ============================================================================

/// Response body of a successful version request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct VersionResponse {
    /// The resolved application version.
    #[cfg_attr(feature = "openapi", schema(example = "1.2.3"))]
    pub version: String,
}

impl VersionResponse {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Standard error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_response_shape() {
        let value = serde_json::to_value(VersionResponse::new("1.2.3")).unwrap();
        assert_eq!(value, json!({ "version": "1.2.3" }));
    }

    #[test]
    fn test_error_response_omits_empty_details() {
        let value = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(value, json!({ "error": "boom" }));

        let value = serde_json::to_value(ErrorResponse::with_details("boom", "disk")).unwrap();
        assert_eq!(value, json!({ "error": "boom", "details": "disk" }));
    }
}
