/// Success response envelope
///
/// Every endpoint answers with the same wrapper:
///
/// ```json
/// {"success": true, "message": "Tasks retrieved successfully", "data": {...}}
/// ```
///
/// Errors use the matching shape with `success: false` (see `error.rs`).
use axum::Json;
use serde::Serialize;

/// Wire envelope for successful responses
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload with a success message
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    /// A success envelope with no payload (deletes, logout)
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let Json(body) = ApiResponse::ok("Task created successfully", json!({"id": 1}));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Task created successfully");
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn test_message_only_omits_data() {
        let Json(body) = ApiResponse::message("Logged out successfully");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("data").is_none());
    }
}
