/// Authenticated request context
///
/// The API's bearer-token middleware validates the Authorization header and
/// inserts an [`AuthContext`] into the request extensions; handlers pull it
/// back out with `Extension<AuthContext>` to learn who is calling.
use uuid::Uuid;

/// Identity attached to an authenticated request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user id (JWT subject claim)
    pub user_id: Uuid,
}

impl AuthContext {
    /// Builds a context from a validated token's subject
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Errors produced while authenticating a request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header on the request
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not a Bearer token
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_carries_user_id() {
        let id = Uuid::new_v4();
        let ctx = AuthContext::from_jwt(id);
        assert_eq!(ctx.user_id, id);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(AuthError::MissingCredentials.to_string(), "Missing credentials");
        assert_eq!(
            AuthError::InvalidFormat("Expected Bearer token".into()).to_string(),
            "Invalid authorization format: Expected Bearer token"
        );
    }
}
