//! Token payload issued by the upstream backend
//!
//! The backend signs `{ id, username }` with a one hour expiry. Older
//! tokens carry the name under `user`.

use serde::{Deserialize, Serialize};

use super::{AuthError, Identity, DEFAULT_DISPLAY_NAME};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub exp: usize,       // Expiration timestamp
    #[serde(default)]
    pub iat: usize,       // Issued at
}

impl Claims {
    pub fn into_identity(self) -> Result<Identity, AuthError> {
        let user_id = self
            .id
            .or(self.sub)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuthError::Invalid("token carries no user id".to_string()))?;

        let display_name = self
            .username
            .or(self.user)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        Ok(Identity { user_id, display_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(json: serde_json::Value) -> Claims {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_backend_payload() {
        let c = claims(serde_json::json!({
            "id": "65a1f0c2e4b0a1b2c3d4e5f6", "username": "priya", "iat": 1, "exp": 2
        }));
        let identity = c.into_identity().unwrap();
        assert_eq!(identity.user_id, "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(identity.display_name, "priya");
    }

    #[test]
    fn test_legacy_user_field() {
        let c = claims(serde_json::json!({ "id": "1", "user": "legacy", "exp": 2 }));
        assert_eq!(c.into_identity().unwrap().display_name, "legacy");
    }

    #[test]
    fn test_display_name_fallback() {
        let c = claims(serde_json::json!({ "sub": "42", "username": "   ", "exp": 2 }));
        let identity = c.into_identity().unwrap();
        assert_eq!(identity.user_id, "42");
        assert_eq!(identity.display_name, DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_missing_user_id() {
        let c = claims(serde_json::json!({ "username": "ghost", "exp": 2 }));
        assert!(matches!(c.into_identity(), Err(AuthError::Invalid(_))));
    }
}
