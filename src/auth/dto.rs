use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;

/// Request body for user registration. Fields are optional so that missing
/// ones surface as a 400 with a JSON error body rather than a deserialization
/// rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for Google sign-in; the identity fields come from the
/// client-side OAuth flow.
#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub google_id: Option<String>,
    pub avatar_url: Option<String>,
}

/// Public projection of a user; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
        }
    }
}

/// Response returned after register, login or Google sign-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_omits_password_hash() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            avatar_url: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn auth_response_shape() {
        let response = AuthResponse {
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "a@b.co".to_string(),
                name: "A".to_string(),
                avatar_url: Some("https://example.com/a.png".to_string()),
            },
            token: "tok".to_string(),
        };
        let value: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert!(value.get("user").is_some());
        assert_eq!(value["token"], "tok");
        assert_eq!(value["user"]["avatar_url"], "https://example.com/a.png");
    }
}
