use serde::{Deserialize, Serialize};

use crate::users::{User, UserUpdate};

/// `{"user": {...}}` wrapper used by every user endpoint.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserEnvelope<T> {
    #[serde(default)]
    pub user: T,
}

/// Request body for login. Missing fields arrive as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for registration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

/// Request body for profile updates. An absent key means "leave as is".
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            bio: req.bio,
            image: req.image,
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Default, Serialize)]
pub struct UserBody {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub username: String,
    pub bio: String,
    pub image: String,
}

impl UserBody {
    pub fn new(user: User, token: Option<String>) -> Self {
        Self {
            email: user.email,
            token,
            username: user.username,
            bio: user.bio,
            image: user.image,
        }
    }
}

pub type UserResponse = UserEnvelope<UserBody>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_absent_from_empty() {
        let req: UserEnvelope<UpdateUserRequest> =
            serde_json::from_str(r#"{"user":{"bio":""}}"#).unwrap();
        let update = UserUpdate::from(req.user);
        assert_eq!(update.bio.as_deref(), Some(""));
        assert!(update.username.is_none());
        assert!(update.image.is_none());
    }

    #[test]
    fn login_request_tolerates_missing_fields() {
        let req: UserEnvelope<LoginRequest> = serde_json::from_str(r#"{"user":{}}"#).unwrap();
        assert!(req.user.email.is_empty());
        let req: UserEnvelope<LoginRequest> = serde_json::from_str("{}").unwrap();
        assert!(req.user.password.is_empty());
    }

    #[test]
    fn token_is_omitted_when_absent() {
        let body = UserBody {
            email: "test@example.com".into(),
            username: "test".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&UserResponse { user: body }).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("token"));
    }
}
