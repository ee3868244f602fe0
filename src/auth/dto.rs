use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub userid: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub gender: String,
    pub birthdate: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub userid: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub userid: String,
    pub is_temporary_password: bool,
}

#[derive(Debug, Deserialize)]
pub struct FindUserIdRequest {
    pub email: String,
    pub birthdate: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindUserIdResponse {
    pub userid: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub userid: String,
    pub email: String,
    pub birthdate: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileImageRequest {
    pub profile_image: String,
}

/// Public profile returned by `/auth/me`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Profile {
    pub userid: String,
    pub email: String,
    pub gender: String,
    pub birthdate: String,
    pub created_at: String,
    pub profile_image: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminCheckResponse {
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
