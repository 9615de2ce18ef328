use serde::{Deserialize, Serialize};

/// Request body for the sign-in stub. There is no credential check; the
/// email is only an opaque identifier selecting the user's storage
/// namespace, and the name is for display and alert emails.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub name: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub name: String,
}
