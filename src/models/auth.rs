use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserResponse;

/// Pushed by the identity provider after it has authenticated the user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionRequest {
    #[schema(example = "oidc|8f14e45f")]
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[schema(example = "google")]
    pub login_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}
