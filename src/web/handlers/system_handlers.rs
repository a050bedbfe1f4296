// src/web/handlers/system_handlers.rs
use crate::auth::{AuthenticatedUser, OptionalAuth};
use crate::web::types::{ApiError, UserInfo};

use rocket::serde::json::Json;
use tracing::info;

pub async fn get_current_user_handler(auth: AuthenticatedUser) -> Json<UserInfo> {
    let user = auth.user();
    let profile = auth.profile();

    Json(UserInfo {
        uid: user.uid.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        subscription_tier: profile.subscription_tier.clone(),
    })
}

pub async fn get_current_user_error_handler() -> ApiError {
    ApiError::Unauthorized("Unauthorized".to_string())
}

pub async fn health_handler(auth: OptionalAuth) -> Json<&'static str> {
    if let Some(user) = auth.user {
        info!(
            "Health check by authenticated user: {} (tier: {})",
            user.email(),
            user.profile().subscription_tier
        );
    } else {
        info!("Health check by anonymous user");
    }
    Json("OK")
}
