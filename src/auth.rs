// src/auth.rs
use crate::app_log;
use crate::database::{DatabaseConfig, Profile, ProfileRepository};
use crate::environment::AuthSettings;
use anyhow::Result;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub aud: String, // Identity provider project ID
    pub iss: String, // Identity provider issuer
    pub sub: String, // User ID (uid)
    pub email: String,
    pub name: Option<String>,
    pub exp: usize, // Expiration timestamp
    pub iat: usize, // Issued at timestamp
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

pub struct AuthConfig {
    pub settings: AuthSettings,
    pub signing_keys: HashMap<String, String>, // kid -> public key
}

impl AuthConfig {
    pub fn new(settings: AuthSettings) -> Self {
        Self {
            settings,
            signing_keys: HashMap::new(),
        }
    }

    /// Fetch the identity provider's public keys for JWT verification
    pub async fn update_signing_keys(&mut self) -> Result<()> {
        let response = reqwest::get(&self.settings.keys_url).await?;
        let keys: HashMap<String, String> = response.json().await?;

        self.signing_keys = keys;
        app_log!(info, "Updated identity provider signing keys");

        Ok(())
    }
}

/// Authenticated user with their subscription profile
pub struct AuthenticatedUser {
    pub identity: Identity,
    pub profile: Profile,
}

impl AuthenticatedUser {
    pub fn user(&self) -> &Identity {
        &self.identity
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn user_id(&self) -> &str {
        &self.identity.uid
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_config = match req.guard::<&State<AuthConfig>>().await {
            Outcome::Success(config) => config,
            Outcome::Error((status, _)) => {
                return Outcome::Error((status, AuthError::DatabaseError))
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let db_config = match req.guard::<&State<DatabaseConfig>>().await {
            Outcome::Success(config) => config,
            Outcome::Error((status, _)) => {
                return Outcome::Error((status, AuthError::DatabaseError))
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        // Extract Authorization header
        let token = match req.headers().get_one("Authorization") {
            Some(header) if header.starts_with("Bearer ") => &header[7..],
            Some(_) => {
                app_log!(warn, "Invalid Authorization header format");
                return Outcome::Error((Status::Unauthorized, AuthError::InvalidToken));
            }
            None => {
                app_log!(warn, "Missing Authorization header");
                return Outcome::Error((Status::Unauthorized, AuthError::MissingToken));
            }
        };

        // Verify the bearer token
        let identity = match verify_token(token, auth_config) {
            Ok(identity) => identity,
            Err(e) => {
                app_log!(error, "Token verification failed: {}", e);
                return Outcome::Error((Status::Unauthorized, AuthError::TokenVerificationFailed));
            }
        };

        let pool = match db_config.pool() {
            Ok(pool) => pool,
            Err(e) => {
                app_log!(error, "Database connection failed: {}", e);
                return Outcome::Error((Status::InternalServerError, AuthError::DatabaseError));
            }
        };

        // Load the subscription profile, creating it on first login
        let profile_repo = ProfileRepository::new(pool);
        let profile = match profile_repo
            .get_or_create(&identity.uid, &identity.email)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                app_log!(
                    error,
                    "Failed to get or create profile for {}: {}",
                    identity.email,
                    e
                );
                return Outcome::Error((Status::InternalServerError, AuthError::DatabaseError));
            }
        };

        app_log!(
            info,
            "User {} authenticated (tier: {})",
            identity.email,
            profile.subscription_tier
        );

        Outcome::Success(AuthenticatedUser { identity, profile })
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    DatabaseError,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Authorization token required",
            AuthError::InvalidToken => "Invalid authorization token format",
            AuthError::TokenVerificationFailed => "Token verification failed",
            AuthError::DatabaseError => "Database error occurred",
        }
    }
}

fn verify_token(token: &str, auth_config: &AuthConfig) -> Result<Identity> {
    // Decode header to get the key ID
    let header = jsonwebtoken::decode_header(token)?;
    let kid = header
        .kid
        .ok_or_else(|| anyhow::anyhow!("Missing kid in token header"))?;

    // Get the public key for this kid
    let public_key = auth_config
        .signing_keys
        .get(&kid)
        .ok_or_else(|| anyhow::anyhow!("Unknown key ID: {}", kid))?;

    // Verify the token
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&auth_config.settings.audience]);
    validation.set_issuer(&[&auth_config.settings.issuer]);

    let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())?;
    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;

    Ok(token_data.claims.into())
}

// Optional auth guard that doesn't fail if no auth is provided
pub struct OptionalAuth {
    pub user: Option<AuthenticatedUser>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalAuth {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(auth) => Outcome::Success(OptionalAuth { user: Some(auth) }),
            _ => Outcome::Success(OptionalAuth { user: None }),
        }
    }
}
