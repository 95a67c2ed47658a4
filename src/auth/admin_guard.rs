use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use argon2::{Argon2, PasswordHash, PasswordVerifier};

use anyhow::Context;

use secrecy::Secret;

use crate::auth::Credentials;
use crate::error::{ApiError, ApiResult};
use crate::settings::AdminSettings;
use crate::telemetry::spawn_blocking_with_tracing;

/// Request guard for admin-only endpoints.
///
/// Pulls Basic credentials from the Authorization header and verifies them
/// against the configured admin account.
#[derive(Debug)]
pub struct Administrator;

impl FromRequest for Administrator {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // NOTE: Must be registered with the application at startup
            let admin: &AdminSettings = req
                .app_data::<web::Data<AdminSettings>>()
                .expect("AdminSettings not registered for application");

            let creds = Credentials::from_headers(req.headers())
                .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

            validate_credentials(admin, creds).await?;

            Ok(Administrator)
        })
    }
}

#[tracing::instrument(name = "Validate admin credentials", skip(admin, credentials))]
async fn validate_credentials(admin: &AdminSettings, credentials: Credentials) -> ApiResult<()> {
    let username_matches = credentials.username == admin.email;

    // Unknown usernames still pay for a full hash verification, on the
    // same blocking pool as the real path
    let password_hash = admin.password_hash.clone();
    let verified =
        spawn_blocking_with_tracing(move || verify_password_hash(credentials.password, password_hash))
            .await
            .context("Failed to spawn blocking task")?;

    if !username_matches {
        return Err(ApiError::Unauthorized("Unknown admin username".into()));
    }

    verified?;
    Ok(())
}

#[tracing::instrument(name = "Verify password hash", skip(password, password_hash))]
fn verify_password_hash(password: Secret<String>, password_hash: Secret<String>) -> ApiResult<()> {
    use secrecy::ExposeSecret;

    let password_hash = PasswordHash::new(password_hash.expose_secret())
        .context("Failed to parse stored password hash")?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &password_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid admin password".into()))?;

    Ok(())
}
