use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};

use serde::{Deserialize, Serialize};

use crate::client::FormRelayClient;
use crate::crypto::{self, SigningKey, CSRF_COOKIE_NAME};
use crate::domain::EmailAddress;
use crate::error::{ApiError, ApiResult, FieldError};

/// Issue a fresh anti-forgery token pair for the public adoption form.
///
/// The token value goes into the response body for the page to embed as a
/// hidden field; the signed copy travels in a script-inaccessible cookie
/// the browser replays on submission.
#[tracing::instrument(name = "Issue form token", skip(signing_key))]
#[get("/token")]
async fn token(signing_key: web::Data<SigningKey>) -> impl Responder {
    let issued = crypto::issue(&signing_key);

    let cookie = Cookie::build(CSRF_COOKIE_NAME, issued.cookie_value().to_string())
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .finish();

    HttpResponse::Ok().cookie(cookie).json(TokenResponse {
        csrf_token: issued.form_token().to_string(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionForm {
    csrf_token: Option<String>,
    name: Option<String>,
    email: Option<String>,
    pet_id: Option<String>,
    message: Option<String>,
}

/// Validated inquiry payload forwarded to the external processing endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdoptionInquiry {
    name: String,
    email: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pet_id: Option<String>,
    message: String,
}

impl TryFrom<&SubmissionForm> for AdoptionInquiry {
    type Error = ApiError;

    fn try_from(form: &SubmissionForm) -> ApiResult<Self> {
        let mut problems = Vec::new();

        let name = match form.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => {
                problems.push(FieldError {
                    field: "name".into(),
                    message: "Name is required".into(),
                });
                None
            }
        };

        let email = match form.email.as_deref() {
            Some(raw) => match raw.parse::<EmailAddress>() {
                Ok(email) => Some(email),
                Err(message) => {
                    problems.push(FieldError {
                        field: "email".into(),
                        message,
                    });
                    None
                }
            },
            None => {
                problems.push(FieldError {
                    field: "email".into(),
                    message: "Email is required".into(),
                });
                None
            }
        };

        let message = match form.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => Some(message.to_string()),
            _ => {
                problems.push(FieldError {
                    field: "message".into(),
                    message: "Message is required".into(),
                });
                None
            }
        };

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) if problems.is_empty() => Ok(Self {
                name,
                email,
                pet_id: form.pet_id.clone(),
                message,
            }),
            _ => Err(ApiError::Validation(problems)),
        }
    }
}

/// Accept a public adoption-form submission.
///
/// The anti-forgery check runs before any field validation; a failed check
/// collapses to one generic 403 regardless of which step failed.
#[tracing::instrument(name = "Submit adoption form", skip(form, signing_key, relay))]
#[post("/submissions")]
async fn submit(
    req: HttpRequest,
    form: web::Form<SubmissionForm>,
    signing_key: web::Data<SigningKey>,
    relay: web::Data<FormRelayClient>,
) -> ApiResult<impl Responder> {
    let cookie = req.cookie(CSRF_COOKIE_NAME);

    crypto::verify(
        &signing_key,
        form.csrf_token.as_deref(),
        cookie.as_ref().map(|cookie| cookie.value()),
    )?;

    let inquiry = AdoptionInquiry::try_from(&form.0)?;

    relay.forward(&inquiry).await.map_err(ApiError::Upstream)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "result": "success" })))
}

/// Public form endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/forms").service(token).service(submit)
}
