use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use serde::Deserialize;

use crate::auth::Administrator;
use crate::client::{DocumentClient, EmailClient};
use crate::error::{ApiError, ApiResult};
use crate::repo::SubscriberRepo;

#[derive(Debug, Deserialize)]
pub struct BroadcastBody {
    title: Option<String>,
    content: Option<BroadcastContent>,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastContent {
    text: Option<String>,
    html: Option<String>,
}

#[derive(Debug)]
struct Broadcast {
    subject: String,
    text_body: String,
    html_body: String,
}

impl TryFrom<BroadcastBody> for Broadcast {
    type Error = ApiError;

    fn try_from(body: BroadcastBody) -> ApiResult<Self> {
        let subject = body
            .title
            .ok_or_else(|| ApiError::validation("title", "Title is required"))?;
        let content = body
            .content
            .ok_or_else(|| ApiError::validation("content", "Content is required"))?;

        let text_body = content
            .text
            .ok_or_else(|| ApiError::validation("content.text", "Text body is required"))?;
        let html_body = content
            .html
            .ok_or_else(|| ApiError::validation("content.html", "HTML body is required"))?;

        Ok(Self {
            subject,
            text_body,
            html_body,
        })
    }
}

/// Send a one-off email to every active subscriber.
///
/// Individual send failures are logged and skipped; one bad address or
/// provider hiccup does not fail the whole broadcast.
#[tracing::instrument(name = "Publish a broadcast", skip(body, store, email_client))]
#[post("")]
async fn publish(
    _admin: Administrator, // Administrator guard
    body: web::Json<BroadcastBody>,
    store: web::Data<DocumentClient>,
    email_client: web::Data<EmailClient>,
) -> ApiResult<impl Responder> {
    let broadcast: Broadcast = body.0.try_into()?;

    let subscribers = SubscriberRepo::fetch_active(&store)
        .await
        .map_err(ApiError::Upstream)?;

    for subscriber in &subscribers {
        if let Err(error) = email_client
            .send(
                &subscriber.email,
                &broadcast.subject,
                &broadcast.html_body,
                &broadcast.text_body,
            )
            .await
        {
            tracing::warn!(
                error.cause_chain = ?error,
                email = %subscriber.email,
                "Skipping subscriber, failed to send broadcast"
            );
        }
    }

    Ok(HttpResponse::Ok())
}

/// Broadcast API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/broadcasts").service(publish)
}
