use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use serde::Deserialize;

use crate::client::DocumentClient;
use crate::domain::{EmailAddress, Preference, Preferences, Subscriber};
use crate::error::{ApiError, ApiResult, FieldError};
use crate::repo::SubscriberRepo;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscriberForm {
    email: Option<String>,
    /// Preference dimensions; an omitted dimension means "any"
    animal_type: Option<String>,
    size: Option<String>,
    age: Option<String>,
}

impl TryFrom<&NewSubscriberForm> for Subscriber {
    type Error = ApiError;

    fn try_from(form: &NewSubscriberForm) -> ApiResult<Self> {
        let mut problems = Vec::new();

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

        let animal_type = parse_preference(form.animal_type.as_deref(), "animalType", &mut problems);
        let size = parse_preference(form.size.as_deref(), "size", &mut problems);
        let age = parse_preference(form.age.as_deref(), "age", &mut problems);

        match (email, animal_type, size, age) {
            (Some(email), Some(animal_type), Some(size), Some(age)) if problems.is_empty() => {
                Ok(Subscriber {
                    email,
                    preferences: Preferences {
                        animal_type,
                        size,
                        age,
                    },
                    active: true,
                })
            }
            _ => Err(ApiError::Validation(problems)),
        }
    }
}

fn parse_preference<T>(
    raw: Option<&str>,
    field: &str,
    problems: &mut Vec<FieldError>,
) -> Option<Preference<T>>
where
    T: std::str::FromStr<Err = String>,
{
    match raw {
        None => Some(Preference::Any),
        Some(raw) => match raw.parse() {
            Ok(preference) => Some(preference),
            Err(message) => {
                problems.push(FieldError {
                    field: field.into(),
                    message,
                });
                None
            }
        },
    }
}

#[tracing::instrument(name = "Create a new subscriber", skip(store))]
#[post("")]
async fn create(
    form: web::Form<NewSubscriberForm>,
    store: web::Data<DocumentClient>,
) -> ApiResult<impl Responder> {
    let subscriber = Subscriber::try_from(&form.0)?;

    SubscriberRepo::insert(&store, &subscriber)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(HttpResponse::Created())
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeForm {
    email: Option<String>,
}

#[tracing::instrument(name = "Unsubscribe", skip(store))]
#[post("/unsubscribe")]
async fn unsubscribe(
    form: web::Form<UnsubscribeForm>,
    store: web::Data<DocumentClient>,
) -> ApiResult<impl Responder> {
    let email: EmailAddress = form
        .email
        .as_deref()
        .ok_or_else(|| ApiError::validation("email", "Email is required"))?
        .parse()
        .map_err(|message: String| ApiError::validation("email", message))?;

    SubscriberRepo::set_active(&store, &email, false)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(HttpResponse::Ok())
}

/// Subscription endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/subscriptions").service(create).service(unsubscribe)
}
