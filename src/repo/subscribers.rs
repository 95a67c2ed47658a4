use std::collections::BTreeMap;

use anyhow::Context;

use serde::{Deserialize, Serialize};

use crate::client::{Document, DocumentClient, FieldValue, QueryBuilder};
use crate::domain::{EmailAddress, Preferences, Subscriber};

const COLLECTION: &str = "subscribers";

/// Repository for mailing-list subscribers in the document store.
///
/// Subscriber documents are keyed by email address; the preference filter
/// is stored as one serialized `preferences` field.
pub struct SubscriberRepo;

impl SubscriberRepo {
    /// Fetch every subscriber that has not unsubscribed
    #[tracing::instrument(name = "Fetch active subscribers", skip(store))]
    pub async fn fetch_active(store: &DocumentClient) -> anyhow::Result<Vec<Subscriber>> {
        let query =
            QueryBuilder::collection(COLLECTION).field_equal("active", FieldValue::boolean(true));

        store
            .run_query(&query)
            .await?
            .iter()
            .map(decode_subscriber)
            .collect()
    }

    /// Insert a new subscriber record, keyed by the email address so
    /// `set_active` can address the same document later
    #[tracing::instrument(name = "Insert subscriber", skip(store))]
    pub async fn insert(store: &DocumentClient, subscriber: &Subscriber) -> anyhow::Result<()> {
        let fields = BTreeMap::from([
            (
                "email".to_string(),
                FieldValue::string(subscriber.email.as_ref()),
            ),
            (
                "preferences".to_string(),
                FieldValue::string(encode_preferences(&subscriber.preferences)?),
            ),
            (
                "active".to_string(),
                FieldValue::boolean(subscriber.active),
            ),
        ]);

        store
            .create(COLLECTION, Some(subscriber.email.as_ref()), fields)
            .await
    }

    /// Soft-delete: flip the `active` flag without touching the record
    #[tracing::instrument(name = "Set subscriber active flag", skip(store))]
    pub async fn set_active(
        store: &DocumentClient,
        email: &EmailAddress,
        active: bool,
    ) -> anyhow::Result<()> {
        let fields = BTreeMap::from([("active".to_string(), FieldValue::boolean(active))]);

        store.patch(COLLECTION, email.as_ref(), fields).await
    }
}

/// Stored shape of the preference filter
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferencesWire {
    animal_type: String,
    size: String,
    age: String,
}

fn encode_preferences(preferences: &Preferences) -> anyhow::Result<String> {
    let wire = PreferencesWire {
        animal_type: preferences.animal_type.to_string(),
        size: preferences.size.to_string(),
        age: preferences.age.to_string(),
    };

    serde_json::to_string(&wire).context("Failed to serialize preferences")
}

/// Translate a stored subscriber document into a domain record; the single
/// place that knows the store's field names and preference encoding
fn decode_subscriber(document: &Document) -> anyhow::Result<Subscriber> {
    let email = document
        .str_field("email")?
        .parse()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Subscriber {} has an invalid email", document.id()))?;

    let wire: PreferencesWire = serde_json::from_str(document.str_field("preferences")?)
        .with_context(|| format!("Subscriber {} has malformed preferences", document.id()))?;

    let preferences = Preferences {
        animal_type: wire.animal_type.parse().map_err(anyhow::Error::msg)?,
        size: wire.size.parse().map_err(anyhow::Error::msg)?,
        age: wire.age.parse().map_err(anyhow::Error::msg)?,
    };

    Ok(Subscriber {
        email,
        preferences,
        active: document.bool_field("active")?,
    })
}
