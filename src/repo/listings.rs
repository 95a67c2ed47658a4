use std::collections::BTreeMap;

use anyhow::Context;

use chrono::{DateTime, Utc};

use crate::client::{Document, DocumentClient, FieldValue, QueryBuilder};
use crate::domain::Listing;

const COLLECTION: &str = "pets";

/// Repository for pet listings in the document store
pub struct ListingRepo;

impl ListingRepo {
    /// Fetch published listings added after `since` that have not yet been
    /// announced to subscribers
    #[tracing::instrument(name = "Fetch unannounced listings", skip(store))]
    pub async fn fetch_unannounced(
        store: &DocumentClient,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Listing>> {
        let query = QueryBuilder::collection(COLLECTION)
            .field_equal("active", FieldValue::boolean(true))
            .field_equal("notificationSent", FieldValue::boolean(false))
            .field_greater_than("dateAdded", FieldValue::timestamp(since));

        store
            .run_query(&query)
            .await?
            .iter()
            .map(decode_listing)
            .collect()
    }

    /// Mark a listing as announced; terminal, the listing is never picked
    /// up by `fetch_unannounced` again
    #[tracing::instrument(name = "Mark listing announced", skip(store))]
    pub async fn mark_announced(
        store: &DocumentClient,
        listing_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let fields = BTreeMap::from([
            ("notificationSent".to_string(), FieldValue::boolean(true)),
            ("lastNotificationAt".to_string(), FieldValue::timestamp(at)),
        ]);

        store.patch(COLLECTION, listing_id, fields).await
    }
}

/// Translate a stored pet document into a domain listing.
///
/// All knowledge of the store's field names and value wrappers for pets
/// lives here; unknown category strings fail the decode rather than being
/// guessed at.
fn decode_listing(document: &Document) -> anyhow::Result<Listing> {
    let animal_type = document
        .str_field("type")?
        .parse()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Listing {} has an invalid type", document.id()))?;

    let size = document
        .str_field("size")?
        .parse()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Listing {} has an invalid size", document.id()))?;

    let age_years = document
        .int_field("age")?
        .try_into()
        .with_context(|| format!("Listing {} has a negative age", document.id()))?;

    Ok(Listing {
        id: document.id().to_string(),
        name: document.str_field("name")?.to_string(),
        animal_type,
        size,
        age_years,
        active: document.bool_field("active")?,
        notification_sent: document.bool_field("notificationSent")?,
        date_added: document.timestamp_field("dateAdded")?,
    })
}
