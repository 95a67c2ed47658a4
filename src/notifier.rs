use std::fmt::Write as _;
use std::time::Duration;

use chrono::Utc;

use futures_util::future::join_all;

use url::Url;

use crate::client::{DocumentClient, EmailClient};
use crate::domain::{Listing, Subscriber};
use crate::repo::{ListingRepo, SubscriberRepo};

/// How far back a pass looks for newly added listings. A delayed or
/// skipped pass can miss listings older than this; that loss is accepted
/// rather than retried.
const DISCOVERY_WINDOW_HOURS: i64 = 1;

/// Scheduled worker that announces new listings to matching subscribers.
///
/// One pass discovers unannounced listings added within the last hour,
/// matches them against every active subscriber's preference filter, sends
/// each matching subscriber a single digest email, and marks all
/// discovered listings as announced.
pub struct Notifier {
    store: DocumentClient,
    email_client: EmailClient,
    public_base_url: Url,
}

impl Notifier {
    pub fn new(store: DocumentClient, email_client: EmailClient, public_base_url: Url) -> Self {
        Self {
            store,
            email_client,
            public_base_url,
        }
    }

    /// Run passes on a fixed period until the process exits
    pub async fn run_forever(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// Execute a single pass. Failures are logged, never propagated; the
    /// timer must not see an error because one upstream call failed.
    #[tracing::instrument(name = "Notification pass", skip(self))]
    pub async fn run_once(&self) {
        if let Err(error) = self.execute_pass().await {
            tracing::error!(error.cause_chain = ?error, "Notification pass failed");
        }
    }

    async fn execute_pass(&self) -> anyhow::Result<()> {
        let since = Utc::now() - chrono::Duration::hours(DISCOVERY_WINDOW_HOURS);

        let listings = ListingRepo::fetch_unannounced(&self.store, since).await?;
        if listings.is_empty() {
            tracing::debug!("No unannounced listings in the discovery window");
            return Ok(());
        }

        let subscribers = SubscriberRepo::fetch_active(&self.store).await?;
        let batches = build_batches(&subscribers, &listings);

        tracing::info!(
            listings = listings.len(),
            subscribers = subscribers.len(),
            batches = batches.len(),
            "Dispatching listing notifications"
        );

        // One independent send per subscriber; wait for all of them and
        // collect each outcome rather than aborting on the first failure
        let sends = batches.iter().map(|batch| async move {
            let outcome = self.send_digest(batch).await;
            (batch.subscriber, outcome)
        });

        for (subscriber, outcome) in join_all(sends).await {
            if let Err(error) = outcome {
                tracing::warn!(
                    error.cause_chain = ?error,
                    email = %subscriber.email,
                    "Failed to send listing notification"
                );
            }
        }

        // Every discovered listing is marked, matched or not, and
        // independent of send outcomes; a stuck listing is worse than an
        // occasional missed notification
        let now = Utc::now();
        for listing in &listings {
            if let Err(error) = ListingRepo::mark_announced(&self.store, &listing.id, now).await {
                tracing::warn!(
                    error.cause_chain = ?error,
                    listing_id = %listing.id,
                    "Failed to mark listing as announced"
                );
            }
        }

        Ok(())
    }

    async fn send_digest(&self, batch: &NotificationBatch<'_>) -> anyhow::Result<()> {
        let subject = if batch.listings.len() == 1 {
            "A new pet is looking for a home".to_string()
        } else {
            format!("{} new pets are looking for a home", batch.listings.len())
        };

        let (html_body, text_body) = self.render_digest(batch);

        self.email_client
            .send(&batch.subscriber.email, &subject, &html_body, &text_body)
            .await
    }

    fn render_digest(&self, batch: &NotificationBatch<'_>) -> (String, String) {
        let unsubscribe_url = self.unsubscribe_url(batch.subscriber);

        let mut html = String::from("<p>New pets matching your preferences:</p>\n<ul>\n");
        let mut text = String::from("New pets matching your preferences:\n\n");

        for listing in &batch.listings {
            let _ = writeln!(
                html,
                "<li><strong>{}</strong> ({}, {}, {})</li>",
                listing.name,
                listing.animal_type,
                listing.size,
                listing.age_group(),
            );
            let _ = writeln!(
                text,
                "- {} ({}, {}, {})",
                listing.name,
                listing.animal_type,
                listing.size,
                listing.age_group(),
            );
        }

        let _ = write!(
            html,
            "</ul>\n<p><a href=\"{}\">Unsubscribe</a></p>",
            unsubscribe_url
        );
        let _ = write!(text, "\nUnsubscribe: {}", unsubscribe_url);

        (html, text)
    }

    fn unsubscribe_url(&self, subscriber: &Subscriber) -> Url {
        let mut url = self
            .public_base_url
            .join("unsubscribe")
            .unwrap_or_else(|_| self.public_base_url.clone());
        url.query_pairs_mut()
            .append_pair("email", subscriber.email.as_ref());
        url
    }
}

/// Per-subscriber group of matching listings, built fresh each pass and
/// never persisted
pub struct NotificationBatch<'a> {
    pub subscriber: &'a Subscriber,
    pub listings: Vec<&'a Listing>,
}

/// Group listings by the subscribers whose preference filters they pass.
/// Subscribers with no matches get no batch and are not contacted.
pub fn build_batches<'a>(
    subscribers: &'a [Subscriber],
    listings: &'a [Listing],
) -> Vec<NotificationBatch<'a>> {
    subscribers
        .iter()
        .filter_map(|subscriber| {
            let matches: Vec<&Listing> = listings
                .iter()
                .filter(|listing| subscriber.preferences.matches(listing))
                .collect();

            if matches.is_empty() {
                None
            } else {
                Some(NotificationBatch {
                    subscriber,
                    listings: matches,
                })
            }
        })
        .collect()
}
