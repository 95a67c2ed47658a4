use std::net::TcpListener;

use anyhow::Context;

use pawhome::app;
use pawhome::client::{DocumentClient, EmailClient, FormRelayClient};
use pawhome::crypto::SigningKey;
use pawhome::notifier::Notifier;
use pawhome::settings::Settings;
use pawhome::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info".into(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().context("Failed to load settings")?;

    let signing_key =
        SigningKey::new(settings.app.secret_key()).context("Failed to create signing key")?;

    let store = DocumentClient::new(
        settings.store.api_timeout(),
        settings.store.api_base_url()?,
        settings.store.api_auth_token(),
    )?;

    let email_client = EmailClient::new(
        settings.email.sender()?,
        settings.email.api_timeout(),
        settings.email.api_base_url()?,
        settings.email.api_auth_token(),
    )?;

    let form_relay = FormRelayClient::new(
        settings.forms.api_timeout(),
        settings.forms.forward_url()?,
    )?;

    let notifier = Notifier::new(
        store.clone(),
        email_client.clone(),
        settings.app.public_base_url()?,
    );
    tokio::spawn(notifier.run_forever(settings.notifications.check_interval()));

    let listener = TcpListener::bind(settings.app.addr())?;

    app::run(
        listener,
        signing_key,
        store,
        email_client,
        form_relay,
        settings.admin.clone(),
    )?
    .await
    .context("Failed to run app")
}
