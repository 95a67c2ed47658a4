use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use tracing_actix_web::TracingLogger;

use crate::client::{DocumentClient, EmailClient, FormRelayClient};
use crate::controller::{broadcasts, forms, subscriptions};
use crate::crypto::SigningKey;
use crate::settings::AdminSettings;

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    signing_key: SigningKey,
    store: DocumentClient,
    email_client: EmailClient,
    form_relay: FormRelayClient,
    admin: AdminSettings,
) -> anyhow::Result<Server> {
    // Wrap application data
    let signing_key = web::Data::new(signing_key);
    let store = web::Data::new(store);
    let email_client = web::Data::new(email_client);
    let form_relay = web::Data::new(form_relay);
    let admin = web::Data::new(admin);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(signing_key.clone())
            .app_data(store.clone())
            .app_data(email_client.clone())
            .app_data(form_relay.clone())
            .app_data(admin.clone())
            .service(health_check)
            .service(forms::scope())
            .service(subscriptions::scope())
            .service(broadcasts::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
