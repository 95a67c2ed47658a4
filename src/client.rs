mod document_store;
mod email_client;
mod form_relay;

pub use document_store::{Document, DocumentClient, FieldValue, QueryBuilder};
pub use email_client::EmailClient;
pub use form_relay::FormRelayClient;
