/// Admin mailing-list broadcast
pub mod broadcasts;
/// CSRF-protected public form submission
pub mod forms;
/// Mailing-list subscribe/unsubscribe
pub mod subscriptions;
