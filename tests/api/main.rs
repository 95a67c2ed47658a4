
mod forms;
mod subscriptions;
