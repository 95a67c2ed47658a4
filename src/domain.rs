mod categories;
mod email_address;
mod listing;
mod subscriber;

pub use categories::{AgeGroup, AnimalType, PetSize, Preference};
pub use email_address::EmailAddress;
pub use listing::Listing;
pub use subscriber::{Preferences, Subscriber};
