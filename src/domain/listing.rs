use chrono::{DateTime, Utc};

use crate::domain::{AgeGroup, AnimalType, PetSize};

/// A pet listing, as far as the notification path cares about it
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Store document id
    pub id: String,
    /// Display name of the pet
    pub name: String,
    pub animal_type: AnimalType,
    pub size: PetSize,
    pub age_years: u32,
    /// Whether the listing is currently published
    pub active: bool,
    /// Set once the listing has been included in a notification pass;
    /// terminal, never flips back
    pub notification_sent: bool,
    pub date_added: DateTime<Utc>,
}

impl Listing {
    /// Age bucket this listing falls into, derived from its age in years
    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::from_age(self.age_years)
    }
}
