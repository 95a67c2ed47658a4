use crate::domain::{AgeGroup, AnimalType, EmailAddress, Listing, PetSize, Preference};

/// A subscriber's preference filter, one dimension per listing attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub animal_type: Preference<AnimalType>,
    pub size: Preference<PetSize>,
    pub age: Preference<AgeGroup>,
}

impl Preferences {
    /// Filter that admits every listing
    pub fn any() -> Self {
        Self {
            animal_type: Preference::Any,
            size: Preference::Any,
            age: Preference::Any,
        }
    }

    /// Whether a listing passes all three preference dimensions
    pub fn matches(&self, listing: &Listing) -> bool {
        self.animal_type.admits(&listing.animal_type)
            && self.size.admits(&listing.size)
            && self.age.admits(&listing.age_group())
    }
}

/// A mailing-list subscriber.
///
/// Unsubscribing flips `active` to false; records are never hard-deleted
/// in the notification path.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub email: EmailAddress,
    pub preferences: Preferences,
    pub active: bool,
}
