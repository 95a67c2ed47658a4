mod listings;
mod subscribers;

pub use listings::ListingRepo;
pub use subscribers::SubscriberRepo;
