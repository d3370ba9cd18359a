pub mod outbox;
pub mod photo;
pub mod record;

pub use outbox::{DeliveryStatus, OutboxEntry};
pub use photo::PhotoEvidence;
pub use record::PersistedRecord;
