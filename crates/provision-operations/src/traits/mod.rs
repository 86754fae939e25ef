mod notifier;
mod object_store;
mod record_store;

pub use notifier::Notifier;
pub use object_store::ObjectStore;
pub use record_store::RecordStore;
