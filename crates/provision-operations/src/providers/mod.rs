mod memory;

pub use memory::{
    Call, CallJournal, FaultKind, InMemoryBackend, InMemoryNotifier, InMemoryObjectStore,
    InMemoryRecordStore, Operation,
};
