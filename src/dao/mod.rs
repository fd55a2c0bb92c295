/// Snapshot entities and the persistence envelope.
pub mod models;
/// Snapshot store trait and its backends.
pub mod snapshot_store;
/// Storage abstraction layer shared by all backends.
pub mod storage;
