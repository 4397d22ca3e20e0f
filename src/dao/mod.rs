/// Whole-file JSON read/write helpers.
pub mod json_file;
/// Persisted data model definitions.
pub mod models;
/// Queue lists store with its scoped lock.
pub mod queue_store;
/// Referee violation log store.
pub mod referee_store;
/// Registration settings store.
pub mod settings_store;
/// Storage error types.
pub mod storage;
