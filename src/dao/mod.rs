/// Database model definitions.
pub mod models;
/// Score persistence: the store trait and its backends.
pub mod score_store;
/// Storage abstraction layer for database operations.
pub mod storage;
