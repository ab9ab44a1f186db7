/// Persistence for teams, schedule, scores and brackets.
pub mod fest_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
