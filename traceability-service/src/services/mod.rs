pub mod database;
pub mod queue;

pub use database::Database;
pub use queue::QueueConsumer;
