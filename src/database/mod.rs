pub mod connection;
pub mod operations;

pub use connection::{connect, connect_with_retry};
pub use operations::{ensure_schema, PgAdviceStore, PgReadingLog};
