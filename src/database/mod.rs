pub mod connection;
pub mod schema;

pub use connection::{DbPool, create_pool, run_migrations};
pub use schema::{SchemaDescriptor, SharedSchema};
