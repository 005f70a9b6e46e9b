mod events;
mod executions;
mod jobs;
mod migrate;
mod store;

pub use migrate::run_migrations;
pub use store::PostgresStore;
