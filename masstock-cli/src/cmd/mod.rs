pub mod cancel;
pub mod engine;
pub mod events;
pub mod execute;
pub mod list;
pub mod migrate;
pub mod serve;
pub mod status;
pub mod validate;
pub mod wait;
pub mod worker;
