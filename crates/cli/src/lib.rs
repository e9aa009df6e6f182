pub mod cli;
pub mod ingest;
pub mod poller;
pub mod runner;
pub mod worker;

pub use runner::{RunOutcome, Runner};
