pub mod config;
pub mod error;
pub mod job;

pub use config::SanityConfig;
pub use error::*;
pub use job::*;
