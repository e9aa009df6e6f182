use std::path::Path;

use clap::Parser;
use sanity_core::config::{load_env_local, DEFAULT_ENV_FILE};
use sanity_core::{Result, SanityConfig, SanityError};
use tracing::error;

/// Production sanity test for the ingestion pipeline.
///
/// Submits a fresh media URL, kicks the worker, and polls the job status
/// until it reaches a terminal state or the poll budget runs out.
/// Store credentials come from the env file (NEXT_PUBLIC_SUPABASE_URL,
/// SUPABASE_SERVICE_ROLE_KEY).
#[derive(Parser, Debug)]
#[command(name = "sanity-test", version, about)]
pub struct CliArgs {
    /// Env file applied to the process environment before anything else
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    pub env_file: String,
}

impl CliArgs {
    /// Load the env file and build the config.
    ///
    /// Missing credentials print the FATAL line and yield `Ok(None)`; the
    /// caller exits 1 without making any request.
    pub fn load_config(&self) -> Result<Option<SanityConfig>> {
        load_env_local(Path::new(&self.env_file));

        match SanityConfig::from_env() {
            Ok(config) => Ok(Some(config)),
            Err(SanityError::MissingConfig(key)) => {
                error!(%key, "required configuration missing");
                println!("FATAL: Missing Supabase credentials in {}", self.env_file);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
