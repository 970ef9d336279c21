use anyhow::{anyhow, Context as _, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::args::Args;
use crate::commit::CommitConfig;
use crate::db::{decode_key, DbKey};

/// Settings resolved from command line flags and environment variables.
#[derive(Clone)]
pub struct Config {
    pub db_path: PathBuf,
    db_key: Option<String>,
    pub commit: CommitConfig,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Self {
            db_path: args.db_path.clone(),
            db_key: args.db_key.clone(),
            commit: CommitConfig {
                max_wait: Duration::from_secs(args.commit_max_wait_secs),
                timeout: Duration::from_secs(args.commit_timeout_secs),
            },
        }
    }

    pub fn db_key(&self) -> Result<DbKey> {
        let encoded = self.db_key.as_deref().ok_or_else(|| {
            anyhow!("No database key given. Pass --db-key or set POS_SALES_DB_KEY.")
        })?;
        decode_key(encoded).context("Invalid database key")
    }
}
