use super::Config;
use crate::session::PersistPolicy;
use std::path::PathBuf;
use std::str::FromStr;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RIDDLECHAT_BASE_URL")
            && !url.is_empty()
        {
            self.transport.base_url = url;
        }

        if let Ok(attempts) = std::env::var("RIDDLECHAT_MAX_ATTEMPTS")
            && let Ok(attempts) = attempts.parse::<u32>()
        {
            self.retry.max_attempts = attempts;
        }

        if let Ok(policy) = std::env::var("RIDDLECHAT_PERSIST_POLICY") {
            match PersistPolicy::from_str(&policy) {
                Ok(policy) => self.session.persist_policy = policy,
                Err(_) => tracing::warn!("Ignoring unknown RIDDLECHAT_PERSIST_POLICY={policy}"),
            }
        }

        if let Ok(dir) = std::env::var("RIDDLECHAT_DATA_DIR")
            && !dir.is_empty()
        {
            self.data_dir = PathBuf::from(dir);
        }
    }
}
