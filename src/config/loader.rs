use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    /// Load `~/.riddlechat/config.toml`, writing defaults on first run.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Self::load_or_init_in(&home.join(".riddlechat"))
    }

    pub fn load_or_init_in(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");

        if !dir.exists() {
            fs::create_dir_all(dir).context("Failed to create .riddlechat directory")?;
        }

        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            config.data_dir = dir.to_path_buf();
            config
        } else {
            let config = Self {
                config_path: config_path.clone(),
                data_dir: dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_env::with_env;
    use crate::session::PersistPolicy;
    use tempfile::TempDir;

    #[test]
    fn first_run_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("riddlechat");

        let config = with_env(&[], || Config::load_or_init_in(&root)).unwrap();

        assert!(root.join("config.toml").exists());
        assert_eq!(config.data_dir, root);
        assert_eq!(config.history_db_path(), root.join("history.db"));
    }

    #[test]
    fn existing_file_is_respected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[transport]\nbase_url = \"http://riddles.local:9000\"\n\n[session]\npersist_policy = \"every_turn\"\n",
        )
        .unwrap();

        let config = with_env(&[], || Config::load_or_init_in(dir.path())).unwrap();
        assert_eq!(config.transport.base_url, "http://riddles.local:9000");
        assert_eq!(config.session.persist_policy, PersistPolicy::EveryTurn);
    }

    #[test]
    fn invalid_file_fails_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[retry]\nmax_attempts = 0\n").unwrap();

        let err = with_env(&[], || Config::load_or_init_in(dir.path())).unwrap_err();
        assert!(format!("{err:#}").contains("max_attempts"));
    }

    #[test]
    fn env_data_dir_wins_over_config_location() {
        let dir = TempDir::new().unwrap();
        let elsewhere = dir.path().join("elsewhere");
        let elsewhere_str = elsewhere.to_string_lossy().into_owned();

        let config = with_env(&[("RIDDLECHAT_DATA_DIR", elsewhere_str.as_str())], || {
            Config::load_or_init_in(dir.path())
        })
        .unwrap();
        assert_eq!(config.config_path, dir.path().join("config.toml"));
        assert_eq!(config.history_db_path(), elsewhere.join("history.db"));
    }
}
