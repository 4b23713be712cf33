#![allow(dead_code)]

use riddlechat::app::dispatch::build_controller;
use riddlechat::{Config, SessionController};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A controller wired exactly like the binary, against a mock riddle service
/// and a throwaway data directory.
pub struct Harness {
    pub server: MockServer,
    pub config: Config,
    pub controller: SessionController,
    _data_dir: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut Config)) -> Self {
        let server = MockServer::start().await;
        let data_dir = TempDir::new().unwrap();

        let mut config = Config::default();
        config.data_dir = data_dir.path().to_path_buf();
        config.config_path = data_dir.path().join("config.toml");
        config.transport.base_url = server.uri();
        config.transport.request_timeout_secs = 2;
        config.retry.base_delay_ms = 1;
        config.retry.max_delay_ms = 5;
        customize(&mut config);
        config.validate().unwrap();

        let controller = build_controller(&config).await.unwrap();
        Self {
            server,
            config,
            controller,
            _data_dir: data_dir,
        }
    }

    /// A second controller over the same history database, as after a restart.
    pub async fn restart(&self) -> SessionController {
        build_controller(&self.config).await.unwrap()
    }

    pub async fn reply(&self, room: u64, prompt: &str, reply: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/{room}/chat")))
            .and(query_param("userPrompt", prompt))
            .respond_with(ResponseTemplate::new(200).set_body_string(reply))
            .mount(&self.server)
            .await;
    }
}
