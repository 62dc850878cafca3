use crate::api::{HttpPracticeApi, MockDelays, MockPracticeApi, PracticeApi};
use crate::config::{AppConfig, BackendKind};
use std::sync::Arc;

pub fn backend_from_config(config: &AppConfig) -> Arc<dyn PracticeApi> {
    match config.backend {
        BackendKind::Http => Arc::new(HttpPracticeApi::new(
            &config.api_url,
            &config.api_version,
            config.api_token.clone(),
        )),
        BackendKind::Mock => {
            let delays = if config.mock_latency {
                MockDelays::default()
            } else {
                MockDelays::zero()
            };
            Arc::new(MockPracticeApi::new(delays))
        }
    }
}
