use crate::api::{
    ApiError, ApiResponse, CharacterReply, CharacterReplyRequest, DrillRequest, DrillSet,
    PracticeApi, ScenarioCatalog, SpeechAnalysis, SpeechAnalysisRequest,
};
use crate::models::{Drill, Scenario};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use self::circuit_breaker::CircuitBreaker;
use self::metrics::Metrics;
use self::retry::RetryPolicy;

pub mod circuit_breaker;
pub mod metrics;
pub mod registry;
pub mod retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AnalyzeSpeech,
    CharacterReply,
    GenerateDrills,
    GetDrill,
    ListScenarios,
    GetScenario,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AnalyzeSpeech => "analyze_speech",
            Operation::CharacterReply => "character_reply",
            Operation::GenerateDrills => "generate_drills",
            Operation::GetDrill => "get_drill",
            Operation::ListScenarios => "list_scenarios",
            Operation::GetScenario => "get_scenario",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u8,
    pub base_delay: Duration,
}

impl CallPolicy {
    pub fn new(timeout: Duration, max_retries: u8) -> Self {
        Self {
            timeout,
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Speech analysis sits on the interactive path, so it alone retries by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicies {
    pub speech: CallPolicy,
    pub default: CallPolicy,
}

impl CallPolicies {
    pub fn for_operation(&self, operation: Operation) -> CallPolicy {
        match operation {
            Operation::AnalyzeSpeech => self.speech,
            _ => self.default,
        }
    }
}

impl Default for CallPolicies {
    fn default() -> Self {
        Self {
            speech: CallPolicy::new(Duration::from_secs(10), 2),
            default: CallPolicy::new(Duration::from_secs(8), 0),
        }
    }
}

/// Practice API client with timeouts, retry, cancellation and a circuit breaker.
///
/// Every call resolves to an [`ApiResponse`] envelope; no error escapes as a panic.
pub struct PracticeClient {
    backend: Arc<dyn PracticeApi>,
    policies: CallPolicies,
    circuit_breaker: Mutex<CircuitBreaker>,
    metrics: Mutex<Metrics>,
}

impl PracticeClient {
    pub fn new(backend: Arc<dyn PracticeApi>, policies: CallPolicies) -> Self {
        tracing::info!("Practice client using '{}' backend", backend.name());
        Self {
            backend,
            policies,
            circuit_breaker: Mutex::new(CircuitBreaker::new()),
            metrics: Mutex::new(Metrics::new()),
        }
    }

    pub fn with_circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.circuit_breaker = Mutex::new(breaker);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn policies(&self) -> &CallPolicies {
        &self.policies
    }

    pub async fn analyze_speech(
        &self,
        request: &SpeechAnalysisRequest,
        cancel: &CancellationToken,
    ) -> ApiResponse<SpeechAnalysis> {
        let backend = self.backend.as_ref();
        self.call(Operation::AnalyzeSpeech, cancel, || backend.analyze_speech(request))
            .await
    }

    pub async fn character_reply(
        &self,
        request: &CharacterReplyRequest,
        cancel: &CancellationToken,
    ) -> ApiResponse<CharacterReply> {
        let backend = self.backend.as_ref();
        self.call(Operation::CharacterReply, cancel, || backend.character_reply(request))
            .await
    }

    pub async fn generate_drills(
        &self,
        request: &DrillRequest,
        cancel: &CancellationToken,
    ) -> ApiResponse<DrillSet> {
        let backend = self.backend.as_ref();
        self.call(Operation::GenerateDrills, cancel, || backend.generate_drills(request))
            .await
    }

    pub async fn get_drill(&self, drill_id: &str, cancel: &CancellationToken) -> ApiResponse<Drill> {
        let backend = self.backend.as_ref();
        self.call(Operation::GetDrill, cancel, || backend.get_drill(drill_id))
            .await
    }

    pub async fn list_scenarios(&self, cancel: &CancellationToken) -> ApiResponse<ScenarioCatalog> {
        let backend = self.backend.as_ref();
        self.call(Operation::ListScenarios, cancel, || backend.list_scenarios())
            .await
    }

    pub async fn get_scenario(
        &self,
        scenario_id: &str,
        cancel: &CancellationToken,
    ) -> ApiResponse<Scenario> {
        let backend = self.backend.as_ref();
        self.call(Operation::GetScenario, cancel, || backend.get_scenario(scenario_id))
            .await
    }

    pub fn success_count(&self, operation: Operation) -> u64 {
        self.metrics
            .lock()
            .map(|m| m.get_success_count(operation))
            .unwrap_or(0)
    }

    pub fn failure_count(&self, operation: Operation) -> u64 {
        self.metrics
            .lock()
            .map(|m| m.get_failure_count(operation))
            .unwrap_or(0)
    }

    pub fn success_rate(&self, operation: Operation) -> f32 {
        self.metrics
            .lock()
            .map(|m| m.get_success_rate(operation))
            .unwrap_or(0.0)
    }

    async fn call<T, F, Fut>(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
        attempt_fn: F,
    ) -> ApiResponse<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = self.execute(operation, cancel, attempt_fn).await;
        if let Err(e) = &result {
            tracing::warn!("{} failed: {}", operation.as_str(), e);
        }
        result.into()
    }

    async fn execute<T, F, Fut>(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
        attempt_fn: F,
    ) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let allowed = match self.circuit_breaker.lock() {
            Ok(mut cb) => cb.is_request_allowed(),
            Err(_) => true,
        };
        if !allowed {
            tracing::warn!(
                "{} skipped: circuit breaker open for '{}'",
                operation.as_str(),
                self.backend.name()
            );
            return Err(ApiError::CircuitOpen);
        }

        let policy = self.policies.for_operation(operation);
        let retry_policy = RetryPolicy::new(policy.max_retries, policy.base_delay);
        let mut attempt = 0u8;

        loop {
            tracing::debug!(
                "{} attempt {}/{} via '{}'",
                operation.as_str(),
                attempt + 1,
                policy.max_retries + 1,
                self.backend.name()
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ApiError::Cancelled),
                result = tokio::time::timeout(policy.timeout, attempt_fn()) => {
                    result.unwrap_or(Err(ApiError::Timeout))
                }
            };

            match outcome {
                Ok(value) => {
                    self.record_success(operation);
                    return Ok(value);
                }
                Err(ApiError::Cancelled) => {
                    tracing::info!("{} cancelled", operation.as_str());
                    return Err(ApiError::Cancelled);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} attempt {}/{} failed: {}",
                        operation.as_str(),
                        attempt + 1,
                        policy.max_retries + 1,
                        e
                    );

                    if retry_policy.should_retry(attempt, &e) {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                tracing::info!("{} cancelled during backoff", operation.as_str());
                                return Err(ApiError::Cancelled);
                            }
                            _ = retry_policy.wait_before_retry(attempt) => {}
                        }
                        attempt += 1;
                        continue;
                    }

                    self.record_failure(operation, &e);
                    return Err(e);
                }
            }
        }
    }

    fn record_success(&self, operation: Operation) {
        if let Ok(mut cb) = self.circuit_breaker.lock() {
            cb.record_success();
        }
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_success(operation);
        }
    }

    fn record_failure(&self, operation: Operation, error: &ApiError) {
        if error.counts_against_backend() {
            if let Ok(mut cb) = self.circuit_breaker.lock() {
                cb.record_failure();
            }
        }
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_failure(operation);
        }
    }
}
