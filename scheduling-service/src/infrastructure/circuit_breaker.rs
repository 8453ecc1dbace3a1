use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scheduling_engine::ResourceSnapshot;
use tokio::sync::Mutex;

use crate::domain::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::domain::client::ResourcesClient;
use crate::error::SchedulingServiceError;

/// Decorator around a [`ResourcesClient`] that checks the circuit breaker before
/// delegating calls and records successes/failures.
pub struct CircuitBreakerClient {
    inner: Arc<dyn ResourcesClient>,
    breaker: Arc<Mutex<CircuitBreaker>>,
}

impl CircuitBreakerClient {
    /// Creates a new circuit-breaker-wrapped client. Returns both the client and a
    /// shared handle to the breaker (used by the health check to force-close it).
    pub fn new(
        inner: Arc<dyn ResourcesClient>,
        config: CircuitBreakerConfig,
    ) -> (Self, Arc<Mutex<CircuitBreaker>>) {
        let breaker = Arc::new(Mutex::new(CircuitBreaker::new(config)));
        let client = Self {
            inner,
            breaker: Arc::clone(&breaker),
        };
        (client, breaker)
    }
}

#[async_trait]
impl ResourcesClient for CircuitBreakerClient {
    #[tracing::instrument(skip(self))]
    async fn get_resources(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ResourceSnapshot, SchedulingServiceError> {
        {
            let mut breaker = self.breaker.lock().await;
            if !breaker.can_execute() {
                tracing::warn!("Circuit breaker is open, fast-failing request");
                return Err(SchedulingServiceError::CircuitOpen);
            }
        }

        match self.inner.get_resources(start_date, end_date).await {
            Ok(result) => {
                self.breaker.lock().await.record_success();
                Ok(result)
            }
            Err(e) => {
                let mut breaker = self.breaker.lock().await;
                breaker.record_failure();
                let state = breaker.state();
                drop(breaker);

                tracing::warn!(
                    circuit_state = ?state,
                    "Resource service call failed, circuit breaker recorded failure"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::circuit_breaker::CircuitState;
    use crate::domain::client::MockResourcesClient;

    fn make_config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            cooldown_secs: 100,
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();
        (start, start + chrono::Duration::days(6))
    }

    #[tokio::test]
    async fn delegates_to_inner_when_closed() {
        let mut mock = MockResourcesClient::new();
        mock.expect_get_resources()
            .returning(|_, _| Ok(ResourceSnapshot::default()));

        let (client, _breaker) = CircuitBreakerClient::new(Arc::new(mock), make_config(3));
        let (start, end) = range();
        let result = client.get_resources(start, end).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn returns_circuit_open_when_open() {
        let mut mock = MockResourcesClient::new();
        mock.expect_get_resources().returning(|_, _| {
            Err(SchedulingServiceError::ResourceServiceUnavailable(
                "connection refused".into(),
            ))
        });

        let (client, _breaker) = CircuitBreakerClient::new(Arc::new(mock), make_config(2));
        let (start, end) = range();

        // Trigger 2 failures to open the circuit
        let _ = client.get_resources(start, end).await;
        let _ = client.get_resources(start, end).await;

        // Third call should be fast-failed by circuit breaker
        let result = client.get_resources(start, end).await;
        assert!(matches!(
            result.unwrap_err(),
            SchedulingServiceError::CircuitOpen
        ));
    }

    #[tokio::test]
    async fn records_success_and_keeps_closed() {
        let mut mock = MockResourcesClient::new();
        mock.expect_get_resources()
            .returning(|_, _| Ok(ResourceSnapshot::default()));

        let (client, breaker) = CircuitBreakerClient::new(Arc::new(mock), make_config(3));
        let (start, end) = range();
        let _ = client.get_resources(start, end).await;

        let state = breaker.lock().await.state();
        assert_eq!(state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn records_failure_and_opens_at_threshold() {
        let mut mock = MockResourcesClient::new();
        mock.expect_get_resources().returning(|_, _| {
            Err(SchedulingServiceError::ResourceServiceUnavailable(
                "timeout".into(),
            ))
        });

        let (client, breaker) = CircuitBreakerClient::new(Arc::new(mock), make_config(2));
        let (start, end) = range();
        let _ = client.get_resources(start, end).await;
        assert_eq!(breaker.lock().await.state(), CircuitState::Closed);

        let _ = client.get_resources(start, end).await;
        assert_eq!(breaker.lock().await.state(), CircuitState::Open);
    }
}
