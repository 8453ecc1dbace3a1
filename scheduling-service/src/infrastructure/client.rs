use async_trait::async_trait;
use chrono::NaiveDate;
use opentelemetry::global;
use opentelemetry::propagation::Injector;
use reqwest::{Client, header};
use scheduling_engine::ResourceSnapshot;
use shared::responses::ApiResponse;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::{domain::client::ResourcesClient, error::SchedulingServiceError};

pub struct HttpResourcesClient {
    client: Client,
    base_url: String,
}

impl HttpResourcesClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::new();
        Self { client, base_url }
    }
}

struct HeaderMapInjector<'a>(&'a mut header::HeaderMap);

impl Injector for HeaderMapInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = header::HeaderName::from_bytes(key.as_bytes())
            && let Ok(val) = header::HeaderValue::from_str(&value)
        {
            self.0.insert(name, val);
        }
    }
}

#[async_trait]
impl ResourcesClient for HttpResourcesClient {
    #[tracing::instrument(skip(self))]
    async fn get_resources(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ResourceSnapshot, SchedulingServiceError> {
        let url = format!(
            "{}/api/v1/resources?start_date={start_date}&end_date={end_date}",
            self.base_url
        );

        let mut headers = header::HeaderMap::new();
        let cx = tracing::Span::current().context();
        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&cx, &mut HeaderMapInjector(&mut headers));
        });

        tracing::debug!(%url, "Requesting resource snapshot");

        let res = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                SchedulingServiceError::ResourceService(format!(
                    "Failed to reach resource service: {e}"
                ))
            })?;

        tracing::debug!(status = %res.status(), "Resource service responded");

        if !res.status().is_success() {
            return Err(SchedulingServiceError::ResourceService(format!(
                "Resource service returned status {}",
                res.status()
            )));
        }

        let api_response = res
            .json::<ApiResponse<ResourceSnapshot>>()
            .await
            .map_err(|e| {
                SchedulingServiceError::ResourceService(format!(
                    "Failed to deserialize response: {e}"
                ))
            })?;

        api_response.data.ok_or_else(|| {
            SchedulingServiceError::ResourceService("No data in response".to_string())
        })
    }
}
