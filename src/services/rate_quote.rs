//! Third-party courier rates.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::ShipmentConfig;
use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateQuoteRequest {
    pub origin_city_id: i32,
    pub destination_city_id: i32,
    /// Grams
    pub weight: i64,
    pub courier: String,
}

/// One service level offered by a courier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub service: String,
    pub cost: i64,
    /// Estimated days in transit as reported by the courier, e.g. `"2-3"`
    pub etd: String,
}

#[async_trait]
pub trait RateQuoteClient: Send + Sync {
    async fn quote(&self, request: &RateQuoteRequest) -> Result<Vec<RateQuote>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct CostEnvelope {
    rajaongkir: CostBody,
}

#[derive(Debug, Deserialize)]
struct CostBody {
    #[serde(default)]
    results: Vec<CourierResult>,
}

#[derive(Debug, Deserialize)]
struct CourierResult {
    #[serde(default)]
    costs: Vec<ServiceCost>,
}

#[derive(Debug, Deserialize)]
struct ServiceCost {
    service: String,
    #[serde(default)]
    cost: Vec<CostValue>,
}

#[derive(Debug, Deserialize)]
struct CostValue {
    value: i64,
    #[serde(default)]
    etd: String,
}

impl From<CostEnvelope> for Vec<RateQuote> {
    fn from(envelope: CostEnvelope) -> Self {
        envelope
            .rajaongkir
            .results
            .into_iter()
            .flat_map(|result| result.costs)
            .flat_map(|service| {
                let name = service.service;
                service.cost.into_iter().map(move |cost| RateQuote {
                    service: name.clone(),
                    cost: cost.value,
                    etd: cost.etd,
                })
            })
            .collect()
    }
}

/// Rate API client speaking the RajaOngkir `cost` endpoint
#[derive(Debug, Clone)]
pub struct HttpRateQuoteClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRateQuoteClient {
    pub fn new(config: &ShipmentConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rate_api_timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("Failed to build rate API client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.rate_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.rate_api_key.clone(),
        })
    }
}

#[async_trait]
impl RateQuoteClient for HttpRateQuoteClient {
    #[instrument(skip(self), fields(courier = %request.courier))]
    async fn quote(&self, request: &RateQuoteRequest) -> Result<Vec<RateQuote>, ServiceError> {
        let url = format!("{}/cost", self.base_url);
        let form = [
            ("origin", request.origin_city_id.to_string()),
            ("destination", request.destination_city_id.to_string()),
            ("weight", request.weight.to_string()),
            ("courier", request.courier.clone()),
        ];

        let response = self
            .client
            .post(&url)
            .header("key", &self.api_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Rate API request failed");
                ServiceError::ExternalServiceError(format!("Rate API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "Rate API returned an error status");
            return Err(ServiceError::ExternalServiceError(format!(
                "Rate API responded with {}",
                status
            )));
        }

        let envelope: CostEnvelope = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Malformed rate API response: {}", e))
        })?;

        let quotes: Vec<RateQuote> = envelope.into();
        debug!(count = quotes.len(), "Rate quotes received");
        Ok(quotes)
    }
}
