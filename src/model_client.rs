//! # Model service adapter
//!
//! The geomagnetic field model is an external HTTP service. This module fixes its
//! request/response contract behind the [`ModelService`] trait, so that the pipeline
//! can be driven by the real service ([`HttpModelService`]) or by any in-process
//! implementation (tests, cached predictions…).
//!
//! ## Contract
//!
//! ```text
//! GET {host}{path}?altitude=<km>&longitude=<deg, -180..180>&latitude=<deg>&year=<decimal year>
//! API-Key: <credential>            (optional)
//!
//! 200 OK
//! { "declination": { "value": 4.12, "units": "deg" }, ... }
//! ```
//!
//! A transport failure, a non-success status or an unexpected body is reported as a
//! [`MagDeclError`] for the queried unit only.
use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::ModelServiceConfig,
    constants::{DecimalYear, Degree, Kilometer, API_KEY_HEADER},
    magdecl_errors::MagDeclError,
};

/// Position and epoch of one model evaluation.
///
/// The field names are the query parameter names of the service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelQuery {
    /// km above sea level (observatory) or above the WGS84 ellipsoid (satellite)
    pub altitude: Kilometer,
    /// `(-180, 180]`
    pub longitude: Degree,
    pub latitude: Degree,
    pub year: DecimalYear,
}

/// Model answer for one query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    /// predicted declination in degrees
    pub declination: Degree,
}

/// Anything able to evaluate the field model at a position and epoch.
pub trait ModelService: Send + Sync {
    fn predict(
        &self,
        query: ModelQuery,
    ) -> impl Future<Output = Result<ModelPrediction, MagDeclError>> + Send;
}

#[derive(Debug, Deserialize)]
struct FieldValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct MagneticFieldResponse {
    declination: FieldValue,
}

/// Parse the JSON body returned by the magnetic field endpoint.
pub fn parse_model_response(body: &str) -> Result<ModelPrediction, MagDeclError> {
    let response: MagneticFieldResponse = serde_json::from_str(body)
        .map_err(|e| MagDeclError::ModelService(format!("unexpected response body: {e}")))?;
    Ok(ModelPrediction {
        declination: response.declination.value,
    })
}

/// [`ModelService`] backed by the HTTP magnetic field endpoint.
#[derive(Debug, Clone)]
pub struct HttpModelService {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpModelService {
    /// Build the adapter and its HTTP client.
    ///
    /// The client timeout is the configured per-query timeout; a request cut by it
    /// is reported as [`MagDeclError::ModelTimeout`].
    pub fn new(config: &ModelServiceConfig) -> Result<Self, MagDeclError> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MagDeclError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(HttpModelService {
            client,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, query: ModelQuery) -> Result<ModelPrediction, MagDeclError> {
        let mut request = self.client.get(&self.endpoint).query(&query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(MagDeclError::ModelStatus {
                status: status.as_u16(),
                body,
            });
        }
        parse_model_response(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> MagDeclError {
        if err.is_timeout() {
            MagDeclError::ModelTimeout(self.timeout)
        } else {
            MagDeclError::ModelService(err.to_string())
        }
    }
}

impl ModelService for HttpModelService {
    fn predict(
        &self,
        query: ModelQuery,
    ) -> impl Future<Output = Result<ModelPrediction, MagDeclError>> + Send {
        self.fetch(query)
    }
}
