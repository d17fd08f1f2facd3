//! # Run configuration
//!
//! Every knob of a validation run lives in [`RunConfig`]. The configuration is
//! immutable once the run starts and is shared by all workers.
//!
//! ```rust
//! use std::time::Duration;
//! use magdecl::config::{EpochMismatchPolicy, RunConfig};
//! use magdecl::orbits::sampling::SamplingPolicy;
//!
//! let config = RunConfig::default()
//!     .with_host("http://localhost:8080")
//!     .with_api_key("secret")
//!     .with_sampling(SamplingPolicy::EveryNth(50))
//!     .with_max_concurrent_requests(8)
//!     .with_request_timeout(Duration::from_secs(5))
//!     .with_epoch_mismatch_policy(EpochMismatchPolicy::FlagAndInclude);
//! assert!(config.validate().is_ok());
//! ```
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        Kilometer, DEFAULT_EARTH_RADIUS_KM, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_MODEL_HOST,
        DEFAULT_MODEL_PATH, DEFAULT_REQUEST_TIMEOUT_MS,
    },
    conversion::InversionMethod,
    magdecl_errors::MagDeclError,
    orbits::sampling::SamplingPolicy,
    time::EpochMode,
};

/// What to do with an observatory file whose epoch differs from the batch epoch.
///
/// Both policies record an [`MagDeclError::EpochConsistency`] entry in the run audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EpochMismatchPolicy {
    /// the unit is left out of the dataset
    #[default]
    Reject,
    /// the unit is kept, with `epoch_flagged = true`
    FlagAndInclude,
}

/// Location and credential of the model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelServiceConfig {
    pub host: String,
    pub path: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ModelServiceConfig {
    fn default() -> Self {
        ModelServiceConfig {
            host: DEFAULT_MODEL_HOST.to_string(),
            path: DEFAULT_MODEL_PATH.to_string(),
            api_key: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ModelServiceConfig {
    /// `{host}{path}`, without doubled or missing `/` at the junction.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.host.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Configuration of one validation run.
///
/// Fields
/// ------
/// * `model`: model service location, credential and per-query timeout
/// * `earth_radius_km`: spherical Earth radius the satellite altitude is measured from
/// * `sampling`: decimation of satellite passes
/// * `max_concurrent_requests`: model queries in flight at once
/// * `epoch_mismatch`: handling of observatory files off the batch epoch
/// * `observatory_epoch_mode`, `orbit_epoch_mode`: decimal-year conventions
/// * `inversion`: ECEF → geodetic algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub model: ModelServiceConfig,
    pub earth_radius_km: Kilometer,
    pub sampling: SamplingPolicy,
    pub max_concurrent_requests: usize,
    pub epoch_mismatch: EpochMismatchPolicy,
    pub observatory_epoch_mode: EpochMode,
    pub orbit_epoch_mode: EpochMode,
    pub inversion: InversionMethod,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            model: ModelServiceConfig::default(),
            earth_radius_km: DEFAULT_EARTH_RADIUS_KM,
            sampling: SamplingPolicy::default(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            epoch_mismatch: EpochMismatchPolicy::default(),
            observatory_epoch_mode: EpochMode::DayOfYear365,
            orbit_epoch_mode: EpochMode::Exact,
            inversion: InversionMethod::default(),
        }
    }
}

impl RunConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.model.host = host.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.model.path = path.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.model.api_key = Some(api_key.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.model.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_earth_radius_km(mut self, radius: Kilometer) -> Self {
        self.earth_radius_km = radius;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    pub fn with_epoch_mismatch_policy(mut self, policy: EpochMismatchPolicy) -> Self {
        self.epoch_mismatch = policy;
        self
    }

    pub fn with_observatory_epoch_mode(mut self, mode: EpochMode) -> Self {
        self.observatory_epoch_mode = mode;
        self
    }

    pub fn with_orbit_epoch_mode(mut self, mode: EpochMode) -> Self {
        self.orbit_epoch_mode = mode;
        self
    }

    /// Apply the same decimal-year convention to both sources.
    pub fn with_uniform_epoch_mode(self, mode: EpochMode) -> Self {
        self.with_observatory_epoch_mode(mode)
            .with_orbit_epoch_mode(mode)
    }

    pub fn with_inversion(mut self, inversion: InversionMethod) -> Self {
        self.inversion = inversion;
        self
    }

    /// Check the configuration before a run starts.
    ///
    /// Return
    /// ------
    /// * [`MagDeclError::InvalidConfig`] naming the first invalid field
    pub fn validate(&self) -> Result<(), MagDeclError> {
        let invalid = |msg: &str| Err(MagDeclError::InvalidConfig(msg.to_string()));

        if self.model.host.trim().is_empty() {
            return invalid("model service host is empty");
        }
        if self.model.request_timeout_ms == 0 {
            return invalid("request timeout must be positive");
        }
        if self.max_concurrent_requests == 0 {
            return invalid("max_concurrent_requests must be at least 1");
        }
        if !self.sampling.is_valid() {
            return invalid("sampling stride and budget must be at least 1");
        }
        if !(self.earth_radius_km.is_finite() && self.earth_radius_km > 0.0) {
            return invalid("earth radius must be a positive number of kilometers");
        }
        Ok(())
    }
}
