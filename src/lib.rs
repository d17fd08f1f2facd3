//! # magdecl
//!
//! Validation of geomagnetic field model declinations against two independent
//! empirical sources:
//!
//! * ground observatories publishing IAGA-2002 daily reports,
//! * a low-earth-orbit satellite magnetometer pass.
//!
//! Each input unit (one station-day, or one selected satellite record) is parsed,
//! normalized and reduced to a measured declination, then paired with the declination
//! predicted by a model service at the same position and epoch. A run yields a
//! [`ComparisonDataset`] in input order together with the audit list of the units
//! that were skipped.
//!
//! Modules
//! -----------------
//! * [`observatories`] – IAGA-2002 parsing and station-day estimation,
//! * [`orbits`] – orbit record sources, decimation and per-sample estimation,
//! * [`conversion`] – longitude/altitude normalization, geocentric → geodetic,
//! * [`declination`] – declination from horizontal components, daily statistics,
//! * [`model_client`] – model service contract and HTTP adapter,
//! * [`dataset`] – observations and the comparison dataset,
//! * [`pipeline`] – bounded concurrent runs, cancellation, run report,
//! * [`config`] – run configuration.
pub mod config;
pub mod constants;
pub mod conversion;
pub mod dataset;
pub mod declination;
pub mod magdecl_errors;
pub mod model_client;
pub mod observatories;
pub mod orbits;
pub mod pipeline;
pub mod progress;
pub mod time;

pub use config::{EpochMismatchPolicy, ModelServiceConfig, RunConfig};
pub use dataset::{ComparisonDataset, DeclinationObservation, SourceType};
pub use magdecl_errors::MagDeclError;
pub use model_client::{HttpModelService, ModelPrediction, ModelQuery, ModelService};
pub use orbits::{orbit_reader::OrbitArrays, orbit_reader::OrbitSource, sampling::SamplingPolicy};
pub use pipeline::{block_on, CancelHandle, RunReport, SkippedUnit, ValidationRun};
pub use time::EpochMode;
