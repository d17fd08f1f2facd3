//! # Validation runs
//!
//! A [`ValidationRun`] turns one batch of raw measurements into a [`RunReport`]:
//!
//! ```text
//! observatory files / orbit source
//!        │  parse, normalize, estimate          (sequential, per unit)
//!        ▼
//!   MeasuredUnit ×N ──► model queries           (bounded pool, per-query timeout)
//!        │
//!        ▼
//!   DatasetBuilder ──► ComparisonDataset (input order) + audit list
//! ```
//!
//! ## Failure isolation
//!
//! Every unit (station-day or satellite sample) succeeds or fails on its own: a parse
//! error, an empty station, an epoch mismatch, a model failure or a timeout is recorded
//! as a [`SkippedUnit`] and the run goes on. Only run-level problems (invalid
//! configuration, empty or unreadable input set) make a run return `Err`.
//!
//! ## Concurrency
//!
//! At most [`RunConfig::max_concurrent_requests`] model queries are in flight. Each
//! query is bounded by the configured request timeout. Results are collected in
//! completion order and re-sorted by input sequence.
//!
//! ## Cancellation
//!
//! A [`CancelHandle`] stops a run cooperatively. The flag is checked before each unit
//! is parsed and before each query is sent: queries already sent are awaited and their
//! units kept, every other unit is reported with [`MagDeclError::Cancelled`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use magdecl::{config::RunConfig, pipeline::{block_on, ValidationRun}};
//!
//! # fn run() -> Result<(), magdecl::magdecl_errors::MagDeclError> {
//! let config = RunConfig::default().with_api_key("my-key");
//! let run = ValidationRun::with_http(config)?;
//! let report = block_on(run.run_observatory_dir(Utf8Path::new("data/2021-04-11")))??;
//! for obs in report.dataset.iter() {
//!     println!("{}: {:.3} vs {:.3}", obs.source_id, obs.declination_measured, obs.declination_predicted);
//! }
//! # Ok(())
//! # }
//! ```
use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use camino::Utf8Path;
use log::{debug, info, warn};
use tokio::{
    sync::Semaphore,
    task::{Id, JoinSet},
};

use crate::{
    config::{EpochMismatchPolicy, RunConfig},
    conversion::GeodeticInversion,
    dataset::{ComparisonDataset, DatasetBuilder, MeasuredUnit},
    magdecl_errors::MagDeclError,
    model_client::{HttpModelService, ModelPrediction, ModelService},
    observatories::{
        iaga_reader::{discover_minute_files, read_iaga_file},
        station_day::estimate_station_day,
    },
    orbits::{
        orbit_reader::OrbitSource,
        orbit_sample::{estimate_orbit_sample, sample_id},
    },
    progress::QueryProgress,
};

/// Outcome of the measured side of one unit.
pub type UnitOutcome = Result<MeasuredUnit, MagDeclError>;

/// Cooperative cancellation flag, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Audit entry of a unit that failed, or that was kept with a flag.
#[derive(Debug, PartialEq)]
pub struct SkippedUnit {
    pub sequence: usize,
    /// station name, file name or sample timestamp
    pub source_id: String,
    pub error: MagDeclError,
    /// `true` when the unit is nevertheless part of the dataset (flagged epoch)
    pub kept: bool,
}

impl SkippedUnit {
    fn dropped(sequence: usize, source_id: impl Into<String>, error: MagDeclError) -> Self {
        SkippedUnit {
            sequence,
            source_id: source_id.into(),
            error,
            kept: false,
        }
    }
}

/// Result of one run: the dataset and the audit list, both in input order.
#[derive(Debug, PartialEq)]
pub struct RunReport {
    pub dataset: ComparisonDataset,
    pub skipped: Vec<SkippedUnit>,
}

impl RunReport {
    fn new(dataset: ComparisonDataset, mut skipped: Vec<SkippedUnit>) -> Self {
        skipped.sort_by_key(|entry| entry.sequence);
        RunReport { dataset, skipped }
    }

    /// Units absent from the dataset.
    pub fn dropped(&self) -> impl Iterator<Item = &SkippedUnit> {
        self.skipped.iter().filter(|entry| !entry.kept)
    }

    /// Units present in the dataset with a flag.
    pub fn flagged(&self) -> impl Iterator<Item = &SkippedUnit> {
        self.skipped.iter().filter(|entry| entry.kept)
    }
}

/// One validation run against a model service.
pub struct ValidationRun<M> {
    config: Arc<RunConfig>,
    service: Arc<M>,
    cancel: CancelHandle,
}

impl ValidationRun<HttpModelService> {
    /// Run against the HTTP model service described by `config.model`.
    pub fn with_http(config: RunConfig) -> Result<Self, MagDeclError> {
        let service = HttpModelService::new(&config.model)?;
        Self::new(config, service)
    }
}

impl<M: ModelService + 'static> ValidationRun<M> {
    /// Validate the configuration and bind it to a model service.
    pub fn new(config: RunConfig, service: M) -> Result<Self, MagDeclError> {
        Self::from_shared(config, Arc::new(service))
    }

    /// Same as [`ValidationRun::new`] with a service shared with other runs.
    pub fn from_shared(config: RunConfig, service: Arc<M>) -> Result<Self, MagDeclError> {
        config.validate()?;
        Ok(ValidationRun {
            config: Arc::new(config),
            service,
            cancel: CancelHandle::new(),
        })
    }

    /// Replace the cancellation flag of the run by an externally owned one.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Validate every `*.min` file of a directory, in file-name order.
    pub async fn run_observatory_dir(&self, dir: &Utf8Path) -> Result<RunReport, MagDeclError> {
        let files = discover_minute_files(dir)?;
        if files.is_empty() {
            return Err(MagDeclError::EmptyInput(format!("no .min file in {dir}")));
        }
        self.run_observatory_files(&files).await
    }

    /// Validate a batch of IAGA-2002 files, one station-day each.
    ///
    /// The first file resolving to an epoch fixes the batch epoch; later files off
    /// that epoch are handled by [`RunConfig::epoch_mismatch`].
    pub async fn run_observatory_files<P: AsRef<Utf8Path>>(
        &self,
        paths: &[P],
    ) -> Result<RunReport, MagDeclError> {
        if paths.is_empty() {
            return Err(MagDeclError::EmptyInput("no observatory file given".into()));
        }
        info!("observatory batch: {} file(s)", paths.len());

        let mut skipped = Vec::new();
        let mut units = Vec::with_capacity(paths.len());
        let mut batch_epoch = None;

        for (sequence, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let name = path.file_name().unwrap_or(path.as_str());
            if self.cancel.is_cancelled() {
                skipped.push(SkippedUnit::dropped(sequence, name, MagDeclError::Cancelled));
                continue;
            }
            let outcome: UnitOutcome = read_iaga_file(path)
                .map_err(MagDeclError::from)
                .and_then(|file| estimate_station_day(&file, self.config.observatory_epoch_mode))
                .map(|day| day.into_measured(sequence));

            let mut unit = match outcome {
                Ok(unit) => unit,
                Err(error) => {
                    warn!("{path}: skipped: {error}");
                    skipped.push(SkippedUnit::dropped(sequence, name, error));
                    continue;
                }
            };

            let reference = *batch_epoch.get_or_insert(unit.epoch);
            if unit.epoch != reference {
                let error = MagDeclError::EpochConsistency {
                    expected: reference,
                    found: unit.epoch,
                };
                warn!("{}: {error}", unit.source_id);
                match self.config.epoch_mismatch {
                    EpochMismatchPolicy::Reject => {
                        skipped.push(SkippedUnit::dropped(sequence, unit.source_id, error));
                        continue;
                    }
                    EpochMismatchPolicy::FlagAndInclude => {
                        unit.epoch_flagged = true;
                        skipped.push(SkippedUnit {
                            sequence,
                            source_id: unit.source_id.clone(),
                            error,
                            kept: true,
                        });
                    }
                }
            }
            units.push(unit);
        }

        let dataset = self.query_all(units, &mut skipped).await;
        info!(
            "observatory batch done: {} observation(s), {} audit entr(ies)",
            dataset.len(),
            skipped.len()
        );
        Ok(RunReport::new(dataset, skipped))
    }

    /// Validate a satellite pass, using the configured inversion.
    pub async fn run_orbit_pass<S: OrbitSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<RunReport, MagDeclError> {
        let inversion = self.config.inversion;
        self.run_orbit_pass_with_inversion(source, &inversion).await
    }

    /// Validate a satellite pass with a caller-provided ECEF → geodetic inversion.
    ///
    /// Records are decimated by [`RunConfig::sampling`]; sequence numbers follow the
    /// selected records.
    pub async fn run_orbit_pass_with_inversion<S: OrbitSource + ?Sized>(
        &self,
        source: &S,
        inversion: &dyn GeodeticInversion,
    ) -> Result<RunReport, MagDeclError> {
        if source.is_empty() {
            return Err(MagDeclError::EmptyInput("orbit source has no record".into()));
        }
        let selected = self.config.sampling.select(source.len());
        info!(
            "orbit pass: {} record(s), {} selected",
            source.len(),
            selected.len()
        );

        let mut skipped = Vec::new();
        let mut units = Vec::with_capacity(selected.len());
        for (sequence, record) in selected
            .into_iter()
            .filter_map(|index| source.record(index))
            .enumerate()
        {
            if self.cancel.is_cancelled() {
                let id = sample_id(&record.timestamp);
                skipped.push(SkippedUnit::dropped(sequence, id, MagDeclError::Cancelled));
                continue;
            }
            match estimate_orbit_sample(
                &record,
                self.config.earth_radius_km,
                inversion,
                self.config.orbit_epoch_mode,
            ) {
                Ok(sample) => units.push(sample.into_measured(sequence)),
                Err(error) => {
                    let id = sample_id(&record.timestamp);
                    warn!("{id}: skipped: {error}");
                    skipped.push(SkippedUnit::dropped(sequence, id, error));
                }
            }
        }

        let dataset = self.query_all(units, &mut skipped).await;
        info!(
            "orbit pass done: {} observation(s), {} audit entr(ies)",
            dataset.len(),
            skipped.len()
        );
        Ok(RunReport::new(dataset, skipped))
    }

    /// Query the model for every unit through the bounded pool.
    async fn query_all(
        &self,
        units: Vec<MeasuredUnit>,
        skipped: &mut Vec<SkippedUnit>,
    ) -> ComparisonDataset {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests));
        let timeout = self.config.model.request_timeout();
        let mut progress = QueryProgress::new(units.len());
        let mut tasks = JoinSet::new();
        // units moved into a task, for the tasks that never hand them back
        let mut in_flight: HashMap<Id, (usize, String, bool)> = HashMap::new();

        for unit in units {
            if self.cancel.is_cancelled() {
                let error = MagDeclError::Cancelled;
                drop_unit(unit.sequence, unit.source_id, unit.epoch_flagged, error, skipped);
                continue;
            }
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                let error = MagDeclError::Cancelled;
                drop_unit(unit.sequence, unit.source_id, unit.epoch_flagged, error, skipped);
                continue;
            };
            // the wait for a slot may have outlived the run
            if self.cancel.is_cancelled() {
                let error = MagDeclError::Cancelled;
                drop_unit(unit.sequence, unit.source_id, unit.epoch_flagged, error, skipped);
                continue;
            }

            let service = Arc::clone(&self.service);
            let audit = (unit.sequence, unit.source_id.clone(), unit.epoch_flagged);
            let task = tasks.spawn(async move {
                let _permit = permit;
                let started = Instant::now();
                let outcome = match tokio::time::timeout(timeout, service.predict(unit.query)).await
                {
                    Ok(prediction) => prediction,
                    Err(_) => Err(MagDeclError::ModelTimeout(timeout)),
                };
                (unit, outcome, started.elapsed())
            });
            in_flight.insert(task.id(), audit);
        }

        let mut builder = DatasetBuilder::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, (unit, outcome, elapsed))) => {
                    in_flight.remove(&id);
                    progress.query_done(elapsed);
                    self.collect(unit, outcome, &mut builder, skipped);
                }
                Err(join_error) => {
                    warn!("model query task failed: {join_error}");
                    if let Some((sequence, source_id, flagged)) =
                        in_flight.remove(&join_error.id())
                    {
                        let error = MagDeclError::ModelTaskFailed(join_error.to_string());
                        drop_unit(sequence, source_id, flagged, error, skipped);
                    }
                }
            }
        }
        progress.finish();
        builder.finish()
    }

    fn collect(
        &self,
        unit: MeasuredUnit,
        outcome: Result<ModelPrediction, MagDeclError>,
        builder: &mut DatasetBuilder,
        skipped: &mut Vec<SkippedUnit>,
    ) {
        match outcome {
            Ok(prediction) => {
                debug!(
                    "{}: measured {:.3}, predicted {:.3}",
                    unit.source_id, unit.declination_measured, prediction.declination
                );
                builder.push(unit, prediction);
            }
            Err(error) => {
                warn!("{}: model query failed: {error}", unit.source_id);
                drop_unit(
                    unit.sequence,
                    unit.source_id,
                    unit.epoch_flagged,
                    error,
                    skipped,
                );
            }
        }
    }
}

/// Record a unit that leaves the dataset at the query stage.
fn drop_unit(
    sequence: usize,
    source_id: String,
    flagged: bool,
    error: MagDeclError,
    skipped: &mut Vec<SkippedUnit>,
) {
    // a flagged unit already has its audit entry: it now leaves the dataset
    if flagged {
        skipped.retain(|entry| !(entry.sequence == sequence && entry.kept));
    }
    skipped.push(SkippedUnit::dropped(sequence, source_id, error));
}

/// Drive a run future to completion on a fresh tokio runtime, for synchronous callers.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, MagDeclError> {
    let runtime = tokio::runtime::Runtime::new()?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod pipeline_test {
    use super::*;

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_report_sorts_audit() {
        let report = RunReport::new(
            ComparisonDataset::default(),
            vec![
                SkippedUnit::dropped(2, "c", MagDeclError::Cancelled),
                SkippedUnit {
                    sequence: 0,
                    source_id: "a".into(),
                    error: MagDeclError::Cancelled,
                    kept: true,
                },
            ],
        );
        let sequences: Vec<_> = report.skipped.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![0, 2]);
        assert_eq!(report.dropped().count(), 1);
        assert_eq!(report.flagged().count(), 1);
    }
}
