//! # Comparison dataset
//!
//! A run produces one [`ComparisonDataset`]: one [`DeclinationObservation`] per unit
//! (station-day or satellite sample) that went through both the declination
//! estimation and the model query. Units that failed on either side are absent, the
//! dataset never holds a missing prediction.
//!
//! Observations are accumulated by a [`DatasetBuilder`] in completion order and sorted
//! by input sequence when the dataset is finalized, so the output order is the input
//! order whatever the scheduling of the model queries.
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DecimalYear, Degree, Kilometer},
    model_client::{ModelPrediction, ModelQuery},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Observatory,
    Satellite,
}

/// Measured side of one unit, ready to be sent to the model service.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredUnit {
    /// position of the unit in the run input
    pub sequence: usize,
    /// station name, or sample timestamp
    pub source_id: String,
    pub source_type: SourceType,
    /// calendar date (observatory) or `HH:MM:SS` (satellite)
    pub label: String,
    pub epoch: DecimalYear,
    /// rendering latitude, degrees
    pub latitude: Degree,
    /// rendering longitude, in the native convention of the source
    pub longitude: Degree,
    pub altitude_km: Kilometer,
    pub declination_measured: Degree,
    pub uncertainty: Option<Degree>,
    /// normalized coordinates sent to the model service
    pub query: ModelQuery,
    pub epoch_flagged: bool,
}

/// One row of the comparison dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclinationObservation {
    pub sequence: usize,
    pub source_id: String,
    pub source_type: SourceType,
    pub label: String,
    pub epoch: DecimalYear,
    pub latitude: Degree,
    pub longitude: Degree,
    pub altitude_km: Kilometer,
    pub declination_measured: Degree,
    pub uncertainty: Option<Degree>,
    pub declination_predicted: Degree,
    pub epoch_flagged: bool,
    pub annotation: String,
}

impl DeclinationObservation {
    /// Join the measured side of a unit with its model prediction.
    pub fn new(unit: MeasuredUnit, prediction: ModelPrediction) -> Self {
        let annotation = annotation(
            unit.source_type,
            &unit.source_id,
            &unit.label,
            unit.declination_measured,
            prediction.declination,
        );
        DeclinationObservation {
            sequence: unit.sequence,
            source_id: unit.source_id,
            source_type: unit.source_type,
            label: unit.label,
            epoch: unit.epoch,
            latitude: unit.latitude,
            longitude: unit.longitude,
            altitude_km: unit.altitude_km,
            declination_measured: unit.declination_measured,
            uncertainty: unit.uncertainty,
            declination_predicted: prediction.declination,
            epoch_flagged: unit.epoch_flagged,
            annotation,
        }
    }

    /// `measured - predicted`, degrees.
    pub fn residual(&self) -> Degree {
        self.declination_measured - self.declination_predicted
    }
}

/// Hover text of an observation, both declinations rounded to three decimals.
///
/// * observatory: `Station: <name><br>Measured <m><br>Calculated <p>`
/// * satellite: `Time: <HH:MM:SS><br>Measured: <m><br>Calculated: <p>`
pub fn annotation(
    source_type: SourceType,
    source_id: &str,
    label: &str,
    measured: Degree,
    predicted: Degree,
) -> String {
    match source_type {
        SourceType::Observatory => {
            format!("Station: {source_id}<br>Measured {measured:.3}<br>Calculated {predicted:.3}")
        }
        SourceType::Satellite => {
            format!("Time: {label}<br>Measured: {measured:.3}<br>Calculated: {predicted:.3}")
        }
    }
}

/// Immutable result of a run, ordered by input sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDataset {
    observations: Vec<DeclinationObservation>,
}

impl ComparisonDataset {
    pub fn observations(&self) -> &[DeclinationObservation] {
        &self.observations
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclinationObservation> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Common epoch of the unflagged observations, `None` if they disagree or if
    /// there are none.
    pub fn epoch(&self) -> Option<DecimalYear> {
        let mut epochs = self
            .observations
            .iter()
            .filter(|obs| !obs.epoch_flagged)
            .map(|obs| obs.epoch);
        let first = epochs.next()?;
        epochs.all(|epoch| epoch == first).then_some(first)
    }

    /// Mean of the residuals, `None` for an empty dataset.
    pub fn mean_residual(&self) -> Option<Degree> {
        if self.observations.is_empty() {
            return None;
        }
        let sum: f64 = self.observations.iter().map(|obs| obs.residual()).sum();
        Some(sum / self.observations.len() as f64)
    }

    /// Pretty JSON export of the dataset.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a ComparisonDataset {
    type Item = &'a DeclinationObservation;
    type IntoIter = std::slice::Iter<'a, DeclinationObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// Per-run accumulator of observations.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    pending: Vec<DeclinationObservation>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: MeasuredUnit, prediction: ModelPrediction) {
        self.pending.push(DeclinationObservation::new(unit, prediction));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Sort by input sequence and freeze the dataset.
    pub fn finish(mut self) -> ComparisonDataset {
        self.pending.sort_by_key(|obs| obs.sequence);
        ComparisonDataset {
            observations: self.pending,
        }
    }
}
