use hifitime::Epoch;
use nalgebra::Vector3;

use crate::constants::{Degree, Meter, NanoTesla};

/// One satellite magnetometer record.
///
/// Positions are **geocentric** spherical coordinates, the field vector is expressed
/// in the local North-East-Center frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitRecord {
    /// UTC instant of the measurement
    pub timestamp: Epoch,
    /// geocentric latitude, degrees
    pub latitude_geocentric: Degree,
    /// longitude, degrees
    pub longitude_geocentric: Degree,
    /// distance to the Earth center, meters
    pub radius: Meter,
    /// `[B_N, B_E, B_C]` in nanotesla
    pub b_nec: Vector3<NanoTesla>,
}

impl OrbitRecord {
    pub fn b_north(&self) -> NanoTesla {
        self.b_nec.x
    }

    pub fn b_east(&self) -> NanoTesla {
        self.b_nec.y
    }
}
