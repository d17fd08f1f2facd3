//! # Satellite passes
//!
//! Ingestion of low-earth-orbit magnetometer records and reduction of each selected
//! record to a declination at a geodetic position.
//!
//! Modules
//! -----------------
//! * [`orbit_record`] – one raw record (geocentric position, `B_NEC` vector),
//! * [`orbit_reader`] – the [`OrbitSource`](orbit_reader::OrbitSource) trait and its
//!   in-memory / CSV implementation,
//! * [`sampling`] – decimation policy,
//! * [`orbit_sample`] – per-record normalization and declination.
pub mod orbit_reader;
pub mod orbit_record;
pub mod orbit_sample;
pub mod sampling;
