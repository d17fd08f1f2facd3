//! # Ground observatories
//!
//! Ingestion of IAGA-2002 daily reports and reduction of each file to one daily
//! declination.
//!
//! * [`iaga_header`] – header normalization and the typed [`IagaHeader`](iaga_header::IagaHeader),
//! * [`iaga_reader`] – two-phase file parser and `.min` directory discovery,
//! * [`station_day`] – column selection, validity filtering and daily statistics.
pub mod iaga_header;
pub mod iaga_reader;
pub mod station_day;
