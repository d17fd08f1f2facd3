//! # IAGA-2002 reader
//!
//! Reads one observatory day file into an [`IagaFile`]: its typed header and its data
//! table.
//!
//! ## Format
//!
//! A file is made of two phases:
//!
//! 1. **Header phase** – fixed-width `key value |` lines, interleaved with comment lines
//!    (any line containing `#`). It ends at the line whose first token is `DATE`.
//! 2. **Table phase** – that `DATE` line gives the column names, every following
//!    non-blank line is one row of whitespace-separated values.
//!
//! ```text
//!  IAGA Code              BOU                                          |
//!  Geodetic Latitude      40.137                                       |
//!  # comment lines are skipped                                         |
//! DATE       TIME         DOY     BOUX      BOUY      BOUZ      BOUF   |
//! 2021-04-11 00:00:00.000 101     20745.29   3541.02  47440.76  52116.84
//! ```
//!
//! The trailing `|` of the column line is dropped. `DATE` and `TIME` are kept as text,
//! every other column is read as a number.
//!
//! ## Errors
//!
//! Any inconsistency is reported as a [`ParseIagaError`] carrying the 1-based line
//! number when it applies. A parse failure concerns the whole file (the station-day
//! unit), never a single row.
use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::constants::{IAGA_MINUTE_EXTENSION, IAGA_SEPARATOR, IAGA_TABLE_TOKEN};
use crate::magdecl_errors::MagDeclError;

use super::iaga_header::{HeaderRecord, IagaHeader};

const COLUMN_TIME: &str = "TIME";
const COLUMN_DOY: &str = "DOY";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseIagaError {
    #[error("Unable to read the file: {0}")]
    Unreadable(String),

    #[error("No DATE line found: the file has no data table")]
    MissingTable,

    #[error("Missing header field: {0}")]
    MissingHeaderField(&'static str),

    #[error("Invalid value {value:?} for header field {key:?}")]
    InvalidHeaderValue { key: String, value: String },

    #[error("Missing column {0} in the data table")]
    MissingColumn(String),

    #[error("Line {line}: expected {expected} values, found {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid value {value:?} in column {column}")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },
}

/// One row of the data table.
///
/// `values` is aligned with [`IagaFile::value_columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct IagaRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub date: String,
    pub time: Option<String>,
    pub day_of_year: u16,
    pub values: Vec<f64>,
}

/// A parsed IAGA-2002 file.
#[derive(Debug, Clone, PartialEq)]
pub struct IagaFile {
    pub header: IagaHeader,
    value_columns: Vec<String>,
    column_index: HashMap<String, usize>,
    pub rows: Vec<IagaRow>,
}

impl IagaFile {
    /// Names of the numeric columns, in table order (`DATE` and `TIME` excluded, `DOY`
    /// excluded as it is exposed through [`IagaRow::day_of_year`]).
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Position of a numeric column in [`IagaRow::values`].
    pub fn column(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    /// Position of the station column of one magnetic component (`X`, `Y`, `D`, `E`…),
    /// named `<IAGA code><component>`.
    pub fn component_column(&self, component: char) -> Result<Option<usize>, ParseIagaError> {
        let code = self.header.require_code()?;
        Ok(self.column(&format!("{code}{component}")))
    }
}

/// Parse the content of an IAGA-2002 file.
///
/// Arguments
/// ---------
/// * `content`: the whole file as text
///
/// Return
/// ------
/// * the parsed file, or the first inconsistency met
pub fn parse_iaga_str(content: &str) -> Result<IagaFile, ParseIagaError> {
    let mut lines = content.lines().enumerate().map(|(idx, line)| (idx + 1, line));

    // header phase
    let mut record = HeaderRecord::new();
    let table_columns = loop {
        let Some((_, line)) = lines.next() else {
            return Err(ParseIagaError::MissingTable);
        };
        if line.trim().is_empty() || line.contains('#') {
            continue;
        }
        if line.split_whitespace().next() == Some(IAGA_TABLE_TOKEN) {
            break line
                .split_whitespace()
                .filter(|token| *token != IAGA_SEPARATOR)
                .map(str::to_string)
                .collect::<Vec<_>>();
        }
        record.push_line(line);
    };
    let header = IagaHeader::try_from(record)?;

    let time_idx = table_columns.iter().position(|c| c == COLUMN_TIME);
    let doy_idx = table_columns
        .iter()
        .position(|c| c == COLUMN_DOY)
        .ok_or_else(|| ParseIagaError::MissingColumn(COLUMN_DOY.to_string()))?;

    let value_positions: Vec<usize> = (1..table_columns.len())
        .filter(|&idx| Some(idx) != time_idx && idx != doy_idx)
        .collect();
    let value_columns: Vec<String> = value_positions
        .iter()
        .map(|&idx| table_columns[idx].clone())
        .collect();
    let column_index = value_columns
        .iter()
        .enumerate()
        .map(|(pos, name)| (name.clone(), pos))
        .collect();

    // table phase
    let mut rows = Vec::new();
    for (line_number, line) in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != table_columns.len() {
            return Err(ParseIagaError::RowLength {
                line: line_number,
                expected: table_columns.len(),
                found: tokens.len(),
            });
        }

        let invalid = |idx: usize| ParseIagaError::InvalidValue {
            line: line_number,
            column: table_columns[idx].clone(),
            value: tokens[idx].to_string(),
        };

        let day_of_year = tokens[doy_idx]
            .parse::<u16>()
            .map_err(|_| invalid(doy_idx))?;
        let values = value_positions
            .iter()
            .map(|&idx| tokens[idx].parse::<f64>().map_err(|_| invalid(idx)))
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(IagaRow {
            line: line_number,
            date: tokens[0].to_string(),
            time: time_idx.map(|idx| tokens[idx].to_string()),
            day_of_year,
            values,
        });
    }

    Ok(IagaFile {
        header,
        value_columns,
        column_index,
        rows,
    })
}

/// Read and parse an IAGA-2002 file from disk.
pub fn read_iaga_file(path: &Utf8Path) -> Result<IagaFile, ParseIagaError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ParseIagaError::Unreadable(format!("{path}: {e}")))?;
    parse_iaga_str(&content)
}

/// List the minute-resolution IAGA-2002 files (`*.min`) of a directory, sorted by
/// file name so that batch sequence numbers are reproducible.
///
/// An unreadable directory is a run-level failure.
pub fn discover_minute_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, MagDeclError> {
    let mut files = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension() == Some(IAGA_MINUTE_EXTENSION) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod iaga_reader_test {
    use super::*;

    const SAMPLE: &str = "\
 Format                 IAGA-2002                                    |
 Station Name           Boulder                                      |
 IAGA Code              BOU                                          |
 Geodetic Latitude      40.137                                       |
 Geodetic Longitude     254.763                                      |
 Elevation              1682                                         |
 # DECBAS               5527    (Baseline declination value in       |
 # tenths of minutes East (0-216,000)).                              |
DATE       TIME         DOY     BOUX      BOUY      BOUZ      BOUF   |
2021-04-11 00:00:00.000 101     20745.29   3541.02  47440.76  52116.84

2021-04-11 00:01:00.000 101     99999.00  99999.00  47440.80  52116.90
";

    #[test]
    fn test_parse_sample() {
        let file = parse_iaga_str(SAMPLE).unwrap();
        assert_eq!(file.header.iaga_code.as_deref(), Some("BOU"));
        assert_eq!(file.header.elevation, Some(1682.0));
        assert_eq!(file.value_columns(), &["BOUX", "BOUY", "BOUZ", "BOUF"]);
        assert_eq!(file.rows.len(), 2);

        let first = &file.rows[0];
        assert_eq!(first.line, 10);
        assert_eq!(first.date, "2021-04-11");
        assert_eq!(first.time.as_deref(), Some("00:00:00.000"));
        assert_eq!(first.day_of_year, 101);
        assert_eq!(first.values, vec![20745.29, 3541.02, 47440.76, 52116.84]);

        assert_eq!(file.component_column('Y').unwrap(), Some(1));
        assert_eq!(file.component_column('D').unwrap(), None);
        // comments never reach the header
        assert!(file.header.extensions.keys().all(|k| !k.contains('#')));
    }

    #[test]
    fn test_missing_table() {
        let content = " IAGA Code              BOU                                          |\n";
        assert_eq!(parse_iaga_str(content), Err(ParseIagaError::MissingTable));
    }

    #[test]
    fn test_row_length() {
        let content = format!("{SAMPLE}2021-04-11 00:02:00.000 101  1.0  2.0\n");
        assert_eq!(
            parse_iaga_str(&content),
            Err(ParseIagaError::RowLength {
                line: 13,
                expected: 7,
                found: 5
            })
        );
    }

    #[test]
    fn test_invalid_value() {
        let content = format!("{SAMPLE}2021-04-11 00:02:00.000 101  1.0  abc  3.0  4.0\n");
        assert_eq!(
            parse_iaga_str(&content),
            Err(ParseIagaError::InvalidValue {
                line: 13,
                column: "BOUY".into(),
                value: "abc".into()
            })
        );
    }

    #[test]
    fn test_missing_doy() {
        let content = " IAGA Code              BOU                                          |\n\
DATE       TIME         BOUX      BOUY   |\n";
        assert_eq!(
            parse_iaga_str(content),
            Err(ParseIagaError::MissingColumn("DOY".into()))
        );
    }

    #[test]
    fn test_discover_minute_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b20210411vmin.min", "a20210411vmin.min", "notes.txt"] {
            std::fs::write(dir.path().join(name), SAMPLE).unwrap();
        }
        let dir_path = Utf8Path::from_path(dir.path()).unwrap();
        let files = discover_minute_files(dir_path).unwrap();
        let names: Vec<_> = files.iter().filter_map(|p| p.file_name()).collect();
        assert_eq!(names, vec!["a20210411vmin.min", "b20210411vmin.min"]);
    }
}
