//! CSV/TSV reading with delimiter detection.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{CarbonLensError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Raw file contents split into headers and string cells.
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
}

/// File bytes plus what we learned while reading them.
pub(crate) struct RawFile {
    pub bytes: Vec<u8>,
    pub size_bytes: u64,
    pub hash: String,
}

/// Read a file fully and hash it.
pub(crate) fn read_file(path: &Path) -> Result<RawFile> {
    let mut file = File::open(path).map_err(|e| CarbonLensError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let size_bytes = file
        .metadata()
        .map_err(|e| CarbonLensError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| CarbonLensError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let hash = hash_bytes(&bytes);
    Ok(RawFile {
        bytes,
        size_bytes,
        hash,
    })
}

/// SHA-256 fingerprint of the dataset contents.
pub(crate) fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Parse delimited bytes into a [`RawTable`].
pub(crate) fn parse_bytes(bytes: &[u8], delimiter: Option<u8>) -> Result<RawTable> {
    let delimiter = match delimiter {
        Some(d) => d,
        None => detect_delimiter(bytes)?,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CarbonLensError::Config("No columns found".to_string()));
    }

    let expected_cols = headers.len();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

        // Pad short rows, truncate long ones
        while row.len() < expected_cols {
            row.push(String::new());
        }
        row.truncate(expected_cols);

        rows.push(row);
    }

    Ok(RawTable {
        headers,
        rows,
        delimiter,
    })
}

/// Human-readable format name for a delimiter.
pub(crate) fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Check if a cell represents a missing value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed == "."
        || trimmed == "-"
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(CarbonLensError::Config("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Higher count with lower variance wins; tabs get a small bonus
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"country,year,co2\nChina,2020,10\nIndia,2020,5";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"country\tyear\tco2\nChina\t2020\t10\nIndia\t2020\t5";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_quoted_delimiters_are_ignored() {
        let data = b"country,year,co2\n\"Korea, South\",2020,10\nIndia,2020,5";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
        let table = parse_bytes(data, None).unwrap();
        assert_eq!(table.rows[0][0], "Korea, South");
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let table = parse_bytes(b"country,year,co2\nChina,2020\n", Some(b',')).unwrap();
        assert_eq!(table.headers, vec!["country", "year", "co2"]);
        assert_eq!(table.rows[0], vec!["China", "2020", ""]);
    }

    #[test]
    fn test_is_null_value() {
        assert!(is_null_value(""));
        assert!(is_null_value("NA"));
        assert!(is_null_value("nan"));
        assert!(is_null_value("NULL"));
        assert!(is_null_value("."));
        assert!(!is_null_value("0"));
        assert!(!is_null_value("China"));
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_bytes(b"abc"), hash_bytes(b"abc"));
        assert_ne!(hash_bytes(b"abc"), hash_bytes(b"abd"));
        assert!(hash_bytes(b"abc").starts_with("sha256:"));
    }
}
