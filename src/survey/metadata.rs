//! Panorama metadata records, one panorama per line:
//! `panoID: <id> panoDate: <YYYY-MM> longitude: <lon> latitude: <lat>`.

use crate::error::{GreenViewError, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

const MIN_FIELDS: usize = 8;
const MIN_COORDINATE_LEN: usize = 3;

/// One sample point. Coordinates stay as the tokens read from the file so
/// result records reproduce them exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanoramaRecord {
    pub pano_id: String,
    pub pano_date: String,
    pub longitude: String,
    pub latitude: String,
}

impl PanoramaRecord {
    /// Two-digit capture month taken from the end of the date.
    pub fn capture_month(&self) -> &str {
        let date = self.pano_date.as_str();
        match date.char_indices().rev().nth(1) {
            Some((index, _)) => &date[index..],
            None => date,
        }
    }

    fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }
        Some(Self {
            pano_id: fields[1].to_string(),
            pano_date: fields[3].to_string(),
            longitude: fields[5].to_string(),
            latitude: fields[7].to_string(),
        })
    }
}

impl fmt::Display for PanoramaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "panoID: {} panoDate: {} longitude: {} latitude: {}",
            self.pano_id, self.pano_date, self.longitude, self.latitude
        )
    }
}

/// Parses metadata text, keeping green-season panoramas with plausible
/// coordinates. Duplicate ids keep their first occurrence; order is preserved.
pub fn parse_metadata(text: &str, green_months: &[String]) -> Vec<PanoramaRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(record) = PanoramaRecord::parse_line(line) else {
            warn!(line = number + 1, "skipping malformed metadata line");
            continue;
        };
        if record.longitude.len() < MIN_COORDINATE_LEN {
            debug!(pano_id = %record.pano_id, "skipping panorama with invalid longitude");
            continue;
        }
        if !green_months.iter().any(|month| month == record.capture_month()) {
            continue;
        }
        if !seen.insert(record.pano_id.clone()) {
            continue;
        }
        records.push(record);
    }

    records
}

pub fn read_metadata_file(path: &Path, green_months: &[String]) -> Result<Vec<PanoramaRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GreenViewError::Metadata(format!("{}: {}", path.display(), e)))?;
    Ok(parse_metadata(&text, green_months))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summer() -> Vec<String> {
        ["05", "06", "07", "08", "09"].iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn parses_and_filters_lines() {
        let text = "\
panoID: aaa panoDate: 2014-07 longitude: -71.0921 latitude: 42.3591
panoID: bbb panoDate: 2014-01 longitude: -71.0922 latitude: 42.3592
panoID: ccc panoDate: 2015-09 longitude: 12 latitude: 42.3593
panoID: aaa panoDate: 2016-06 longitude: -71.0999 latitude: 42.3599
broken line
panoID: ddd panoDate: 2013-05 longitude: -71.0924 latitude: 42.3594
";
        let records = parse_metadata(text, &summer());
        let ids: Vec<&str> = records.iter().map(|r| r.pano_id.as_str()).collect();
        assert_eq!(ids, vec!["aaa", "ddd"]);
        assert_eq!(records[0].pano_date, "2014-07");
        assert_eq!(records[0].longitude, "-71.0921");
        assert_eq!(records[0].latitude, "42.3591");
    }

    #[test]
    fn capture_month_is_last_two_characters() {
        let record = PanoramaRecord::parse_line(
            "panoID: x panoDate: 2011-10 longitude: 1.234 latitude: 5.678",
        )
        .unwrap();
        assert_eq!(record.capture_month(), "10");
    }

    #[test]
    fn display_matches_input_format() {
        let line = "panoID: xyz panoDate: 2014-07 longitude: -71.0921 latitude: 42.3591";
        let record = PanoramaRecord::parse_line(line).unwrap();
        assert_eq!(record.to_string(), line);
    }

    #[test]
    fn missing_file_is_metadata_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_metadata_file(&dir.path().join("absent.txt"), &summer());
        assert!(matches!(result, Err(GreenViewError::Metadata(_))));
    }
}
