//! Result records: one line per sample point with its Green View Index.

use crate::error::Result;
use crate::survey::metadata::PanoramaRecord;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const RESULT_FILE_PREFIX: &str = "GV_";

/// Output file name for a metadata file name, `GV_<name>`.
pub fn result_file_name(metadata_file_name: &str) -> String {
    format!("{}{}", RESULT_FILE_PREFIX, metadata_file_name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GreenViewRecord {
    pub panorama: PanoramaRecord,
    pub green_view: f64,
    /// Set when a heading failed and `green_view` carries the failure sentinel.
    pub failed: bool,
}

impl fmt::Display for GreenViewRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `{:?}` keeps the decimal point on whole numbers (50.0, not 50).
        write!(f, "{}, greenview: {:?}", self.panorama, self.green_view)
    }
}

pub fn write_records(path: &Path, records: &[GreenViewRecord]) -> Result<()> {
    let mut output = BufWriter::new(std::fs::File::create(path)?);
    for record in records {
        writeln!(output, "{}", record)?;
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(green_view: f64) -> GreenViewRecord {
        GreenViewRecord {
            panorama: PanoramaRecord {
                pano_id: "abc".into(),
                pano_date: "2014-07".into(),
                longitude: "-71.0921".into(),
                latitude: "42.3591".into(),
            },
            green_view,
            failed: false,
        }
    }

    #[test]
    fn formats_result_line() {
        assert_eq!(
            record(50.0).to_string(),
            "panoID: abc panoDate: 2014-07 longitude: -71.0921 latitude: 42.3591, greenview: 50.0"
        );
        assert!(record(12.25).to_string().ends_with("greenview: 12.25"));
    }

    #[test]
    fn result_name_is_prefixed() {
        assert_eq!(result_file_name("Pnt_start0_end1000.txt"), "GV_Pnt_start0_end1000.txt");
    }

    #[test]
    fn writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GV_points.txt");
        write_records(&path, &[record(1.5), record(-1000.0 / 6.0)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("greenview: 1.5"));
        assert!(lines[1].contains("greenview: -166.66"));
    }
}
